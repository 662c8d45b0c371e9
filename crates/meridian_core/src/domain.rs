//! crates/meridian_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The onboarding state of a user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileStatus {
    New,
    PendingApproval,
    Approved,
}

impl ProfileStatus {
    /// The canonical string form used in storage and over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::New => "new",
            ProfileStatus::PendingApproval => "pending_approval",
            ProfileStatus::Approved => "approved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(ProfileStatus::New),
            "pending_approval" => Some(ProfileStatus::PendingApproval),
            "approved" => Some(ProfileStatus::Approved),
            _ => None,
        }
    }
}

/// One per user; provisioned at signup with status `new` and never deleted.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user_id: Uuid,
    pub full_name: String,
    pub status: ProfileStatus,
    pub application_type: Option<String>,
    pub occupation: Option<String>,
    pub account_purpose: Option<String>,
    pub id_document_path: Option<String>,
    pub address_document_path: Option<String>,
}

/// The fields submitted with the onboarding application form.
#[derive(Debug, Clone)]
pub struct ApplicationUpdate {
    pub application_type: String,
    pub occupation: String,
    pub account_purpose: String,
}

/// One per user. Balances are held in integer cents; formatting into a
/// dollar string happens at the presentation edge.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance_cents: i64,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub sender_id: Option<Uuid>,
    pub receiver_id: Option<Uuid>,
    pub kind: String,
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// A single support-chat message. Immutable once created; a null receiver
/// means the message is addressed to the support desk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
