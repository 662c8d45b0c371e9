//! crates/meridian_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Account, ApplicationUpdate, Message, Profile, Transaction, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, disk).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Auth Methods ---

    /// Creates the user row and seeds the dependent rows every user is
    /// assumed to have: a profile with status `new` and a zero-balance
    /// account. Returns `Conflict` if the email is already registered.
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
        full_name: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the user id for a live (unexpired) session.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    /// Deletes the session and returns the user id it belonged to.
    async fn delete_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    // --- Profile Management ---
    async fn get_profile(&self, user_id: Uuid) -> PortResult<Profile>;

    /// Stores the application fields and moves the profile to `pending_approval`.
    async fn submit_application(
        &self,
        user_id: Uuid,
        application: ApplicationUpdate,
    ) -> PortResult<()>;

    /// Stores uploaded document path references and moves the profile to
    /// `pending_approval`.
    async fn set_document_paths(
        &self,
        user_id: Uuid,
        id_document_path: &str,
        address_document_path: &str,
    ) -> PortResult<()>;

    // --- Account and Transactions ---
    async fn get_account(&self, user_id: Uuid) -> PortResult<Account>;

    /// Transactions where the user is sender or receiver, newest first.
    async fn transactions_for_user(&self, user_id: Uuid) -> PortResult<Vec<Transaction>>;

    // --- Messages ---

    /// Messages where the user is sender or receiver, ascending by creation time.
    async fn messages_for_user(&self, user_id: Uuid) -> PortResult<Vec<Message>>;

    async fn insert_message(
        &self,
        sender_id: Uuid,
        receiver_id: Option<Uuid>,
        content: &str,
    ) -> PortResult<Message>;
}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Stores a named blob under a path scoped by the owning user and
    /// returns the stored path reference.
    async fn upload(&self, user_id: Uuid, file_name: &str, data: &[u8]) -> PortResult<String>;
}

//=========================================================================================
// Realtime Port
//=========================================================================================

/// Push notifications fanned out to live connections.
#[derive(Debug, Clone)]
pub enum RealtimeEvent {
    /// A new row landed in the messages collection.
    MessageInserted(Message),
    /// The user's auth session was revoked (logout); live connections for
    /// this user must release their subscription.
    SessionRevoked { user_id: Uuid },
}

/// One open push channel. Dropping the subscription closes it.
#[async_trait]
pub trait RealtimeSubscription: Send {
    /// The next event, or `None` once the hub has shut down.
    async fn next_event(&mut self) -> Option<RealtimeEvent>;
}

#[async_trait]
pub trait RealtimeService: Send + Sync {
    fn subscribe(&self) -> Box<dyn RealtimeSubscription>;
    fn publish(&self, event: RealtimeEvent);
}
