//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meridian_core::domain::{
    Account, ApplicationUpdate, Message, Profile, ProfileStatus, Transaction, User,
    UserCredentials,
};
use meridian_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: Some(self.email),
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct ProfileRecord {
    user_id: Uuid,
    full_name: String,
    status: String,
    application_type: Option<String>,
    occupation: Option<String>,
    account_purpose: Option<String>,
    id_document_path: Option<String>,
    address_document_path: Option<String>,
}
impl ProfileRecord {
    fn to_domain(self) -> PortResult<Profile> {
        let status = ProfileStatus::parse(&self.status).ok_or_else(|| {
            PortError::Unexpected(format!("Unknown profile status '{}'", self.status))
        })?;
        Ok(Profile {
            user_id: self.user_id,
            full_name: self.full_name,
            status,
            application_type: self.application_type,
            occupation: self.occupation,
            account_purpose: self.account_purpose,
            id_document_path: self.id_document_path,
            address_document_path: self.address_document_path,
        })
    }
}

#[derive(FromRow)]
struct AccountRecord {
    id: Uuid,
    user_id: Uuid,
    balance_cents: i64,
}
impl AccountRecord {
    fn to_domain(self) -> Account {
        Account {
            id: self.id,
            user_id: self.user_id,
            balance_cents: self.balance_cents,
        }
    }
}

#[derive(FromRow)]
struct TransactionRecord {
    id: Uuid,
    sender_id: Option<Uuid>,
    receiver_id: Option<Uuid>,
    kind: String,
    amount_cents: i64,
    created_at: DateTime<Utc>,
}
impl TransactionRecord {
    fn to_domain(self) -> Transaction {
        Transaction {
            id: self.id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            kind: self.kind,
            amount_cents: self.amount_cents,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct MessageRecord {
    id: Uuid,
    sender_id: Uuid,
    receiver_id: Option<Uuid>,
    content: String,
    created_at: DateTime<Utc>,
}
impl MessageRecord {
    fn to_domain(self) -> Message {
        Message {
            id: self.id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
        full_name: &str,
    ) -> PortResult<User> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let user_id = Uuid::new_v4();
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, email",
        )
        .bind(user_id)
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PortError::Conflict(format!("The email '{}' is already registered", email))
            }
            _ => unexpected(e),
        })?;

        // Every user is assumed to have a profile and an account from signup on.
        sqlx::query("INSERT INTO profiles (user_id, full_name, status) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(full_name)
            .bind(ProfileStatus::New.as_str())
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        sqlx::query("INSERT INTO accounts (id, user_id, balance_cents) VALUES ($1, $2, 0)")
            .bind(Uuid::new_v4())
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User '{}' not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        row.map(|(user_id,)| user_id).ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row: Option<(Uuid,)> =
            sqlx::query_as("DELETE FROM auth_sessions WHERE id = $1 RETURNING user_id")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(unexpected)?;

        row.map(|(user_id,)| user_id)
            .ok_or_else(|| PortError::NotFound("Auth session not found".to_string()))
    }

    async fn get_profile(&self, user_id: Uuid) -> PortResult<Profile> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "SELECT user_id, full_name, status, application_type, occupation, account_purpose, \
             id_document_path, address_document_path FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Profile for user {} not found", user_id))
            }
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn submit_application(
        &self,
        user_id: Uuid,
        application: ApplicationUpdate,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE profiles SET application_type = $1, occupation = $2, account_purpose = $3, \
             status = $4 WHERE user_id = $5",
        )
        .bind(&application.application_type)
        .bind(&application.occupation)
        .bind(&application.account_purpose)
        .bind(ProfileStatus::PendingApproval.as_str())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Profile for user {} not found",
                user_id
            )));
        }
        Ok(())
    }

    async fn set_document_paths(
        &self,
        user_id: Uuid,
        id_document_path: &str,
        address_document_path: &str,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE profiles SET id_document_path = $1, address_document_path = $2, status = $3 \
             WHERE user_id = $4",
        )
        .bind(id_document_path)
        .bind(address_document_path)
        .bind(ProfileStatus::PendingApproval.as_str())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Profile for user {} not found",
                user_id
            )));
        }
        Ok(())
    }

    async fn get_account(&self, user_id: Uuid) -> PortResult<Account> {
        let record = sqlx::query_as::<_, AccountRecord>(
            "SELECT id, user_id, balance_cents FROM accounts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Account for user {} not found", user_id))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn transactions_for_user(&self, user_id: Uuid) -> PortResult<Vec<Transaction>> {
        let records = sqlx::query_as::<_, TransactionRecord>(
            "SELECT id, sender_id, receiver_id, kind, amount_cents, created_at FROM transactions \
             WHERE sender_id = $1 OR receiver_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn messages_for_user(&self, user_id: Uuid) -> PortResult<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            "SELECT id, sender_id, receiver_id, content, created_at FROM messages \
             WHERE sender_id = $1 OR receiver_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn insert_message(
        &self,
        sender_id: Uuid,
        receiver_id: Option<Uuid>,
        content: &str,
    ) -> PortResult<Message> {
        let record = sqlx::query_as::<_, MessageRecord>(
            "INSERT INTO messages (id, sender_id, receiver_id, content) VALUES ($1, $2, $3, $4) \
             RETURNING id, sender_id, receiver_id, content, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.to_domain())
    }
}
