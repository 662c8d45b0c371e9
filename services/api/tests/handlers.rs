//! End-to-end handler tests against in-memory port implementations.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use api_lib::config::Config;
use api_lib::adapters::BroadcastHub;
use api_lib::web::auth::{login_handler, signup_handler, LoginRequest, SignupRequest};
use api_lib::web::pages::{page_gate_handler, transfer_handler, TransferRequest};
use api_lib::web::state::AppState;
use meridian_core::domain::{
    Account, ApplicationUpdate, Message, Profile, ProfileStatus, Transaction, User,
    UserCredentials,
};
use meridian_core::ports::{DatabaseService, PortError, PortResult, StorageService};

//=========================================================================================
// In-memory fakes
//=========================================================================================

/// A fixed-response database fake: one registered user with a known password.
struct FakeDb {
    user_id: Uuid,
    email: String,
    hashed_password: String,
    status: ProfileStatus,
}

impl FakeDb {
    fn with_user(email: &str, password: &str, status: ProfileStatus) -> Self {
        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string();
        Self {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password,
            status,
        }
    }

    fn profile(&self) -> Profile {
        Profile {
            user_id: self.user_id,
            full_name: "Test User".to_string(),
            status: self.status,
            application_type: None,
            occupation: None,
            account_purpose: None,
            id_document_path: None,
            address_document_path: None,
        }
    }
}

#[async_trait]
impl DatabaseService for FakeDb {
    async fn create_user_with_email(
        &self,
        email: &str,
        _hashed_password: &str,
        _full_name: &str,
    ) -> PortResult<User> {
        if email == self.email {
            return Err(PortError::Conflict(format!(
                "The email '{}' is already registered",
                email
            )));
        }
        Ok(User {
            user_id: Uuid::new_v4(),
            email: Some(email.to_string()),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        if email != self.email {
            return Err(PortError::NotFound(format!("User '{}' not found", email)));
        }
        Ok(UserCredentials {
            user_id: self.user_id,
            email: self.email.clone(),
            hashed_password: self.hashed_password.clone(),
        })
    }

    async fn create_auth_session(
        &self,
        _session_id: &str,
        _user_id: Uuid,
        _expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        if session_id == "valid-session" {
            Ok(self.user_id)
        } else {
            Err(PortError::Unauthorized)
        }
    }

    async fn delete_auth_session(&self, _session_id: &str) -> PortResult<Uuid> {
        Ok(self.user_id)
    }

    async fn get_profile(&self, user_id: Uuid) -> PortResult<Profile> {
        if user_id == self.user_id {
            Ok(self.profile())
        } else {
            Err(PortError::NotFound(format!(
                "Profile for user {} not found",
                user_id
            )))
        }
    }

    async fn submit_application(
        &self,
        _user_id: Uuid,
        _application: ApplicationUpdate,
    ) -> PortResult<()> {
        Ok(())
    }

    async fn set_document_paths(
        &self,
        _user_id: Uuid,
        _id_document_path: &str,
        _address_document_path: &str,
    ) -> PortResult<()> {
        Ok(())
    }

    async fn get_account(&self, user_id: Uuid) -> PortResult<Account> {
        Ok(Account {
            id: Uuid::new_v4(),
            user_id,
            balance_cents: 0,
        })
    }

    async fn transactions_for_user(&self, _user_id: Uuid) -> PortResult<Vec<Transaction>> {
        Ok(Vec::new())
    }

    async fn messages_for_user(&self, _user_id: Uuid) -> PortResult<Vec<Message>> {
        Ok(Vec::new())
    }

    async fn insert_message(
        &self,
        sender_id: Uuid,
        receiver_id: Option<Uuid>,
        content: &str,
    ) -> PortResult<Message> {
        Ok(Message {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            content: content.to_string(),
            created_at: Utc::now(),
        })
    }
}

struct NullStorage;

#[async_trait]
impl StorageService for NullStorage {
    async fn upload(&self, user_id: Uuid, file_name: &str, _data: &[u8]) -> PortResult<String> {
        Ok(format!("{}/{}", user_id, file_name))
    }
}

fn test_state(db: FakeDb) -> Arc<AppState> {
    let config = Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: String::new(),
        log_level: tracing::Level::INFO,
        documents_path: std::env::temp_dir(),
        cors_origin: "http://localhost:3000".to_string(),
        session_days: 30,
    };
    Arc::new(AppState {
        db: Arc::new(db),
        storage: Arc::new(NullStorage),
        realtime: Arc::new(BroadcastHub::new(16)),
        config: Arc::new(config),
    })
}

fn expect_err<T>(result: Result<T, api_lib::error::ApiError>) -> api_lib::error::ApiError {
    match result {
        Err(e) => e,
        Ok(_) => panic!("expected the handler to fail"),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

//=========================================================================================
// Scenarios
//=========================================================================================

#[tokio::test]
async fn login_with_valid_credentials_runs_the_status_check() {
    let state = test_state(FakeDb::with_user(
        "user@example.com",
        "hunter2",
        ProfileStatus::Approved,
    ));

    let response = login_handler(
        State(state),
        Json(LoginRequest {
            email: "user@example.com".to_string(),
            password: "hunter2".to_string(),
            page: Some("login".to_string()),
        }),
    )
    .await
    .unwrap()
    .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("set-cookie"));

    let body = body_json(response).await;
    // An approved user on the login page is sent to the dashboard.
    assert_eq!(body["route"]["action"], "redirect");
    assert_eq!(body["route"]["to"], "dashboard");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let state = test_state(FakeDb::with_user(
        "user@example.com",
        "hunter2",
        ProfileStatus::New,
    ));

    let err = expect_err(
        login_handler(
            State(state),
            Json(LoginRequest {
                email: "user@example.com".to_string(),
                password: "wrong".to_string(),
                page: None,
            }),
        )
        .await,
    );

    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn signup_with_existing_email_surfaces_the_conflict_message() {
    let state = test_state(FakeDb::with_user(
        "taken@example.com",
        "hunter2",
        ProfileStatus::New,
    ));

    let err = expect_err(
        signup_handler(
            State(state),
            Json(SignupRequest {
                full_name: "Second User".to_string(),
                email: "taken@example.com".to_string(),
                password: "hunter2".to_string(),
            }),
        )
        .await,
    );

    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("'taken@example.com' is already registered"));
}

#[tokio::test]
async fn page_gate_without_session_redirects_to_login() {
    let state = test_state(FakeDb::with_user(
        "user@example.com",
        "hunter2",
        ProfileStatus::Approved,
    ));

    let Json(decision) = page_gate_handler(
        State(state),
        HeaderMap::new(),
        Path("dashboard".to_string()),
    )
    .await
    .unwrap();

    assert_eq!(decision.action, "redirect");
    assert_eq!(decision.to.as_deref(), Some("login"));
}

#[tokio::test]
async fn page_gate_holds_new_users_on_onboarding() {
    let state = test_state(FakeDb::with_user(
        "user@example.com",
        "hunter2",
        ProfileStatus::New,
    ));

    let mut headers = HeaderMap::new();
    headers.insert("cookie", "session=valid-session".parse().unwrap());

    let Json(decision) = page_gate_handler(State(state), headers, Path("dashboard".to_string()))
        .await
        .unwrap();

    assert_eq!(decision.action, "redirect");
    assert_eq!(decision.to.as_deref(), Some("onboarding"));
}

#[tokio::test]
async fn page_gate_reveals_pending_on_onboarding() {
    let state = test_state(FakeDb::with_user(
        "user@example.com",
        "hunter2",
        ProfileStatus::PendingApproval,
    ));

    let mut headers = HeaderMap::new();
    headers.insert("cookie", "session=valid-session".parse().unwrap());

    let Json(decision) = page_gate_handler(State(state), headers, Path("onboarding".to_string()))
        .await
        .unwrap();

    assert_eq!(decision.action, "reveal_pending");
    assert_eq!(decision.to, None);
}

#[tokio::test]
async fn transfer_rejects_non_positive_amounts() {
    let state = test_state(FakeDb::with_user(
        "user@example.com",
        "hunter2",
        ProfileStatus::Approved,
    ));
    let user_id = Uuid::new_v4();

    let err = expect_err(
        transfer_handler(
            State(state.clone()),
            Extension(user_id),
            Json(TransferRequest { amount_cents: 0 }),
        )
        .await,
    );
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

    let response = transfer_handler(
        State(state),
        Extension(user_id),
        Json(TransferRequest { amount_cents: 2500 }),
    )
    .await
    .unwrap()
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["simulated"], true);
    assert!(body["note"].as_str().unwrap().contains("$25.00"));
}
