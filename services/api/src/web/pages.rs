//! services/api/src/web/pages.rs
//!
//! Contains the Axum handlers for the page-facing REST endpoints and the
//! master definition for the OpenAPI specification. The page gate runs the
//! status router for every protected page load; the remaining handlers are
//! thin form glue (application, document upload, transfer simulation).

use axum::{
    extract::{Multipart, Path as UrlPath, State},
    http::HeaderMap,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use meridian_core::domain::ApplicationUpdate;
use meridian_core::routing::{self, Page, RouteAction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::middleware::session_id_from_headers;
use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        page_gate_handler,
        dashboard_handler,
        application_handler,
        documents_handler,
        transfer_handler,
    ),
    components(
        schemas(
            RouteDecision,
            DashboardResponse,
            TransactionView,
            ApplicationRequest,
            TransferRequest,
            TransferResponse,
        )
    ),
    tags(
        (name = "Meridian API", description = "API endpoints for the onboarding and dashboard front end.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The status router's answer for a page load.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct RouteDecision {
    /// One of `stay`, `redirect`, `reveal_pending`.
    pub action: String,
    /// The target page segment when `action` is `redirect`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl RouteDecision {
    pub fn stay() -> Self {
        Self {
            action: "stay".to_string(),
            to: None,
        }
    }

    pub fn redirect(page: Page) -> Self {
        Self {
            action: "redirect".to_string(),
            to: Some(page.as_segment().to_string()),
        }
    }

    pub fn reveal_pending() -> Self {
        Self {
            action: "reveal_pending".to_string(),
            to: None,
        }
    }
}

impl From<RouteAction> for RouteDecision {
    fn from(action: RouteAction) -> Self {
        match action {
            RouteAction::Stay => RouteDecision::stay(),
            RouteAction::Redirect(page) => RouteDecision::redirect(page),
            RouteAction::RevealPending => RouteDecision::reveal_pending(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub full_name: String,
    /// The account balance rendered as a dollar string.
    pub balance: String,
    /// Transactions involving the user, newest first.
    pub transactions: Vec<TransactionView>,
}

#[derive(Serialize, ToSchema)]
pub struct TransactionView {
    pub kind: String,
    pub amount: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, ToSchema)]
pub struct ApplicationRequest {
    pub application_type: String,
    pub occupation: String,
    pub account_purpose: String,
}

#[derive(Deserialize, ToSchema)]
pub struct TransferRequest {
    pub amount_cents: i64,
}

#[derive(Serialize, ToSchema)]
pub struct TransferResponse {
    pub simulated: bool,
    pub note: String,
}

/// Renders integer cents as a dollar string.
fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Run the status router for a page load.
///
/// This endpoint is public: with no (or an invalid) session cookie the
/// answer is always a redirect to the login page, and the profile is never
/// consulted in that case.
#[utoipa::path(
    get,
    path = "/pages/{page}",
    params(("page" = String, Path, description = "The page segment being loaded.")),
    responses(
        (status = 200, description = "The action to take for this page", body = RouteDecision),
        (status = 400, description = "Unknown page"),
        (status = 500, description = "Profile lookup failed")
    )
)]
pub async fn page_gate_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    UrlPath(segment): UrlPath<String>,
) -> Result<Json<RouteDecision>, ApiError> {
    let page = Page::from_segment(&segment)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown page '{}'", segment)))?;

    let status = match session_id_from_headers(&headers) {
        None => None,
        Some(session_id) => match state.db.validate_auth_session(session_id).await {
            // An expired or unknown session reads as "no session".
            Err(_) => None,
            Ok(user_id) => {
                // A missing or failed profile fetch halts routing for this
                // page load instead of falling through to a wrong answer.
                let profile = state.db.get_profile(user_id).await.map_err(|e| {
                    error!("Profile fetch failed during routing: {:?}", e);
                    ApiError::from(e)
                })?;
                Some(profile.status)
            }
        },
    };

    Ok(Json(routing::resolve(status, page).into()))
}

/// Load the dashboard data for the authenticated user.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard data", body = DashboardResponse),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let profile = state.db.get_profile(user_id).await?;
    let account = state.db.get_account(user_id).await?;
    let transactions = state.db.transactions_for_user(user_id).await?;

    Ok(Json(DashboardResponse {
        full_name: profile.full_name,
        balance: format_cents(account.balance_cents),
        transactions: transactions
            .into_iter()
            .map(|tx| TransactionView {
                kind: tx.kind,
                amount: format_cents(tx.amount_cents),
                created_at: tx.created_at,
            })
            .collect(),
    }))
}

/// Submit the onboarding application form.
///
/// Stores the application fields, moves the profile to `pending_approval`,
/// and tells the client to swap the application section for the pending one.
#[utoipa::path(
    post,
    path = "/application",
    request_body = ApplicationRequest,
    responses(
        (status = 200, description = "Application submitted", body = RouteDecision),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn application_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<ApplicationRequest>,
) -> Result<Json<RouteDecision>, ApiError> {
    state
        .db
        .submit_application(
            user_id,
            ApplicationUpdate {
                application_type: req.application_type,
                occupation: req.occupation,
                account_purpose: req.account_purpose,
            },
        )
        .await?;

    Ok(Json(RouteDecision::reveal_pending()))
}

/// Upload the identity and address verification documents.
///
/// Accepts a multipart/form-data request with two file parts named
/// `id_document` and `address_document`; both are stored under a path scoped
/// by the user id and the profile moves to `pending_approval`.
#[utoipa::path(
    post,
    path = "/documents",
    request_body(content_type = "multipart/form-data", description = "The identity and address documents."),
    responses(
        (status = 200, description = "Documents stored", body = RouteDecision),
        (status = 400, description = "Missing a document part"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn documents_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<RouteDecision>, ApiError> {
    let mut id_document: Option<(String, Vec<u8>)> = None;
    let mut address_document: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart data: {}", e)))?
    {
        let part = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or("document").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file bytes: {}", e)))?;

        match part.as_str() {
            "id_document" => id_document = Some((file_name, data.to_vec())),
            "address_document" => address_document = Some((file_name, data.to_vec())),
            _ => {}
        }
    }

    let (id_name, id_data) = id_document
        .ok_or_else(|| ApiError::BadRequest("Missing the id_document part".to_string()))?;
    let (addr_name, addr_data) = address_document
        .ok_or_else(|| ApiError::BadRequest("Missing the address_document part".to_string()))?;

    let id_path = state.storage.upload(user_id, &id_name, &id_data).await?;
    let addr_path = state.storage.upload(user_id, &addr_name, &addr_data).await?;

    state
        .db
        .set_document_paths(user_id, &id_path, &addr_path)
        .await?;

    Ok(Json(RouteDecision::reveal_pending()))
}

/// Simulate a transfer.
///
/// No balance is mutated; the response carries a confirmation note only.
#[utoipa::path(
    post,
    path = "/transfer",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer simulated", body = TransferResponse),
        (status = 400, description = "Invalid amount"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn transfer_handler(
    State(_state): State<Arc<AppState>>,
    Extension(_user_id): Extension<Uuid>,
    Json(req): Json<TransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.amount_cents <= 0 {
        return Err(ApiError::BadRequest(
            "Transfer amount must be positive".to_string(),
        ));
    }

    Ok(Json(TransferResponse {
        simulated: true,
        note: format!(
            "This is a simulation. Transfer of {} initiated.",
            format_cents(req.amount_cents)
        ),
    }))
}
