//! Auth routes — email-confirmation callback and session refresh.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::backend::{AuthClient, AuthError, GoTrueClient, Session};
use crate::paths::DASHBOARD_PATH;
use crate::state::AppState;

const NO_SESSION: &str = "No session to refresh";
const REFRESH_FAILED: &str = "Failed to refresh session";

// =============================================================================
// CALLBACK
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

/// `GET /auth/callback?code=…`: exchange the confirmation code, then go to
/// the dashboard whatever the outcome.
pub async fn callback(State(state): State<AppState>, jar: CookieJar, Query(query): Query<CallbackQuery>) -> Response {
    let (client, storage) = state.request_client(jar);

    match query.code.as_deref().filter(|code| !code.is_empty()) {
        Some(code) => match client.exchange_code_for_session(code).await {
            Ok(session) => info!(user = session.user.email_or_dash(), "auth code exchanged"),
            Err(e) => error!(error = %e, "auth code exchange failed"),
        },
        None => warn!("auth callback without code"),
    }

    (storage.jar(), Redirect::temporary(DASHBOARD_PATH)).into_response()
}

// =============================================================================
// REFRESH
// =============================================================================

/// `GET /api/auth/refresh`: rotate the cookie session.
pub async fn refresh(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (client, storage) = state.request_client(jar);
    let outcome = refresh_current(&client).await;
    let jar = storage.jar();

    match outcome {
        Ok(session) => {
            let body = serde_json::json!({
                "message": "Session refreshed successfully",
                "user": session.user,
                "session": session,
                "success": true,
            });
            (jar, Json(body)).into_response()
        }
        Err((status, message)) => (jar, (status, Json(serde_json::json!({ "error": message })))).into_response(),
    }
}

async fn refresh_current(client: &GoTrueClient) -> Result<Session, (StatusCode, String)> {
    match client.get_session().await {
        Ok(Some(_)) => client.refresh_session().await.map_err(refresh_failure),
        Ok(None) => Err((StatusCode::UNAUTHORIZED, NO_SESSION.to_owned())),
        Err(e) => Err(refresh_failure(e)),
    }
}

fn refresh_failure(e: AuthError) -> (StatusCode, String) {
    match e {
        AuthError::Parse(_) | AuthError::HttpClientBuild(_) => {
            error!(error = %e, "session refresh failed unexpectedly");
            (StatusCode::INTERNAL_SERVER_ERROR, REFRESH_FAILED.to_owned())
        }
        AuthError::Api { .. } | AuthError::Network(_) | AuthError::SessionMissing => {
            warn!(error = %e, "session refresh rejected");
            (StatusCode::UNAUTHORIZED, e.message())
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
