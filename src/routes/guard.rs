//! Route guard middleware — gates page requests on the cookie session.
//!
//! The request path is classified in canonical form, the way the static
//! file service resolves it. Excluded paths skip the session lookup entirely. Everything else gets a
//! request-scoped auth client over the request's cookies; token rotation
//! during the lookup writes cookies, and every response returned from here
//! carries those writes.

use axum::extract::{Request, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use crate::backend::AuthClient;
use crate::paths::{DASHBOARD_PATH, RouteClass, canonical_path, classify, login_redirect_url};
use crate::state::AppState;

/// Set on pass-through responses for authenticated requests.
pub const AUTH_STATE_HEADER: HeaderName = HeaderName::from_static("x-middleware-auth");

pub async fn session_guard(State(state): State<AppState>, jar: CookieJar, mut request: Request, next: Next) -> Response {
    let path = canonical_path(request.uri().path());
    let class = classify(&path);
    if class == RouteClass::Excluded {
        return next.run(request).await;
    }

    let (client, storage) = state.request_client(jar);
    let session = match client.get_session().await {
        Ok(session) => session,
        Err(e) => {
            warn!(%path, error = %e, "session lookup failed, continuing without session");
            None
        }
    };
    let jar = storage.jar();

    let redirect = match (class, &session) {
        (RouteClass::Protected, None) => Some(login_redirect_url(&path)),
        (RouteClass::AuthOnly, Some(_)) => Some(DASHBOARD_PATH.to_owned()),
        _ => None,
    };
    if let Some(location) = redirect {
        match temporary_redirect(&location) {
            Some(response) => {
                debug!(%path, %location, "guard redirect");
                return (jar, response).into_response();
            }
            None => warn!(%path, %location, "unusable redirect location, passing through"),
        }
    }

    let authenticated = session.is_some();
    if let Some(session) = session {
        request.extensions_mut().insert(session);
    }
    let mut response = next.run(request).await;
    if authenticated {
        response
            .headers_mut()
            .insert(AUTH_STATE_HEADER, HeaderValue::from_static("authenticated"));
    }
    (jar, response).into_response()
}

fn temporary_redirect(location: &str) -> Option<Response> {
    let location = HeaderValue::from_str(location).ok()?;
    Some((StatusCode::TEMPORARY_REDIRECT, [(LOCATION, location)]).into_response())
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
