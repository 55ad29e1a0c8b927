//! Route classification — the one path table shared by every auth layer.
//!
//! DESIGN
//! ======
//! The request-time guard, the session store's client-side route check and
//! the protected-route wrapper all consult `classify`. Matching is
//! segment-aware: `/dashboard` covers `/dashboard/history` but not
//! `/dashboards`. Request paths are classified in canonical form (see
//! `canonical_path`) so that encoded or dotted spellings of a protected page
//! are gated the same as the plain one.

use percent_encoding::percent_decode_str;

/// Landing page. Sign-out navigates here.
pub const HOME_PATH: &str = "/";
/// Login form. Unauthenticated visitors to protected paths land here.
pub const LOGIN_PATH: &str = "/login";
/// Registration form.
pub const REGISTER_PATH: &str = "/register";
/// Default destination for authenticated users.
pub const DASHBOARD_PATH: &str = "/dashboard";
/// Email-confirmation callback that exchanges an auth code for a session.
pub const CALLBACK_PATH: &str = "/auth/callback";
/// Query parameter carrying the originally requested path to the login page.
pub const REDIRECT_PARAM: &str = "redirectTo";

const PROTECTED: &[&str] = &[DASHBOARD_PATH];
const AUTH_ONLY: &[&str] = &[LOGIN_PATH, REGISTER_PATH];
const EXCLUDED: &[&str] = &["/api", CALLBACK_PATH, "/pkg", "/static", "/images", "/favicon.ico"];

/// Access rule for a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires a session.
    Protected,
    /// Login/register; not reachable with a session.
    AuthOnly,
    /// Anyone.
    Public,
    /// Static assets, API routes and the auth callback. These bypass session
    /// handling entirely; the callback writes its own session cookie.
    Excluded,
}

/// Classify a request path. Query strings must already be stripped.
#[must_use]
pub fn classify(path: &str) -> RouteClass {
    if EXCLUDED.iter().any(|prefix| matches_prefix(path, prefix)) {
        RouteClass::Excluded
    } else if PROTECTED.iter().any(|prefix| matches_prefix(path, prefix)) {
        RouteClass::Protected
    } else if AUTH_ONLY.iter().any(|prefix| matches_prefix(path, prefix)) {
        RouteClass::AuthOnly
    } else {
        RouteClass::Public
    }
}

/// Percent-decode `raw`, collapse repeated `/` and resolve `.` and `..`
/// segments, matching what the static file service serves for it. The
/// result always starts with `/` and has no trailing slash.
#[must_use]
pub fn canonical_path(raw: &str) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    format!("/{}", segments.join("/"))
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Accept a redirect target only if it stays on this site.
///
/// Returns `None` for absolute URLs, scheme-relative `//host` targets and
/// anything not starting with `/`.
#[must_use]
pub fn local_redirect_target(raw: &str) -> Option<&str> {
    let target = raw.trim();
    if !target.starts_with('/') || target.starts_with("//") || target.starts_with("/\\") {
        return None;
    }
    Some(target)
}

/// Build `/login?redirectTo=<path>` with the path form-urlencoded.
#[must_use]
pub fn login_redirect_url(original_path: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(original_path.as_bytes()).collect();
    format!("{LOGIN_PATH}?{REDIRECT_PARAM}={encoded}")
}

#[cfg(test)]
#[path = "paths_test.rs"]
mod tests;
