//! Backend auth — the hosted auth service and the clients that talk to it.
//!
//! DESIGN
//! ======
//! Two layers. `gotrue::AuthApi` is the stateless HTTP surface (one method
//! per endpoint). `client::AuthClient` is what the application consumes: a
//! session-owning client with `get_session`, sign-in/up/out, refresh, code
//! exchange and auth-change subscriptions. `GoTrueClient` implements the
//! latter on top of the former plus a `StorageAdapter`: memory for
//! long-lived in-process clients, request cookies for per-request server
//! clients.

pub mod client;
pub mod events;
pub mod gotrue;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{AuthClient, GoTrueClient, spawn_auto_refresh};
pub use events::{AuthObserver, ObserverRegistry, Subscription};
pub use gotrue::{ApiTimeouts, AuthApi, GoTrueApi, SignUpRequest};
pub use storage::{CookieStorage, MemoryStorage, StorageAdapter};
pub use types::{AuthChange, AuthError, AuthEvent, Session, SignUp, User};
