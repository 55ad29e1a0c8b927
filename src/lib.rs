//! Session and route-guard lifecycle for the FitTrack web app.
//!
//! The server side gates page requests on the session held in auth cookies;
//! the client side keeps a reactive session store that follows the hosted
//! auth service's change events and enforces the same route rules.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`paths`] | Route classification shared by every layer |
//! | [`backend`] | Hosted auth API, session storage and the stateful auth client |
//! | [`store`] | Client-side session store, redirect intent, protected wrapper, toasts |
//! | [`routes`] | Guard middleware, callback and refresh endpoints |
//! | [`config`] | Environment configuration |
//! | [`state`] | Shared Axum state |

pub mod backend;
pub mod config;
pub mod paths;
pub mod routes;
pub mod state;
pub mod store;
