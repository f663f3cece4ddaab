//! Operator authentication
//!
//! The credential (token + role), its durable and cookie mirrors, and the
//! synchronization of all of them with the dispatcher's token.

pub mod cookies;
pub mod credential;
pub mod hydration;
pub mod store;

pub use cookies::{CookieJar, CookiePair};
pub use credential::{AuthState, Credential, Role};
pub use hydration::HydrationSync;
pub use store::CredentialStore;
