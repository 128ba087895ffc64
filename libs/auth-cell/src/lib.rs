//! Authentication for the marketplace.
//!
//! Two surfaces live here. [`auth_routes`] is the REST variant mounted by the
//! API binary, with HMAC-signed tokens. [`AuthService`] and [`SessionContext`]
//! are the client-side session layer: an embedding app builds the service with
//! [`AuthService::from_config`] and drives it through the context. The server
//! never builds them, so `SESSION_STORE_PATH` and `EXPOSE_DEMO_ACCOUNTS` only
//! affect that client-side path.

pub mod context;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod router;
pub mod service;
pub mod session;
pub mod storage;

pub use context::{SessionContext, SessionSnapshot};
pub use credentials::CredentialStore;
pub use error::{AuthError, StorageError};
pub use router::{auth_routes, AuthApiState};
pub use service::{AuthOutcome, AuthService, AuthState};
pub use session::SessionStore;
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
