pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod routes;
pub mod test_util;

pub use auth::google::GoogleTokenVerifier;
pub use auth::session::{SessionClaims, SessionCodec};
pub use config::Config;
pub use db::users::{MongoUserStore, UserStore};
pub use models::user::{User, UserResponse};

use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Verifier for Google-issued ID tokens.
    pub google_verifier: GoogleTokenVerifier,
    /// Issues and verifies session cookies.
    pub session_codec: SessionCodec,
    /// User persistence; Mongo in production, in-memory in tests.
    pub users: Arc<dyn UserStore>,
}
