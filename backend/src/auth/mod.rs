pub mod google;
pub mod guard;
pub mod session;

pub use google::{GoogleIdentity, GoogleTokenVerifier};
pub use guard::{AuthError, SESSION_COOKIE};
pub use session::{SessionClaims, SessionCodec, SessionError};
