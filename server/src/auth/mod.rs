//! Authentication
//!
//! Bearer-token authentication against the escrow platform's JWT secret.
//! This service keeps no user table: the token subject is the user identity,
//! and platform services reach the internal surface with a shared token.

pub mod error;
pub mod jwt;
pub mod middleware;

pub use error::{AuthError, AuthResult, ErrorResponse};
pub use jwt::{generate_access_token, validate_access_token, Claims};
pub use middleware::{require_auth, require_internal, AuthUser};
