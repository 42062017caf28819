//! Authentication and authorization

pub mod guard;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod store;

pub use guard::require_role;
pub use jwt::{Claims, TokenCodec, TokenError};
pub use middleware::{bearer_token, extract_claims, require_auth};
pub use models::{CredentialRecord, LoginForm, Role, TokenResponse};
pub use store::CredentialStore;
