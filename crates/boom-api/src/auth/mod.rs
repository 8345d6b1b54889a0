pub mod middleware;
pub mod models;

pub use middleware::{auth_middleware, verify_token, AuthState};
pub use models::{JwtClaims, UserContext};
