use boom_api::auth::JwtClaims;
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

/// Shared secret the test router verifies against
pub const TEST_JWT_SECRET: &str = "test-secret-key-min-32-characters-long-for-testing";

/// A caller with a valid bearer token
pub struct TestUser {
    pub user_id: Uuid,
    pub token: String,
}

impl TestUser {
    pub fn new() -> Self {
        let user_id = Uuid::new_v4();
        Self {
            user_id,
            token: token_for(user_id),
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

pub fn token_for(user_id: Uuid) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = JwtClaims {
        user_id,
        exp: now + 3600,
        iat: Some(now),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

pub fn expired_token_for(user_id: Uuid) -> String {
    let claims = JwtClaims {
        user_id,
        exp: chrono::Utc::now().timestamp() - 3600,
        iat: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}
