use crate::auth::models::{JwtClaims, UserContext, INVALID_TOKEN_MESSAGE, MISSING_TOKEN_MESSAGE};
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use boom_core::AppError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthState {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthState {
    /// HS256 verification with the shared identity-provider secret
    pub fn new(jwt_secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
        }
    }
}

/// Decode and verify a bearer token
pub fn verify_token(auth_state: &AuthState, token: &str) -> Result<JwtClaims, AppError> {
    decode::<JwtClaims>(token, &auth_state.decoding_key, &auth_state.validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "JWT verification failed");
            AppError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string())
        })
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) if !token.trim().is_empty() => token.trim().to_string(),
        _ => {
            tracing::debug!("Request without bearer token rejected");
            return HttpAppError(AppError::Unauthorized(MISSING_TOKEN_MESSAGE.to_string()))
                .into_response();
        }
    };

    let claims = match verify_token(&auth_state, &token) {
        Ok(claims) => claims,
        Err(e) => return HttpAppError(e).into_response(),
    };

    tracing::debug!(user_id = %claims.user_id, "Request authenticated");
    request.extensions_mut().insert(UserContext {
        user_id: claims.user_id,
    });

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn token(secret: &str, exp: i64) -> String {
        let claims = JwtClaims {
            user_id: Uuid::new_v4(),
            exp,
            iat: None,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_valid_token() {
        let state = AuthState::new(SECRET);
        let exp = chrono::Utc::now().timestamp() + 3600;
        assert!(verify_token(&state, &token(SECRET, exp)).is_ok());
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let state = AuthState::new(SECRET);
        let exp = chrono::Utc::now().timestamp() + 3600;
        assert!(verify_token(&state, &token("another-secret-another-secret-!!", exp)).is_err());

        let expired = chrono::Utc::now().timestamp() - 3600;
        let err = verify_token(&state, &token(SECRET, expired)).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == INVALID_TOKEN_MESSAGE));
    }
}
