use crate::error::{Error, Result};
use crate::models::locale::Locale;
use crate::models::user::{User, ROLE_ADMIN};
use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

const TOKEN_LIFETIME_SECONDS: i64 = 24 * 60 * 60;

/// Bearer-token claims issued at login. The exam core never reads ambient
/// auth state; handlers pull the user id and locale out of these claims and
/// pass them down explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
    pub lang: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| Error::Unauthorized("invalid_token_subject".to_string()))
    }

    pub fn locale(&self) -> Locale {
        self.lang
            .as_deref()
            .and_then(Locale::parse)
            .unwrap_or_default()
    }

    pub fn is_admin(&self) -> bool {
        self.role
            .as_deref()
            .map(|r| r.eq_ignore_ascii_case(ROLE_ADMIN))
            .unwrap_or(false)
    }
}

pub fn issue_token(user: &User) -> Result<String> {
    let config = crate::config::get_config();
    let claims = Claims {
        sub: user.id.to_string(),
        exp: (crate::utils::time::now().timestamp() + TOKEN_LIFETIME_SECONDS) as usize,
        role: Some(user.role.clone()),
        lang: Some(user.language.clone()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to issue token: {}", e)))
}

fn decode_bearer(req: &Request) -> std::result::Result<Claims, &'static str> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("missing_authorization")?;
    let auth_str = auth_header.to_str().map_err(|_| "bad_authorization")?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or("unsupported_scheme")?;

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| "invalid_token")
}

pub async fn require_bearer_auth(mut req: Request, next: Next) -> Response {
    match decode_bearer(&req) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(reason) => {
            (StatusCode::UNAUTHORIZED, Json(json!({ "error": reason }))).into_response()
        }
    }
}

pub async fn require_admin(mut req: Request, next: Next) -> Response {
    match decode_bearer(&req) {
        Ok(claims) => {
            if !claims.is_admin() {
                return (StatusCode::FORBIDDEN, Json(json!({"error":"forbidden"})))
                    .into_response();
            }
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(reason) => {
            (StatusCode::UNAUTHORIZED, Json(json!({ "error": reason }))).into_response()
        }
    }
}
