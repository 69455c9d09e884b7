use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use shopfront_auth::{Caller, JwtValidator, TokenType};
use shopfront_infra::AccountStore;

use crate::app::errors;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
    pub accounts: Arc<dyn AccountStore>,
}

/// Classify the caller and attach it as a request extension.
///
/// No `Authorization` header means anonymous. A header that is present but
/// does not carry a valid access token for an existing account is rejected
/// outright.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let claims = match extract_bearer(req.headers()) {
        Ok(None) => None,
        Ok(Some(token)) => match state.jwt.validate(token, Utc::now()) {
            Ok(claims) if claims.token_type == TokenType::Access => Some(claims),
            Ok(_) => {
                tracing::debug!("refresh token presented as bearer credential");
                return errors::not_authenticated("token is not an access token");
            }
            Err(e) => {
                tracing::debug!(error = %e, "bearer token rejected");
                return errors::not_authenticated(e.to_string());
            }
        },
        Err(message) => return errors::not_authenticated(message),
    };

    let caller = match claims {
        None => Caller::Anonymous,
        Some(claims) => match state.accounts.get(claims.sub).await {
            Ok(Some(account)) => Caller::from_account(&account),
            Ok(None) => {
                tracing::debug!(user_id = %claims.sub, "access token for unknown account");
                return errors::not_authenticated("user not found");
            }
            Err(e) => return errors::store_error_to_response(e),
        },
    };

    req.extensions_mut().insert(caller);
    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, &'static str> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header
        .to_str()
        .map_err(|_| "authorization header is not valid ASCII")?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or("authorization header must use the Bearer scheme")?;

    let token = header.trim();
    if token.is_empty() {
        return Err("bearer token is empty");
    }

    Ok(Some(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn missing_header_is_anonymous() {
        assert_eq!(extract_bearer(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn bearer_token_is_extracted() {
        let h = headers("Bearer abc.def.ghi");
        assert_eq!(extract_bearer(&h), Ok(Some("abc.def.ghi")));
    }

    #[test]
    fn other_schemes_and_empty_tokens_are_rejected() {
        assert!(extract_bearer(&headers("Basic dXNlcjpwYXNz")).is_err());
        assert!(extract_bearer(&headers("Bearer   ")).is_err());
    }
}
