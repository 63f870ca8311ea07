use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{roles, AuthUser};
use crate::error::ApiError;

/// JWT authentication middleware: resolves the bearer token to a stored
/// employee and exposes it to handlers. The user is also attached to the
/// response so outer layers can attribute the request.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    let auth_user = state.services.auth.authenticate(&token).await.map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(auth_user.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(auth_user);
    Ok(response)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Employee allowed to read: `ROLE_USER` or `ROLE_ADMIN`
#[derive(Debug, Clone)]
pub struct ReadAccess(pub AuthUser);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ReadAccess {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.can_read() {
            return Err(ApiError::forbidden(format!(
                "Access denied: requires {} or {}",
                roles::USER,
                roles::ADMIN
            )));
        }
        Ok(Self(user))
    }
}

/// Employee allowed to change data: `ROLE_ADMIN`
#[derive(Debug, Clone)]
pub struct AdminAccess(pub AuthUser);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminAccess {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!("'{}' attempted an admin operation", user.user_name);
            return Err(ApiError::forbidden(format!("Access denied: requires {}", roles::ADMIN)));
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_tokens() {
        assert_eq!(extract_jwt_from_headers(&headers("Bearer abc.def")).unwrap(), "abc.def");
        assert!(extract_jwt_from_headers(&headers("Basic abc")).is_err());
        assert!(extract_jwt_from_headers(&headers("Bearer   ")).is_err());
        assert!(extract_jwt_from_headers(&HeaderMap::new()).is_err());
    }

    #[tokio::test]
    async fn role_gates() {
        let user = AuthUser {
            employee_id: 1,
            user_name: "jdoe".to_string(),
            roles: vec![roles::USER.to_string()],
        };
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        parts.extensions.insert(user);

        assert!(ReadAccess::from_request_parts(&mut parts, &()).await.is_ok());
        let err = AdminAccess::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status_code(), 403);

        let (mut anonymous, _) = axum::http::Request::new(()).into_parts();
        let err = ReadAccess::from_request_parts(&mut anonymous, &()).await.unwrap_err();
        assert_eq!(err.status_code(), 401);
    }
}
