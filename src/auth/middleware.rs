use std::future::{Ready, ready};

use actix_session::SessionExt;
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
    body::MessageBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
    http::header::{self, HeaderMap},
    middleware::Next,
    web,
};

use crate::db::Store;
use crate::models::api_token;
use crate::templates_structs::ApiErrorResponse;

/// Middleware function that checks for an authenticated session.
/// Redirects to /login if no session found.
pub async fn require_auth(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let session = req.get_session();
    let has_user = session.get::<i64>("user_id").unwrap_or(None).is_some();

    if !has_user {
        let response = HttpResponse::SeeOther()
            .insert_header(("Location", "/login"))
            .finish();
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Member resolved from an `Authorization: Bearer` token by [`require_api_token`].
#[derive(Debug, Clone, Copy)]
pub struct ApiUser {
    pub member_id: i64,
}

impl FromRequest for ApiUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<ApiUser>()
                .copied()
                .ok_or_else(|| actix_web::error::ErrorUnauthorized("Missing bearer token")),
        )
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Middleware function for the REST API: resolves the bearer token to a
/// member, or answers 401 with a JSON error body.
pub async fn require_api_token(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let resolved = match (bearer_token(req.headers()), req.app_data::<web::Data<Store>>()) {
        (Some(token), Some(store)) => match api_token::resolve(store, &token).await {
            Ok(found) => found,
            Err(e) => {
                log::error!("Token lookup failed: {e}");
                None
            }
        },
        _ => None,
    };

    let Some(member_id) = resolved else {
        let response = HttpResponse::Unauthorized().json(ApiErrorResponse {
            error: "Missing or invalid bearer token".to_string(),
            details: None,
        });
        return Ok(req.into_response(response).map_into_right_body());
    };

    req.extensions_mut().insert(ApiUser { member_id });
    next.call(req).await.map(|res| res.map_into_left_body())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc123")).as_deref(), Some("abc123"));
        assert_eq!(bearer_token(&headers("bearer  abc123 ")).as_deref(), Some("abc123"));
        assert_eq!(bearer_token(&headers("Basic abc123")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
