use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;

use crate::auth::middleware::bearer_token;
use crate::auth::rate_limit::{RateLimiter, client_ip};
use crate::db::Store;
use crate::errors::AppError;
use crate::models::{api_token, member};
use crate::templates_structs::{ApiErrorResponse, ApiTokenRequest, ApiTokenResponse};

/// POST /api/v1/auth/token - exchange credentials for a bearer token.
pub async fn issue_token(
    req: HttpRequest,
    store: web::Data<Store>,
    limiter: web::Data<RateLimiter>,
    body: web::Json<ApiTokenRequest>,
) -> Result<HttpResponse, AppError> {
    let ip = client_ip(&req);
    if limiter.is_blocked(ip) {
        return Ok(HttpResponse::TooManyRequests().json(ApiErrorResponse {
            error: "Too many failed login attempts".to_string(),
            details: None,
        }));
    }

    let Some(found) = member::verify_credentials(&store, body.username.trim(), &body.password).await? else {
        limiter.record_failure(ip);
        return Ok(HttpResponse::Unauthorized().json(ApiErrorResponse {
            error: "Invalid username or password".to_string(),
            details: None,
        }));
    };
    limiter.clear(ip);

    let token = api_token::issue(&store, found.id, Utc::now()).await?;
    let member = member::find_by_id(&store, found.id).await?.ok_or(AppError::NotFound)?;
    log::info!("API token issued for '{}'", member.username);
    Ok(HttpResponse::Ok().json(ApiTokenResponse { token, member }))
}

/// DELETE /api/v1/auth/token - revoke the token in the Authorization header.
pub async fn revoke_token(
    req: HttpRequest,
    store: web::Data<Store>,
) -> Result<HttpResponse, AppError> {
    let Some(token) = bearer_token(req.headers()) else {
        return Ok(HttpResponse::Unauthorized().json(ApiErrorResponse {
            error: "Missing bearer token".to_string(),
            details: None,
        }));
    };
    api_token::revoke(&store, &token).await?;
    Ok(HttpResponse::NoContent().finish())
}
