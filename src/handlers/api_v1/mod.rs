pub mod activity;
pub mod auth;
pub mod members;
pub mod tasks;

use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::{Next, from_fn},
    web,
};

use crate::auth::middleware::require_api_token;
use crate::errors::AppError;
use crate::templates_structs::ApiErrorResponse;

/// Middleware: reject POST/PUT/DELETE requests without `Content-Type: application/json`.
/// GET requests are exempt (read-only, no state changes).
async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method().clone();

    if method == actix_web::http::Method::POST
        || method == actix_web::http::Method::PUT
        || method == actix_web::http::Method::DELETE
    {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let response = HttpResponse::BadRequest().json(ApiErrorResponse {
                error: "Content-Type must be application/json for mutation requests".to_string(),
                details: None,
            });
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

pub(crate) fn validation_failed(errors: Vec<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiErrorResponse {
        error: "Validation failed".to_string(),
        details: Some(errors.join("; ")),
    })
}

/// JSON bodies for the errors an API client can act on; everything else
/// goes through `AppError`'s own response.
pub(crate) fn api_error(e: AppError) -> Result<HttpResponse, AppError> {
    match e {
        AppError::Validation(msg) => Ok(validation_failed(vec![msg])),
        AppError::NotFound => Ok(HttpResponse::NotFound().json(ApiErrorResponse {
            error: "Not found".to_string(),
            details: None,
        })),
        other => Err(other),
    }
}

/// Configure API v1 routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .wrap(from_fn(require_json_content_type))
            .route("/token", web::post().to(auth::issue_token))
            .route("/token", web::delete().to(auth::revoke_token)),
    );
    cfg.service(
        web::scope("/tasks")
            .wrap(from_fn(require_json_content_type))
            .wrap(from_fn(require_api_token))
            .route("", web::get().to(tasks::list))
            .route("", web::post().to(tasks::create))
            .route("/{id}", web::get().to(tasks::read))
            .route("/{id}", web::put().to(tasks::update))
            .route("/{id}", web::delete().to(tasks::delete))
            .route("/{id}/move", web::post().to(tasks::move_task)),
    );
    cfg.service(
        web::scope("")
            .wrap(from_fn(require_api_token))
            .route("/activity", web::get().to(activity::list))
            .route("/members", web::get().to(members::list))
            .route("/stages", web::get().to(members::stages)),
    );
}
