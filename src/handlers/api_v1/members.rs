use actix_web::{web, HttpResponse};

use crate::auth::middleware::ApiUser;
use crate::db::Store;
use crate::errors::AppError;
use crate::models::member;
use crate::models::stage::COLUMNS;
use crate::templates_structs::ApiStage;

/// GET /api/v1/members
pub async fn list(
    store: web::Data<Store>,
    _user: ApiUser,
) -> Result<HttpResponse, AppError> {
    let members = member::find_all(&store).await?;
    Ok(HttpResponse::Ok().json(members))
}

/// GET /api/v1/stages - the ten columns in board order.
pub async fn stages(_user: ApiUser) -> HttpResponse {
    let stages: Vec<ApiStage> = COLUMNS.iter().map(ApiStage::from).collect();
    HttpResponse::Ok().json(stages)
}
