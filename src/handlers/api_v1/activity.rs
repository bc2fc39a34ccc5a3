use actix_web::{web, HttpResponse};

use crate::auth::middleware::ApiUser;
use crate::db::Store;
use crate::errors::AppError;
use crate::models::activity::{self, DEFAULT_ACTIVITY_LIMIT};
use crate::templates_structs::ApiActivityQuery;

/// GET /api/v1/activity - newest first; `task_id` narrows to one OP.
pub async fn list(
    store: web::Data<Store>,
    _user: ApiUser,
    query: web::Query<ApiActivityQuery>,
) -> Result<HttpResponse, AppError> {
    let events = match query.task_id {
        Some(task_id) => activity::find_for_task(&store, task_id).await?,
        None => {
            let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT).clamp(1, 1000);
            activity::find_recent(&store, limit).await?
        }
    };
    Ok(HttpResponse::Ok().json(events))
}
