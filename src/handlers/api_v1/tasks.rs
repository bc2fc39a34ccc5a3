use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::auth::middleware::ApiUser;
use crate::auth::validate;
use crate::db::Store;
use crate::errors::AppError;
use crate::handlers::api_v1::{api_error, validation_failed};
use crate::models::member;
use crate::models::stage::Stage;
use crate::models::task::{self, NewTask, TaskFilter, TaskUpdate};
use crate::operations::{self, Actor};
use crate::realtime::ConnectionMap;
use crate::templates_structs::{
    ApiMoveRequest, ApiTaskChange, ApiTaskQuery, ApiTaskUpdate, PaginatedResponse,
};

/// Field checks shared by create and update.
async fn validate_task(
    store: &Store,
    op_number: &str,
    title: &str,
    owner_id: Option<i64>,
    progress: Option<i32>,
) -> Result<Vec<String>, AppError> {
    let mut errors = Vec::new();
    errors.extend(validate::validate_required(op_number, "OP number", 40));
    errors.extend(validate::validate_required(title, "Client", 200));
    if let Some(owner) = owner_id {
        if member::find_by_id(store, owner).await?.is_none() {
            errors.push(format!("Unknown owner {owner}"));
        }
    }
    if progress.is_some_and(|p| !(0..=100).contains(&p)) {
        errors.push("Progress must be between 0 and 100".to_string());
    }
    Ok(errors)
}

/// GET /api/v1/tasks - filtered like the board, paginated.
/// Query params: owner, status, priority, q, page (default 1), per_page (default 50)
pub async fn list(
    store: web::Data<Store>,
    _user: ApiUser,
    query: web::Query<ApiTaskQuery>,
) -> Result<HttpResponse, AppError> {
    let filter = TaskFilter::from_query(&query.board_query());
    let tasks = filter.apply(task::find_all(&store).await?);
    Ok(HttpResponse::Ok().json(PaginatedResponse::from_all(tasks, query.page(), query.per_page())))
}

/// GET /api/v1/tasks/{id}
pub async fn read(
    store: web::Data<Store>,
    _user: ApiUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    match task::find_by_id(&store, path.into_inner()).await? {
        Some(found) => Ok(HttpResponse::Ok().json(found)),
        None => api_error(AppError::NotFound),
    }
}

/// POST /api/v1/tasks
pub async fn create(
    store: web::Data<Store>,
    conn_map: web::Data<ConnectionMap>,
    user: ApiUser,
    body: web::Json<NewTask>,
) -> Result<HttpResponse, AppError> {
    let errors = validate_task(&store, &body.op_number, &body.title, body.owner_id, None).await?;
    if !errors.is_empty() {
        return Ok(validation_failed(errors));
    }

    let mut new = body.into_inner();
    new.op_number = new.op_number.trim().to_string();
    new.title = new.title.trim().to_string();
    if new.created_by.trim().is_empty() {
        new.created_by = member::find_by_id(&store, user.member_id)
            .await?
            .map(|m| m.username)
            .unwrap_or_default();
    }

    let actor = Actor { member_id: user.member_id };
    match operations::create_task(&store, &conn_map, actor, &new, Utc::now()).await {
        Ok(created) => Ok(HttpResponse::Created().json(created)),
        Err(e) => api_error(e),
    }
}

/// PUT /api/v1/tasks/{id} - partial update; absent fields are kept.
pub async fn update(
    store: web::Data<Store>,
    conn_map: web::Data<ConnectionMap>,
    user: ApiUser,
    path: web::Path<i64>,
    body: web::Json<ApiTaskUpdate>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let Some(existing) = task::find_by_id(&store, id).await? else {
        return api_error(AppError::NotFound);
    };

    let update: TaskUpdate = body.into_inner().apply_to(TaskUpdate::from_task(&existing));
    let owner_to_check = update.owner_id.filter(|o| Some(*o) != existing.owner_id);
    let errors = validate_task(&store, &update.op_number, &update.title, owner_to_check, Some(update.progress)).await?;
    if !errors.is_empty() {
        return Ok(validation_failed(errors));
    }

    let actor = Actor { member_id: user.member_id };
    match operations::update_task(&store, &conn_map, actor, id, update, Utc::now()).await {
        Ok((task, activity)) => Ok(HttpResponse::Ok().json(ApiTaskChange { task, activity })),
        Err(e) => api_error(e),
    }
}

/// DELETE /api/v1/tasks/{id}
pub async fn delete(
    store: web::Data<Store>,
    conn_map: web::Data<ConnectionMap>,
    _user: ApiUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    match operations::delete_task(&store, &conn_map, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => api_error(e),
    }
}

/// POST /api/v1/tasks/{id}/move - `{"status": "<stage id or label>"}`.
pub async fn move_task(
    store: web::Data<Store>,
    conn_map: web::Data<ConnectionMap>,
    user: ApiUser,
    path: web::Path<i64>,
    body: web::Json<ApiMoveRequest>,
) -> Result<HttpResponse, AppError> {
    let raw = body.status.trim();
    let Some(to) = Stage::from_id(raw).or_else(|| Stage::from_label(raw)) else {
        return Ok(validation_failed(vec![format!("Unknown stage '{raw}'")]));
    };

    let actor = Actor { member_id: user.member_id };
    match operations::move_task(&store, &conn_map, actor, path.into_inner(), to, Utc::now()).await {
        Ok((task, activity)) => Ok(HttpResponse::Ok().json(ApiTaskChange { task, activity })),
        Err(e) => api_error(e),
    }
}
