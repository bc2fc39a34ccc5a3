use actix_session::Session;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::csrf;
use crate::auth::session::{get_username, require_user_id, set_flash};
use crate::config::AppConfig;
use crate::db::Store;
use crate::errors::{AppError, render};
use crate::handlers::{CsrfOnly, safe_next, see_other};
use crate::models::member::{self, TeamMember};
use crate::models::stage::{COLUMNS, Stage};
use crate::models::task::{self, NewTask, TaskForm, TaskUpdate};
use crate::models::{activity, chat};
use crate::operations::{self, Actor};
use crate::realtime::ConnectionMap;
use crate::storage;
use crate::templates_structs::{PageContext, TaskDetailTemplate, TaskFormTemplate, TaskFormValues};

#[derive(Deserialize)]
pub struct MoveForm {
    pub status: String,
    pub csrf_token: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct PhotoQuery {
    pub filename: String,
}

fn actor(session: &Session) -> Result<Actor, AppError> {
    Ok(Actor { member_id: require_user_id(session)? })
}

/// Parse the form and check that the chosen owner exists.
fn parse_task_form(form: &TaskForm, members: &[TeamMember]) -> Result<TaskUpdate, Vec<String>> {
    let update = form.parse()?;
    if update.owner_id.is_some_and(|owner| !members.iter().any(|m| m.id == owner)) {
        return Err(vec!["Owner must be a team member".to_string()]);
    }
    Ok(update)
}

/// GET /tasks/new
pub async fn new_form(
    store: web::Data<Store>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(&session, &store, "/tasks/new").await?;
    let members = member::find_all(&store).await?;
    render(TaskFormTemplate::new(ctx, false, "/tasks".to_string(), TaskFormValues::blank(), members))
}

/// POST /tasks
pub async fn create(
    store: web::Data<Store>,
    conn_map: web::Data<ConnectionMap>,
    session: Session,
    form: web::Form<TaskForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let actor = actor(&session)?;
    let members = member::find_all(&store).await?;

    let update = match parse_task_form(&form, &members) {
        Ok(u) => u,
        Err(errors) => {
            let ctx = PageContext::build(&session, &store, "/tasks/new").await?;
            let mut tmpl = TaskFormTemplate::new(
                ctx,
                false,
                "/tasks".to_string(),
                TaskFormValues::from_form(&form),
                members,
            );
            tmpl.errors = errors;
            return render(tmpl);
        }
    };

    let created_by = get_username(&session).unwrap_or_default();
    let new = NewTask::from_update(update, &created_by);
    let created = operations::create_task(&store, &conn_map, actor, &new, Utc::now()).await?;
    set_flash(&session, &format!("OP {} creada", created.op_number));
    Ok(see_other(&format!("/tasks/{}", created.id)))
}

/// GET /tasks/{id}
pub async fn detail(
    store: web::Data<Store>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let found = task::find_by_id(&store, id).await?.ok_or(AppError::NotFound)?;
    let ctx = PageContext::build(&session, &store, "/board").await?;
    let channel = chat::task_channel(id);

    let tmpl = TaskDetailTemplate {
        ctx,
        activity: activity::find_for_task(&store, id).await?,
        messages: chat::find_recent(&store, &channel, chat::DEFAULT_CHAT_LIMIT).await?,
        channel,
        task: found,
        stages: &COLUMNS,
        today: Utc::now().date_naive(),
    };
    render(tmpl)
}

/// GET /tasks/{id}/edit
pub async fn edit_form(
    store: web::Data<Store>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let found = task::find_by_id(&store, id).await?.ok_or(AppError::NotFound)?;
    let ctx = PageContext::build(&session, &store, "/board").await?;
    let members = member::find_all(&store).await?;
    render(TaskFormTemplate::new(
        ctx,
        true,
        format!("/tasks/{id}"),
        TaskFormValues::from_task(&found),
        members,
    ))
}

/// POST /tasks/{id}
pub async fn update(
    store: web::Data<Store>,
    conn_map: web::Data<ConnectionMap>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<TaskForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let actor = actor(&session)?;
    let id = path.into_inner();
    let members = member::find_all(&store).await?;

    let parsed = match parse_task_form(&form, &members) {
        Ok(u) => u,
        Err(errors) => {
            let ctx = PageContext::build(&session, &store, "/board").await?;
            let mut tmpl = TaskFormTemplate::new(
                ctx,
                true,
                format!("/tasks/{id}"),
                TaskFormValues::from_form(&form),
                members,
            );
            tmpl.errors = errors;
            return render(tmpl);
        }
    };

    let (updated, _) = operations::update_task(&store, &conn_map, actor, id, parsed, Utc::now()).await?;
    set_flash(&session, &format!("OP {} actualizada", updated.op_number));
    Ok(see_other(&format!("/tasks/{id}")))
}

/// POST /tasks/{id}/move - drag-and-drop and the detail page stage picker.
pub async fn move_task(
    store: web::Data<Store>,
    conn_map: web::Data<ConnectionMap>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<MoveForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let actor = actor(&session)?;
    let id = path.into_inner();
    let to = Stage::from_id(form.status.trim())
        .or_else(|| Stage::from_label(&form.status))
        .ok_or_else(|| AppError::Validation(format!("Unknown stage '{}'", form.status.trim())))?;

    let (moved, activity) = operations::move_task(&store, &conn_map, actor, id, to, Utc::now()).await?;
    if activity.is_some() {
        set_flash(&session, &format!("OP {} → {}", moved.op_number, to.label()));
    }
    Ok(see_other(&safe_next(form.next.as_deref(), "/board")))
}

/// POST /tasks/{id}/delete
pub async fn delete(
    store: web::Data<Store>,
    conn_map: web::Data<ConnectionMap>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    require_user_id(&session)?;
    let id = path.into_inner();
    operations::delete_task(&store, &conn_map, id).await?;
    set_flash(&session, "OP eliminada");
    Ok(see_other("/board"))
}

/// POST /tasks/{id}/photo?filename=... - raw image body, CSRF token in the
/// `X-CSRF-Token` header.
pub async fn upload_photo(
    req: HttpRequest,
    store: web::Data<Store>,
    conn_map: web::Data<ConnectionMap>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
    query: web::Query<PhotoQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    csrf::validate_header(&session, req.headers())?;
    require_user_id(&session)?;

    let id = path.into_inner();
    task::find_by_id(&store, id).await?.ok_or(AppError::NotFound)?;
    let url = storage::save_upload(&config.upload_dir, &query.filename, &body).await?;
    let updated = operations::set_task_photo(&store, &conn_map, id, &url, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "photo_url": updated.photo_url })))
}
