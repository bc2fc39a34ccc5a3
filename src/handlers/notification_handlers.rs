use actix_session::Session;
use actix_web::{web, HttpResponse};

use crate::auth::csrf;
use crate::auth::session::require_user_id;
use crate::db::Store;
use crate::errors::{AppError, render};
use crate::handlers::{CsrfOnly, see_other};
use crate::models::notification;
use crate::realtime::{self, ConnectionMap};
use crate::templates_structs::{NotificationsTemplate, PageContext};

const PAGE_LIMIT: i64 = 100;

/// GET /notifications
pub async fn list(
    store: web::Data<Store>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(&session, &store, "/notifications").await?;
    let notifications = notification::find_for_member(&store, ctx.user_id, PAGE_LIMIT).await?;
    render(NotificationsTemplate { ctx, notifications })
}

/// POST /notifications/{id}/read
pub async fn mark_read(
    store: web::Data<Store>,
    conn_map: web::Data<ConnectionMap>,
    session: Session,
    path: web::Path<i64>,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let member_id = require_user_id(&session)?;
    let id = path.into_inner();
    if !notification::mark_read(&store, id, member_id).await? {
        log::debug!("Notification {id} already read or not owned by {member_id}");
    }
    realtime::send_count_update(&conn_map, &store, member_id).await;
    Ok(see_other("/notifications"))
}

/// POST /notifications/read-all
pub async fn mark_all_read(
    store: web::Data<Store>,
    conn_map: web::Data<ConnectionMap>,
    session: Session,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let member_id = require_user_id(&session)?;
    let changed = notification::mark_all_read(&store, member_id).await?;
    log::debug!("Member {member_id} marked {changed} notifications read");
    realtime::send_count_update(&conn_map, &store, member_id).await;
    Ok(see_other("/notifications"))
}
