use actix_session::Session;
use actix_web::{web, HttpResponse};

use crate::db::Store;
use crate::errors::{AppError, render};
use crate::models::activity::{self, DEFAULT_ACTIVITY_LIMIT};
use crate::templates_structs::{ActivityTemplate, PageContext};

/// GET /activity - newest movements first.
pub async fn list(
    store: web::Data<Store>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(&session, &store, "/activity").await?;
    let events = activity::find_recent(&store, DEFAULT_ACTIVITY_LIMIT).await?;
    render(ActivityTemplate { ctx, events })
}
