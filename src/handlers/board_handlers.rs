use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::db::Store;
use crate::errors::{AppError, render};
use crate::models::board;
use crate::models::stage::{COLUMNS, Priority};
use crate::models::task::{self, BoardQuery, TaskFilter};
use crate::models::member;
use crate::templates_structs::{BoardTemplate, PageContext};

/// GET /board - the ten columns, filtered by owner/status/priority/search.
pub async fn index(
    store: web::Data<Store>,
    session: Session,
    query: web::Query<BoardQuery>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(&session, &store, "/board").await?;
    let filter = TaskFilter::from_query(&query);

    let all = task::find_all(&store).await?;
    let total = all.len();
    let visible_tasks = filter.apply(all);
    let visible = visible_tasks.len();

    let tmpl = BoardTemplate {
        ctx,
        columns: board::group_by_stage(visible_tasks),
        members: member::find_all(&store).await?,
        stages: &COLUMNS,
        priorities: &Priority::ALL,
        owner_value: filter.owner.as_query(),
        status_value: filter.status.map(|s| s.id().to_string()).unwrap_or_default(),
        priority_value: filter.priority.map(|p| p.id().to_string()).unwrap_or_default(),
        q_value: query.q.clone().unwrap_or_default(),
        visible,
        total,
        today: Utc::now().date_naive(),
    };
    render(tmpl)
}
