use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::config::AppConfig;
use crate::db::Store;
use crate::errors::{AppError, render};
use crate::models::{member, optimizer, stalled, stats, task};
use crate::templates_structs::{PageContext, StatsTemplate};

/// GET /stats - workload, stalled OPs and optimizer suggestions.
pub async fn index(
    store: web::Data<Store>,
    config: web::Data<AppConfig>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(&session, &store, "/stats").await?;
    let tasks = task::find_all(&store).await?;
    let members = member::find_all(&store).await?;

    let board_stats = stats::compute(&tasks, &members);
    let stalled = stalled::detect(&tasks, Utc::now(), config.stall_hours);
    let suggestions = optimizer::suggest(&board_stats, &stalled, &tasks);

    render(StatsTemplate {
        ctx,
        stats: board_stats,
        stalled,
        suggestions,
        stall_hours: config.stall_hours,
    })
}
