use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;

use crate::assistant;
use crate::auth::csrf;
use crate::config::AppConfig;
use crate::db::Store;
use crate::errors::{AppError, render};
use crate::models::{member, stalled, stats, task};
use crate::templates_structs::{AssistantTemplate, PageContext};

#[derive(Deserialize)]
pub struct AskForm {
    pub question: String,
    pub csrf_token: String,
}

/// GET /assistant
pub async fn page(
    store: web::Data<Store>,
    config: web::Data<AppConfig>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(&session, &store, "/assistant").await?;
    render(AssistantTemplate {
        ctx,
        configured: config.llm.is_some(),
        question: String::new(),
        answer: None,
        error: None,
    })
}

/// POST /assistant - one question, one completion.
pub async fn ask(
    store: web::Data<Store>,
    config: web::Data<AppConfig>,
    session: Session,
    form: web::Form<AskForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let ctx = PageContext::build(&session, &store, "/assistant").await?;

    let outcome = match assistant::validate_question(&form.question) {
        Ok(()) => {
            let tasks = task::find_all(&store).await?;
            let members = member::find_all(&store).await?;
            let board_stats = stats::compute(&tasks, &members);
            let stalled = stalled::detect(&tasks, Utc::now(), config.stall_hours);
            let prompt = assistant::build_prompt(&form.question, &board_stats, &stalled, &tasks);
            assistant::complete(config.llm.as_ref(), &prompt).await
        }
        Err(e) => Err(e),
    };

    let (answer, error) = match outcome {
        Ok(text) => (Some(text), None),
        Err(AppError::Validation(msg)) => (None, Some(msg)),
        Err(AppError::Remote(msg)) => {
            log::error!("Assistant request failed: {msg}");
            (None, Some("El asistente no respondió. Intentá de nuevo.".to_string()))
        }
        Err(e) => return Err(e),
    };

    render(AssistantTemplate {
        ctx,
        configured: config.llm.is_some(),
        question: form.question.clone(),
        answer,
        error,
    })
}
