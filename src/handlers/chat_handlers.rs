use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::csrf;
use crate::auth::session::{require_user_id, set_flash};
use crate::db::Store;
use crate::errors::{AppError, render};
use crate::handlers::see_other;
use crate::models::chat::{self, ChatForm};
use crate::operations::{self, Actor};
use crate::realtime::ConnectionMap;
use crate::templates_structs::{ChatTemplate, PageContext};

#[derive(Deserialize)]
pub struct ChannelQuery {
    #[serde(default)]
    pub channel: String,
}

/// Where to go back to after posting: the OP page for task threads.
fn return_path(channel: &str) -> String {
    match channel.strip_prefix("task:") {
        Some(id) => format!("/tasks/{id}"),
        None => format!("/chat?channel={channel}"),
    }
}

/// GET /chat?channel=...
pub async fn index(
    store: web::Data<Store>,
    session: Session,
    query: web::Query<ChannelQuery>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(&session, &store, "/chat").await?;
    let channel = chat::normalize_channel(&query.channel);
    let messages = chat::find_recent(&store, &channel, chat::DEFAULT_CHAT_LIMIT).await?;
    render(ChatTemplate { ctx, channel, messages })
}

/// POST /chat
pub async fn post(
    store: web::Data<Store>,
    conn_map: web::Data<ConnectionMap>,
    session: Session,
    form: web::Form<ChatForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let actor = Actor { member_id: require_user_id(&session)? };
    let channel = chat::normalize_channel(&form.channel);

    match operations::post_chat(&store, &conn_map, actor, &channel, &form.body, Utc::now()).await {
        Ok(_) => {}
        Err(AppError::Validation(msg)) => set_flash(&session, &msg),
        Err(e) => return Err(e),
    }
    Ok(see_other(&return_path(&channel)))
}

#[cfg(test)]
mod tests {
    use super::return_path;

    #[test]
    fn task_threads_return_to_the_op() {
        assert_eq!(return_path("task:12"), "/tasks/12");
        assert_eq!(return_path("general"), "/chat?channel=general");
    }
}
