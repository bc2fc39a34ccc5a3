use askama::Template;

use super::PageContext;
use crate::models::activity::ActivityEvent;
use crate::models::chat::ChatMessage;
use crate::models::member::TeamMember;
use crate::models::notification::Notification;
use crate::models::optimizer::Suggestion;
use crate::models::stalled::StalledTask;
use crate::models::stats::BoardStats;

#[derive(Template)]
#[template(path = "activity.html")]
pub struct ActivityTemplate {
    pub ctx: PageContext,
    pub events: Vec<ActivityEvent>,
}

/// One row of the team page: the member plus their current load.
pub struct TeamRow {
    pub member: TeamMember,
    pub open: usize,
    pub delivered: usize,
}

#[derive(Template)]
#[template(path = "team.html")]
pub struct TeamTemplate {
    pub ctx: PageContext,
    pub rows: Vec<TeamRow>,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "stats.html")]
pub struct StatsTemplate {
    pub ctx: PageContext,
    pub stats: BoardStats,
    pub stalled: Vec<StalledTask>,
    pub suggestions: Vec<Suggestion>,
    pub stall_hours: i64,
}

#[derive(Template)]
#[template(path = "chat.html")]
pub struct ChatTemplate {
    pub ctx: PageContext,
    pub channel: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Template)]
#[template(path = "notifications.html")]
pub struct NotificationsTemplate {
    pub ctx: PageContext,
    pub notifications: Vec<Notification>,
}

#[derive(Template)]
#[template(path = "assistant.html")]
pub struct AssistantTemplate {
    pub ctx: PageContext,
    pub configured: bool,
    pub question: String,
    pub answer: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates_structs::{TaskFormTemplate, TaskFormValues};
    use chrono::{TimeZone, Utc};

    fn ctx(path: &str) -> PageContext {
        PageContext {
            user_id: 1,
            display_name: "Ana Pérez".into(),
            initials: "AP".into(),
            is_admin: false,
            flash: None,
            csrf_token: "tok".into(),
            unread_count: 0,
            current_path: path.into(),
        }
    }

    #[test]
    fn progress_is_only_editable_on_existing_ops() {
        let new = TaskFormTemplate::new(ctx("/tasks/new"), false, "/tasks".into(), TaskFormValues::blank(), Vec::new())
            .render()
            .unwrap();
        assert!(!new.contains(r#"name="progress""#));

        let edit = TaskFormTemplate::new(ctx("/board"), true, "/tasks/1".into(), TaskFormValues::blank(), Vec::new())
            .render()
            .unwrap();
        assert!(edit.contains(r#"name="progress""#));
    }

    #[test]
    fn chat_rows_carry_message_ids() {
        let ctx = ctx("/chat");
        let message = ChatMessage {
            id: 7,
            channel: "general".into(),
            author_id: 1,
            author_name: "Ana Pérez".into(),
            body: "Buen día".into(),
            created_at: Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap(),
        };
        let html = ChatTemplate { ctx, channel: "general".into(), messages: vec![message] }
            .render()
            .unwrap();
        assert!(html.contains(r#"<li data-id="7">"#));
        assert!(html.contains(r#"data-channel="general""#));
    }
}
