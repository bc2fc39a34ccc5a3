// Template context structures for Askama templates, organized by page area.

use actix_session::Session;

use crate::auth::csrf;
use crate::auth::session::{get_display_name, get_user_id, is_admin, take_flash};
use crate::db::Store;
use crate::errors::AppError;
use crate::models::member::initials;
use crate::models::notification;

/// Common context shared by all authenticated pages.
/// Templates access these as `ctx.display_name`, `ctx.unread_count`, etc.
pub struct PageContext {
    pub user_id: i64,
    pub display_name: String,
    pub initials: String,
    pub is_admin: bool,
    pub flash: Option<String>,
    pub csrf_token: String,
    pub unread_count: i64,
    pub current_path: String,
}

impl PageContext {
    pub async fn build(session: &Session, store: &Store, current_path: &str) -> Result<Self, AppError> {
        let user_id = get_user_id(session)
            .ok_or_else(|| AppError::Session("No user in session".to_string()))?;
        let display_name = get_display_name(session);
        let unread_count = notification::count_unread(store, user_id).await;
        Ok(Self {
            user_id,
            initials: initials(&display_name),
            display_name,
            is_admin: is_admin(session),
            flash: take_flash(session),
            csrf_token: csrf::get_or_create_token(session),
            unread_count,
            current_path: current_path.to_string(),
        })
    }

    /// Whether a nav link should be highlighted.
    pub fn is_active(&self, prefix: &str) -> bool {
        self.current_path == prefix || self.current_path.starts_with(&format!("{prefix}/"))
    }
}

mod api;
mod board;
mod common;
mod pages;

pub use self::api::{
    ApiActivityQuery, ApiErrorResponse, ApiMoveRequest, ApiStage, ApiTaskChange, ApiTaskQuery,
    ApiTaskUpdate, ApiTokenRequest, ApiTokenResponse, PaginatedResponse,
};
pub use self::board::{BoardTemplate, TaskDetailTemplate, TaskFormTemplate, TaskFormValues};
pub use self::common::{LoginTemplate, NotFoundTemplate};
pub use self::pages::{
    ActivityTemplate, AssistantTemplate, ChatTemplate, NotificationsTemplate, StatsTemplate, TeamRow,
    TeamTemplate,
};
