pub mod activity_handlers;
pub mod api_v1;
pub mod assistant_handlers;
pub mod auth_handlers;
pub mod board_handlers;
pub mod chat_handlers;
pub mod notification_handlers;
pub mod stats_handlers;
pub mod task_handlers;
pub mod team_handlers;
pub mod ws;

use actix_web::HttpResponse;
use serde::Deserialize;

/// Form carrying only the CSRF token (logout, deletes, mark-as-read).
#[derive(Deserialize)]
pub struct CsrfOnly {
    pub csrf_token: String,
}

pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", location))
        .finish()
}

/// Only follow local redirect targets.
pub fn safe_next(next: Option<&str>, fallback: &str) -> String {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") => n.to_string(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::safe_next;

    #[test]
    fn safe_next_rejects_external_targets() {
        assert_eq!(safe_next(Some("/board?owner=2"), "/board"), "/board?owner=2");
        assert_eq!(safe_next(Some("https://evil.test"), "/board"), "/board");
        assert_eq!(safe_next(Some("//evil.test"), "/board"), "/board");
        assert_eq!(safe_next(None, "/board"), "/board");
    }
}
