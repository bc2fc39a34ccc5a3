use chrono::{DateTime, Utc};

use crate::db::Store;
use crate::errors::AppError;
use super::types::{ChatMessage, MAX_BODY_LEN, normalize_channel};

#[derive(sqlx::FromRow)]
struct ChatRow {
    id: i64,
    channel: String,
    author_id: i64,
    author_name: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<ChatRow> for ChatMessage {
    fn from(r: ChatRow) -> Self {
        ChatMessage {
            id: r.id,
            channel: r.channel,
            author_id: r.author_id,
            author_name: r.author_name,
            body: r.body,
            created_at: r.created_at,
        }
    }
}

/// Store a message. Empty or oversized bodies are rejected.
pub async fn post(
    store: &Store,
    channel: &str,
    author_id: i64,
    body: &str,
    now: DateTime<Utc>,
) -> Result<ChatMessage, AppError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(AppError::Validation("Message is empty".into()));
    }
    if body.chars().count() > MAX_BODY_LEN {
        return Err(AppError::Validation(format!("Message must be at most {MAX_BODY_LEN} characters")));
    }
    let channel = normalize_channel(channel);
    match store {
        Store::Postgres(pool) => {
            let row = sqlx::query_as::<_, ChatRow>(
                "WITH inserted AS ( \
                     INSERT INTO chat_messages (channel, author_id, body, created_at) \
                     VALUES ($1, $2, $3, $4) RETURNING * \
                 ) \
                 SELECT i.id, i.channel, i.author_id, m.display_name AS author_name, i.body, i.created_at \
                 FROM inserted i JOIN members m ON m.id = i.author_id",
            )
            .bind(&channel)
            .bind(author_id)
            .bind(body)
            .bind(now)
            .fetch_one(pool)
            .await?;
            Ok(ChatMessage::from(row))
        }
        Store::Mock(mock) => {
            let mut data = mock.write();
            let author_name = data.member_name(author_id).ok_or(AppError::NotFound)?;
            let msg = ChatMessage {
                id: data.next_id(),
                channel,
                author_id,
                author_name,
                body: body.to_string(),
                created_at: now,
            };
            data.chat.push(msg.clone());
            Ok(msg)
        }
    }
}

/// The latest `limit` messages of a channel, oldest first.
pub async fn find_recent(store: &Store, channel: &str, limit: i64) -> Result<Vec<ChatMessage>, AppError> {
    let channel = normalize_channel(channel);
    let limit = limit.clamp(1, 500);
    let mut messages = match store {
        Store::Postgres(pool) => {
            let rows = sqlx::query_as::<_, ChatRow>(
                "SELECT c.id, c.channel, c.author_id, m.display_name AS author_name, c.body, c.created_at \
                 FROM chat_messages c JOIN members m ON m.id = c.author_id \
                 WHERE c.channel = $1 \
                 ORDER BY c.created_at DESC, c.id DESC LIMIT $2",
            )
            .bind(&channel)
            .bind(limit)
            .fetch_all(pool)
            .await?;
            rows.into_iter().map(ChatMessage::from).collect::<Vec<_>>()
        }
        Store::Mock(mock) => {
            let data = mock.read();
            let mut msgs: Vec<ChatMessage> = data.chat.iter().filter(|m| m.channel == channel).cloned().collect();
            msgs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            msgs.truncate(limit as usize);
            msgs
        }
    };
    messages.reverse();
    Ok(messages)
}
