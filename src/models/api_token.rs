use chrono::{DateTime, Utc};
use rand::Rng;

use crate::db::Store;
use crate::errors::AppError;

/// Random 32-byte hex bearer token.
fn generate() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Issue a new bearer token for the legacy REST API.
pub async fn issue(store: &Store, member_id: i64, now: DateTime<Utc>) -> Result<String, AppError> {
    let token = generate();
    match store {
        Store::Postgres(pool) => {
            sqlx::query("INSERT INTO api_tokens (token, member_id, created_at) VALUES ($1, $2, $3)")
                .bind(&token)
                .bind(member_id)
                .bind(now)
                .execute(pool)
                .await?;
        }
        Store::Mock(mock) => {
            mock.write().tokens.insert(token.clone(), (member_id, now));
        }
    }
    Ok(token)
}

/// Member id owning `token`, if any.
pub async fn resolve(store: &Store, token: &str) -> Result<Option<i64>, AppError> {
    if token.is_empty() {
        return Ok(None);
    }
    match store {
        Store::Postgres(pool) => {
            let row: Option<(i64,)> = sqlx::query_as("SELECT member_id FROM api_tokens WHERE token = $1")
                .bind(token)
                .fetch_optional(pool)
                .await?;
            Ok(row.map(|r| r.0))
        }
        Store::Mock(mock) => Ok(mock.read().tokens.get(token).map(|(id, _)| *id)),
    }
}

pub async fn revoke(store: &Store, token: &str) -> Result<(), AppError> {
    match store {
        Store::Postgres(pool) => {
            sqlx::query("DELETE FROM api_tokens WHERE token = $1")
                .bind(token)
                .execute(pool)
                .await?;
        }
        Store::Mock(mock) => {
            mock.write().tokens.remove(token);
        }
    }
    Ok(())
}
