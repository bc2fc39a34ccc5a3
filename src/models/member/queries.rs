use crate::auth::password;
use crate::db::Store;
use crate::db::mock::MockMember;
use crate::errors::AppError;
use super::types::{MemberAuth, NewMember, TeamMember};

const SELECT_MEMBER: &str = "\
    SELECT id, username, display_name, role_label, productivity, is_admin \
    FROM members";

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: i64,
    username: String,
    display_name: String,
    role_label: String,
    productivity: f64,
    is_admin: bool,
}

impl From<MemberRow> for TeamMember {
    fn from(r: MemberRow) -> Self {
        TeamMember {
            id: r.id,
            username: r.username,
            display_name: r.display_name,
            role_label: r.role_label,
            productivity: r.productivity,
            is_admin: r.is_admin,
        }
    }
}

/// All members ordered by display name.
pub async fn find_all(store: &Store) -> Result<Vec<TeamMember>, AppError> {
    match store {
        Store::Postgres(pool) => {
            let rows = sqlx::query_as::<_, MemberRow>(&format!("{SELECT_MEMBER} ORDER BY display_name, id"))
                .fetch_all(pool)
                .await?;
            Ok(rows.into_iter().map(TeamMember::from).collect())
        }
        Store::Mock(mock) => {
            let data = mock.read();
            let mut members: Vec<TeamMember> = data.members.iter().map(|m| m.member.clone()).collect();
            members.sort_by(|a, b| a.display_name.cmp(&b.display_name).then(a.id.cmp(&b.id)));
            Ok(members)
        }
    }
}

pub async fn find_by_id(store: &Store, id: i64) -> Result<Option<TeamMember>, AppError> {
    match store {
        Store::Postgres(pool) => {
            let row = sqlx::query_as::<_, MemberRow>(&format!("{SELECT_MEMBER} WHERE id = $1"))
                .bind(id)
                .fetch_optional(pool)
                .await?;
            Ok(row.map(TeamMember::from))
        }
        Store::Mock(mock) => Ok(mock
            .read()
            .members
            .iter()
            .find(|m| m.member.id == id)
            .map(|m| m.member.clone())),
    }
}

pub async fn find_auth_by_username(store: &Store, username: &str) -> Result<Option<MemberAuth>, AppError> {
    let username = username.trim();
    match store {
        Store::Postgres(pool) => {
            let row: Option<(i64, String, String, String, bool)> = sqlx::query_as(
                "SELECT id, username, display_name, password, is_admin FROM members WHERE username = $1",
            )
            .bind(username)
            .fetch_optional(pool)
            .await?;
            Ok(row.map(|(id, username, display_name, password, is_admin)| MemberAuth {
                id,
                username,
                display_name,
                password,
                is_admin,
            }))
        }
        Store::Mock(mock) => Ok(mock
            .read()
            .members
            .iter()
            .find(|m| m.member.username == username)
            .map(MockMember::to_auth)),
    }
}

/// Credential check: the member when `username`/`password` match, else `None`.
pub async fn verify_credentials(
    store: &Store,
    username: &str,
    password_plain: &str,
) -> Result<Option<MemberAuth>, AppError> {
    let Some(found) = find_auth_by_username(store, username).await? else {
        return Ok(None);
    };
    match password::verify_password(password_plain, &found.password) {
        Ok(true) => Ok(Some(found)),
        Ok(false) => Ok(None),
        Err(e) => {
            log::warn!("Stored hash for '{}' is unreadable: {}", found.username, e);
            Ok(None)
        }
    }
}

/// Create a member. `new.password` must already be hashed.
/// Duplicate usernames are a validation error.
pub async fn create(store: &Store, new: &NewMember) -> Result<i64, AppError> {
    let username = new.username.trim().to_string();
    if find_auth_by_username(store, &username).await?.is_some() {
        return Err(AppError::Validation(format!("Username '{username}' is already taken")));
    }
    match store {
        Store::Postgres(pool) => {
            let (id,): (i64,) = sqlx::query_as(
                "INSERT INTO members (username, display_name, role_label, password, productivity, is_admin) \
                 VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
            )
            .bind(&username)
            .bind(new.display_name.trim())
            .bind(new.role_label.trim())
            .bind(&new.password)
            .bind(new.productivity)
            .bind(new.is_admin)
            .fetch_one(pool)
            .await?;
            Ok(id)
        }
        Store::Mock(mock) => {
            let mut data = mock.write();
            let id = data.next_id();
            data.members.push(MockMember {
                member: TeamMember {
                    id,
                    username,
                    display_name: new.display_name.trim().to_string(),
                    role_label: new.role_label.trim().to_string(),
                    productivity: new.productivity,
                    is_admin: new.is_admin,
                },
                password: new.password.clone(),
            });
            Ok(id)
        }
    }
}

pub async fn count(store: &Store) -> Result<i64, AppError> {
    match store {
        Store::Postgres(pool) => {
            let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM members")
                .fetch_one(pool)
                .await?;
            Ok(n)
        }
        Store::Mock(mock) => Ok(mock.read().members.len() as i64),
    }
}

/// Ids of members flagged as admin, used as fallback recipients.
pub async fn find_admin_ids(store: &Store) -> Result<Vec<i64>, AppError> {
    Ok(find_all(store)
        .await?
        .into_iter()
        .filter(|m| m.is_admin)
        .map(|m| m.id)
        .collect())
}
