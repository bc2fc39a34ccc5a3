use actix_session::Session;
use actix_web::{web, HttpResponse};

use crate::auth::session::{require_admin, set_flash};
use crate::auth::{csrf, password, validate};
use crate::db::Store;
use crate::errors::{AppError, render};
use crate::handlers::see_other;
use crate::models::member::{self, MemberForm, NewMember};
use crate::models::{stats, task};
use crate::templates_structs::{PageContext, TeamRow, TeamTemplate};

async fn team_page(
    store: &Store,
    session: &Session,
    errors: Vec<String>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(session, store, "/team").await?;
    let members = member::find_all(store).await?;
    let tasks = task::find_all(store).await?;
    let board_stats = stats::compute(&tasks, &members);

    let rows = members
        .into_iter()
        .map(|m| {
            let load = board_stats.per_member.iter().find(|l| l.member_id == m.id);
            TeamRow {
                open: load.map_or(0, |l| l.open),
                delivered: load.map_or(0, |l| l.delivered),
                member: m,
            }
        })
        .collect();
    render(TeamTemplate { ctx, rows, errors })
}

/// GET /team
pub async fn list(
    store: web::Data<Store>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    team_page(&store, &session, Vec::new()).await
}

/// POST /team - admins add a member.
pub async fn create(
    store: web::Data<Store>,
    session: Session,
    form: web::Form<MemberForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    require_admin(&session, "team.create")?;

    let mut errors = Vec::new();
    errors.extend(validate::validate_username(&form.username));
    errors.extend(validate::validate_password(&form.password));
    errors.extend(validate::validate_required(&form.display_name, "Display name", 100));
    errors.extend(validate::validate_optional(&form.role_label, "Role", 60));
    if !errors.is_empty() {
        return team_page(&store, &session, errors).await;
    }

    let new = NewMember {
        username: form.username.trim().to_string(),
        password: password::hash_password(&form.password)?,
        display_name: form.display_name.trim().to_string(),
        role_label: form.role_label.trim().to_string(),
        productivity: 1.0,
        is_admin: false,
    };
    match member::create(&store, &new).await {
        Ok(id) => {
            log::info!("Member '{}' created (id {id})", new.username);
            set_flash(&session, &format!("{} agregado al equipo", new.display_name));
            Ok(see_other("/team"))
        }
        Err(AppError::Validation(msg)) => team_page(&store, &session, vec![msg]).await,
        Err(e) => Err(e),
    }
}
