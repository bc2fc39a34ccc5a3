use actix_session::Session;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::auth::rate_limit::{RateLimiter, client_ip};
use crate::auth::{csrf, session as auth_session};
use crate::db::Store;
use crate::errors::{AppError, render};
use crate::handlers::{CsrfOnly, see_other};
use crate::models::member;
use crate::templates_structs::LoginTemplate;

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub csrf_token: String,
}

fn login_error(session: &Session, message: &str) -> Result<HttpResponse, AppError> {
    let csrf_token = csrf::get_or_create_token(session);
    render(LoginTemplate { error: Some(message.to_string()), csrf_token })
}

pub async fn login_page(session: Session) -> Result<HttpResponse, AppError> {
    if auth_session::get_user_id(&session).is_some() {
        return Ok(see_other("/board"));
    }
    let csrf_token = csrf::get_or_create_token(&session);
    render(LoginTemplate { error: None, csrf_token })
}

pub async fn login_submit(
    req: HttpRequest,
    store: web::Data<Store>,
    session: Session,
    form: web::Form<LoginForm>,
    limiter: web::Data<RateLimiter>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    // Rate-limit check before any store access
    let ip = client_ip(&req);
    if limiter.is_blocked(ip) {
        log::warn!("Login blocked for {ip}: too many failures");
        return login_error(&session, "Demasiados intentos fallidos. Probá de nuevo más tarde.");
    }

    match member::verify_credentials(&store, form.username.trim(), &form.password).await? {
        Some(found) => {
            limiter.clear(ip);
            auth_session::log_in(&session, &found)?;
            log::info!("Member '{}' logged in", found.username);
            Ok(see_other("/board"))
        }
        None => {
            limiter.record_failure(ip);
            login_error(&session, "Usuario o contraseña incorrectos")
        }
    }
}

pub async fn logout(
    session: Session,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    session.purge();
    Ok(see_other("/login"))
}
