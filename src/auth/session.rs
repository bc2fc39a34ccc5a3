use actix_session::Session;

use crate::errors::AppError;
use crate::models::member::MemberAuth;

/// Store the logged-in member in the session.
pub fn log_in(session: &Session, member: &MemberAuth) -> Result<(), AppError> {
    session.renew();
    let to_err = |e: actix_session::SessionInsertError| AppError::Session(e.to_string());
    session.insert("user_id", member.id).map_err(to_err)?;
    session.insert("username", &member.username).map_err(to_err)?;
    session.insert("display_name", &member.display_name).map_err(to_err)?;
    session.insert("is_admin", member.is_admin).map_err(to_err)?;
    Ok(())
}

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>("user_id").unwrap_or(None)
}

/// The logged-in member id, or a session error for anonymous requests.
pub fn require_user_id(session: &Session) -> Result<i64, AppError> {
    get_user_id(session).ok_or_else(|| AppError::Session("No user in session".to_string()))
}

pub fn get_username(session: &Session) -> Option<String> {
    session.get::<String>("username").unwrap_or(None)
}

pub fn get_display_name(session: &Session) -> String {
    session
        .get::<String>("display_name")
        .unwrap_or(None)
        .unwrap_or_default()
}

pub fn is_admin(session: &Session) -> bool {
    session.get::<bool>("is_admin").unwrap_or(None).unwrap_or(false)
}

/// Admin-only pages; returns Err(AppError) if denied.
pub fn require_admin(session: &Session, what: &str) -> Result<(), AppError> {
    if is_admin(session) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(what.to_string()))
    }
}

pub fn set_flash(session: &Session, message: &str) {
    let _ = session.insert("flash", message);
}

pub fn take_flash(session: &Session) -> Option<String> {
    let flash = session.get::<String>("flash").unwrap_or(None);
    if flash.is_some() {
        session.remove("flash");
    }
    flash
}
