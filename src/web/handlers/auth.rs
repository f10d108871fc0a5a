//! Web handlers for logging in, registering and logging out

use actix_web::{web, HttpResponse};
use log::{info, warn};
use serde_json::json;

use crate::core::error::{MensableError, Result};
use crate::core::password::{check_password_hash, generate_password_hash};
use crate::core::validation::{check_new_password, check_username};
use crate::web::handlers::pages::{redirect, render};
use crate::web::models::{LoginForm, RegisterForm};
use crate::web::server::AppState;
use crate::web::session::Session;

/// Serve the login form
pub async fn login_form(session: Session) -> HttpResponse {
    render(&session, "login", json!({ "title": "Log in | Mensable" }))
}

/// Log user in
pub async fn login(
    data: web::Data<AppState>,
    session: Session,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse> {
    // A login attempt always ends the previous session's state
    session.clear();

    let username = form.username.trim();
    if username.is_empty() {
        session.flash("Please enter a username.");
        return Ok(redirect(&session, "/login"));
    }
    if form.password.is_empty() {
        session.flash("Please enter a password.");
        return Ok(redirect(&session, "/login"));
    }

    let user = match data.repo.find_user_by_name(username)? {
        Some(user) => user,
        None => {
            session.flash("Username not recognized - try again or register for an account.");
            return Ok(redirect(&session, "/login"));
        }
    };

    if !check_password_hash(&user.password_hash, &form.password) {
        warn!("Failed login for user {}", user.name);
        session.flash(format!("Incorrect password for user {}.", user.name));
        return Ok(redirect(&session, "/login"));
    }

    session.log_in(user.id);
    info!("User {} logged in", user.name);
    Ok(redirect(&session, "/"))
}

/// Serve the registration form
pub async fn register_form(session: Session) -> HttpResponse {
    render(&session, "register", json!({ "title": "Register | Mensable" }))
}

/// Register a new user and log them in
pub async fn register(
    data: web::Data<AppState>,
    session: Session,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse> {
    let username = form.username.trim();
    let created = check_username(username)
        .and_then(|_| match data.repo.find_user_by_name(username)? {
            Some(_) => Err(MensableError::Validation("Username taken.".to_string())),
            None => Ok(()),
        })
        .and_then(|_| check_new_password(&form.password, &form.confirmation))
        .and_then(|_| {
            data.repo
                .create_user(username, &generate_password_hash(&form.password))
        });

    let user_id = match created {
        Ok(id) => id,
        Err(MensableError::Validation(message)) => {
            session.flash(message);
            return Ok(redirect(&session, "/register"));
        }
        Err(e) => return Err(e),
    };
    session.log_in(user_id);
    info!("Registered user {}", username);

    session.flash(format!(
        "User {} registered and logged in - welcome to Mensable.",
        username
    ));
    Ok(redirect(&session, "/"))
}

/// Log user out
pub async fn logout(session: Session) -> HttpResponse {
    session.clear();
    redirect(&session, "/")
}
