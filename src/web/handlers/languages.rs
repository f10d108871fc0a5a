use actix_web::{web, HttpResponse};
use log::info;
use serde_json::json;

use crate::core::error::{MensableError, Result};
use crate::core::validation::check_language_name;
use crate::web::handlers::pages::{redirect, render, require_login};
use crate::web::models::LanguageForm;
use crate::web::server::AppState;
use crate::web::session::Session;

/// List every language with its number of tables
pub async fn languages(data: web::Data<AppState>, session: Session) -> Result<HttpResponse> {
    if let Err(response) = require_login(&session) {
        return Ok(response);
    }

    let context = json!({
        "title": "Languages | Mensable",
        "languages": data.repo.list_languages()?,
    });
    Ok(render(&session, "languages", context))
}

pub async fn create_language_form(session: Session) -> HttpResponse {
    if let Err(response) = require_login(&session) {
        return response;
    }
    render(&session, "create_language", json!({ "title": "New language | Mensable" }))
}

pub async fn create_language(
    data: web::Data<AppState>,
    session: Session,
    form: web::Form<LanguageForm>,
) -> Result<HttpResponse> {
    if let Err(response) = require_login(&session) {
        return Ok(response);
    }

    let name = form.language_name.trim();
    let created = check_language_name(name)
        .and_then(|_| match data.repo.find_language_by_name(name)? {
            Some(_) => Err(MensableError::Validation(format!("Language {} already exists.", name))),
            None => Ok(()),
        })
        .and_then(|_| data.repo.create_language(name));

    match created {
        Ok(_) => {}
        Err(MensableError::Validation(message)) => {
            session.flash(message);
            return Ok(redirect(&session, "/create_language"));
        }
        Err(e) => return Err(e),
    }

    info!("Created language {}", name);
    Ok(redirect(&session, &format!("/create_table/{}", name)))
}
