use std::sync::Arc;

use actix_web::{http::header, web, HttpResponse};
use handlebars::Handlebars;
use log::{error, warn};
use serde_json::{json, Value};

use crate::core::error::Result;
use crate::web::server::AppState;
use crate::web::session::Session;

/// Shared handlebars instance
lazy_static::lazy_static! {
    static ref HBS: Arc<Handlebars<'static>> = {
        let mut hbs = Handlebars::new();
        // Register templates
        if let Err(e) = hbs.register_templates_directory(".hbs", "./src/web/templates") {
            error!("Error registering Handlebars templates: {}", e);
        }
        Arc::new(hbs)
    };
}

/// Render a page, adding pending flash messages and the login state
pub fn render(session: &Session, template: &str, context: Value) -> HttpResponse {
    render_with_status(session, template, context, HttpResponse::Ok)
}

fn render_with_status(
    session: &Session,
    template: &str,
    mut context: Value,
    status: fn() -> actix_web::HttpResponseBuilder,
) -> HttpResponse {
    if let Value::Object(map) = &mut context {
        map.insert("flashes".to_string(), json!(session.take_flashes()));
        map.insert("logged_in".to_string(), json!(session.user_id().is_some()));
    }

    match HBS.render(template, &context) {
        Ok(body) => {
            let mut builder = status();
            session.attach(&mut builder);
            builder.content_type("text/html; charset=utf-8").body(body)
        }
        Err(e) => {
            error!("Template rendering error: {}", e);
            HttpResponse::InternalServerError().body(format!("Template error: {}", e))
        }
    }
}

/// `302 Found` to `location`
pub fn redirect(session: &Session, location: &str) -> HttpResponse {
    let mut builder = HttpResponse::Found();
    session.attach(&mut builder);
    builder
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}

/// The logged-in user's id, or a redirect to the login page
pub fn require_login(session: &Session) -> std::result::Result<i64, HttpResponse> {
    session
        .user_id()
        .ok_or_else(|| redirect(session, "/login"))
}

/// Serve the home page
pub async fn home(data: web::Data<AppState>, session: Session) -> Result<HttpResponse> {
    let user_id = match require_login(&session) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    let user = match data.repo.find_user(user_id)? {
        Some(user) => user,
        None => {
            warn!("Session refers to missing user {}", user_id);
            session.clear();
            return Ok(redirect(&session, "/login"));
        }
    };

    let context = json!({
        "title": "Mensable",
        "username": user.name,
        "tables": data.repo.tables_created_by(user.id)?,
        "subscriptions": data.repo.subscriptions_for_user(user.id)?,
    });

    Ok(render(&session, "home", context))
}

/// 404 Not Found handler
pub async fn not_found(session: Session) -> HttpResponse {
    let context = json!({
        "title": "Page Not Found | Mensable",
    });

    render_with_status(&session, "404", context, HttpResponse::NotFound)
}
