//! Web handlers for word tables
//!
//! Anyone logged in can browse and view tables; only a table's creator may
//! change its words.

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::Local;
use futures::StreamExt;
use log::{info, warn};
use serde_json::json;

use crate::core::csv_import::parse_word_list;
use crate::core::error::{MensableError, Result};
use crate::core::models::{AddWordOutcome, Language, Table};
use crate::core::validation::{check_table_name, clean_word_pair};
use crate::web::handlers::pages::{redirect, render, require_login};
use crate::web::models::{DeleteWordForm, LanguagePath, TableForm, TablePath, WordPairForm};
use crate::web::server::AppState;
use crate::web::session::Session;

/// Largest accepted word list upload
const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

/// The table named in the path, if it exists and belongs to the named language
pub(crate) fn find_table(data: &AppState, path: &TablePath) -> Result<Option<(Language, Table)>> {
    let language = match data.repo.find_language_by_name(&path.language_name)? {
        Some(language) => language,
        None => return Ok(None),
    };
    let table = data
        .repo
        .find_table_by_name(&path.table_name)?
        .filter(|table| table.language_id == language.id);
    Ok(table.map(|table| (language, table)))
}

/// Flash and send the user home for a table that isn't there
pub(crate) fn missing_table(session: &Session, path: &TablePath) -> HttpResponse {
    session.flash(format!("Table {} does not exist.", path.table_name));
    redirect(session, "/")
}

/// Load a table its creator wants to change, or the response refusing it
fn editable_table(
    data: &AppState,
    session: &Session,
    path: &TablePath,
    user_id: i64,
) -> Result<std::result::Result<(Language, Table), HttpResponse>> {
    let (language, table) = match find_table(data, path)? {
        Some(found) => found,
        None => return Ok(Err(missing_table(session, path))),
    };

    if table.creator_id != user_id {
        warn!("User {} tried to edit table {} without owning it", user_id, table.name);
        session.flash("You can only edit tables you created.");
        let location = if data.repo.table_word_ids(table.id)?.is_empty() {
            path.language_tables_url()
        } else {
            path.view_url()
        };
        return Ok(Err(redirect(session, &location)));
    }

    Ok(Ok((language, table)))
}

/// List all tables
pub async fn all_tables(data: web::Data<AppState>, session: Session) -> Result<HttpResponse> {
    if let Err(response) = require_login(&session) {
        return Ok(response);
    }

    let context = json!({
        "title": "Tables | Mensable",
        "heading": "All tables",
        "tables": data.repo.list_tables(None)?,
    });
    Ok(render(&session, "tables", context))
}

/// List the tables of one language
pub async fn language_tables(
    data: web::Data<AppState>,
    session: Session,
    path: web::Path<LanguagePath>,
) -> Result<HttpResponse> {
    if let Err(response) = require_login(&session) {
        return Ok(response);
    }

    let language = match data.repo.find_language_by_name(&path.language_name)? {
        Some(language) => language,
        None => {
            session.flash(format!("Language {} does not exist.", path.language_name));
            return Ok(redirect(&session, "/languages"));
        }
    };

    let tables = data.repo.list_tables(Some(language.id))?;
    let context = json!({
        "title": format!("{} tables | Mensable", language.name),
        "heading": format!("{} tables", language.name),
        "language": language,
        "tables": tables,
    });
    Ok(render(&session, "tables", context))
}

pub async fn create_table_form(
    data: web::Data<AppState>,
    session: Session,
    path: web::Path<LanguagePath>,
) -> Result<HttpResponse> {
    if let Err(response) = require_login(&session) {
        return Ok(response);
    }

    match data.repo.find_language_by_name(&path.language_name)? {
        Some(language) => Ok(render(
            &session,
            "create_table",
            json!({ "title": "New table | Mensable", "language": language }),
        )),
        None => {
            session.flash(format!("Language {} does not exist.", path.language_name));
            Ok(redirect(&session, "/languages"))
        }
    }
}

/// Create a new word table to learn
pub async fn create_table(
    data: web::Data<AppState>,
    session: Session,
    path: web::Path<LanguagePath>,
    form: web::Form<TableForm>,
) -> Result<HttpResponse> {
    let user_id = match require_login(&session) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    let language = match data.repo.find_language_by_name(&path.language_name)? {
        Some(language) => language,
        None => {
            session.flash(format!("Language {} does not exist.", path.language_name));
            return Ok(redirect(&session, "/languages"));
        }
    };

    let back = format!("/create_table/{}", language.name);
    let name = form.table_name.trim();
    let created = check_table_name(name)
        .and_then(|_| match data.repo.find_table_by_name(name)? {
            Some(_) => Err(MensableError::Validation(format!("Table {} already exists.", name))),
            None => Ok(()),
        })
        .and_then(|_| {
            data.repo
                .create_table(name, user_id, language.id, Local::now().date_naive())
        });

    match created {
        Ok(_) => {}
        Err(MensableError::Validation(message)) => {
            session.flash(message);
            return Ok(redirect(&session, &back));
        }
        Err(e) => return Err(e),
    }

    info!("User {} created table {} in {}", user_id, name, language.name);
    Ok(redirect(&session, &format!("/edit_table/{}/{}", language.name, name)))
}

/// Edit an existing word table
pub async fn edit_table(
    data: web::Data<AppState>,
    session: Session,
    path: web::Path<TablePath>,
) -> Result<HttpResponse> {
    let user_id = match require_login(&session) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };
    let (language, table) = match editable_table(&data, &session, &path, user_id)? {
        Ok(found) => found,
        Err(response) => return Ok(response),
    };

    let words = data.repo.table_word_pairs(table.id)?;
    let context = json!({
        "title": format!("Edit {} | Mensable", table.name),
        "language": language,
        "table": table,
        "words": words,
    });
    Ok(render(&session, "edit_table", context))
}

/// Add one word pair typed into the editor
pub async fn add_word(
    data: web::Data<AppState>,
    session: Session,
    path: web::Path<TablePath>,
    form: web::Form<WordPairForm>,
) -> Result<HttpResponse> {
    let user_id = match require_login(&session) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };
    let (language, table) = match editable_table(&data, &session, &path, user_id)? {
        Ok(found) => found,
        Err(response) => return Ok(response),
    };

    let (foreign_word, translation) = match clean_word_pair(&form.foreign_word, &form.translation) {
        Ok(pair) => pair,
        Err(MensableError::Validation(message)) => {
            session.flash(message);
            return Ok(redirect(&session, &path.edit_url()));
        }
        Err(e) => return Err(e),
    };

    match data
        .repo
        .add_word_pair(table.id, language.id, &foreign_word, &translation)?
    {
        AddWordOutcome::Created(_) => {}
        AddWordOutcome::Linked(_) => session.flash(format!(
            "{} was already known in {} and has been added to this table.",
            foreign_word, language.name
        )),
        AddWordOutcome::AlreadyInTable(_) => {
            session.flash(format!("{} is already in this table.", foreign_word))
        }
    }

    Ok(redirect(&session, &path.edit_url()))
}

/// Take a word out of a table
pub async fn delete_word(
    data: web::Data<AppState>,
    session: Session,
    path: web::Path<TablePath>,
    form: web::Form<DeleteWordForm>,
) -> Result<HttpResponse> {
    let user_id = match require_login(&session) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };
    let (_, table) = match editable_table(&data, &session, &path, user_id)? {
        Ok(found) => found,
        Err(response) => return Ok(response),
    };

    if !data.repo.remove_word_from_table(table.id, form.word_pair_id)? {
        session.flash("That word is not in this table.");
    }
    Ok(redirect(&session, &path.edit_url()))
}

/// Import a two-column word list into a table
pub async fn upload_table(
    data: web::Data<AppState>,
    session: Session,
    path: web::Path<TablePath>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let user_id = match require_login(&session) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };
    let (language, table) = match editable_table(&data, &session, &path, user_id)? {
        Ok(found) => found,
        Err(response) => return Ok(response),
    };

    let text = match read_upload(payload).await.and_then(|bytes| {
        String::from_utf8(bytes)
            .map_err(|_| MensableError::Validation("Word lists must be UTF-8 text.".to_string()))
    }) {
        Ok(text) => text,
        Err(MensableError::Validation(message)) => {
            session.flash(message);
            return Ok(redirect(&session, &path.edit_url()));
        }
        Err(e) => return Err(e),
    };

    let parsed = parse_word_list(&text);
    let mut summary = data.repo.import_word_pairs(table.id, language.id, &parsed.rows)?;
    summary.skipped = parsed.skipped;
    info!("Imported word list into {}: {:?}", table.name, summary);

    session.flash(format!(
        "Imported {} new word pairs, {} already known in {}, {} already in the table, {} rows skipped.",
        summary.created, summary.linked, language.name, summary.already_in_table, summary.skipped
    ));
    Ok(redirect(&session, &path.edit_url()))
}

/// Read the `file` field of a multipart upload
async fn read_upload(mut payload: Multipart) -> Result<Vec<u8>> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| MensableError::Upload(e.to_string()))?;
        let is_file = field.content_disposition().get_name() == Some("file");

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| MensableError::Upload(e.to_string()))?;
            if !is_file {
                continue;
            }
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(MensableError::Validation("That file is too large to import.".to_string()));
            }
            bytes.extend_from_slice(&chunk);
        }

        if is_file {
            return Ok(bytes);
        }
    }

    Err(MensableError::Validation("Please choose a file to upload.".to_string()))
}

/// View an existing word table
pub async fn view_table(
    data: web::Data<AppState>,
    session: Session,
    path: web::Path<TablePath>,
) -> Result<HttpResponse> {
    let user_id = match require_login(&session) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };
    let (language, table) = match find_table(&data, &path)? {
        Some(found) => found,
        None => return Ok(missing_table(&session, &path)),
    };

    let words = data.repo.table_word_pairs(table.id)?;
    if words.is_empty() {
        session.flash(format!("Table {} is empty, try editing it here.", table.name));
        return Ok(redirect(&session, &path.edit_url()));
    }

    let subscribed = data.repo.find_subscription(user_id, table.id)?.is_some();
    let context = json!({
        "title": format!("{} | Mensable", table.name),
        "language": language,
        "is_owner": table.creator_id == user_id,
        "subscribed": subscribed,
        "table": table,
        "words": words,
    });
    Ok(render(&session, "view_table", context))
}
