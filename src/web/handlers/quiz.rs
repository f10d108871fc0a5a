//! Web handlers for Leitner quizzes
//!
//! A quiz lives in the session: starting one draws the question order,
//! every GET shows the pending question and every POST grades it. When the
//! queue runs dry the results go into the learner's subscription.

use actix_web::{web, HttpResponse};
use chrono::Local;
use log::{debug, info};
use serde::Serialize;
use serde_json::json;

use crate::core::error::Result;
use crate::core::models::{Language, Table};
use crate::core::quiz::QuizState;
use crate::web::handlers::pages::{redirect, render, require_login};
use crate::web::handlers::tables::{find_table, missing_table};
use crate::web::models::{AnswerForm, TablePath};
use crate::web::server::AppState;
use crate::web::session::Session;

/// One line of the results page
#[derive(Serialize)]
struct ResultRow {
    foreign_word: String,
    translation: String,
    correct: bool,
    level: u32,
}

/// Show the pending question, starting a quiz first if there is none
pub async fn question(
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

    let mut quiz = match session.quiz().filter(|quiz| quiz.table_id == table.id) {
        Some(quiz) => quiz,
        None => return start_quiz(&data, &session, &path, &table, user_id),
    };

    while let Some(word_id) = quiz.current_or_next() {
        match data.repo.find_table_word_pair(table.id, word_id)? {
            Some(word) => {
                let context = json!({
                    "title": format!("Quiz: {} | Mensable", table.name),
                    "language": language,
                    "table": table,
                    "foreign_word": word.foreign_word,
                    "position": quiz.position(),
                    "total": quiz.total,
                });
                session.set_quiz(quiz);
                return Ok(render(&session, "quiz", context));
            }
            None => {
                debug!("Word pair {} left table {} mid-quiz", word_id, table.id);
                quiz.skip_current();
            }
        }
    }

    finish_quiz(&data, &session, &path, &language, &table, user_id, quiz)
}

/// Draw a new question order and bounce back to the question page
fn start_quiz(
    data: &AppState,
    session: &Session,
    path: &TablePath,
    table: &Table,
    user_id: i64,
) -> Result<HttpResponse> {
    let word_ids = data.repo.table_word_ids(table.id)?;
    if word_ids.is_empty() {
        session.flash(format!("Table {} is empty, add some words before taking a quiz.", table.name));
        return Ok(redirect(session, &path.edit_url()));
    }

    let today = Local::now().date_naive();
    let mut subscription = data.repo.find_or_create_subscription(user_id, table.id, today)?;
    let questions = subscription.prepare_quiz(&word_ids, data.config.quiz_length, &mut rand::thread_rng());
    data.repo.save_subscription(&subscription)?;

    info!("User {} started a {}-question quiz on {}", user_id, questions.len(), table.name);
    session.set_quiz(QuizState::new(table.id, questions));
    Ok(redirect(session, &path.quiz_url()))
}

/// Grade the answer to the pending question
pub async fn answer(
    data: web::Data<AppState>,
    session: Session,
    path: web::Path<TablePath>,
    form: web::Form<AnswerForm>,
) -> Result<HttpResponse> {
    let user_id = match require_login(&session) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };
    let (language, table) = match find_table(&data, &path)? {
        Some(found) => found,
        None => return Ok(missing_table(&session, &path)),
    };

    let mut quiz = match session.quiz().filter(|quiz| quiz.table_id == table.id) {
        Some(quiz) => quiz,
        None => return Ok(redirect(&session, &path.quiz_url())),
    };
    let word_id = match quiz.current {
        Some(id) => id,
        None => return Ok(redirect(&session, &path.quiz_url())),
    };

    match data.repo.find_table_word_pair(table.id, word_id)? {
        Some(word) => {
            let correct = data.checker.is_correct(&form.answer, &word.translation);
            quiz.record_answer(correct);
            if correct {
                session.flash(format!("Correct! {} means {}.", word.foreign_word, word.translation));
            } else {
                session.flash(format!("Incorrect - {} means {}.", word.foreign_word, word.translation));
            }
        }
        None => {
            quiz.skip_current();
            session.flash("That word was removed from the table.");
        }
    }

    if quiz.is_finished() {
        return finish_quiz(&data, &session, &path, &language, &table, user_id, quiz);
    }

    session.set_quiz(quiz);
    Ok(redirect(&session, &path.quiz_url()))
}

/// Move the answered words between boxes and store the scores
fn finish_quiz(
    data: &AppState,
    session: &Session,
    path: &TablePath,
    language: &Language,
    table: &Table,
    user_id: i64,
    quiz: QuizState,
) -> Result<HttpResponse> {
    session.clear_quiz();

    let word_ids = data.repo.table_word_ids(table.id)?;
    if !quiz.results.keys().any(|id| word_ids.contains(id)) {
        session.flash("There were no questions left in this quiz.");
        let location = if word_ids.is_empty() { path.edit_url() } else { path.view_url() };
        return Ok(redirect(session, &location));
    }

    let today = Local::now().date_naive();
    let mut subscription = data.repo.find_or_create_subscription(user_id, table.id, today)?;
    subscription.record_quiz(&word_ids, &quiz.results, today);
    data.repo.save_subscription(&subscription)?;

    info!(
        "User {} finished a quiz on {}/{}: {} of {} right",
        user_id,
        language.name,
        table.name,
        subscription.last_quiz_results.values().filter(|correct| **correct).count(),
        subscription.last_quiz_results.len()
    );
    Ok(redirect(session, &path.results_url()))
}

/// Show the latest quiz results and the running score
pub async fn results(
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

    let subscription = match data.repo.find_subscription(user_id, table.id)? {
        Some(subscription) if subscription.quiz_attempts > 0 => subscription,
        _ => {
            session.flash(format!("You haven't finished a quiz on {} yet.", table.name));
            return Ok(redirect(&session, &path.view_url()));
        }
    };

    let rows: Vec<ResultRow> = data
        .repo
        .table_word_pairs(table.id)?
        .into_iter()
        .filter_map(|word| {
            let correct = *subscription.last_quiz_results.get(&word.id)?;
            Some(ResultRow {
                level: subscription.leitner_boxes.get(&word.id).copied().unwrap_or(0),
                foreign_word: word.foreign_word,
                translation: word.translation,
                correct,
            })
        })
        .collect();
    let right = rows.iter().filter(|row| row.correct).count();

    let context = json!({
        "title": format!("Results: {} | Mensable", table.name),
        "language": language,
        "table": table,
        "rows": rows,
        "right": right,
        "asked": rows.len(),
        "subscription": subscription,
    });
    Ok(render(&session, "quiz_results", context))
}

/// Stop learning a table: forget its boxes and scores
pub async fn unsubscribe(
    data: web::Data<AppState>,
    session: Session,
    path: web::Path<TablePath>,
) -> Result<HttpResponse> {
    let user_id = match require_login(&session) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };
    let (_, table) = match find_table(&data, &path)? {
        Some(found) => found,
        None => return Ok(missing_table(&session, &path)),
    };

    if session.quiz().map_or(false, |quiz| quiz.table_id == table.id) {
        session.clear_quiz();
    }

    if data.repo.delete_subscription(user_id, table.id)? {
        info!("User {} unsubscribed from {}", user_id, table.name);
        session.flash(format!("Unsubscribed from {}.", table.name));
    } else {
        session.flash(format!("You were not subscribed to {}.", table.name));
    }
    Ok(redirect(&session, "/"))
}
