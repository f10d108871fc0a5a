use actix_files as fs;
use actix_web::{middleware, web, App, HttpServer};
use log::info;

use crate::config::Config;
use crate::core::answer::AnswerChecker;
use crate::storage::Repository;
use crate::web::handlers;
use crate::web::session::SessionStore;

/// Start the web server for the Mensable UI
pub async fn start_web_server(config: Config, repo: Repository) -> std::io::Result<()> {
    let address = config.bind_address();
    info!("Starting web server on http://{}", address);

    let app_state = web::Data::new(AppState::new(config, repo));

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(configure_routes)
            // Default route for 404
            .default_service(web::route().to(handlers::pages::not_found))
    })
    .bind(address)?
    .run()
    .await
}

/// Register every page route and the static files
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Static files
        .service(fs::Files::new("/static", "./src/web/static"))
        // Account routes
        .route("/", web::get().to(handlers::pages::home))
        .route("/login", web::get().to(handlers::auth::login_form))
        .route("/login", web::post().to(handlers::auth::login))
        .route("/register", web::get().to(handlers::auth::register_form))
        .route("/register", web::post().to(handlers::auth::register))
        .route("/logout", web::get().to(handlers::auth::logout))
        // Languages
        .route("/languages", web::get().to(handlers::languages::languages))
        .route("/create_language", web::get().to(handlers::languages::create_language_form))
        .route("/create_language", web::post().to(handlers::languages::create_language))
        // Tables and their words
        .route("/tables", web::get().to(handlers::tables::all_tables))
        .route("/tables/{language_name}", web::get().to(handlers::tables::language_tables))
        .route("/create_table/{language_name}", web::get().to(handlers::tables::create_table_form))
        .route("/create_table/{language_name}", web::post().to(handlers::tables::create_table))
        .route("/edit_table/{language_name}/{table_name}", web::get().to(handlers::tables::edit_table))
        .route("/edit_table/{language_name}/{table_name}", web::post().to(handlers::tables::add_word))
        .route("/delete_word/{language_name}/{table_name}", web::post().to(handlers::tables::delete_word))
        .route("/upload_table/{language_name}/{table_name}", web::post().to(handlers::tables::upload_table))
        .route("/view_table/{language_name}/{table_name}", web::get().to(handlers::tables::view_table))
        // Quizzes
        .route("/quiz/{language_name}/{table_name}", web::get().to(handlers::quiz::question))
        .route("/quiz/{language_name}/{table_name}", web::post().to(handlers::quiz::answer))
        .route("/quiz_results/{language_name}/{table_name}", web::get().to(handlers::quiz::results))
        .route("/unsubscribe/{language_name}/{table_name}", web::post().to(handlers::quiz::unsubscribe));
}

/// Shared application state for web handlers
pub struct AppState {
    pub repo: Repository,
    pub sessions: SessionStore,
    pub checker: AnswerChecker,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, repo: Repository) -> Self {
        Self {
            sessions: SessionStore::new(config.session_idle_minutes),
            checker: AnswerChecker::new(config.answer_tolerance),
            repo,
            config,
        }
    }
}
