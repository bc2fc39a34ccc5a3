use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, middleware, web};
use chrono::Utc;

use opboard::auth::rate_limit::RateLimiter;
use opboard::config::AppConfig;
use opboard::errors::AppError;
use opboard::handlers::{self, see_other};
use opboard::templates_structs::NotFoundTemplate;
use opboard::{auth, db, realtime, scheduler, storage};

fn session_key(config: &AppConfig) -> Key {
    // Load from SESSION_KEY for sessions that survive restarts
    match config.session_key.as_deref() {
        Some(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Some(val) => {
            log::warn!("SESSION_KEY too short ({} bytes, need 64+), generating random key", val.len());
            Key::generate()
        }
        None => {
            log::warn!("No SESSION_KEY set, generating random key (sessions lost on restart)");
            Key::generate()
        }
    }
}

async fn not_found(req: actix_web::HttpRequest) -> Result<actix_web::HttpResponse, AppError> {
    let body = askama::Template::render(&NotFoundTemplate { path: req.path().to_string() })?;
    Ok(actix_web::HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env();
    let store = db::connect(&config)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    log::info!("Using the {} store", store.backend_name());

    db::seed::seed_if_empty(&store, &config.admin_password, Utc::now())
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    std::fs::create_dir_all(&config.upload_dir)?;

    let conn_map = realtime::new_connection_map();
    scheduler::spawn_scheduler(store.clone(), conn_map.clone(), config.stall_hours);

    let secret_key = session_key(&config);
    let limiter = RateLimiter::new();
    let bind_addr = config.bind_addr.clone();
    let upload_dir = config.upload_dir.clone();
    let config = web::Data::new(config);

    log::info!("Starting server at http://{bind_addr}");

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(
            CookieSessionStore::default(),
            secret_key.clone(),
        )
        .cookie_secure(false)
        .cookie_http_only(true)
        .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(conn_map.clone()))
            .app_data(web::Data::new(limiter.clone()))
            .app_data(config.clone())
            .app_data(web::JsonConfig::default().limit(256 * 1024))
            // Static files and uploaded photos
            .service(actix_files::Files::new("/static", "./static"))
            .service(actix_files::Files::new(storage::PUBLIC_PREFIX, upload_dir.clone()))
            // Legacy REST fallback (bearer token, no session)
            .service(web::scope("/api/v1").configure(handlers::api_v1::configure))
            // Public routes
            .route("/login", web::get().to(handlers::auth_handlers::login_page))
            .route("/login", web::post().to(handlers::auth_handlers::login_submit))
            .route("/", web::get().to(|| async { see_other("/board") }))
            // Protected routes
            .service(
                web::scope("")
                    .wrap(middleware::from_fn(auth::middleware::require_auth))
                    .route("/logout", web::post().to(handlers::auth_handlers::logout))
                    .route("/ws", web::get().to(handlers::ws::ws_connect))
                    .route("/board", web::get().to(handlers::board_handlers::index))
                    // /tasks/new BEFORE /tasks/{id} to avoid routing conflict
                    .route("/tasks/new", web::get().to(handlers::task_handlers::new_form))
                    .route("/tasks", web::post().to(handlers::task_handlers::create))
                    .route("/tasks/{id}", web::get().to(handlers::task_handlers::detail))
                    .route("/tasks/{id}", web::post().to(handlers::task_handlers::update))
                    .route("/tasks/{id}/edit", web::get().to(handlers::task_handlers::edit_form))
                    .route("/tasks/{id}/move", web::post().to(handlers::task_handlers::move_task))
                    .route("/tasks/{id}/delete", web::post().to(handlers::task_handlers::delete))
                    .service(
                        web::resource("/tasks/{id}/photo")
                            .app_data(web::PayloadConfig::new(storage::MAX_UPLOAD_BYTES))
                            .route(web::post().to(handlers::task_handlers::upload_photo)),
                    )
                    .route("/activity", web::get().to(handlers::activity_handlers::list))
                    .route("/team", web::get().to(handlers::team_handlers::list))
                    .route("/team", web::post().to(handlers::team_handlers::create))
                    .route("/stats", web::get().to(handlers::stats_handlers::index))
                    .route("/chat", web::get().to(handlers::chat_handlers::index))
                    .route("/chat", web::post().to(handlers::chat_handlers::post))
                    .route("/notifications", web::get().to(handlers::notification_handlers::list))
                    .route("/notifications/read-all", web::post().to(handlers::notification_handlers::mark_all_read))
                    .route("/notifications/{id}/read", web::post().to(handlers::notification_handlers::mark_read))
                    .route("/assistant", web::get().to(handlers::assistant_handlers::page))
                    .route("/assistant", web::post().to(handlers::assistant_handlers::ask)),
            )
            // Default 404 handler (must be registered last)
            .default_service(web::to(not_found))
    })
    .bind(bind_addr)?
    .run()
    .await
}
