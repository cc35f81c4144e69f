use actix_web::{web, App, HttpServer, middleware::Logger};
use actix_web::http::header;
use actix_cors::Cors;
use todo_server::{AppState, Settings, AppError, AUTH_HEADER};
use todo_server::config::CorsConfig;
use dotenv::dotenv;
use std::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn build_cors(config: &CorsConfig) -> Cors {
    if !config.enabled {
        // CORS disabled - use most restrictive settings
        return Cors::default();
    }

    let cors = if config.allow_any_origin {
        Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
    } else {
        config
            .origins()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE"])
            .allowed_headers(vec![header::CONTENT_TYPE])
            .allowed_header(AUTH_HEADER)
    };

    cors.expose_headers(vec![AUTH_HEADER])
        .max_age(config.max_age as usize)
}

#[actix_web::main]
async fn main() -> todo_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully ({} environment)", config.environment);

    let state = AppState::new(config.clone()).await?;
    let data = web::Data::new(state.clone());

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    info!("Starting server at http://{}:{}", config.server.host, config.server.port);

    let cors_config = config.cors.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&cors_config))
            .wrap(Logger::default())
            .app_data(data.clone())
            .configure(todo_server::configure)
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    state.shutdown().await;
    info!("Server stopped");
    Ok(())
}
