use actix_web::middleware::{NormalizePath, from_fn};
use actix_web::web::{self, Data};
use actix_web::{App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod routes;
mod store;
mod utils;
mod views;

#[cfg(test)]
mod test_support;

use auth::service::AuthService;
use auth::session::{SessionStore, session_middleware};
use config::Config;
use db::init_store;

use tracing::info;
use tracing_appender::rolling;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env().context("failed to load configuration")?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let store = init_store(&config).await;
    let auth = Data::new(AuthService::new(store.clone()));
    let sessions = SessionStore::from_config(&config);

    let server_addr = config.server_addr.clone();
    info!(addr = %server_addr, store_available = store.is_available(), "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(from_fn(session_middleware))
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .app_data(Data::new(store.clone()))
            .app_data(auth.clone())
            .app_data(Data::new(sessions.clone()))
            .app_data(Data::new(config.clone()))
            .configure(routes::configure)
            .default_service(web::to(routes::not_found))
    })
    .bind(&server_addr)
    .with_context(|| format!("failed to bind {server_addr}"))?
    .run()
    .await
    .context("server terminated with an error")
}
