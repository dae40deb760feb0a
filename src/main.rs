use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use env_logger::Env;
use log::info;

use posts_backend::database::connect_to_mongo;
use posts_backend::middleware::not_found::not_found;
use posts_backend::post::post_repository::MongoPostStore;
use posts_backend::post::post_service::PostService;
use posts_backend::post::post_store::{InMemoryPostStore, PostStore};
use posts_backend::router::index::routes;
use posts_backend::utils::config::{AppConfig, StoreBackend};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logger with environment variable support
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    let store: Arc<dyn PostStore> = match config.store_backend {
        StoreBackend::Mongo => {
            let client = connect_to_mongo(&config)
                .await
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            Arc::new(MongoPostStore::new(&client, &config.mongodb_database))
        }
        StoreBackend::Memory => {
            info!("Using in-memory post store");
            Arc::new(InMemoryPostStore::new())
        }
    };
    let post_service = web::Data::new(PostService::new(store));

    info!("Starting server on http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(post_service.clone())
            .configure(routes)
            .wrap(ErrorHandlers::new().handler(StatusCode::NOT_FOUND, not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    // Log after server has started (this line will only be reached when the server shuts down)
    info!("Server has stopped");

    Ok(())
}
