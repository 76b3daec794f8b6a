use actix_web::middleware::NormalizePath;
use actix_web::{App, HttpServer};
use anyhow::Context;
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use workflow::config::Config;
use workflow::docs::ApiDoc;
use workflow::routes::{self, Limiters};
use workflow::state::AppState;
use workflow::store::Store;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

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

    info!(addr = %config.server_addr, "Server starting...");

    let store = Store::connect(&config.store)
        .await
        .context("failed to connect to the document store")?;
    store.ping().await.context("document store did not answer ping")?;
    info!("Pinged the document store");

    if config.jwt_secret.is_none() {
        error!("No ACCESS_TOKEN_SECRET set: every token operation will fail");
    }

    let limiters = Limiters::from_config(&config)?;
    let state = AppState::new(config.clone(), store.clone());

    let served = HttpServer::new(move || {
        let state = state.clone();
        let limiters = limiters.clone();
        App::new()
            .wrap(routes::cors(&state.config))
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .configure(move |cfg| routes::configure(cfg, &state, &limiters))
    })
    .bind(&config.server_addr)
    .with_context(|| format!("failed to bind {}", config.server_addr))?
    .run()
    .await;

    // actix-web stops on SIGINT/SIGTERM; release the store either way
    store.close().await;
    info!("Server stopped");

    served.context("server error")
}
