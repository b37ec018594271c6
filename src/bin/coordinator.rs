use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

use hrleave::config::Config;
use hrleave::coordinator::balance::{BalanceAuthority, MySqlBalanceAuthority};
use hrleave::db::init_db;
use hrleave::docs::ApiDoc;
use hrleave::routes;
use hrleave::rpc::client::LedgerClient;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Leave workflow coordinator"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "coordinator.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .pretty()
        .init();

    info!("Coordinator starting...");

    let pool = init_db(&config.database_url).await;

    let ledger = LedgerClient::new(
        &config.ledger_url,
        Duration::from_secs(config.rpc_timeout_secs),
    );
    let balance: Arc<dyn BalanceAuthority> = Arc::new(MySqlBalanceAuthority::new(pool));
    let balance_data = Data::from(balance);

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(ledger.clone()))
            .app_data(balance_data.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind coordinator to {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
