use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get, web};
use anyhow::Context;
use dotenvy::dotenv;

use hrleave::config::Config;
use hrleave::db::init_db;
use hrleave::ledger::handlers::{self, MySqlLedgerService};
use hrleave::ledger::service::LedgerService;
use hrleave::ledger::store::MySqlLeaveStore;
use tracing::info;
use tracing_appender::rolling;

#[get("/")]
async fn index() -> impl Responder {
    "Leave ledger"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "ledger.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .pretty()
        .init();

    info!("Ledger starting...");

    let pool = init_db(&config.database_url).await;
    let service: MySqlLedgerService =
        LedgerService::new(MySqlLeaveStore::new(pool), &config.link_base_url);
    let service_data = Data::new(service);

    let ledger_addr = config.ledger_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .app_data(service_data.clone())
            .service(index)
            .route("/rpc", web::post().to(handlers::dispatch))
    })
    .bind(&ledger_addr)
    .with_context(|| format!("Failed to bind ledger to {ledger_addr}"))?
    .run()
    .await?;

    Ok(())
}
