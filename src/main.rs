use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;

use queue_booking::config::Config;
use queue_booking::routes;
use queue_booking::state::AppState;
use queue_booking::upstream::client::ApiClient;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    if dotenv().is_err() {
        info!("no .env file, reading the process environment only");
    }

    let config = Config::from_env()?;
    let api = ApiClient::new(config.api_base.clone(), config.upstream_timeout)?;
    let state = web::Data::new(AppState::new(&config, Arc::new(api)));

    // branches and counts load concurrently while the server starts
    state.references.revalidate();

    info!(
        "serving booking form on {}:{} against {} (slot capacity {})",
        config.bind_addr, config.port, config.api_base, config.slot_capacity
    );

    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes::init))
        .bind((config.bind_addr.as_str(), config.port))?
        .run()
        .await?;

    Ok(())
}
