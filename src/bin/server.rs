use log::info;
use sqlx::postgres::PgPoolOptions;
use warp::Filter;

use ruokalista_sdk::error::handle_rejection;
use ruokalista_sdk::routes::api::api;
use ruokalista_sdk::Config;

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let pool = match PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("failed to connect to the database: {e}");
            std::process::exit(1);
        }
    };

    let routes = api(pool, &config)
        .recover(handle_rejection)
        .with(warp::log("ruokalista::api"));

    info!("listening on {}", config.bind_addr);
    warp::serve(routes).run(config.bind_addr).await;
}
