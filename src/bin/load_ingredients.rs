use std::path::PathBuf;

use sqlx::postgres::PgPoolOptions;

use ruokalista_sdk::csv_load::load_ingredients;
use ruokalista_sdk::Config;

/// Loads the two-column ingredient dataset into the database.
/// Usage: load_ingredients <path/to/ingredients.csv>
#[tokio::main]
async fn main() {
    env_logger::init();

    let path: PathBuf = match std::env::args().nth(1) {
        Some(path) => path.into(),
        None => {
            eprintln!("usage: load_ingredients <path/to/ingredients.csv>");
            std::process::exit(2);
        }
    };

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

    match load_ingredients(&path, &pool).await {
        Ok(created) => println!("done, {created} ingredients created"),
        Err(e) => {
            eprintln!("ingredient load failed: {e}");
            std::process::exit(1);
        }
    }
}
