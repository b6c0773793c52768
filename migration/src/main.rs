//! `migration up|down|fresh|status` for the Fukuoka schema. Reads `DATABASE_URL`.

use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    if dotenvy::dotenv().is_err() {
        eprintln!("No .env file found, using the process environment");
    }
    cli::run_cli(migration::Migrator).await;
}
