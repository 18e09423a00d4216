mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use catalog_review::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
