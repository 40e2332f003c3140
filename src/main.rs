mod cli;
mod commands;
mod constants;
mod error;
mod models;
mod server;
mod services;
mod worker;

#[tokio::main]
async fn main() {
    cli::run().await;
}
