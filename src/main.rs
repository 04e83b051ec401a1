use std::sync::Arc;

use dealer_session::config::{load_config, print_schema};
use dealer_session::startup;
use dealer_session::utils::logger::init_logging;
use tracing::error;

#[tokio::main]
async fn main() {
    if std::env::args().skip(1).any(|arg| arg == "--schema") {
        print_schema();
        return;
    }

    let config = load_config();
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Error initializing logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = startup::run(Arc::new(config)).await {
        error!("Server stopped with error: {}", e);
        std::process::exit(1);
    }
}
