//! Fisiopay Server CLI
//!
//! Starts the HTTP server for payment-document processing.

use fisiopay_server::{config::ServerConfig, start_server, ServerError};
use std::env;
use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();

    let config = if args.len() > 2 && args[1] == "--config" {
        // Load from specified config file
        let config_path = &args[2];
        ServerConfig::from_file(config_path)?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        process::exit(0);
    } else {
        eprintln!("Warning: No config file specified, using default test configuration");
        eprintln!("Usage: fisiopay-server --config <path-to-config.toml>");
        eprintln!();
        ServerConfig::default_test_config()
    };

    start_server(config).await?;

    Ok(())
}

fn print_help() {
    println!("Fisiopay Server - Payment Document Processing");
    println!();
    println!("USAGE:");
    println!("    fisiopay-server --config <path-to-config.toml>");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("EXAMPLE:");
    println!("    fisiopay-server --config config/server.toml");
    println!();
    println!("CONFIGURATION:");
    println!("    The TOML config file may contain:");
    println!("    - bind_address: IP address to bind (default '127.0.0.1')");
    println!("    - bind_port: Port number (default 8080)");
    println!("    - uploads_root: Directory for stored payment documents");
    println!("    - [sandbox]: worker_path and timeout_secs for PDF text extraction");
    println!("    - [extractor]: rules table mapping invoice labels to fields");
    println!("    - [[physiotherapists]]: roster entries (id, name, email, contract_type)");
    println!();
}
