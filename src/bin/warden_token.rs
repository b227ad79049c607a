//! Issue a signed access token for local testing and operations

use clap::Parser;
use std::time::Duration;

use rusty_warden::auth::TokenManager;
use rusty_warden::config::ServerConfig;
use rusty_warden::constants::DEFAULT_ACCESS_TOKEN_TTL_SECS;

#[derive(Debug, Parser)]
#[command(name = "warden-token", version, about = "Issue a bearer token signed with the gateway secret")]
struct Cli {
    /// Subject of the token (identity store user id)
    #[arg(long)]
    user_id: String,

    /// Username to embed in the claims
    #[arg(long)]
    username: Option<String>,

    /// Token lifetime in seconds
    #[arg(long, default_value_t = DEFAULT_ACCESS_TOKEN_TTL_SECS)]
    ttl_secs: u64,

    /// Print the claims as JSON alongside the token
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let _ = dotenvy::dotenv();
    env_logger::init();

    let cli = Cli::parse();

    let secret = match std::env::var("RUSTY_WARDEN_JWT_SECRET").or_else(|_| std::env::var("JWT_SECRET")) {
        Ok(secret) => secret,
        Err(_) => {
            eprintln!("RUSTY_WARDEN_JWT_SECRET (or JWT_SECRET) must be set");
            std::process::exit(2);
        }
    };
    if let Err(e) = ServerConfig::validate_jwt_secret(&secret) {
        eprintln!("{}", e);
        std::process::exit(2);
    }
    if cli.ttl_secs == 0 {
        eprintln!("--ttl-secs must be greater than zero");
        std::process::exit(2);
    }

    let manager = TokenManager::new(&secret).with_access_token_ttl(Duration::from_secs(cli.ttl_secs));
    let issued = match manager.issue(&cli.user_id, cli.username, chrono::Utc::now()) {
        Ok(issued) => issued,
        Err(e) => {
            eprintln!("Failed to issue token: {}", e);
            std::process::exit(1);
        }
    };

    if cli.verbose {
        match serde_json::to_string_pretty(&issued.claims) {
            Ok(claims) => eprintln!("{}", claims),
            Err(e) => log::warn!("Could not render claims: {}", e),
        }
    }
    println!("{}", issued.token);
}
