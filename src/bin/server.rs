use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rusty_warden::auth::AuthGateway;
use rusty_warden::clock::system_clock;
use rusty_warden::config::ServerConfig;
use rusty_warden::handlers::routes;
use rusty_warden::security_logger::{init_security_logger, log_security_event, SecurityEvent};
use rusty_warden::storage::{
    MemoryIdentityStore, MemoryRevocationStore, SeedData, SharedIdentityStore,
    SharedRevocationStore,
};

const REVOCATION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);
const IDENTITY_CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() {
    // Initialize env
    let dotenv_result = dotenvy::dotenv();

    // Initialize logging
    env_logger::init();

    match dotenv_result {
        Ok(path) => info!("Environment variables loaded from {}", path.display()),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    init_security_logger();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            log_security_event(SecurityEvent::ConfigurationError {
                component: "server".to_string(),
                error: e.to_string(),
            })
            .await;
            std::process::exit(1);
        }
    };

    info!(
        "Configuration: host={}, port={}, token_ttl={}s, cache_ttl={}s, default_permissions={}",
        config.host,
        config.port,
        config.access_token_ttl.as_secs(),
        config.identity_cache_ttl.as_secs(),
        config.default_permissions.len()
    );
    if config.development_mode {
        warn!("Development mode is enabled; do not run this configuration in production");
    }

    let clock = system_clock();

    let identity_store = Arc::new(MemoryIdentityStore::new());
    if let Some(seed_file) = &config.seed_file {
        let seeded = match SeedData::load_from_file(seed_file) {
            Ok(seed) => seed.apply(identity_store.as_ref()).await,
            Err(e) => Err(e),
        };
        match seeded {
            Ok(report) => info!(
                "Seed applied: {} roles created ({} skipped), {} users created ({} skipped)",
                report.roles_created,
                report.roles_skipped,
                report.users_created,
                report.users_skipped
            ),
            Err(e) => {
                error!("Failed to apply seed file {}: {}", seed_file.display(), e);
                std::process::exit(1);
            }
        }
    }
    let identity_store: SharedIdentityStore = identity_store;

    let revocation_store = build_revocation_store(&config, &clock).await;

    let gateway = Arc::new(AuthGateway::from_config(
        &config,
        identity_store.clone(),
        revocation_store,
        clock,
    ));

    let purge_gateway = gateway.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(IDENTITY_CACHE_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = purge_gateway.identities().purge_expired().await;
            if purged > 0 {
                info!("Purged {} expired identity cache entries", purged);
            }
        }
    });

    let routes = routes(gateway, identity_store);

    // Build the server address
    let addr: SocketAddr = match config.bind_address().parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    match (config.enable_tls, &config.tls_cert_path, &config.tls_key_path) {
        (true, Some(cert_path), Some(key_path)) => {
            info!("Starting Rusty Warden on https://{}", addr);
            warp::serve(routes)
                .tls()
                .cert_path(cert_path)
                .key_path(key_path)
                .run(addr)
                .await;
        }
        _ => {
            info!("Starting Rusty Warden on http://{}", addr);
            warp::serve(routes).run(addr).await;
        }
    }
}

#[cfg(feature = "redis-store")]
async fn build_revocation_store(
    config: &ServerConfig,
    clock: &rusty_warden::clock::SharedClock,
) -> SharedRevocationStore {
    if let Some(redis_url) = &config.redis_url {
        match rusty_warden::storage::RedisRevocationStore::connect(redis_url).await {
            Ok(store) => return Arc::new(store),
            Err(e) => {
                error!("Failed to connect to the revocation store: {}", e);
                std::process::exit(1);
            }
        }
    }
    memory_revocation_store(clock)
}

#[cfg(not(feature = "redis-store"))]
async fn build_revocation_store(
    config: &ServerConfig,
    clock: &rusty_warden::clock::SharedClock,
) -> SharedRevocationStore {
    if config.redis_url.is_some() {
        warn!("RUSTY_WARDEN_REDIS_URL is set but the redis-store feature is disabled; revocations stay local to this instance");
    }
    memory_revocation_store(clock)
}

fn memory_revocation_store(clock: &rusty_warden::clock::SharedClock) -> SharedRevocationStore {
    let store = Arc::new(MemoryRevocationStore::new(clock.clone()));
    store.clone().start_cleanup_task(REVOCATION_CLEANUP_INTERVAL);
    store
}
