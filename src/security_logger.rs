//! Security-focused logging module to track authorization events

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Types of security events to track
#[derive(Debug, Clone)]
pub enum SecurityEvent {
    // Authentication events
    AuthenticationFailed { user_id: Option<String>, token: Option<String>, reason: String },
    AuthenticationSuccess { user_id: String },
    RevokedTokenPresented { token: String },
    TokenRevoked { user_id: String, token: String },

    // Authorization events
    PermissionDenied { user_id: String, required: Vec<String> },

    // Backend health
    StoreUnavailable { store: String, error: String },

    // System security
    ConfigurationError { component: String, error: String },
}

impl SecurityEvent {
    /// Event key for tracking
    pub fn key(&self) -> &'static str {
        match self {
            SecurityEvent::AuthenticationFailed { .. } => "auth_failed",
            SecurityEvent::AuthenticationSuccess { .. } => "auth_success",
            SecurityEvent::RevokedTokenPresented { .. } => "revoked_token_presented",
            SecurityEvent::TokenRevoked { .. } => "token_revoked",
            SecurityEvent::PermissionDenied { .. } => "permission_denied",
            SecurityEvent::StoreUnavailable { .. } => "store_unavailable",
            SecurityEvent::ConfigurationError { .. } => "config_error",
        }
    }
}

/// Security event with timestamp
#[derive(Debug, Clone)]
struct TimestampedEvent {
    event: SecurityEvent,
    timestamp: Instant,
}

/// Security logger for tracking and alerting on security events
pub struct SecurityLogger {
    events: Arc<RwLock<Vec<TimestampedEvent>>>,
    event_counts: Arc<RwLock<HashMap<&'static str, usize>>>,
    max_events: usize,
    alert_thresholds: HashMap<&'static str, usize>,
}

impl SecurityLogger {
    /// Create a new security logger
    pub fn new() -> Self {
        let mut alert_thresholds = HashMap::new();
        // Authentication
        alert_thresholds.insert("auth_failed", 20);
        alert_thresholds.insert("revoked_token_presented", 5);

        // Authorization
        alert_thresholds.insert("permission_denied", 20);

        // Backends and configuration
        alert_thresholds.insert("store_unavailable", 3);
        alert_thresholds.insert("config_error", 1);

        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            event_counts: Arc::new(RwLock::new(HashMap::new())),
            max_events: 10000,
            alert_thresholds,
        }
    }

    /// Log a security event
    pub async fn log_event(&self, event: SecurityEvent) {
        let event_key = event.key();

        {
            let mut events = self.events.write().await;
            events.push(TimestampedEvent {
                event: event.clone(),
                timestamp: Instant::now(),
            });

            // Limit memory usage
            if events.len() > self.max_events {
                let events_to_remove = events.len() - self.max_events;
                events.drain(0..events_to_remove);
            }
        }

        // Update counters and check for alerts
        {
            let mut counts = self.event_counts.write().await;
            let count = counts.entry(event_key).or_insert(0);
            *count += 1;

            if let Some(&threshold) = self.alert_thresholds.get(event_key) {
                if *count >= threshold {
                    self.trigger_alert(event_key, *count, &event);
                    *count = 0;
                }
            }
        }

        match event {
            SecurityEvent::AuthenticationFailed { user_id, token, reason } => {
                log::warn!("SECURITY: Authentication failed - User: {:?}, Token: {:?}, Reason: {}", user_id, token, reason);
            }
            SecurityEvent::AuthenticationSuccess { user_id } => {
                log::debug!("SECURITY: Authentication success - User: {}", user_id);
            }
            SecurityEvent::RevokedTokenPresented { token } => {
                log::warn!("SECURITY: Revoked token presented - Token: {}", token);
            }
            SecurityEvent::TokenRevoked { user_id, token } => {
                log::info!("SECURITY: Token revoked - User: {}, Token: {}", user_id, token);
            }
            SecurityEvent::PermissionDenied { user_id, required } => {
                log::warn!("SECURITY: Permission denied - User: {}, Required any of: {:?}", user_id, required);
            }
            SecurityEvent::StoreUnavailable { store, error } => {
                log::error!("SECURITY: Store unavailable, request denied - Store: {}, Error: {}", store, error);
            }
            SecurityEvent::ConfigurationError { component, error } => {
                log::error!("SECURITY: Configuration error - Component: {}, Error: {}", component, error);
            }
        }
    }

    fn trigger_alert(&self, event_type: &str, count: usize, sample_event: &SecurityEvent) {
        log::error!("SECURITY ALERT: {} events of type '{}' detected", count, event_type);
        log::error!("Sample event: {:?}", sample_event);
    }

    /// Get recent security events
    pub async fn get_recent_events(&self, duration: Duration) -> Vec<SecurityEvent> {
        let events = self.events.read().await;
        let Some(cutoff) = Instant::now().checked_sub(duration) else {
            return events.iter().map(|e| e.event.clone()).collect();
        };

        events
            .iter()
            .filter(|event| event.timestamp > cutoff)
            .map(|event| event.event.clone())
            .collect()
    }

    /// Counts since the last alert for each event kind
    pub async fn get_event_stats(&self) -> HashMap<&'static str, usize> {
        self.event_counts.read().await.clone()
    }

    /// Clean up old events
    pub async fn cleanup_old_events(&self, max_age: Duration) {
        let Some(cutoff) = Instant::now().checked_sub(max_age) else {
            return;
        };
        self.events.write().await.retain(|event| event.timestamp > cutoff);
    }

    /// Start periodic cleanup task
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                self.cleanup_old_events(Duration::from_secs(3600 * 24)).await;
            }
        });
    }
}

impl Default for SecurityLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Global security logger instance
static SECURITY_LOGGER: OnceLock<Arc<SecurityLogger>> = OnceLock::new();

/// Initialize the global security logger; must run inside a tokio runtime
pub fn init_security_logger() {
    SECURITY_LOGGER.get_or_init(|| {
        let logger = Arc::new(SecurityLogger::new());
        logger.clone().start_cleanup_task();
        logger
    });
}

/// Get the global security logger
pub fn get_security_logger() -> Option<Arc<SecurityLogger>> {
    SECURITY_LOGGER.get().cloned()
}

/// Log a security event using the global logger.
///
/// Without an initialized logger the event still reaches the `log` facade.
pub async fn log_security_event(event: SecurityEvent) {
    match get_security_logger() {
        Some(logger) => logger.log_event(event).await,
        None => log::debug!("SECURITY: {:?}", event),
    }
}
