use std::{env, time::Duration};

use dash_common::{
    helpers::{env_or_default, parse_boolean_flag},
    Secret,
};
use log::*;

use crate::helpers::FeePolicy;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/dash_orders.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_GATEWAY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub fee_policy: FeePolicy,
    /// The bound on every catalog, payment and identity call.
    pub gateway_timeout: Duration,
    pub webhook: WebhookConfig,
    pub event_buffer_size: usize,
}

#[derive(Clone, Debug)]
pub struct WebhookConfig {
    pub secret: Secret<String>,
    /// How far the signed timestamp may be from the current time.
    pub tolerance: chrono::Duration,
    /// If false, payment callbacks are accepted without a signature check. **DANGER**
    pub signature_checks: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: Secret::default(),
            tolerance: chrono::Duration::seconds(DEFAULT_WEBHOOK_TOLERANCE_SECS),
            signature_checks: true,
        }
    }
}

impl WebhookConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { secret: Secret::new(secret.into()), ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let secret = env::var("DASH_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            warn!("🪛️ DASH_WEBHOOK_SECRET is not set. Signed payment callbacks will be rejected.");
            String::default()
        });
        let tolerance =
            chrono::Duration::seconds(env_or_default("DASH_WEBHOOK_TOLERANCE_SECS", DEFAULT_WEBHOOK_TOLERANCE_SECS));
        let signature_checks = parse_boolean_flag(env::var("DASH_WEBHOOK_SIGNATURE_CHECKS").ok(), true);
        if !signature_checks {
            warn!(
                "🚨️ Webhook signature checks are DISABLED. Anyone who can reach the callback endpoint can confirm \
                 payments. Never run with this setting in production."
            );
        }
        Self { secret: Secret::new(secret), tolerance, signature_checks }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            fee_policy: FeePolicy::default(),
            gateway_timeout: Duration::from_millis(DEFAULT_GATEWAY_TIMEOUT_MS),
            webhook: WebhookConfig::default(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env_or_default("DASH_DATABASE_URL", DEFAULT_DATABASE_URL.to_string());
        let max_connections = env_or_default("DASH_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS).max(1);
        let fee_policy = env_or_default("DASH_FEE_POLICY", FeePolicy::default());
        let gateway_timeout =
            Duration::from_millis(env_or_default("DASH_GATEWAY_TIMEOUT_MS", DEFAULT_GATEWAY_TIMEOUT_MS));
        let webhook = WebhookConfig::from_env_or_default();
        let event_buffer_size = env_or_default("DASH_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let result = Self { database_url, max_connections, fee_policy, gateway_timeout, webhook, event_buffer_size };
        debug!("🪛️ Engine configuration: {result:?}");
        result
    }
}
