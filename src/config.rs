//! Client configuration module

use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use crate::checkout::Session;
use crate::domain::pricing::PricingPolicy;
use crate::domain::value_objects::Won;
use crate::services::HttpConfig;

/// Settings shared by every command, read from flags or the environment.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// API gateway base URL
    #[arg(long, env = "LIVEMART_API_URL", default_value = "http://localhost:8080/api", global = true)]
    pub api_url: String,

    /// Bearer token of the signed-in user
    #[arg(long, env = "LIVEMART_ACCESS_TOKEN", hide_env_values = true, global = true)]
    pub access_token: Option<String>,

    /// Id of the signed-in user, required to place orders
    #[arg(long, env = "LIVEMART_USER_ID", global = true)]
    pub user_id: Option<i64>,

    /// Directory holding the persisted cart
    #[arg(long, env = "LIVEMART_CART_DIR", default_value = ".livemart", global = true)]
    pub cart_dir: PathBuf,

    /// Subtotal (won) from which shipping is free
    #[arg(long, env = "LIVEMART_FREE_SHIPPING_THRESHOLD", default_value_t = 50_000, global = true)]
    pub free_shipping_threshold: u64,

    /// Shipping fee (won) below the threshold
    #[arg(long, env = "LIVEMART_FLAT_SHIPPING_FEE", default_value_t = 3_000, global = true)]
    pub flat_shipping_fee: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "LIVEMART_TIMEOUT_SECS", default_value_t = 10, global = true)]
    pub timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,
}

impl Config {
    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            free_shipping_threshold: Won::new(self.free_shipping_threshold),
            flat_shipping_fee: Won::new(self.flat_shipping_fee),
        }
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            base_url: self.api_url.clone(),
            access_token: self.access_token.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn session(&self) -> Option<Session> { self.user_id.map(|user_id| Session { user_id }) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        config: Config,
    }

    #[test]
    fn test_flags_override_defaults() {
        let h = Harness::try_parse_from([
            "livemart-checkout",
            "--api-url", "https://api.livemart.kr/api",
            "--user-id", "42",
            "--free-shipping-threshold", "30000",
            "--timeout-secs", "3",
        ]).unwrap();
        assert_eq!(h.config.pricing_policy().free_shipping_threshold, Won::new(30_000));
        assert_eq!(h.config.pricing_policy().flat_shipping_fee, Won::new(3_000));
        assert_eq!(h.config.http_config().timeout, Duration::from_secs(3));
        assert_eq!(h.config.session(), Some(Session { user_id: 42 }));
    }
}
