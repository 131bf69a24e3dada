use config::ConfigError;
use serde::Deserialize;
use std::time::Duration;

use adapter::{rest::RestClientConfig, AuthClientCredentials, ReaderLimits};

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub api: ApiSettings,
    pub database: DatabaseSettings,
    pub reader: ReaderSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApiSettings {
    pub base_url: String,
    // 为空时以匿名身份访问公开接口
    pub access_token: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ReaderSettings {
    pub page_size: u32,
    pub max_posts_per_feed: u32,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        Self::load(&run_mode, config::Environment::with_prefix("WPCLIENT"))
    }

    fn load(run_mode: &str, env: config::Environment) -> Result<Self, ConfigError> {
        let s = config::Config::builder()
            .set_default("api.base_url", adapter::rest::DEFAULT_BASE_URL)?
            .set_default("api.client_id", "")?
            .set_default("api.client_secret", "")?
            .set_default("api.timeout_secs", 30)?
            .set_default("database.url", "sqlite://data/wpclient.db")?
            .set_default("reader.page_size", 20)?
            .set_default("reader.max_posts_per_feed", 200)?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
            .build()?;

        s.try_deserialize()
    }

    pub fn rest_client_config(&self) -> RestClientConfig {
        RestClientConfig {
            base_url: self.api.base_url.clone(),
            access_token: self.api.access_token.clone(),
            timeout: Duration::from_secs(self.api.timeout_secs),
        }
    }

    pub fn credentials(&self) -> AuthClientCredentials {
        AuthClientCredentials {
            client_id: self.api.client_id.clone(),
            client_secret: self.api.client_secret.clone(),
        }
    }

    pub fn reader_limits(&self) -> ReaderLimits {
        ReaderLimits {
            page_size: self.reader.page_size,
            max_posts_per_feed: self.reader.max_posts_per_feed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("WPCLIENT").source(Some(source))
    }

    #[test]
    fn defaults_cover_every_section() {
        let s = Settings::load("test", env(&[])).unwrap();
        assert_eq!(s.api.base_url, adapter::rest::DEFAULT_BASE_URL);
        assert_eq!(s.api.access_token, None);
        assert_eq!(s.reader.page_size, 20);
        assert_eq!(s.reader.max_posts_per_feed, 200);
    }

    #[test]
    fn prefixed_env_vars_override_nested_keys() {
        let s = Settings::load(
            "test",
            env(&[
                ("WPCLIENT_DATABASE__URL", "sqlite::memory:"),
                ("WPCLIENT_READER__MAX_POSTS_PER_FEED", "50"),
                ("WPCLIENT_API__CLIENT_ID", "11"),
            ]),
        )
        .unwrap();
        assert_eq!(s.database.url, "sqlite::memory:");
        assert_eq!(s.reader_limits().max_posts_per_feed, 50);
        assert_eq!(s.credentials().client_id, "11");
    }
}
