use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub mapkit: MapKitSettings,
    pub imgur: ImgurSettings,
    pub discord: DiscordSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Maps Server API over HTTPS.
    #[default]
    Server,
    /// MapKit JS under a jsdom sandbox.
    Sandbox,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapKitSettings {
    pub team_id: String,
    pub key_id: String,
    /// Defaults to `./AuthKey_<key_id>.p8`.
    pub private_key_path: Option<PathBuf>,
    /// Public domain registered for the key; used as token origin and referrer.
    pub domain: String,
    #[serde(default = "default_snapshot_host")]
    pub snapshot_host: String,
    #[serde(default = "default_maps_api_url")]
    pub maps_api_url: String,
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default = "default_route_timeout_secs")]
    pub route_timeout_secs: u64,
    #[serde(default = "default_node_binary")]
    pub node_binary: String,
}

impl MapKitSettings {
    pub fn private_key_path(&self) -> PathBuf {
        self.private_key_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("./AuthKey_{}.p8", self.key_id)))
    }

    pub fn route_timeout(&self) -> Duration {
        Duration::from_secs(self.route_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImgurSettings {
    pub client_id: String,
    pub album: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscordSettings {
    pub webhook_url: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_snapshot_host() -> String {
    "https://snapshot.apple-mapkit.com".to_string()
}

fn default_maps_api_url() -> String {
    crate::infrastructure::maps_server::DEFAULT_BASE_URL.to_string()
}

fn default_route_timeout_secs() -> u64 {
    30
}

fn default_node_binary() -> String {
    "node".to_string()
}

/// `config/magellan.toml` (optional) overlaid with `MAGELLAN__*` environment variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/magellan").required(false))
        .add_source(config::Environment::with_prefix("MAGELLAN").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [mapkit]
        team_id = "TEAM123456"
        key_id = "KEY7654321"
        domain = "maps.example.org"
        provider = "sandbox"

        [imgur]
        client_id = "cid"

        [discord]
        webhook_url = "https://discord.com/api/webhooks/1/abc"
    "#;

    fn parse(text: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(SAMPLE);
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.mapkit.provider, ProviderKind::Sandbox);
        assert_eq!(config.mapkit.route_timeout(), Duration::from_secs(30));
        assert_eq!(config.mapkit.snapshot_host, "https://snapshot.apple-mapkit.com");
        assert_eq!(
            config.mapkit.private_key_path(),
            PathBuf::from("./AuthKey_KEY7654321.p8")
        );
        assert!(config.imgur.album.is_none());
    }
}
