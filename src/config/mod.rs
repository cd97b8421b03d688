use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub name: Option<String>,
    pub url: String,
}

/// The connected account, if any. Without one the submit action stays
/// blocked; without a `sign_command` submission fails at the signing seam.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub address: String,
    pub sign_command: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    pub account: Option<AccountConfig>,
}

pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    match toml::from_str::<Config>(&content) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("ignoring malformed config at {}: {err}", path.display());
            Config::default()
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("RELAYCODE_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("relaycode").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("relaycode").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "relaycode", "relaycode")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

impl EndpointConfig {
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => format!("{name} ({})", self.url),
            _ => self.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config() {
        let config: Config = toml::from_str(
            r#"
            [[endpoints]]
            name = "polkadot"
            url = "wss://rpc.polkadot.io"

            [[endpoints]]
            url = "http://localhost:9933"

            [account]
            address = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"
            sign_command = "my-signer --suri-file ~/.keys/alice"
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(
            config.endpoints[0].label(),
            "polkadot (wss://rpc.polkadot.io)"
        );
        assert_eq!(config.endpoints[1].label(), "http://localhost:9933");
        let account = config.account.unwrap();
        assert!(account.sign_command.is_some());
    }

    #[test]
    fn empty_config_is_fine() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.endpoints.is_empty());
        assert!(config.account.is_none());
    }
}
