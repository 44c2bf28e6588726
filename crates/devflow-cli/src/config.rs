//! Layered CLI configuration.
//!
//! Precedence, highest first: command-line flags (and their environment
//! variables, which clap resolves), the JSON config file, then the provider
//! preset.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use devflow::{DeviceConfig, Provider};
use serde::{Deserialize, Serialize};

/// Obtain an `OAuth2` access token with the device authorization grant.
#[derive(Parser, Debug, Default)]
#[command(name = "devflow", version, about)]
pub struct Cli {
    /// Provider preset
    #[arg(short, long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// OAuth client ID
    #[arg(long, env = "DEVFLOW_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret (only for providers that require one)
    #[arg(long, env = "DEVFLOW_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Device authorization endpoint (custom provider)
    #[arg(long)]
    pub auth_url: Option<String>,

    /// Token endpoint (custom provider)
    #[arg(long)]
    pub token_url: Option<String>,

    /// Scope to request; repeat for several
    #[arg(short, long = "scope")]
    pub scopes: Vec<String>,

    /// Extra device authorization parameter as KEY=VALUE; repeat for several
    #[arg(long = "extra", value_parser = parse_key_value)]
    pub extras: Vec<(String, String)>,

    /// Base poll interval in seconds
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Give up once the device code's lifetime has elapsed
    #[arg(long)]
    pub enforce_expiry: bool,

    /// Overall deadline in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Use the blocking client instead of the async one
    #[arg(long)]
    pub blocking: bool,

    /// Open the verification URI in the default browser
    #[arg(long)]
    pub open: bool,

    /// Print the full token as JSON instead of just the access token
    #[arg(long)]
    pub json: bool,

    /// Only print the token
    #[arg(short, long)]
    pub quiet: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, env = "DEVFLOW_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Provider presets selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderArg {
    /// GitHub OAuth apps and GitHub Apps
    Github,
    /// Microsoft identity platform
    Microsoft,
    /// Google limited-input devices
    Google,
    /// Endpoints given by --auth-url and --token-url
    Custom,
}

/// Contents of `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Provider preset.
    pub provider: Option<ProviderArg>,
    /// OAuth client ID.
    pub client_id: Option<String>,
    /// OAuth client secret.
    pub client_secret: Option<String>,
    /// Device authorization endpoint.
    pub auth_url: Option<String>,
    /// Token endpoint.
    pub token_url: Option<String>,
    /// Scopes.
    pub scopes: Vec<String>,
    /// Extra device authorization parameters.
    pub extras: BTreeMap<String, String>,
    /// Base poll interval in seconds.
    pub poll_interval: Option<u64>,
}

/// Default config file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("devflow")
        .join("config.json")
}

/// Loads the config file; a missing default file is not an error.
pub fn load_file(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = explicit.map_or_else(default_config_path, Path::to_path_buf);

    if !path.exists() {
        if explicit.is_some() {
            bail!("config file {} does not exist", path.display());
        }
        tracing::debug!(path = %path.display(), "no config file");
        return Ok(FileConfig::default());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config = serde_json::from_str(&contents)
        .with_context(|| format!("parsing {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Merges flags over the file and builds the library configuration.
pub fn resolve(cli: &Cli, file: FileConfig) -> Result<DeviceConfig> {
    let provider = cli
        .provider
        .or(file.provider)
        .unwrap_or(ProviderArg::Github);

    let Some(client_id) = cli.client_id.clone().or(file.client_id) else {
        bail!("no client ID; pass --client-id or set DEVFLOW_CLIENT_ID");
    };

    let mut config = match provider {
        ProviderArg::Github => DeviceConfig::for_provider(&Provider::github()?, client_id),
        ProviderArg::Microsoft => DeviceConfig::for_provider(&Provider::microsoft()?, client_id),
        ProviderArg::Google => DeviceConfig::for_provider(&Provider::google()?, client_id),
        ProviderArg::Custom => {
            let auth_url = cli.auth_url.clone().or(file.auth_url);
            let token_url = cli.token_url.clone().or(file.token_url);
            let (Some(auth_url), Some(token_url)) = (auth_url, token_url) else {
                bail!("the custom provider needs --auth-url and --token-url");
            };
            DeviceConfig::new(client_id, auth_url, token_url)?
        }
    };

    if !cli.scopes.is_empty() {
        config = config.with_scopes(cli.scopes.iter().cloned());
    } else if !file.scopes.is_empty() {
        config = config.with_scopes(file.scopes);
    }

    if let Some(secret) = cli.client_secret.clone().or(file.client_secret) {
        config = config.with_client_secret(secret);
    }

    let mut extras = file.extras;
    extras.extend(cli.extras.iter().cloned());
    for (name, value) in extras {
        config = config.with_extra(name, value);
    }

    if let Some(secs) = cli.poll_interval.or(file.poll_interval) {
        config = config.with_poll_interval(secs);
    }

    config = config.with_expiry_enforcement(cli.enforce_expiry);
    config.validate()?;
    Ok(config)
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("devflow").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_github_default_provider() {
        let cli = cli(&["--client-id", "Iv1.abc", "-s", "repo", "-s", "gist"]);
        let config = resolve(&cli, FileConfig::default()).unwrap();

        assert_eq!(config.auth_url.as_str(), devflow::provider::GITHUB_DEVICE_AUTH_URL);
        assert_eq!(config.scopes, vec!["repo".to_string(), "gist".to_string()]);
        assert!(!config.enforce_expiry);
    }

    #[test]
    fn test_flags_override_file() {
        let file = FileConfig {
            provider: Some(ProviderArg::Microsoft),
            client_id: Some("from-file".to_string()),
            scopes: vec!["User.Read".to_string()],
            poll_interval: Some(9),
            ..FileConfig::default()
        };
        let cli = cli(&["--client-id", "from-flag", "--poll-interval", "3"]);
        let config = resolve(&cli, file).unwrap();

        assert_eq!(config.client_id, "from-flag");
        assert_eq!(config.scopes, vec!["User.Read".to_string()]);
        assert_eq!(config.poll_interval, 3);
        assert_eq!(config.token_url.as_str(), devflow::provider::MICROSOFT_TOKEN_URL);
    }

    #[test]
    fn test_custom_provider_needs_urls() {
        let cli_args = cli(&["--provider", "custom", "--client-id", "abc"]);
        assert!(resolve(&cli_args, FileConfig::default()).is_err());

        let cli_args = cli(&[
            "--provider",
            "custom",
            "--client-id",
            "abc",
            "--auth-url",
            "https://idp.example.com/device",
            "--token-url",
            "https://idp.example.com/token",
            "--extra",
            "audience=api",
        ]);
        let config = resolve(&cli_args, FileConfig::default()).unwrap();
        assert_eq!(config.extras, vec![("audience".to_string(), "api".to_string())]);
    }

    #[test]
    fn test_missing_client_id() {
        let cli = Cli::default();
        let err = resolve(&cli, FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("client ID"));
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("a=b=c").unwrap(),
            ("a".to_string(), "b=c".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_file_config_json() {
        let file: FileConfig = serde_json::from_str(
            r#"{ "provider": "google", "client_id": "gid", "scopes": ["email"], "extras": { "hd": "example.com" } }"#,
        )
        .unwrap();

        assert_eq!(file.provider, Some(ProviderArg::Google));
        assert_eq!(file.extras.get("hd").map(String::as_str), Some("example.com"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        assert!(load_file(Some(Path::new("/nonexistent/devflow.json"))).is_err());
    }
}
