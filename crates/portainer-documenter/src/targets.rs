//! Target registry: turns configured hosts into a validated list of [`Target`]s.

use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

/// Name given to a legacy single-target configuration without an explicit name.
pub const DEFAULT_TARGET_NAME: &str = "default";

/// Credentials for one Portainer instance.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// API access token sent on every request.
    Token(String),
    /// Exchanged for a session JWT before collection.
    Basic { username: String, password: String },
}

impl Auth {
    /// `"token"` or `"basic"`, safe to log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Token(_) => "token",
            Self::Basic { .. } => "basic",
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(***)"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

/// One remote instance to document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    name: String,
    base_url: Url,
    auth: Auth,
}

impl Target {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Base URL without a trailing slash, for joining API paths.
    pub fn api_root(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }
}

/// Raw, unvalidated target fields as they appear in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "base_url")]
    pub url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// The two accepted configuration shapes, resolved once by [`load_targets`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetsSource {
    /// Explicit list of target objects.
    Many(Vec<TargetConfig>),
    /// Flat single-target fields.
    Legacy(TargetConfig),
}

impl TargetsSource {
    /// Parses a JSON array of target objects.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw)
            .map(Self::Many)
            .map_err(|e| ConfigError::InvalidTargetList(e.to_string()))
    }
}

/// Validates and normalizes configured targets.
///
/// Fails on an empty list, an invalid URL, ambiguous or missing credentials,
/// an unsafe name, or a duplicate name. Nothing here touches the network.
pub fn load_targets(source: TargetsSource) -> Result<Vec<Target>, ConfigError> {
    let configs = match source {
        TargetsSource::Many(configs) => configs,
        TargetsSource::Legacy(mut config) => {
            if non_empty(&config.name).is_none() {
                config.name = Some(DEFAULT_TARGET_NAME.to_string());
            }
            vec![config]
        }
    };

    if configs.is_empty() {
        return Err(ConfigError::NoTargets);
    }

    let mut seen = HashSet::new();
    let mut targets = Vec::with_capacity(configs.len());
    for (index, config) in configs.into_iter().enumerate() {
        let target = validate(index, config)?;
        if !seen.insert(target.name.clone()) {
            return Err(ConfigError::DuplicateTarget(target.name));
        }
        targets.push(target);
    }
    Ok(targets)
}

fn validate(index: usize, config: TargetConfig) -> Result<Target, ConfigError> {
    let Some(name) = non_empty(&config.name) else {
        return Err(ConfigError::InvalidTarget {
            name: format!("#{}", index + 1),
            reason: "name is required".to_string(),
        });
    };
    let invalid = |reason: String| ConfigError::InvalidTarget {
        name: name.clone(),
        reason,
    };

    if !is_filesystem_safe(&name) {
        return Err(invalid(
            "name may only contain ASCII letters, digits, '-', '_' and '.'".to_string(),
        ));
    }

    let raw_url = non_empty(&config.url).ok_or_else(|| invalid("url is required".to_string()))?;
    let base_url = Url::parse(&raw_url).map_err(|e| invalid(format!("invalid url '{raw_url}': {e}")))?;
    if !matches!(base_url.scheme(), "http" | "https") || base_url.host_str().is_none() {
        return Err(invalid(format!("url '{raw_url}' must be an http(s) address")));
    }

    let token = credential(config.token);
    let username = credential(config.username);
    let password = credential(config.password);
    let auth = match (token, username, password) {
        (Some(token), None, None) => Auth::Token(token),
        (None, Some(username), Some(password)) => Auth::Basic { username, password },
        (Some(_), _, _) => {
            return Err(invalid(
                "set either token or username/password, not both".to_string(),
            ));
        }
        (None, None, None) => {
            return Err(invalid(
                "credentials required: token or username/password".to_string(),
            ));
        }
        (None, _, _) => {
            return Err(invalid(
                "username and password must be set together".to_string(),
            ));
        }
    };

    Ok(Target {
        name,
        base_url,
        auth,
    })
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Blank credentials count as absent; anything else is kept byte for byte.
fn credential(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_filesystem_safe(name: &str) -> bool {
    name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
