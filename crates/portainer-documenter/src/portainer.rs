//! Portainer HTTP collector.

use std::time::Duration;

use documenter_std::time::{GetNow, SystemClock};
use futures::{StreamExt, stream};
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::{
    document::{Document, Sections},
    error::{CollectError, ConfigError},
    targets::{Auth, Target},
    traits::Collector,
};

const USER_AGENT: &str = concat!("portainer-documenter/", env!("CARGO_PKG_VERSION"));

/// Stack files fetched at once, in stack order.
const STACK_FILE_CONCURRENCY: usize = 4;

/// Collects a [`Document`] from a Portainer instance over its REST API.
///
/// Status, endpoints and stacks are required; a failure there fails the
/// target. Every other section is best effort and reported as missing.
pub struct PortainerCollector<C = SystemClock> {
    http: HttpClient,
    sections: Sections,
    clock: C,
}

impl PortainerCollector<SystemClock> {
    pub fn new(timeout: Duration, sections: Sections) -> Result<Self, ConfigError> {
        Self::with_clock(timeout, sections, SystemClock)
    }
}

impl<C: GetNow> PortainerCollector<C> {
    pub fn with_clock(timeout: Duration, sections: Sections, clock: C) -> Result<Self, ConfigError> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            http,
            sections,
            clock,
        })
    }

    async fn open_session<'a>(&'a self, target: &'a Target) -> Result<Session<'a>, CollectError> {
        let bearer = match target.auth() {
            Auth::Token(token) => token.clone(),
            Auth::Basic { username, password } => {
                self.authenticate(target, username, password).await?
            }
        };
        Ok(Session {
            http: &self.http,
            root: target.api_root(),
            bearer,
        })
    }

    async fn authenticate(
        &self,
        target: &Target,
        username: &str,
        password: &str,
    ) -> Result<String, CollectError> {
        #[derive(Deserialize)]
        struct AuthResponse {
            jwt: Option<String>,
        }

        let url = format!("{}/api/auth", target.api_root());
        let response = self
            .http
            .post(&url)
            .json(&json!({ "Username": username, "Password": password }))
            .send()
            .await
            .map_err(|e| CollectError::Connectivity(format!("POST {url}: {e}")))?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST
                | StatusCode::UNAUTHORIZED
                | StatusCode::FORBIDDEN
                | StatusCode::UNPROCESSABLE_ENTITY
        ) {
            return Err(CollectError::Auth(format!(
                "credentials for '{username}' rejected ({status})"
            )));
        }
        if !status.is_success() {
            return Err(CollectError::Connectivity(format!("POST {url}: HTTP {status}")));
        }

        let body: AuthResponse = response
            .json()
            .await
            .map_err(|e| CollectError::Connectivity(format!("POST {url}: invalid response: {e}")))?;
        let jwt = body
            .jwt
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CollectError::Auth("no JWT in authentication response".to_string()))?;

        info!(target = %target.name(), "Authenticated with Portainer");
        Ok(jwt)
    }
}

impl<C: GetNow + Send + Sync> Collector for PortainerCollector<C> {
    async fn collect(&self, target: &Target) -> Result<Document, CollectError> {
        let session = self.open_session(target).await?;
        let sections = self.sections;
        let mut missing = Vec::new();
        let mut document = Document::empty(
            target.name(),
            target.base_url().as_str(),
            self.clock.now(),
        );

        let status = session.get("/api/status").await.map_err(RequestError::into_collect_error)?;
        debug!(target = %target.name(), "Connected to Portainer");

        if sections.license_info {
            document.data.license = Some(license_info(&status));
        }
        document.data.status = Some(status);

        if sections.auth_settings {
            match session.get("/api/settings").await {
                Ok(settings) => {
                    document.data.auth_settings = Some(auth_settings(&settings));
                    document.data.settings = Some(settings);
                }
                Err(e) => note_missing(target, &mut missing, "settings", e),
            }
        }

        document.data.endpoints = session
            .get_list("/api/endpoints")
            .await
            .map_err(RequestError::into_collect_error)?;

        let mut stacks = session
            .get_list("/api/stacks")
            .await
            .map_err(RequestError::into_collect_error)?;
        if sections.compose_files {
            attach_compose_files(target, &session, &mut stacks, &mut missing).await;
        }
        document.data.stacks = stacks;

        if sections.templates {
            match session.get_list("/api/custom_templates").await {
                Ok(templates) => document.data.templates = Some(templates),
                Err(e) => note_missing(target, &mut missing, "templates", e),
            }
        }

        if sections.registries {
            match session.get_list("/api/registries").await {
                Ok(registries) => document.data.registries = Some(registries),
                Err(e) => note_missing(target, &mut missing, "registries", e),
            }
        }

        if sections.users_teams {
            match session.get_list("/api/users").await {
                Ok(users) => document.data.users = Some(users),
                Err(e) => note_missing(target, &mut missing, "users", e),
            }
            match session.get_list("/api/teams").await {
                Ok(teams) => document.data.teams = Some(teams),
                Err(e) => note_missing(target, &mut missing, "teams", e),
            }
        }

        if missing.is_empty() {
            Ok(document)
        } else {
            Err(CollectError::PartialData {
                document: Box::new(document),
                missing,
            })
        }
    }
}

async fn attach_compose_files(
    target: &Target,
    session: &Session<'_>,
    stacks: &mut [Value],
    missing: &mut Vec<String>,
) {
    let ids: Vec<Option<i64>> = stacks
        .iter()
        .map(|s| s.get("Id").and_then(Value::as_i64))
        .collect();
    let files: Vec<_> = stream::iter(ids.iter().copied().map(|id| async move {
        match id {
            Some(id) => Some(session.get(&format!("/api/stacks/{id}/file")).await),
            None => None,
        }
    }))
    .buffered(STACK_FILE_CONCURRENCY)
    .collect()
    .await;

    for ((stack, id), file) in stacks.iter_mut().zip(&ids).zip(files) {
        let (Some(id), Some(file)) = (id, file) else {
            continue;
        };
        match file {
            Ok(file) => {
                let content = file
                    .get("StackFileContent")
                    .cloned()
                    .unwrap_or(Value::String(String::new()));
                if let Some(obj) = stack.as_object_mut() {
                    obj.insert("ComposeFile".to_string(), content);
                }
            }
            Err(e) => note_missing(target, missing, &format!("stack file {id}"), e),
        }
    }
}

fn note_missing(target: &Target, missing: &mut Vec<String>, section: &str, error: RequestError) {
    warn!(target = %target.name(), section, error = %error, "Could not collect section");
    missing.push(section.to_string());
}

fn license_info(status: &Value) -> Value {
    json!({
        "Edition": status.get("Edition").cloned().unwrap_or_else(|| json!("Community")),
        "Version": status.get("Version").cloned().unwrap_or_else(|| json!("Unknown")),
        "License": status.get("License").cloned().unwrap_or_else(|| json!({})),
    })
}

fn auth_settings(settings: &Value) -> Value {
    json!({
        "AuthenticationMethod": settings
            .get("AuthenticationMethod")
            .cloned()
            .unwrap_or_else(|| json!("Internal")),
        "LDAPSettings": settings.get("LDAPSettings").cloned().unwrap_or_else(|| json!({})),
        "OAuthSettings": settings.get("OAuthSettings").cloned().unwrap_or_else(|| json!({})),
        "InternalAuthSettings": settings
            .get("InternalAuthSettings")
            .cloned()
            .unwrap_or_else(|| json!({})),
    })
}

/// Authenticated view of one target for the duration of a collection.
struct Session<'a> {
    http: &'a HttpClient,
    root: &'a str,
    bearer: String,
}

impl Session<'_> {
    async fn get(&self, path: &str) -> Result<Value, RequestError> {
        let url = format!("{}{path}", self.root);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.bearer)
            .send()
            .await
            .map_err(|e| RequestError::Transport {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Status {
                path: path.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|e| RequestError::Transport {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        if body.is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_slice(&body).map_err(|e| RequestError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_list(&self, path: &str) -> Result<Vec<Value>, RequestError> {
        match self.get(path).await? {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            other => Err(RequestError::Decode {
                path: path.to_string(),
                message: format!("expected a JSON array, got {}", json_kind(&other)),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug)]
enum RequestError {
    Transport { path: String, message: String },
    Status { path: String, status: StatusCode },
    Decode { path: String, message: String },
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport { path, message } => write!(f, "GET {path}: {message}"),
            Self::Status { path, status } => write!(f, "GET {path}: HTTP {status}"),
            Self::Decode { path, message } => write!(f, "GET {path}: invalid response: {message}"),
        }
    }
}

impl RequestError {
    fn into_collect_error(self) -> CollectError {
        match &self {
            Self::Status { status, .. }
                if matches!(*status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) =>
            {
                CollectError::Auth(self.to_string())
            }
            _ => CollectError::Connectivity(self.to_string()),
        }
    }
}
