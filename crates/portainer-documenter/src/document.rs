use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Which optional report sections are collected and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sections {
    pub compose_files: bool,
    pub templates: bool,
    pub registries: bool,
    pub auth_settings: bool,
    pub license_info: bool,
    pub users_teams: bool,
}

impl Default for Sections {
    fn default() -> Self {
        Self {
            compose_files: true,
            templates: true,
            registries: true,
            auth_settings: true,
            license_info: true,
            users_teams: true,
        }
    }
}

/// Everything collected from one target in one run.
///
/// Sub-resources are kept as raw JSON so the report reflects whatever the
/// remote API returned. `None` means the section was not collected.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub target_name: String,
    pub base_url: String,
    pub collected_at: DateTime<Utc>,
    pub data: DocumentData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_settings: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
    pub endpoints: Vec<Value>,
    pub stacks: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registries: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<Value>>,
}

impl Document {
    pub fn empty(
        target_name: impl Into<String>,
        base_url: impl Into<String>,
        collected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            target_name: target_name.into(),
            base_url: base_url.into(),
            collected_at,
            data: DocumentData::default(),
        }
    }
}
