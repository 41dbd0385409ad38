//! Markdown and JSON reports for a collected [`Document`].

use std::fmt::Write as _;

use serde_json::{Value, json};

use crate::{
    config::OutputFormat,
    document::{Document, Sections},
    traits::Renderer,
};

const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Renders reports, gated by the same section flags used for collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportRenderer {
    sections: Sections,
}

impl ReportRenderer {
    pub fn new(sections: Sections) -> Self {
        Self { sections }
    }

    fn markdown(&self, document: &Document) -> String {
        let mut out = String::new();
        let data = &document.data;

        let _ = writeln!(
            out,
            "# Portainer Environment Documentation - {}\n",
            document.target_name
        );
        let _ = writeln!(
            out,
            "Generated on: {}",
            document.collected_at.format(GENERATED_AT_FORMAT)
        );
        let _ = writeln!(out, "Portainer URL: {}\n\n---", document.base_url);

        if self.sections.license_info
            && let Some(license) = &data.license
        {
            license_section(&mut out, license);
        }
        if self.sections.auth_settings
            && let Some(auth) = &data.auth_settings
        {
            auth_section(&mut out, auth);
        }
        endpoints_section(&mut out, &data.endpoints);
        stacks_section(&mut out, &data.stacks, self.sections.compose_files);
        if self.sections.templates
            && let Some(templates) = &data.templates
        {
            templates_section(&mut out, templates);
        }
        if self.sections.registries
            && let Some(registries) = &data.registries
        {
            registries_section(&mut out, registries);
        }
        if self.sections.users_teams {
            users_teams_section(
                &mut out,
                data.users.as_deref().unwrap_or_default(),
                data.teams.as_deref().unwrap_or_default(),
            );
        }
        out
    }

    fn json(&self, document: &Document) -> Vec<u8> {
        let report = json!({
            "generated_at": document.collected_at.to_rfc3339(),
            "host_name": document.target_name,
            "portainer_url": document.base_url,
            "data": document.data,
        });
        let mut bytes = serde_json::to_vec_pretty(&report).unwrap_or_default();
        bytes.push(b'\n');
        bytes
    }
}

impl Renderer for ReportRenderer {
    fn render(&self, document: &Document, format: OutputFormat) -> Vec<u8> {
        match format {
            OutputFormat::Markdown => self.markdown(document).into_bytes(),
            OutputFormat::Json => self.json(document),
        }
    }
}

/// String values print bare, missing or null ones print `default`.
fn field(value: &Value, key: &str, default: &str) -> String {
    match value.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn present<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    })
}

fn license_section(out: &mut String, license: &Value) {
    let _ = writeln!(out, "\n## License and Version Information");
    let _ = writeln!(out, "- **Edition**: {}", field(license, "Edition", "Unknown"));
    let _ = writeln!(out, "- **Version**: {}", field(license, "Version", "Unknown"));
    if let Some(details) = present(license, "License") {
        let _ = writeln!(out, "- **License Type**: {}", field(details, "Type", "N/A"));
        if present(details, "ExpiryDate").is_some() {
            let _ = writeln!(out, "- **License Expiry**: {}", field(details, "ExpiryDate", ""));
        }
    }
}

fn auth_section(out: &mut String, auth: &Value) {
    let _ = writeln!(out, "\n## Authentication Configuration");
    let _ = writeln!(
        out,
        "- **Method**: {}",
        field(auth, "AuthenticationMethod", "Internal")
    );

    if let Some(ldap) = present(auth, "LDAPSettings")
        && present(ldap, "URL").is_some()
    {
        let _ = writeln!(out, "\n### LDAP Configuration");
        let _ = writeln!(out, "- **Server**: {}", field(ldap, "URL", "Not configured"));
        let _ = writeln!(out, "- **Anonymous Mode**: {}", field(ldap, "AnonymousMode", "false"));
        let _ = writeln!(out, "- **Base DN**: {}", field(ldap, "BaseDN", "Not configured"));
    }

    if let Some(oauth) = present(auth, "OAuthSettings")
        && present(oauth, "Provider").is_some()
    {
        let _ = writeln!(out, "\n### OAuth Configuration");
        let _ = writeln!(out, "- **Provider**: {}", field(oauth, "Provider", "Not configured"));
        let client_id = if present(oauth, "ClientID").is_some() {
            "[Configured]"
        } else {
            "Not configured"
        };
        let _ = writeln!(out, "- **Client ID**: {client_id}");
    }
}

fn endpoints_section(out: &mut String, endpoints: &[Value]) {
    let _ = writeln!(out, "\n## Endpoints ({} total)", endpoints.len());
    for endpoint in endpoints {
        let _ = writeln!(out, "\n### {}", field(endpoint, "Name", "Unknown"));
        let _ = writeln!(out, "- **Type**: {}", field(endpoint, "Type", "Unknown"));
        let _ = writeln!(out, "- **URL**: {}", field(endpoint, "URL", "Not specified"));
        let _ = writeln!(out, "- **Status**: {}", field(endpoint, "Status", "Unknown"));
        if let Some(tags) = present(endpoint, "TagIds") {
            let _ = writeln!(out, "- **Tags**: {tags}");
        }
        if present(endpoint, "GroupId").is_some() {
            let _ = writeln!(out, "- **Group ID**: {}", field(endpoint, "GroupId", ""));
        }
    }
}

fn stacks_section(out: &mut String, stacks: &[Value], compose_files: bool) {
    let _ = writeln!(out, "\n## Stacks ({} total)", stacks.len());
    for stack in stacks {
        let _ = writeln!(out, "\n### {}", field(stack, "Name", "Unknown"));
        let _ = writeln!(out, "- **Status**: {}", field(stack, "Status", "Unknown"));
        let _ = writeln!(out, "- **Endpoint ID**: {}", field(stack, "EndpointId", "Unknown"));

        if let Some(Value::Array(env)) = present(stack, "Env") {
            let _ = writeln!(out, "- **Environment Variables**:");
            for var in env {
                let _ = writeln!(
                    out,
                    "  - `{}={}`",
                    field(var, "name", "Unknown"),
                    field(var, "value", "Unknown")
                );
            }
        }

        if compose_files && let Some(Value::String(compose)) = present(stack, "ComposeFile") {
            let _ = writeln!(out, "\n**Docker Compose File:**");
            let _ = writeln!(out, "```yaml\n{}\n```", compose.trim_end());
        }
    }
}

fn templates_section(out: &mut String, templates: &[Value]) {
    let _ = writeln!(out, "\n## Custom Templates ({} total)", templates.len());
    for template in templates {
        let _ = writeln!(out, "\n### {}", field(template, "Title", "Unknown"));
        let _ = writeln!(out, "- **Type**: {}", field(template, "Type", "Unknown"));
        if present(template, "Description").is_some() {
            let _ = writeln!(out, "- **Description**: {}", field(template, "Description", ""));
        }
        if present(template, "Platform").is_some() {
            let _ = writeln!(out, "- **Platform**: {}", field(template, "Platform", ""));
        }
        let repo = present(template, "GitConfig")
            .map(|repo| (repo, "URL", "ConfigFilePath"))
            .or_else(|| present(template, "Repository").map(|repo| (repo, "url", "stackfile")));
        if let Some((repo, url_key, file_key)) = repo {
            let _ = writeln!(out, "- **Repository**: {}", field(repo, url_key, "Unknown"));
            if present(repo, file_key).is_some() {
                let _ = writeln!(out, "- **Stack File**: {}", field(repo, file_key, ""));
            }
        }
    }
}

fn registries_section(out: &mut String, registries: &[Value]) {
    let _ = writeln!(out, "\n## Registries ({} total)", registries.len());
    for registry in registries {
        let _ = writeln!(out, "\n### {}", field(registry, "Name", "Unknown"));
        let _ = writeln!(out, "- **Type**: {}", field(registry, "Type", "Unknown"));
        let _ = writeln!(out, "- **URL**: {}", field(registry, "URL", "Unknown"));
        let authenticated = present(registry, "Authentication").is_some();
        let _ = writeln!(
            out,
            "- **Authentication**: {}",
            if authenticated { "Yes" } else { "No" }
        );
        if authenticated && present(registry, "Username").is_some() {
            let _ = writeln!(out, "- **Username**: {}", field(registry, "Username", ""));
        }
    }
}

fn users_teams_section(out: &mut String, users: &[Value], teams: &[Value]) {
    if users.is_empty() && teams.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n## Users and Teams");
    let _ = writeln!(out, "- **Users**: {} total", users.len());
    let _ = writeln!(out, "- **Teams**: {} total", teams.len());
    if !users.is_empty() {
        let _ = writeln!(out, "\n### Users");
        for user in users {
            let _ = writeln!(
                out,
                "- **{}** (Role: {})",
                field(user, "Username", "Unknown"),
                field(user, "Role", "Unknown")
            );
        }
    }
    if !teams.is_empty() {
        let _ = writeln!(out, "\n### Teams");
        for team in teams {
            let _ = writeln!(out, "- **{}**", field(team, "Name", "Unknown"));
        }
    }
}
