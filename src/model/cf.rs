use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A page of results from the CF v3 API.
///
/// Every v3 listing endpoint wraps its resources in this envelope; the full
/// resource list is the concatenation of `resources` across pages, followed
/// in link order until `pagination.next` is absent.
pub trait Paginated {
    fn next_page(&self) -> Option<&str>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    pub next: Option<PageLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageLink {
    pub href: String,
}

fn next_href(pagination: &Option<Pagination>) -> Option<&str> {
    pagination
        .as_ref()
        .and_then(|p| p.next.as_ref())
        .map(|link| link.href.as_str())
}

/// One application as returned by `/v3/apps`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    pub guid: String,
    pub name: String,
    pub state: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct AppsPage {
    pub resources: Option<Vec<App>>,
    pub pagination: Option<Pagination>,
}

impl Paginated for AppsPage {
    fn next_page(&self) -> Option<&str> {
        next_href(&self.pagination)
    }
}

/// Process configuration for an app (`/v3/apps/<guid>/processes`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instances: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_in_mb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_in_mb: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessesPage {
    pub resources: Option<Vec<ProcessInfo>>,
    pub pagination: Option<Pagination>,
}

impl Paginated for ProcessesPage {
    fn next_page(&self) -> Option<&str> {
        next_href(&self.pagination)
    }
}

/// Runtime state of one process instance (`/v3/processes/<guid>/stats`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<ProcessUsage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessUsage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mem: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct StatsPage {
    pub resources: Option<Vec<ProcessStats>>,
    pub pagination: Option<Pagination>,
}

impl Paginated for StatsPage {
    fn next_page(&self) -> Option<&str> {
        next_href(&self.pagination)
    }
}

/// Response from `/v3/apps/<guid>/env`.
///
/// Environment variable values are decoded as raw JSON values: CF accepts
/// non-string values and we only care about one well-known key.
#[derive(Debug, Deserialize)]
pub struct EnvResponse {
    pub environment_variables: Option<HashMap<String, serde_json::Value>>,
    pub pagination: Option<Pagination>,
}

impl Paginated for EnvResponse {
    fn next_page(&self) -> Option<&str> {
        next_href(&self.pagination)
    }
}

/// The Java buildpack's JRE selector variable.
pub const JDK_ENV_VAR: &str = "JBP_CONFIG_OPEN_JDK_JRE";

impl EnvResponse {
    /// Extracts the raw JDK selector setting, if the app defines one.
    pub fn jdk_env(&self) -> Option<String> {
        let value = self.environment_variables.as_ref()?.get(JDK_ENV_VAR)?;
        Some(match value.as_str() {
            Some(s) => s.to_string(),
            None => value.to_string(),
        })
    }
}

/// The build artifact currently deployed for an app
/// (`/v3/apps/<guid>/droplets/current`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Droplet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buildpacks: Option<Vec<Buildpack>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_types: Option<ProcessTypes>,
    #[serde(skip_serializing, default)]
    pub pagination: Option<Pagination>,
}

impl Paginated for Droplet {
    fn next_page(&self) -> Option<&str> {
        next_href(&self.pagination)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Buildpack {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessTypes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<String>,
}

/// The CF CLI's saved target, read from `~/.cf/config.json`.
///
/// Used to resolve the space guid when none is passed on the command line,
/// and echoed into the report so consumers know which target was scanned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfConfig {
    #[serde(rename = "OrganizationFields")]
    pub organization_fields: OrgFields,
    #[serde(rename = "SpaceFields")]
    pub space_fields: SpaceFields,
    #[serde(rename = "Target")]
    pub target: String,
    #[serde(rename = "APIVersion")]
    pub api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgFields {
    #[serde(rename = "GUID")]
    pub guid: String,
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceFields {
    #[serde(rename = "GUID")]
    pub guid: String,
    #[serde(rename = "Name")]
    pub name: String,
}

impl CfConfig {
    /// Default location of the CF CLI config file.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cf")
            .join("config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apps_page_decodes_leniently() {
        // Unknown fields must be ignored to survive API evolution.
        let json = r#"{
            "pagination": {
                "total_results": 2,
                "next": { "href": "/v3/apps?page=2" }
            },
            "resources": [{
                "guid": "a-1",
                "name": "billing",
                "state": "STARTED",
                "created_at": "2023-01-01T00:00:00Z",
                "updated_at": "2023-06-01T00:00:00Z",
                "lifecycle": { "type": "buildpack" }
            }]
        }"#;
        let page: AppsPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.next_page(), Some("/v3/apps?page=2"));
        let apps = page.resources.unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, "billing");
    }

    #[test]
    fn last_page_has_no_next_link() {
        let json = r#"{ "pagination": { "next": null }, "resources": [] }"#;
        let page: AppsPage = serde_json::from_str(json).unwrap();
        assert!(page.next_page().is_none());

        let json = r#"{ "resources": [] }"#;
        let page: AppsPage = serde_json::from_str(json).unwrap();
        assert!(page.next_page().is_none());
    }

    #[test]
    fn jdk_env_extracts_string_value() {
        let json = r#"{
            "environment_variables": {
                "JBP_CONFIG_OPEN_JDK_JRE": "{ jre: { version: 17.+ } }",
                "OTHER": "ignored"
            }
        }"#;
        let env: EnvResponse = serde_json::from_str(json).unwrap();
        assert_eq!(env.jdk_env().as_deref(), Some("{ jre: { version: 17.+ } }"));
    }

    #[test]
    fn jdk_env_absent_when_not_set() {
        let json = r#"{ "environment_variables": { "OTHER": "x" } }"#;
        let env: EnvResponse = serde_json::from_str(json).unwrap();
        assert!(env.jdk_env().is_none());

        let json = r#"{}"#;
        let env: EnvResponse = serde_json::from_str(json).unwrap();
        assert!(env.jdk_env().is_none());
    }

    #[test]
    fn droplet_decodes_current_droplet_response() {
        let json = r#"{
            "guid": "d-1",
            "state": "STAGED",
            "buildpacks": [
                { "name": "java_buildpack", "version": "4.50", "detect_output": "java" }
            ],
            "process_types": { "web": "JAVA_OPTS=... && ./run", "task": null }
        }"#;
        let droplet: Droplet = serde_json::from_str(json).unwrap();
        assert_eq!(droplet.guid.as_deref(), Some("d-1"));
        let bps = droplet.buildpacks.unwrap();
        assert_eq!(bps[0].name.as_deref(), Some("java_buildpack"));
        assert_eq!(droplet.process_types.unwrap().task, None);
    }

    #[test]
    fn cf_config_decodes_cli_casing() {
        let json = r#"{
            "ConfigVersion": 4,
            "Target": "https://api.example.com",
            "APIVersion": "3.130.0",
            "OrganizationFields": { "GUID": "o-1", "Name": "platform" },
            "SpaceFields": { "GUID": "s-1", "Name": "production" }
        }"#;
        let config: CfConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.space_fields.guid, "s-1");
        assert_eq!(config.organization_fields.name, "platform");
    }
}
