use serde::Serialize;
use tabled::{Table, Tabled};

use crate::cli::error::CliResult;
use crate::cli::utils::{apply_table_style, mask_token};
use crate::instances::{Environment, InstanceResolver};

#[derive(Debug, Serialize)]
pub struct InstanceInfo {
    pub name: String,
    pub url: String,
    pub token: String,
    pub is_current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xq_project: Option<i64>,
}

#[derive(Tabled)]
pub(crate) struct InstanceDisplay {
    #[tabled(rename = "")]
    pub(crate) marker: &'static str,
    #[tabled(rename = "Name")]
    pub(crate) name: String,
    #[tabled(rename = "URL")]
    pub(crate) url: String,
    #[tabled(rename = "Token")]
    pub(crate) token: String,
    #[tabled(rename = "X-Q")]
    pub(crate) xq_project: String,
}

impl From<&InstanceInfo> for InstanceDisplay {
    fn from(info: &InstanceInfo) -> Self {
        Self {
            marker: if info.is_current { "*" } else { "" },
            name: info.name.clone(),
            url: info.url.clone(),
            token: info.token.clone(),
            xq_project: info
                .xq_project
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Every resolvable instance with masked tokens.
pub fn collect_instances<E: Environment>(
    resolver: &InstanceResolver<E>,
) -> CliResult<Vec<InstanceInfo>> {
    let instances = resolver.resolve_instances()?;
    let current = resolver.resolve_current()?;
    let xq = resolver.xq_projects()?;

    Ok(instances
        .into_iter()
        .map(|(name, entry)| InstanceInfo {
            is_current: current.as_deref() == Some(name.as_str()),
            xq_project: xq.get(&name).copied(),
            token: mask_token(&entry.token),
            url: entry.url,
            name,
        })
        .collect())
}

/// List configured instances
pub fn list_instances<E: Environment>(
    resolver: &InstanceResolver<E>,
    format: &str,
) -> CliResult<String> {
    let instances = collect_instances(resolver)?;

    match format {
        "json" => Ok(serde_json::to_string_pretty(&instances)?),
        _ => Ok(format_table(&instances)),
    }
}

pub(crate) fn format_table(instances: &[InstanceInfo]) -> String {
    if instances.is_empty() {
        return "No instances configured. Set VIKUNJA_URL and VIKUNJA_TOKEN or add one with connect_instance.".to_string();
    }

    let display: Vec<InstanceDisplay> = instances.iter().map(|i| i.into()).collect();
    let mut table = Table::new(display);
    apply_table_style(&mut table);
    table.to_string()
}
