//! `push` command: import a prepared OpenAPI document

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use super::output::{print_json, read_json};
use crate::config::ApiFoxConfig;
use crate::push::{ApiFoxPusher, PushOutcome};

pub async fn handle_push_command(
    document: &Path,
    project_id: Option<String>,
    base_url: Option<String>,
) -> Result<()> {
    let mut config = ApiFoxConfig::from_env().context("Failed to load ApiFox configuration")?;
    if let Some(project_id) = project_id {
        config.project_id = Some(project_id);
    }
    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }
    config.validate_settings()?;

    let document: Value = read_json(document)?;
    let pusher = ApiFoxPusher::new(Arc::new(config))?;

    match pusher.push_document(document).await? {
        PushOutcome::Imported { payload } => {
            println!("Document imported");
            print_json(&payload)
        }
        PushOutcome::Rejected { status, payload } => {
            print_json(&payload)?;
            bail!("ApiFox rejected the document (HTTP {})", status)
        }
        PushOutcome::Skipped => Ok(()),
    }
}
