//! Command implementations
//!
//! Each command reads a workflow file into a fresh store, so the file goes
//! through the same import checks as the designer's import button.

use std::path::Path;

use anyhow::{Context, Result};

use workflow_engine::{
    load_catalog, simulate_shared, AutomationCatalog, CatalogState, EngineConfig,
    FileAutomationSource, SimulationResult, StaticAutomationSource, ValidationReport,
    WorkflowStore,
};

use crate::config::AppConfig;

/// Read a workflow file into a new store
pub async fn open_workflow(path: &Path, engine: &EngineConfig) -> Result<WorkflowStore> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read workflow file: {}", path.display()))?;

    let mut store = WorkflowStore::new(engine.clone()).context("failed to create workflow store")?;
    store
        .import_json(&contents)
        .with_context(|| format!("failed to import workflow file: {}", path.display()))?;

    log::info!(
        "Loaded {} node(s) and {} edge(s) from {}",
        store.nodes().len(),
        store.edges().len(),
        path.display()
    );
    Ok(store)
}

/// Load the configured automation catalog, or the built-in one
pub async fn load_automations(config: &AppConfig) -> Result<AutomationCatalog> {
    match &config.catalog_path {
        Some(path) => load_catalog(&FileAutomationSource::new(path))
            .await
            .with_context(|| format!("failed to load automations from {}", path.display())),
        None => Ok(load_catalog(&StaticAutomationSource::builtin()).await?),
    }
}

/// Structural validation of a workflow file
pub async fn validate_file(path: &Path, config: &AppConfig) -> Result<ValidationReport> {
    let store = open_workflow(path, &config.engine).await?;
    Ok(store.validation_report().clone())
}

/// Simulate a workflow file, optionally with the designer's latency
pub async fn simulate_file(path: &Path, config: &AppConfig, paced: bool) -> Result<SimulationResult> {
    let catalog = CatalogState::Ready(load_automations(config).await?);
    let mut store = open_workflow(path, &config.engine).await?;

    if paced {
        let shared = store.into_shared();
        Ok(simulate_shared(&shared, catalog).await)
    } else {
        Ok(store.run_simulation(catalog))
    }
}

/// Import then export a workflow file, dropping stale validation tags
///
/// Writes to `output` when given and returns the normalised JSON.
pub async fn normalize_file(path: &Path, output: Option<&Path>, config: &AppConfig) -> Result<String> {
    let store = open_workflow(path, &config.engine).await?;
    let json = store.export_workflow().context("failed to export workflow")?;

    if let Some(output) = output {
        tokio::fs::write(output, &json)
            .await
            .with_context(|| format!("failed to write {}", output.display()))?;
        log::info!("Normalised workflow written to {}", output.display());
    }
    Ok(json)
}

/// Load the configuration at `path` and, when `init` is set, write it back
///
/// With `init` a missing file is created with every default spelled out.
pub async fn show_config(path: &Path, init: bool) -> Result<AppConfig> {
    let config = AppConfig::load(path)
        .await
        .with_context(|| format!("failed to load config: {}", path.display()))?;

    if init {
        config
            .save(path)
            .await
            .with_context(|| format!("failed to write config: {}", path.display()))?;
    }
    Ok(config)
}
