//! Automation catalog: the externally supplied list of automated actions
//!
//! Automated nodes reference an action by id; the catalog says which
//! parameters that action requires. The catalog arrives asynchronously, so
//! consumers hold a [`CatalogState`] and treat `Loading` as "can't tell yet"
//! rather than as pass or fail.
//!
//! # Usage
//!
//! ```ignore
//! use workflow_engine::{load_catalog, StaticAutomationSource};
//!
//! let catalog = load_catalog(&StaticAutomationSource::builtin()).await?;
//! assert!(catalog.find("send_email").is_some());
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkflowError};

/// One available automated action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationAction {
    /// Identifier referenced by `actionId`
    pub id: String,
    /// Human-readable label
    pub label: String,
    /// Parameter names that must be filled in, in display order
    #[serde(alias = "params", default)]
    pub required_params: Vec<String>,
}

impl AutomationAction {
    pub fn new(id: impl Into<String>, label: impl Into<String>, required_params: &[&str]) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            required_params: required_params.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Loaded list of automations, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutomationCatalog {
    actions: Vec<AutomationAction>,
}

impl AutomationCatalog {
    /// Create a catalog from a list; later duplicates replace earlier ones
    pub fn new(actions: Vec<AutomationAction>) -> Self {
        let mut catalog = Self::default();
        for action in actions {
            catalog.register(action);
        }
        catalog
    }

    /// The actions shipped with the designer
    pub fn builtin() -> Self {
        Self::new(vec![
            AutomationAction::new("send_email", "Send Email", &["to", "subject", "body"]),
            AutomationAction::new("generate_doc", "Generate Document", &["template", "recipient"]),
            AutomationAction::new("notify_slack", "Notify Slack", &["channel", "message"]),
        ])
    }

    /// Register an action, replacing any existing action with the same id
    pub fn register(&mut self, action: AutomationAction) {
        match self.actions.iter_mut().find(|a| a.id == action.id) {
            Some(existing) => *existing = action,
            None => self.actions.push(action),
        }
    }

    /// Look up an action by id
    pub fn find(&self, id: &str) -> Option<&AutomationAction> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// All actions in listing order
    pub fn actions(&self) -> &[AutomationAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Whether the catalog has arrived yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogState {
    /// Still being fetched; lookups cannot be decided
    Loading,
    /// Available for lookups
    Ready(AutomationCatalog),
}

impl CatalogState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The catalog, if it has loaded
    pub fn catalog(&self) -> Option<&AutomationCatalog> {
        match self {
            Self::Loading => None,
            Self::Ready(catalog) => Some(catalog),
        }
    }
}

impl From<AutomationCatalog> for CatalogState {
    fn from(catalog: AutomationCatalog) -> Self {
        Self::Ready(catalog)
    }
}

/// Source of the automation list (`listAutomations`)
///
/// This abstracts over where the list comes from (a bundled table, a file,
/// a remote service) so the engine does not care about transport.
#[async_trait]
pub trait AutomationSource: Send + Sync {
    /// Fetch every available automation
    async fn list_automations(&self) -> Result<Vec<AutomationAction>>;
}

/// In-memory source, optionally with artificial latency
pub struct StaticAutomationSource {
    actions: Vec<AutomationAction>,
    latency: Duration,
}

impl StaticAutomationSource {
    pub fn new(actions: Vec<AutomationAction>) -> Self {
        Self {
            actions,
            latency: Duration::ZERO,
        }
    }

    /// Source serving [`AutomationCatalog::builtin`]
    pub fn builtin() -> Self {
        Self::new(AutomationCatalog::builtin().actions)
    }

    /// Delay every listing by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl AutomationSource for StaticAutomationSource {
    async fn list_automations(&self) -> Result<Vec<AutomationAction>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.actions.clone())
    }
}

/// Source reading a JSON array of actions from disk
pub struct FileAutomationSource {
    path: PathBuf,
}

impl FileAutomationSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl AutomationSource for FileAutomationSource {
    async fn list_automations(&self) -> Result<Vec<AutomationAction>> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            WorkflowError::catalog(format!("failed to read {:?}: {}", self.path, e))
        })?;
        serde_json::from_str(&contents)
            .map_err(|e| WorkflowError::catalog(format!("failed to parse {:?}: {}", self.path, e)))
    }
}

/// Fetch the list from a source and build a catalog
pub async fn load_catalog(source: &dyn AutomationSource) -> Result<AutomationCatalog> {
    let actions = source.list_automations().await?;
    log::debug!("Loaded {} automation(s)", actions.len());
    Ok(AutomationCatalog::new(actions))
}
