//! Engine configuration
//!
//! All sections are optional in serialized form; missing values fall back to
//! the defaults below.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Undo/redo history settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Maximum snapshots kept; `None` keeps every committed state
    #[serde(default)]
    pub max_snapshots: Option<usize>,
    /// zstd level used to compress snapshots
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

fn default_compression_level() -> i32 {
    3
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_snapshots: None,
            compression_level: default_compression_level(),
        }
    }
}

/// Pacing of the simulated run, mirroring the latency users see in the designer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_per_node_delay_ms")]
    pub per_node_delay_ms: u64,
    /// Cap on the node-proportional part of the delay
    #[serde(default = "default_max_extra_delay_ms")]
    pub max_extra_delay_ms: u64,
}

fn default_base_delay_ms() -> u64 {
    400
}

fn default_per_node_delay_ms() -> u64 {
    50
}

fn default_max_extra_delay_ms() -> u64 {
    600
}

impl SimulationConfig {
    /// Simulated latency for a graph of `node_count` nodes
    pub fn latency(&self, node_count: usize) -> Duration {
        let extra = self
            .per_node_delay_ms
            .saturating_mul(node_count as u64)
            .min(self.max_extra_delay_ms);
        Duration::from_millis(self.base_delay_ms.saturating_add(extra))
    }

    /// No artificial latency at all
    pub fn immediate() -> Self {
        Self {
            base_delay_ms: 0,
            per_node_delay_ms: 0,
            max_extra_delay_ms: 0,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            per_node_delay_ms: default_per_node_delay_ms(),
            max_extra_delay_ms: default_max_extra_delay_ms(),
        }
    }
}

/// Full engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_is_capped() {
        let config = SimulationConfig::default();
        assert_eq!(config.latency(0), Duration::from_millis(400));
        assert_eq!(config.latency(4), Duration::from_millis(600));
        assert_eq!(config.latency(12), Duration::from_millis(1000));
        assert_eq!(config.latency(500), Duration::from_millis(1000));
        assert_eq!(SimulationConfig::immediate().latency(500), Duration::ZERO);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"history": {"maxSnapshots": 20}}"#).unwrap();
        assert_eq!(config.history.max_snapshots, Some(20));
        assert_eq!(config.history.compression_level, 3);
        assert_eq!(config.simulation, SimulationConfig::default());
    }
}
