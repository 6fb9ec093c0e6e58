//! Per-layer and pipeline diagnostics
//!
//! Counters are plain data owned by the pipeline; [`DiagnosticsSnapshot`] is
//! the serializable view handed to tools and logs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dispatcher::DispatcherStats;
use crate::layer::LayerHealth;

/// Counters kept for one layer
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerStats {
    /// Entities handled in the last frame
    pub processed: u64,
    /// Entities skipped in the last frame (disabled, culled)
    pub skipped: u64,
    /// Entities currently registered with the layer
    pub total_entities: usize,
    pub last_update: Duration,
    pub last_render: Duration,
    /// Commands the layer executed last frame
    pub commands_last_frame: usize,
    pub commands_total: u64,
    /// Callbacks that errored or panicked
    pub failures: u64,
}

impl LayerStats {
    /// Zero everything except the registered entity count
    pub fn reset(&mut self) {
        *self = Self {
            total_entities: self.total_entities,
            ..Self::default()
        };
    }
}

/// Command routing counters across all layers
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineDiagnostics {
    pub total_frames: u64,
    /// Commands collected during the current (or last) frame
    pub commands_current: usize,
    pub commands_total: u64,
    /// Highest per-frame command count seen
    pub commands_peak: usize,
    /// Commands executed per layer during the last frame, in run order
    pub per_layer: Vec<(String, usize)>,
    /// Commands no layer claimed during the last frame
    pub unclaimed_last_frame: usize,
    pub unclaimed_total: u64,
}

impl PipelineDiagnostics {
    pub fn average_commands(&self) -> f64 {
        if self.total_frames == 0 {
            0.0
        } else {
            self.commands_total as f64 / self.total_frames as f64
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn begin_frame(&mut self) {
        self.commands_current = 0;
        self.per_layer.clear();
    }

    pub(crate) fn end_frame(&mut self, unclaimed: usize) {
        self.total_frames += 1;
        self.commands_total += self.commands_current as u64;
        self.commands_peak = self.commands_peak.max(self.commands_current);
        self.unclaimed_last_frame = unclaimed;
        self.unclaimed_total += unclaimed as u64;
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Serializable view of one layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    pub name: String,
    pub priority: i32,
    pub active: bool,
    pub healthy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub processed: u64,
    pub skipped: u64,
    pub total_entities: usize,
    pub update_ms: f64,
    pub render_ms: f64,
    pub commands_last_frame: usize,
    pub commands_total: u64,
    pub failures: u64,
}

impl LayerSnapshot {
    pub fn new(
        name: &str,
        priority: i32,
        active: bool,
        health: &LayerHealth,
        stats: &LayerStats,
    ) -> Self {
        Self {
            name: name.to_string(),
            priority,
            active,
            healthy: health.is_healthy(),
            error: health.error().map(str::to_string),
            processed: stats.processed,
            skipped: stats.skipped,
            total_entities: stats.total_entities,
            update_ms: millis(stats.last_update),
            render_ms: millis(stats.last_render),
            commands_last_frame: stats.commands_last_frame,
            commands_total: stats.commands_total,
            failures: stats.failures,
        }
    }
}

/// Serializable view of the dispatcher counters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DispatcherSnapshot {
    pub pending: usize,
    pub total_executed: u64,
    pub total_failed: u64,
    pub total_ms: f64,
    pub average_ms: f64,
}

impl DispatcherSnapshot {
    pub fn new(pending: usize, stats: &DispatcherStats) -> Self {
        Self {
            pending,
            total_executed: stats.total_executed,
            total_failed: stats.total_failed,
            total_ms: millis(stats.total_time),
            average_ms: millis(stats.average_duration()),
        }
    }
}

/// Everything the runtime reports, ready for serialization
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsSnapshot {
    pub frame: u64,
    pub total_frames: u64,
    pub entities: usize,
    pub commands_current: usize,
    pub commands_total: u64,
    pub commands_peak: usize,
    pub average_commands: f64,
    pub unclaimed_total: u64,
    pub layers: Vec<LayerSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatcher: Option<DispatcherSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_stats_reset_keeps_entities() {
        let mut stats = LayerStats {
            processed: 4,
            total_entities: 7,
            failures: 2,
            ..Default::default()
        };
        stats.reset();
        assert_eq!(stats.processed, 0);
        assert_eq!(stats.failures, 0);
        assert_eq!(stats.total_entities, 7);
    }

    #[test]
    fn test_pipeline_average() {
        let mut diag = PipelineDiagnostics::default();
        assert_eq!(diag.average_commands(), 0.0);

        for count in [4, 2] {
            diag.begin_frame();
            diag.commands_current = count;
            diag.end_frame(1);
        }
        assert_eq!(diag.total_frames, 2);
        assert_eq!(diag.commands_peak, 4);
        assert_eq!(diag.average_commands(), 3.0);
        assert_eq!(diag.unclaimed_total, 2);

        diag.reset();
        assert_eq!(diag, PipelineDiagnostics::default());
    }

    #[test]
    fn test_snapshot_serializes_failed_layer() {
        let health = LayerHealth::Failed {
            phase: crate::layer::LayerPhase::Update,
            error: "boom".into(),
            frame: 2,
        };
        let snapshot = LayerSnapshot::new("world", 100, true, &health, &LayerStats::default());
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"healthy\":false"));
        assert!(json.contains("boom"));
    }
}
