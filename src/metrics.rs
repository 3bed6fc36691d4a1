//! Stage timing and output shape tracking for pipeline runs.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tracing::info;

/// Kind of pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Preprocessor,
    Model,
    Postprocessor,
}

/// One finished stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageRecord {
    pub name: String,
    pub kind: StageKind,
    pub duration: Duration,
    /// (rows, numeric columns) after the stage
    pub output_shape: (usize, usize),
}

/// Metrics collector for pipeline runs
pub struct PipelineMetrics {
    /// Finished stages in execution order
    stages: RwLock<Vec<StageRecord>>,
    /// Wall-clock time the collector was created
    started_at: DateTime<Utc>,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            stages: RwLock::new(Vec::new()),
            started_at: Utc::now(),
        }
    }

    /// Record a finished stage
    pub fn record_stage(
        &self,
        name: &str,
        kind: StageKind,
        duration: Duration,
        output_shape: (usize, usize),
    ) {
        info!(
            stage = %name,
            kind = ?kind,
            rows = output_shape.0,
            columns = output_shape.1,
            elapsed_ms = duration.as_millis() as u64,
            "Finished step"
        );
        if let Ok(mut stages) = self.stages.write() {
            stages.push(StageRecord {
                name: name.to_string(),
                kind,
                duration,
                output_shape,
            });
        }
    }

    pub fn stages(&self) -> Vec<StageRecord> {
        self.stages.read().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn stage_count(&self) -> usize {
        self.stages.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Sum of all stage durations
    pub fn total_time(&self) -> Duration {
        self.stages().iter().map(|s| s.duration).sum()
    }

    /// Total time spent per stage kind
    pub fn time_by_kind(&self) -> HashMap<StageKind, Duration> {
        let mut by_kind = HashMap::new();
        for stage in self.stages() {
            *by_kind.entry(stage.kind).or_insert(Duration::ZERO) += stage.duration;
        }
        by_kind
    }

    /// Slowest stage, if any ran
    pub fn slowest_stage(&self) -> Option<StageRecord> {
        self.stages().into_iter().max_by_key(|s| s.duration)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let stages = self.stages();
        let total = self.total_time();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║                 PREDICTION PIPELINE - SUMMARY                ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Started: {}  │  Stages: {:>3}  │  Total: {:>8.2}s ║",
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            stages.len(),
            total.as_secs_f64()
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        for stage in &stages {
            let pct = if total.as_secs_f64() > 0.0 {
                stage.duration.as_secs_f64() / total.as_secs_f64() * 100.0
            } else {
                0.0
            };
            info!(
                "║ {:<30} {:>8.3}s ({:>5.1}%) shape=({}, {})",
                truncate(&stage.name, 30),
                stage.duration.as_secs_f64(),
                pct,
                stage.output_shape.0,
                stage.output_shape.1
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        name.to_string()
    } else {
        let mut short: String = name.chars().take(width - 1).collect();
        short.push('…');
        short
    }
}
