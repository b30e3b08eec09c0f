use std::time::{Duration, Instant};

/// Status of a stage in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StageStatus {
    /// Stage started but has not finished.
    Running,
    Completed,
    Failed,
    /// Stage never started because the run was cancelled.
    Cancelled,
}

/// Record of one stage of a pipeline run.
#[derive(Debug)]
pub struct StageRecord {
    pub name: String,
    pub status: StageStatus,
    pub started_at: Instant,
    pub completed_at: Option<Instant>,
}

impl StageRecord {
    /// Time spent in the stage, if it finished.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.completed_at
            .map(|done| done.saturating_duration_since(self.started_at))
    }
}

/// Audit log tracking every stage of a pipeline run.
#[derive(Debug, Default)]
pub struct PipelineAuditLog {
    records: Vec<StageRecord>,
}

impl PipelineAuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_start(&mut self, name: &str) {
        self.records.push(StageRecord {
            name: name.to_string(),
            status: StageStatus::Running,
            started_at: Instant::now(),
            completed_at: None,
        });
    }

    pub(crate) fn record_success(&mut self) {
        self.finish_last(StageStatus::Completed);
    }

    pub(crate) fn record_failure(&mut self) {
        self.finish_last(StageStatus::Failed);
    }

    pub(crate) fn record_cancelled(&mut self, name: &str) {
        let now = Instant::now();
        self.records.push(StageRecord {
            name: name.to_string(),
            status: StageStatus::Cancelled,
            started_at: now,
            completed_at: Some(now),
        });
    }

    fn finish_last(&mut self, status: StageStatus) {
        if let Some(record) = self.records.last_mut() {
            record.status = status;
            record.completed_at = Some(Instant::now());
        }
    }

    #[must_use]
    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    /// Names of stages that completed successfully, in run order.
    #[must_use]
    pub fn completed(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|record| record.status == StageStatus::Completed)
            .map(|record| record.name.as_str())
            .collect()
    }

    /// One line per stage with a status marker, for display.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for record in &self.records {
            let status = match record.status {
                StageStatus::Running => "…",
                StageStatus::Completed => "✓",
                StageStatus::Failed => "✗",
                StageStatus::Cancelled => "-",
            };
            lines.push(format!("{status} {}", record.name));
        }
        lines.join("\n")
    }
}
