use std::time::Instant;
use crate::pipeline::Stage;

/// Logs how long a stage took when dropped.
pub struct StageTimer {
    stage: Stage,
    job_id: Option<String>,
    start: Instant,
}

impl StageTimer {
    pub fn new(stage: Stage, job_id: Option<&str>) -> Self {
        Self {
            stage,
            job_id: job_id.map(str::to_string),
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        tracing::debug!(
            stage = self.stage.as_str(),
            job_id = self.job_id.as_deref().unwrap_or("-"),
            duration_ms = self.elapsed_ms(),
            "Stage timing"
        );
    }
}
