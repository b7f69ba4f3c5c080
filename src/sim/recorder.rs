use super::types::StepRecord;

/// Caller-owned log of settled hours.
///
/// Replaces any shared global buffer: whoever drives the simulator decides
/// whether to keep history and hands records in explicitly.
#[derive(Debug, Clone, Default)]
pub struct EpisodeRecorder {
    records: Vec<StepRecord>,
}

impl EpisodeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: &StepRecord) {
        self.records.push(record.clone());
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the recorder and returns its records.
    pub fn into_records(self) -> Vec<StepRecord> {
        self.records
    }
}
