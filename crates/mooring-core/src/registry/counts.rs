use serde::{Deserialize, Serialize};

use crate::domain::AssetStatus;

/// Number of tracked local assets per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCounts {
    pub idle: usize,
    pub uploading: usize,
    pub committed: usize,
    pub failed: usize,
}

impl RegistryCounts {
    pub(crate) fn add(&mut self, status: AssetStatus) {
        match status {
            AssetStatus::Idle => self.idle += 1,
            AssetStatus::Uploading => self.uploading += 1,
            AssetStatus::Committed => self.committed += 1,
            AssetStatus::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.idle + self.uploading + self.committed + self.failed
    }
}
