use crate::probe::VolumeResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl From<VolumeResult> for QuoteResponse {
    fn from(result: VolumeResult) -> Self {
        Self {
            volume: result.volume,
        }
    }
}
