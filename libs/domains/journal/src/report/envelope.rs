use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Report bytes wrapped for JSON transports: `{"pdf": "<base64>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEnvelope {
    pub pdf: String,
}

impl ReportEnvelope {
    pub fn encode(bytes: &[u8]) -> Self {
        Self {
            pdf: STANDARD.encode(bytes),
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.pdf)
    }
}
