use base64::{engine::general_purpose::STANDARD, Engine as _};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::session::ROUND_SIZES;

/// Result of one completed round
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStats {
    pub elapsed_secs: u64,
    pub error_count: u32,
}

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("summary code is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("summary code does not decode to text: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("malformed summary text: {0}")]
    Malformed(String),
}

/// Per-size results of a session, in round order (3, 4, 5)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub rounds: [RoundStats; 3],
}

impl SessionSummary {
    /// Rounds with no recorded stats count as zero errors in zero seconds.
    pub fn from_stats(stats: &BTreeMap<usize, RoundStats>) -> Self {
        let mut rounds = [RoundStats::default(); 3];
        for (slot, size) in rounds.iter_mut().zip(ROUND_SIZES) {
            if let Some(s) = stats.get(&size) {
                *slot = *s;
            }
        }
        Self { rounds }
    }

    pub fn round(&self, size: usize) -> Option<RoundStats> {
        ROUND_SIZES
            .iter()
            .position(|&s| s == size)
            .map(|i| self.rounds[i])
    }

    /// `<e3>,<t3>@<e4>,<t4>@<e5>,<t5>`
    pub fn to_text(&self) -> String {
        self.rounds
            .iter()
            .map(|r| format!("{},{}", r.error_count, r.elapsed_secs))
            .join("@")
    }

    pub fn parse(text: &str) -> Result<Self, SummaryError> {
        let parts: Vec<&str> = text.trim().split('@').collect();
        if parts.len() != ROUND_SIZES.len() {
            return Err(SummaryError::Malformed(format!(
                "expected {} rounds, found {}",
                ROUND_SIZES.len(),
                parts.len()
            )));
        }

        let mut rounds = [RoundStats::default(); 3];
        for (slot, part) in rounds.iter_mut().zip(parts) {
            let (errors, secs) = part
                .split_once(',')
                .ok_or_else(|| SummaryError::Malformed(format!("missing ',' in {part:?}")))?;
            slot.error_count = errors
                .parse()
                .map_err(|_| SummaryError::Malformed(format!("bad error count {errors:?}")))?;
            slot.elapsed_secs = secs
                .parse()
                .map_err(|_| SummaryError::Malformed(format!("bad time {secs:?}")))?;
        }

        Ok(Self { rounds })
    }

    pub fn encode(&self) -> String {
        encode_text(&self.to_text())
    }

    pub fn decode(code: &str) -> Result<Self, SummaryError> {
        Self::parse(&decode_text(code)?)
    }

    pub fn total_secs(&self) -> u64 {
        self.rounds.iter().map(|r| r.elapsed_secs).sum()
    }

    pub fn total_errors(&self) -> u32 {
        self.rounds.iter().map(|r| r.error_count).sum()
    }
}

pub fn encode_text(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

pub fn decode_text(code: &str) -> Result<String, SummaryError> {
    let bytes = STANDARD.decode(code.trim().as_bytes())?;
    Ok(String::from_utf8(bytes)?)
}
