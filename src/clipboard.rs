//! Hand-off of the finished session's summary code.
//!
//! The clipboard is best effort: when it is disabled or unavailable the code
//! is still shown on the results screen, and the caller gets a
//! [`Delivery::Fallback`] explaining why.

use thiserror::Error;
use tracing::{info, warn};

use crate::summary::SessionSummary;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard disabled")]
    Disabled,
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}

/// Destination for the encoded summary
pub trait SummarySink {
    fn deliver(&mut self, text: &str) -> Result<(), ClipboardError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Copied,
    Fallback { reason: String },
}

/// Encode `summary` and hand it to `sink`. Failures are reported, never retried.
pub fn deliver_summary(sink: &mut dyn SummarySink, summary: &SessionSummary) -> Delivery {
    let code = summary.encode();
    match sink.deliver(&code) {
        Ok(()) => {
            info!("summary copied to clipboard");
            Delivery::Copied
        }
        Err(err) => {
            warn!(%err, "summary not copied, showing fallback");
            Delivery::Fallback {
                reason: err.to_string(),
            }
        }
    }
}

/// System clipboard via arboard. The handle is kept for the lifetime of the
/// sink since some X11 setups drop the selection with its owner.
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
    init_error: Option<String>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        match arboard::Clipboard::new() {
            Ok(cb) => Self {
                inner: Some(cb),
                init_error: None,
            },
            Err(err) => Self {
                inner: None,
                init_error: Some(err.to_string()),
            },
        }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl SummarySink for SystemClipboard {
    fn deliver(&mut self, text: &str) -> Result<(), ClipboardError> {
        match self.inner.as_mut() {
            Some(cb) => cb
                .set_text(text.to_owned())
                .map_err(|e| ClipboardError::Unavailable(e.to_string())),
            None => Err(ClipboardError::Unavailable(
                self.init_error
                    .clone()
                    .unwrap_or_else(|| "no clipboard".to_string()),
            )),
        }
    }
}

/// Sink used with `--no-clipboard`
#[derive(Debug, Default)]
pub struct DisabledClipboard;

impl SummarySink for DisabledClipboard {
    fn deliver(&mut self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Disabled)
    }
}

/// In-memory sink for headless runs and tests
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
}

impl SummarySink for MemoryClipboard {
    fn deliver(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}
