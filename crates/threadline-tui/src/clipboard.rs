//! Clipboard sink for copied selections.

use thiserror::Error;

#[derive(Debug, Error)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(String);

/// Destination for copied text.
pub trait ClipboardSink: Send {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard via `arboard`. A handle is opened per copy.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| ClipboardError(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Keeps copied text in memory; can be told to fail.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryClipboard {
        pub copied: Arc<Mutex<Vec<String>>>,
        pub broken: bool,
    }

    impl ClipboardSink for MemoryClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.broken {
                return Err(ClipboardError("no display".to_string()));
            }
            self.copied.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }
}
