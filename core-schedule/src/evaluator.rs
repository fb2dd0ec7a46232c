//! Event window evaluation for a single file.

use crate::window::{DateWindow, StartOnlyPolicy, WindowState};
use chrono::NaiveDateTime;
use core_metadata::{CodecError, MetadataSource};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decides whether a file is currently eligible for display.
///
/// The filename is consulted first; embedded metadata is read only when the
/// name carries no usable date. Evaluation never touches the file beyond
/// reading it and keeps no state between calls.
#[derive(Clone)]
pub struct WindowEvaluator {
    metadata: Arc<dyn MetadataSource>,
    start_only: StartOnlyPolicy,
}

impl WindowEvaluator {
    pub fn new(metadata: Arc<dyn MetadataSource>) -> Self {
        Self {
            metadata,
            start_only: StartOnlyPolicy::default(),
        }
    }

    pub fn with_start_only_policy(mut self, policy: StartOnlyPolicy) -> Self {
        self.start_only = policy;
        self
    }

    pub fn start_only_policy(&self) -> StartOnlyPolicy {
        self.start_only
    }

    /// Resolve the display window of `path`, filename first.
    pub fn resolve_window(&self, path: &Path) -> DateWindow {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();

        if let Some(window) = DateWindow::from_filename(&stem) {
            return window;
        }

        match self.metadata.read_metadata(path) {
            Ok(map) => DateWindow::from_metadata(&map),
            Err(CodecError::Unsupported { format }) => {
                debug!(file = %stem, format = %format, "No metadata channel for file");
                DateWindow::default()
            }
            Err(e) => {
                warn!(file = %stem, error = %e, "Could not read metadata, treating as undated");
                DateWindow::default()
            }
        }
    }

    /// State of `path` at local time `now`. Dates compare by calendar day.
    pub fn evaluate(&self, path: &Path, now: NaiveDateTime) -> WindowState {
        let window = self.resolve_window(path);
        let state = window.state_on(now.date(), self.start_only);

        match state {
            WindowState::NoSignal => {
                warn!(file = %path.display(), "No usable date window, treating as inactive")
            }
            _ => debug!(
                file = %path.display(),
                start = ?window.start,
                end = ?window.end,
                state = %state,
                "Window evaluated"
            ),
        }
        state
    }

    pub fn is_active(&self, path: &Path, now: NaiveDateTime) -> bool {
        self.evaluate(path, now).is_active()
    }
}

impl std::fmt::Debug for WindowEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowEvaluator")
            .field("start_only", &self.start_only)
            .finish_non_exhaustive()
    }
}
