use notedown_core::DocumentHost;
use std::path::{Path, PathBuf};

/// Host for a command-line run: nothing stays open between invocations, so
/// closing and reopening only track which note the run is working on.
#[derive(Debug, Default)]
pub struct FileHost {
    open: Option<PathBuf>,
}

impl FileHost {
    pub fn new(path: &Path) -> Self {
        Self {
            open: Some(path.to_path_buf()),
        }
    }

    /// The note the run ends up on, if it is still open.
    pub fn current(&self) -> Option<&Path> {
        self.open.as_deref()
    }
}

impl DocumentHost for FileHost {
    fn close(&mut self, path: &Path) {
        tracing::debug!("Closing {}", path.display());
        if self.open.as_deref() == Some(path) {
            self.open = None;
        }
    }

    fn reopen(&mut self, path: &Path) {
        tracing::debug!("Reopening {}", path.display());
        self.open = Some(path.to_path_buf());
    }
}
