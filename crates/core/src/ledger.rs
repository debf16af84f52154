//! Ordered record of cache files created during one pipeline run.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::{PaperboyError, Result};

/// Tracks every file one pipeline run writes into the cache directory, in
/// creation order, so the caller can delete them all after delivery.
///
/// A ledger belongs to a single run. Runs never share a ledger, so two
/// concurrent runs cannot purge each other's files.
#[derive(Debug, Default)]
pub struct CacheLedger {
    paths: Vec<PathBuf>,
}

impl CacheLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a path to the ledger.
    pub fn register(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    /// Registered paths, in registration order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Deletes every registered file, in registration order, then drains
    /// the ledger so a repeated call is a no-op.
    ///
    /// A file that is already gone counts as removed. Any other failure is
    /// logged and collected without stopping the purge of the remaining
    /// entries; if any entry failed, the paths that could not be removed
    /// stay registered and a [`PaperboyError::Cleanup`] reports them.
    pub fn purge(&mut self) -> Result<()> {
        let mut failed = Vec::new();

        for path in self.paths.drain(..) {
            match remove_if_present(&path) {
                Ok(()) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to remove cached file");
                    failed.push(path);
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            self.paths = failed.clone();
            Err(PaperboyError::Cleanup { failed })
        }
    }
}

fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
