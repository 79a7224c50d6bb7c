//! Ties the persisted files, the parser and the uploader together.

use crate::config::{Config, ListTarget, Paths, Settings};
use crate::diff::select_highlights;
use crate::models::{Highlight, StyleSheet};
use crate::parser::{read_clippings, ClippingsError};
use crate::remote::{RemoteError, RemoteTree, Session};
use crate::store::{self, HighlightLog, StoreError};
use crate::style::{StyleError, StyleStore};
use crate::uploader::{self, UploadError, UploadReport};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Clippings(#[from] ClippingsError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// Highlights read from the Kindle, and the ones picked for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub current: Vec<Highlight>,
    pub selected: Vec<Highlight>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub found: usize,
    pub report: UploadReport,
}

pub struct Workspace {
    paths: Paths,
    settings: Settings,
    styles: StyleStore,
    log: HighlightLog,
}

impl Workspace {
    /// Loads config, style and log files, writing defaults for any that are missing.
    pub fn open(paths: Paths) -> Result<Self, StoreError> {
        let settings = Settings::open(&paths.config_file, &paths.default_log)?;
        let styles = StyleStore::open(&paths.style_file)?;
        let log = HighlightLog::open(&settings.log_path(&paths.default_log))?;

        Ok(Workspace {
            paths,
            settings,
            styles,
            log,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn styles(&self) -> &StyleSheet {
        self.styles.sheet()
    }

    pub fn config(&self, env: impl Fn(&str) -> Option<String>) -> Config {
        self.settings.resolve(env)
    }

    pub fn set_config(&mut self, name: &str, value: &str) -> Result<(), StoreError> {
        self.settings.set(name, value);
        self.settings.save(&self.paths.config_file)?;
        info!(name, "Config updated");
        Ok(())
    }

    pub fn set_style(&mut self, element: &str, variable: &str, value: &str) -> Result<(), StyleError> {
        self.styles.set(element, variable, value)
    }

    pub fn file_path(&self, target: ListTarget) -> &Path {
        match target {
            ListTarget::KindleLog => self.log.path(),
            ListTarget::Config => &self.paths.config_file,
            ListTarget::Style => self.styles.path(),
        }
    }

    pub fn read_file(&self, target: ListTarget) -> Result<String, StoreError> {
        store::read_text(self.file_path(target))
    }

    /// Parses the Kindle export and compares it with the log.
    pub fn collect(&self, kindle_location: &Path, only_new: bool) -> Result<Batch, SyncError> {
        let current = read_clippings(kindle_location)?;
        let previous = self.log.load()?;
        let selected = select_highlights(&current, &previous, only_new);

        info!(
            found = current.len(),
            selected = selected.len(),
            only_new,
            "Collected highlights"
        );
        Ok(Batch { current, selected })
    }

    /// Uploads the selected highlights, then records the full current set in the log.
    ///
    /// The log is only rewritten once the upload has succeeded. With nothing
    /// to upload, no session is opened.
    pub fn sync<T, F>(
        &self,
        kindle_location: &Path,
        only_new: bool,
        connect: F,
    ) -> Result<SyncOutcome, SyncError>
    where
        T: RemoteTree,
        F: FnOnce() -> Result<Session<T>, RemoteError>,
    {
        let batch = self.collect(kindle_location, only_new)?;

        let report = if batch.selected.is_empty() {
            info!("No highlights to upload");
            UploadReport::default()
        } else {
            uploader::upload(connect, &batch.selected, self.styles.sheet())?
        };

        self.log.save(&batch.current)?;

        Ok(SyncOutcome {
            found: batch.current.len(),
            report,
        })
    }
}
