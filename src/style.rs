use crate::models::{BlockType, Color, Element, StyleSheet};
use crate::store::{self, StoreError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const VARIABLE_COLOR: &str = "color";
pub const VARIABLE_BLOCK_TYPE: &str = "block.type";

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("Unknown element '{0}', expected title, quote or annotation")]
    UnknownElement(String),
    #[error("Unknown style variable '{0}', expected color or block.type")]
    UnknownVariable(String),
    #[error("Invalid color '{0}'")]
    InvalidColor(String),
    #[error("Invalid block type '{0}'")]
    InvalidBlockType(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Sets `variable` of `element` in `sheet`, validating both names and the value.
pub fn apply_style(
    sheet: &mut StyleSheet,
    element: &str,
    variable: &str,
    value: &str,
) -> Result<(), StyleError> {
    let element: Element = element.parse().map_err(StyleError::UnknownElement)?;
    let rule = sheet.rule_mut(element);

    match variable {
        VARIABLE_COLOR => {
            rule.color = value.parse::<Color>().map_err(StyleError::InvalidColor)?;
        }
        VARIABLE_BLOCK_TYPE => {
            rule.block_type = value
                .parse::<BlockType>()
                .map_err(StyleError::InvalidBlockType)?;
        }
        other => return Err(StyleError::UnknownVariable(other.to_string())),
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct StyleStore {
    path: PathBuf,
    sheet: StyleSheet,
}

impl StyleStore {
    /// Loads `style.json`, regenerating it with defaults when missing or not JSON.
    ///
    /// Unknown colors or block types are an error and the file is left as is.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let sheet = match store::load_json(path) {
            Ok(sheet) => sheet,
            Err(e) if !e.is_unreadable() => return Err(e),
            Err(e) => {
                if path.exists() {
                    warn!(error = %e, "Style file unreadable, writing defaults");
                }
                let sheet = StyleSheet::default();
                store::write_json(path, &sheet)?;
                sheet
            }
        };

        Ok(StyleStore {
            path: path.to_path_buf(),
            sheet,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet(&self) -> &StyleSheet {
        &self.sheet
    }

    /// Updates one style value and rewrites the file. Invalid input leaves both untouched.
    pub fn set(&mut self, element: &str, variable: &str, value: &str) -> Result<(), StyleError> {
        let mut sheet = self.sheet;
        apply_style(&mut sheet, element, variable, value)?;
        store::write_json(&self.path, &sheet)?;
        self.sheet = sheet;

        info!(element, variable, value, "Style updated");
        Ok(())
    }
}
