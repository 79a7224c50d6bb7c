//! Upload Kindle highlights to a Notion page.
//!
//! `My Clippings.txt` is parsed into [`models::Highlight`]s, compared with
//! the log of earlier uploads, and the new ones are appended to the page
//! grouped under one section per book.

pub mod config;
pub mod diff;
pub mod models;
pub mod parser;
pub mod remote;
pub mod store;
pub mod style;
pub mod uploader;
pub mod workspace;

pub use models::{Highlight, StyleSheet};
pub use workspace::{SyncError, Workspace};
