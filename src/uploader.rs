use crate::models::{Highlight, StyleSheet};
use crate::parser::display_location;
use crate::remote::{NewBlock, NodeId, Placement, RemoteError, RemoteTree, Session};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Could not open the Notion page, check notion.v2token and notion.page: {0}")]
    Credential(#[source] RemoteError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Highlights of one book, in the order they were clipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookGroup<'a> {
    pub title: &'a str,
    pub highlights: Vec<&'a Highlight>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadReport {
    pub sections_created: usize,
    pub sections_extended: usize,
    pub highlights: usize,
}

/// Groups highlights by book title, keeping the order titles first appear in.
pub fn group_by_book(highlights: &[Highlight]) -> Vec<BookGroup<'_>> {
    let mut groups: Vec<BookGroup<'_>> = Vec::new();

    for highlight in highlights {
        match groups.iter_mut().find(|g| g.title == highlight.book_title) {
            Some(group) => group.highlights.push(highlight),
            None => groups.push(BookGroup {
                title: &highlight.book_title,
                highlights: vec![highlight],
            }),
        }
    }

    groups
}

/// Opens a session with `connect` and uploads `highlights` into it.
///
/// Any failure while connecting is reported as [`UploadError::Credential`].
/// Failures after that abort the remaining books; blocks already created stay.
pub fn upload<T, F>(
    connect: F,
    highlights: &[Highlight],
    styles: &StyleSheet,
) -> Result<UploadReport, UploadError>
where
    T: RemoteTree,
    F: FnOnce() -> Result<Session<T>, RemoteError>,
{
    let session = connect().map_err(UploadError::Credential)?;
    Ok(upload_to(&session, highlights, styles)?)
}

pub fn upload_to<T: RemoteTree>(
    session: &Session<T>,
    highlights: &[Highlight],
    styles: &StyleSheet,
) -> Result<UploadReport, RemoteError> {
    let mut report = UploadReport::default();
    let mut known_titles = session.section_titles()?;
    debug!(sections = known_titles.len(), "Loaded existing sections");

    for group in group_by_book(highlights) {
        if known_titles.iter().any(|t| t == group.title) {
            extend_section(session, &group, styles)?;
            report.sections_extended += 1;
        } else {
            create_section(session, &group, styles)?;
            known_titles.push(group.title.to_string());
            report.sections_created += 1;
        }
        report.highlights += group.highlights.len();
    }

    Ok(report)
}

fn create_section<T: RemoteTree>(
    session: &Session<T>,
    group: &BookGroup<'_>,
    styles: &StyleSheet,
) -> Result<(), RemoteError> {
    let header = session.tree.create_child(
        &session.root,
        NewBlock::styled(styles.title.block_type, group.title, styles.title.color),
    )?;

    for highlight in &group.highlights {
        let entry = create_entry(session, highlight, styles)?;

        if styles.title.block_type.is_container() {
            for node in entry {
                session.tree.move_node(&node, Placement::LastChildOf(&header))?;
            }
        }
    }

    info!(book = group.title, highlights = group.highlights.len(), "Created section");
    Ok(())
}

// Existing sections nest each entry as a chain: quote > location > divider.
fn extend_section<T: RemoteTree>(
    session: &Session<T>,
    group: &BookGroup<'_>,
    styles: &StyleSheet,
) -> Result<(), RemoteError> {
    let header = session
        .find_section(group.title)?
        .ok_or_else(|| RemoteError::SectionMissing(group.title.to_string()))?;

    for highlight in &group.highlights {
        let [quote, location, divider] = create_entry(session, highlight, styles)?;

        session.tree.move_node(&quote, Placement::LastChildOf(&header))?;
        session.tree.move_node(&location, Placement::LastChildOf(&quote))?;
        session.tree.move_node(&divider, Placement::LastChildOf(&location))?;
    }

    info!(book = group.title, highlights = group.highlights.len(), "Extended section");
    Ok(())
}

/// Appends quote, location and divider blocks to the root page.
fn create_entry<T: RemoteTree>(
    session: &Session<T>,
    highlight: &Highlight,
    styles: &StyleSheet,
) -> Result<[NodeId; 3], RemoteError> {
    let location = display_location(&highlight.location);

    let quote_id = session.tree.create_child(
        &session.root,
        NewBlock::styled(styles.quote.block_type, &highlight.quote, styles.quote.color),
    )?;
    let location_id = session.tree.create_child(
        &session.root,
        NewBlock::styled(styles.annotation.block_type, &location, styles.annotation.color),
    )?;
    let divider_id = session.tree.create_child(&session.root, NewBlock::divider())?;

    Ok([quote_id, location_id, divider_id])
}
