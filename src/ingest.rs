use log::debug;

use crate::changeset::{attribute, TouchedFile};
use crate::config::IngestOptions;
use crate::error::Result;
use crate::group::group_files;
use crate::model::ProjectStats;
use crate::parsers::clover::CloverParser;
use crate::parsers::ReportParser;

/// Parse a Clover report and group it into folders. Project totals come
/// from the report's project-level metrics.
pub fn ingest(xml: &str, options: &IngestOptions) -> Result<ProjectStats> {
    let data = CloverParser.parse(xml)?;
    Ok(group_files(data, options))
}

/// Like [`ingest`], then restrict the result to the files touched by a
/// change-set and re-estimate the totals over the touched lines.
///
/// The totals are an approximation; see [`attribute`].
pub fn ingest_changes(
    xml: &str,
    touched: &[TouchedFile],
    options: &IngestOptions,
) -> Result<ProjectStats> {
    let stats = ingest(xml, options)?;
    debug!("attributing coverage to {} touched files", touched.len());
    attribute(&stats, touched)
}
