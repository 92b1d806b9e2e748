//! Folder grouping: derive each file's folder from its path and build the
//! ordered folder → file hierarchy.

use log::debug;

use crate::config::IngestOptions;
use crate::model::{CoverageData, FileRecord, Folder, ProjectStats};

/// Strip the workspace prefix (and the separator following it) from a path.
/// Paths outside the workspace are returned unchanged.
#[must_use]
pub fn normalize_path(path: &str, workspace_prefix: Option<&str>) -> String {
    let Some(prefix) = workspace_prefix.map(|p| p.trim_end_matches('/')) else {
        return path.to_string();
    };
    if prefix.is_empty() {
        return path.to_string();
    }
    match path.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            rest.trim_start_matches('/').to_string()
        }
        _ => path.to_string(),
    }
}

/// Split a path into `(folder, file name)`: everything before the last `/`,
/// and the last segment.
#[must_use]
pub fn split_path(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}

/// Group parsed files into folders.
///
/// Files are sorted by normalized path first, so folder and file order is
/// the same for every run over the same report. When two files land on the
/// same name within one folder, the later one replaces the earlier.
#[must_use]
pub fn group_files(data: CoverageData, options: &IngestOptions) -> ProjectStats {
    let workspace = options.workspace_prefix.as_deref();

    let mut files: Vec<_> = data
        .files
        .into_iter()
        .map(|file| (normalize_path(&file.path, workspace), file))
        .collect();
    files.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut stats = ProjectStats {
        total: data.total,
        ..Default::default()
    };

    for (path, file) in files {
        let (folder, name) = split_path(&path);
        stats
            .folders
            .entry(folder.to_string())
            .or_insert_with(|| Folder::new(folder))
            .insert(FileRecord {
                name: name.to_string(),
                metrics: file.metrics,
                lines: file.lines,
                methods: file.methods,
            });
    }

    debug!(
        "grouped {} files into {} folders",
        stats.file_count(),
        stats.folders.len()
    );
    stats
}
