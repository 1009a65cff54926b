use crate::artifact::error::ArtifactError;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Suffix given to directories, which are zipped before upload
pub const ARCHIVE_SUFFIX: &str = ".zip";

/// Whether `path` points at a web resource rather than the local filesystem
pub fn is_web_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Derive the filename a buildpack artifact is uploaded under.
///
/// URLs keep their last path segment. Local paths are made absolute and keep
/// their base name; directories get [`ARCHIVE_SUFFIX`] appended since they are
/// zipped before upload. Never touches the network.
pub fn artifact_filename(path: &str) -> Result<String, ArtifactError> {
    if is_web_url(path) {
        return Ok(url_base_name(path));
    }

    let absolute = std::path::absolute(Path::new(path))
        .map(|p| normalize(&p))
        .map_err(|e| ArtifactError::Resolve {
            path: path.into(),
            source: e,
        })?;
    let metadata = std::fs::metadata(&absolute).map_err(|e| ArtifactError::Resolve {
        path: absolute.clone(),
        source: e,
    })?;

    let mut filename = absolute
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| absolute.to_string_lossy().into_owned());

    if metadata.is_dir() {
        filename.push_str(ARCHIVE_SUFFIX);
    }
    Ok(filename)
}

/// Lexically drop `.` and resolve `..` against the preceding component
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn url_base_name(raw: &str) -> String {
    if let Ok(url) = Url::parse(raw) {
        if let Some(last) = url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        {
            return last.to_string();
        }
        if let Some(host) = url.host_str() {
            return host.to_string();
        }
    }
    raw.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(raw)
        .to_string()
}
