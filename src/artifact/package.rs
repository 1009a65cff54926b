use crate::artifact::error::ArtifactError;
use crate::artifact::namer::is_web_url;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use tokio::task;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const ZIP_SIGNATURES: [&[u8; 4]; 2] = [b"PK\x03\x04", b"PK\x05\x06"];

/// An archive ready to be uploaded as buildpack bits
///
/// Archives built into a temporary file are removed when this is dropped.
#[derive(Debug)]
pub struct PackagedArtifact {
    path: PathBuf,
    size: u64,
    _temp: Option<TempPath>,
}

impl PackagedArtifact {
    /// Wrap an archive that already exists on disk
    pub fn existing(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            _temp: None,
        }
    }

    fn temporary(temp: TempPath, size: u64) -> Self {
        Self {
            path: temp.to_path_buf(),
            size,
            _temp: Some(temp),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Package `path` into an uploadable zip archive.
///
/// * `path` - A directory (zipped), a zip file (used as-is) or a web URL (downloaded)
/// * `http` - Client used for downloads
pub async fn package_artifact(
    path: &str,
    http: &reqwest::Client,
) -> Result<PackagedArtifact, ArtifactError> {
    if is_web_url(path) {
        return download(path, http).await;
    }

    let local = std::path::absolute(Path::new(path)).map_err(|e| ArtifactError::Resolve {
        path: path.into(),
        source: e,
    })?;
    task::spawn_blocking(move || package_local(&local))
        .await
        .map_err(|e| ArtifactError::Package(PathBuf::from("<task>"), format!("Task panic: {e}")))?
}

fn package_local(path: &Path) -> Result<PackagedArtifact, ArtifactError> {
    let metadata = std::fs::metadata(path).map_err(|e| ArtifactError::Resolve {
        path: path.to_path_buf(),
        source: e,
    })?;

    if metadata.is_dir() {
        return zip_directory(path);
    }

    let mut header = [0u8; 4];
    let mut file = File::open(path)?;
    let is_zip = file.read_exact(&mut header).is_ok()
        && ZIP_SIGNATURES.iter().any(|sig| **sig == header);
    if !is_zip {
        return Err(ArtifactError::NotAnArchive(path.to_path_buf()));
    }

    debug!("Using existing archive {}", path.display());
    Ok(PackagedArtifact::existing(path.to_path_buf(), metadata.len()))
}

fn zip_directory(dir: &Path) -> Result<PackagedArtifact, ArtifactError> {
    debug!("Zipping directory {}", dir.display());
    let package_err =
        |e: zip::result::ZipError| ArtifactError::Package(dir.to_path_buf(), e.to_string());

    let temp = NamedTempFile::new()?;
    let mut writer = ZipWriter::new(temp.reopen()?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = std::fs::read_dir(&current)?.collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let entry_path = entry.path();
            let relative = entry_path
                .strip_prefix(dir)
                .map_err(|e| ArtifactError::Package(dir.to_path_buf(), e.to_string()))?
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");

            if entry.file_type()?.is_dir() {
                writer
                    .add_directory(format!("{relative}/"), options)
                    .map_err(package_err)?;
                pending.push(entry_path);
            } else {
                writer.start_file(relative, options).map_err(package_err)?;
                let mut source = File::open(&entry_path)?;
                std::io::copy(&mut source, &mut writer)?;
            }
        }
    }

    let mut file = writer.finish().map_err(package_err)?;
    file.flush()?;
    let size = file.metadata()?.len();

    Ok(PackagedArtifact::temporary(temp.into_temp_path(), size))
}

async fn download(url: &str, http: &reqwest::Client) -> Result<PackagedArtifact, ArtifactError> {
    debug!("Downloading buildpack from {}", url);
    let download_err = |e: reqwest::Error| ArtifactError::Download(url.to_string(), e.to_string());

    let response = http
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(download_err)?;
    let body = response.bytes().await.map_err(download_err)?;

    let mut temp = NamedTempFile::new()?;
    temp.write_all(&body)?;
    temp.flush()?;

    Ok(PackagedArtifact::temporary(
        temp.into_temp_path(),
        body.len() as u64,
    ))
}
