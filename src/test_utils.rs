use crate::cache::CollectionCache;
use crate::config::BuildpackConfig;
use crate::platform::Buildpack;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Creates a remote buildpack record with the schema defaults
///
/// Other fields can be customized after creation if needed
pub fn create_test_buildpack(guid: &str, name: &str) -> Buildpack {
    Buildpack {
        guid: guid.to_string(),
        name: name.to_string(),
        filename: String::new(),
        position: Some(1),
        enabled: Some(true),
        locked: Some(false),
    }
}

/// Creates a declared buildpack with the schema defaults and an optional path
pub fn create_test_config(name: &str, path: Option<&Path>) -> BuildpackConfig {
    BuildpackConfig {
        name: name.to_string(),
        path: path.map(|p| p.to_string_lossy().into_owned()),
        position: 1,
        enabled: true,
        locked: false,
    }
}

/// A cache that never expires
pub fn create_test_cache() -> Arc<CollectionCache> {
    Arc::new(CollectionCache::new(NonZeroUsize::new(8).unwrap(), None))
}

/// Creates a directory named `name` holding a minimal buildpack layout
pub fn create_buildpack_dir(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(dir.join("bin")).unwrap();
    std::fs::write(dir.join("bin").join("detect"), "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::write(dir.join("manifest.yml"), "language: test\n").unwrap();
    dir
}

/// Writes an empty but valid zip archive
pub fn create_zip_file(root: &Path, name: &str) -> PathBuf {
    let path = root.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let writer = zip::ZipWriter::new(file);
    writer.finish().unwrap();
    path
}
