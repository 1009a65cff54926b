pub mod error;
pub mod namer;
pub mod package;

pub use error::ArtifactError;
pub use namer::{artifact_filename, is_web_url};
pub use package::{package_artifact, PackagedArtifact};
