pub mod client;
pub mod cloud_controller;
pub mod error;
pub mod fake;
pub mod models;

pub use client::BuildpackClient;
pub use cloud_controller::CloudControllerClient;
pub use error::PlatformError;
#[allow(unused_imports)]
pub use fake::FakeBuildpackClient;
pub use models::{Buildpack, ClientIdentity};
