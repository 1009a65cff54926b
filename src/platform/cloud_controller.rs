use crate::artifact::{package_artifact, ArtifactError, PackagedArtifact};
use crate::config::PlatformConfig;
use crate::platform::client::BuildpackClient;
use crate::platform::error::PlatformError;
use crate::platform::models::{
    ApiErrorBody, Buildpack, BuildpackEntity, BuildpackPage, BuildpackResource, ClientIdentity,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

const PAGE_SIZE: u32 = 100;

/// Buildpack client for a Cloud Foundry v2 style control plane
#[derive(Clone)]
pub struct CloudControllerClient {
    api_endpoint: String,
    access_token: String,
    user: Option<String>,
    http: Client,
}

impl CloudControllerClient {
    /// Create a new client from configuration
    pub fn new(config: &PlatformConfig) -> Result<Self, PlatformError> {
        let access_token = config.resolve_access_token().ok_or_else(|| {
            PlatformError::Configuration("No access token configured".to_string())
        })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .danger_accept_invalid_certs(config.skip_ssl_validation)
            .user_agent(concat!("buildpack-reconciler/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                PlatformError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        info!("Created buildpack client for {}", config.api_endpoint);

        Ok(Self::with_http_client(
            &config.api_endpoint,
            &access_token,
            config.user.as_deref(),
            http,
        ))
    }

    /// Create a client around a pre-built `reqwest::Client`
    pub fn with_http_client(
        api_endpoint: &str,
        access_token: &str,
        user: Option<&str>,
        http: Client,
    ) -> Self {
        Self {
            api_endpoint: api_endpoint.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            user: user.map(str::to_string),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_endpoint, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.access_token)
    }

    async fn fetch_page(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<BuildpackPage, PlatformError> {
        debug!("GET {} {:?}", path, query);
        let response = self
            .authorized(self.http.get(self.url(path)))
            .query(query)
            .send()
            .await?;
        decode(check(response, path).await?).await
    }

    async fn send_entity(
        &self,
        builder: RequestBuilder,
        what: &str,
        entity: &BuildpackEntity,
    ) -> Result<Buildpack, PlatformError> {
        let response = self.authorized(builder).json(entity).send().await?;
        let resource: BuildpackResource = decode(check(response, what).await?).await?;
        Ok(resource.into())
    }
}

/// Turn non-success responses into `PlatformError`
async fn check(response: Response, what: &str) -> Result<Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(PlatformError::NotFound(what.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or(ApiErrorBody {
        code: 0,
        description: text,
    });
    Err(PlatformError::Api {
        status: status.as_u16(),
        code: body.code,
        description: body.description,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, PlatformError> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| PlatformError::Decode(e.to_string()))
}

#[async_trait]
impl BuildpackClient for CloudControllerClient {
    fn identity(&self) -> ClientIdentity {
        ClientIdentity::new(&self.api_endpoint, self.user.as_deref())
    }

    async fn list(&self) -> Result<Vec<Buildpack>, PlatformError> {
        let mut buildpacks = Vec::new();
        let mut page = self
            .fetch_page(
                "/v2/buildpacks",
                &[("results-per-page", PAGE_SIZE.to_string())],
            )
            .await?;

        loop {
            buildpacks.extend(page.resources.into_iter().map(Buildpack::from));
            match page.next_url {
                Some(next) if !next.is_empty() => {
                    page = self.fetch_page(&next, &[]).await?;
                }
                _ => break,
            }
        }

        debug!("Listed {} buildpacks", buildpacks.len());
        Ok(buildpacks)
    }

    async fn find_by_name(&self, name: &str) -> Result<Buildpack, PlatformError> {
        let page = self
            .fetch_page("/v2/buildpacks", &[("q", format!("name:{}", name))])
            .await?;
        page.resources
            .into_iter()
            .next()
            .map(Buildpack::from)
            .ok_or_else(|| PlatformError::NotFound(format!("Buildpack {}", name)))
    }

    async fn create(
        &self,
        name: &str,
        position: Option<i64>,
        enabled: Option<bool>,
        locked: Option<bool>,
    ) -> Result<Buildpack, PlatformError> {
        debug!("Creating buildpack {}", name);
        let entity = BuildpackEntity {
            name: name.to_string(),
            filename: None,
            position,
            enabled,
            locked,
        };
        self.send_entity(
            self.http.post(self.url("/v2/buildpacks")),
            &format!("Buildpack {}", name),
            &entity,
        )
        .await
    }

    async fn update(&self, buildpack: &Buildpack) -> Result<Buildpack, PlatformError> {
        debug!("Updating buildpack {} ({})", buildpack.name, buildpack.guid);
        let entity = BuildpackEntity {
            name: buildpack.name.clone(),
            filename: None,
            position: buildpack.position,
            enabled: buildpack.enabled,
            locked: buildpack.locked,
        };
        self.send_entity(
            self.http
                .put(self.url(&format!("/v2/buildpacks/{}", buildpack.guid))),
            &format!("Buildpack {}", buildpack.guid),
            &entity,
        )
        .await
    }

    async fn delete(&self, guid: &str) -> Result<(), PlatformError> {
        debug!("Deleting buildpack {}", guid);
        let response = self
            .authorized(self.http.delete(self.url(&format!("/v2/buildpacks/{}", guid))))
            .send()
            .await?;
        check(response, &format!("Buildpack {}", guid)).await?;
        Ok(())
    }

    async fn package_artifact(&self, path: &str) -> Result<PackagedArtifact, PlatformError> {
        Ok(package_artifact(path, &self.http).await?)
    }

    async fn upload(
        &self,
        buildpack: &Buildpack,
        artifact: PackagedArtifact,
        filename: &str,
    ) -> Result<(), PlatformError> {
        debug!(
            "Uploading {} ({} bytes) to buildpack {}",
            filename,
            artifact.size(),
            buildpack.guid
        );
        let file = tokio::fs::File::open(artifact.path())
            .await
            .map_err(ArtifactError::from)?;
        let length = file.metadata().await.map_err(ArtifactError::from)?.len();
        let part = Part::stream_with_length(Body::from(file), length)
            .file_name(filename.to_string())
            .mime_str("application/zip")?;
        let form = Form::new().part("buildpack", part);

        let response = self
            .authorized(
                self.http
                    .put(self.url(&format!("/v2/buildpacks/{}/bits", buildpack.guid))),
            )
            .multipart(form)
            .send()
            .await?;
        check(response, &format!("Buildpack {}", buildpack.guid)).await?;

        info!("Uploaded {} to buildpack {}", filename, buildpack.name);
        Ok(())
    }
}
