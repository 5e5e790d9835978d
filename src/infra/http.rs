//! reqwest-backed [`ContentSource`] for the supported content APIs.

use async_trait::async_trait;
use reqwest::{Client, Response, Url, header::ACCEPT};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::source::{ContentSource, FetchError};
use crate::config::ApiSettings;
use crate::domain::provider::Provider;
use crate::domain::resources::ResourceKey;

use super::error::InfraError;

/// Error bodies are kept for logs only; cap what we hold on to.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Fields every query projects, in the shape the normalizer reads.
const SANITY_PROJECTION: &str = r#"{
  _id,
  id,
  projectID,
  title,
  description,
  popupText,
  categoryId,
  "imageUrl": image.asset->url,
  sections[] { _key, sectionTitle, "images": images[].asset->url },
  detailImages[] { title, text, "imageUrl": image.asset->url }
}"#;

const STRAPI_POPULATE: [&str; 3] = ["image", "sections.images", "category"];

#[derive(Clone, Debug)]
pub struct HttpContentSource {
    client: Client,
    base: Url,
    provider: Provider,
    token: Option<String>,
    dataset: String,
    api_version: String,
    page_size: u32,
}

impl HttpContentSource {
    pub fn new(api: &ApiSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(api.timeout)
            .build()?;

        let mut base = api.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            client,
            base,
            provider: api.provider,
            token: api.token.clone(),
            dataset: api.dataset.clone(),
            api_version: api.api_version.clone(),
            page_size: api.page_size.get(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("folio/", env!("CARGO_PKG_VERSION"))
    }

    /// The full request URL for `resource`, query string included.
    pub fn request_url(&self, resource: &ResourceKey) -> Result<Url, FetchError> {
        let invalid =
            |err: url::ParseError| FetchError::transport(format!("invalid request URL: {err}"));

        match self.provider {
            Provider::Strapi => {
                let mut url = self
                    .base
                    .join(&format!("api/{}", strapi_collection(resource)))
                    .map_err(invalid)?;
                {
                    let mut pairs = url.query_pairs_mut();
                    for (index, relation) in STRAPI_POPULATE.iter().enumerate() {
                        pairs.append_pair(&format!("populate[{index}]"), relation);
                    }
                    pairs.append_pair("sort[0]", "id:asc");
                    pairs.append_pair("pagination[pageSize]", &self.page_size.to_string());
                }
                Ok(url)
            }
            Provider::Sanity => {
                let mut url = self
                    .base
                    .join(&format!(
                        "v{}/data/query/{}",
                        self.api_version, self.dataset
                    ))
                    .map_err(invalid)?;
                url.query_pairs_mut()
                    .append_pair("query", &sanity_query(resource));
                Ok(url)
            }
        }
    }

    async fn handle(response: Response) -> Result<Value, FetchError> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(FetchError::transport)?;
        if !status.is_success() {
            let body: String = String::from_utf8_lossy(&bytes)
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_slice(&bytes).map_err(FetchError::decode)
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    #[instrument(skip(self, resource), fields(provider = %self.provider, resource = %resource))]
    async fn fetch(&self, resource: &ResourceKey) -> Result<Value, FetchError> {
        let url = self.request_url(resource)?;
        debug!(url = %url, "requesting content");

        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        if let Some(token) = self.token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(FetchError::transport)?;
        Self::handle(response).await
    }
}

fn strapi_collection(resource: &ResourceKey) -> &str {
    match resource {
        ResourceKey::Main => "mains",
        ResourceKey::Projects => "projects",
        ResourceKey::Collection(name) => name,
    }
}

fn sanity_query(resource: &ResourceKey) -> String {
    let (document_type, order) = match resource {
        ResourceKey::Main => ("main".to_string(), "id asc"),
        ResourceKey::Projects => ("index".to_string(), "categoryId asc, id asc"),
        ResourceKey::Collection(name) => (name.replace('"', "\\\""), "id asc"),
    };
    format!("*[_type == \"{document_type}\"] | order({order}) {SANITY_PROJECTION}")
}
