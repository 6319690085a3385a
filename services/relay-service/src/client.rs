use reqwest::{header::ACCEPT, Url};
use serde_json::Value;
use tracing::{info_span, Instrument};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::models::{ItemEnvelope, NewItem};

const USER_AGENT: &str = concat!("cms-relay/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct CmsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CmsClient {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let base_url = Url::parse(&config.cms_api_base_url)
            .map_err(|err| RelayError::UpstreamUrl(format!("{}: {err}", config.cms_api_base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(RelayError::UpstreamUrl(format!(
                "{} cannot be used as a base url",
                config.cms_api_base_url
            )));
        }

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
        })
    }

    pub fn items_url(&self, collection_id: &str) -> Result<Url, RelayError> {
        // The url crate drops dot segments instead of encoding them.
        if matches!(collection_id, "." | "..") {
            return Err(RelayError::UpstreamUrl(format!(
                "collection id {collection_id:?} is not a usable path segment"
            )));
        }
        // Pushed as one segment, so '/', '?' and '#' are percent-encoded.
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RelayError::UpstreamUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["v1", "collections", collection_id, "items"]);
        Ok(url)
    }

    pub async fn create_item(&self, item: &NewItem) -> Result<Value, RelayError> {
        let url = self.items_url(&item.collection_id)?;
        let span = info_span!("cms_create_item", collection_id = %item.collection_id);

        async move {
            let response = self
                .http
                .post(url)
                .bearer_auth(&item.api_token)
                .header(ACCEPT, "application/json")
                .json(&ItemEnvelope {
                    fields: &item.fields,
                })
                .send()
                .await?;

            let status = response.status();
            // Raw text first: error pages are often not JSON.
            let body = response.text().await?;
            tracing::info!(status = status.as_u16(), "cms responded");

            if !status.is_success() {
                return Err(RelayError::Upstream { status, body });
            }

            Ok(serde_json::from_str(&body)?)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> CmsClient {
        CmsClient::new(&RelayConfig {
            cms_api_base_url: base.to_string(),
            ..RelayConfig::default()
        })
        .expect("client")
    }

    #[test]
    fn items_url_follows_collection_layout() {
        let url = client("https://api.webflow.com")
            .items_url("580e63fc8c9a982ac9b8b745")
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://api.webflow.com/v1/collections/580e63fc8c9a982ac9b8b745/items"
        );
    }

    #[test]
    fn items_url_keeps_base_path_prefix() {
        let url = client("http://localhost:9000/cms/").items_url("abc").expect("url");
        assert_eq!(url.as_str(), "http://localhost:9000/cms/v1/collections/abc/items");
    }

    #[test]
    fn collection_id_cannot_escape_its_segment() {
        let url = client("https://api.webflow.com")
            .items_url("../../sites?x=1")
            .expect("url");
        let segments: Vec<&str> = url.path_segments().expect("segments").collect();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0], "v1");
        assert_eq!(segments[3], "items");
        assert!(url.query().is_none());
        assert!(!url.as_str().contains("/sites"));
    }

    #[test]
    fn dot_segments_are_rejected_as_collection_ids() {
        let cms = client("https://api.webflow.com");
        for id in [".", ".."] {
            assert!(
                matches!(cms.items_url(id), Err(RelayError::UpstreamUrl(_))),
                "{id} must not collapse the path"
            );
        }
        assert!(cms.items_url("...").is_ok());
    }

    #[test]
    fn rejects_unusable_base_urls() {
        for base in ["not a url", "mailto:cms@example.com"] {
            let result = CmsClient::new(&RelayConfig {
                cms_api_base_url: base.to_string(),
                ..RelayConfig::default()
            });
            assert!(matches!(result, Err(RelayError::UpstreamUrl(_))), "{base}");
        }
    }
}
