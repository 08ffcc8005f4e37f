use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use url::Url;

use crate::domain::model::{CatalogEntity, CatalogRef, MediaKind};
use crate::domain::ports::{CatalogLookup, ConfigProvider};
use crate::utils::error::{ListError, Result};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    api_code: &'a str,
}

/// Catalog lookup over HTTP. Each media kind is served by its own catalog
/// service, addressed through the route table.
///
/// Per route base `B`:
/// - `GET B/apicode/{ref}` finds an entity, 404 means unknown
/// - `POST B` with `{"apiCode": ref}` fetches from the provider and registers
/// - `DELETE B/{id}` removes a registered entity
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: Client,
    routes: HashMap<MediaKind, Url>,
}

impl HttpCatalogClient {
    pub fn new(routes: HashMap<MediaKind, String>, timeout: Duration) -> Result<Self> {
        let routes = routes
            .into_iter()
            .map(|(kind, base)| {
                Url::parse(&base)
                    .map(|url| (kind, url))
                    .map_err(|e| ListError::InvalidConfigValue {
                        field: format!("catalog.routes.{}", kind),
                        value: base.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<HashMap<_, _>>>()?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ListError::Config {
                field: "catalog".to_string(),
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client, routes })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let routes = MediaKind::ALL
            .iter()
            .filter_map(|kind| {
                config
                    .catalog_route(*kind)
                    .map(|route| (*kind, route.to_string()))
            })
            .collect();
        Self::new(
            routes,
            Duration::from_secs(config.request_timeout_seconds()),
        )
    }

    fn endpoint(&self, kind: MediaKind, segments: &[&str]) -> Result<Url> {
        let mut url = self
            .routes
            .get(&kind)
            .cloned()
            .ok_or_else(|| ListError::invalid_reference(format!("no catalog serves {}", kind)))?;

        url.path_segments_mut()
            .map_err(|_| ListError::Config {
                field: format!("catalog.routes.{}", kind),
                message: "route cannot be used as a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_entity(response: Response) -> Result<CatalogEntity> {
        response
            .json::<CatalogEntity>()
            .await
            .map_err(|e| ListError::unavailable(format!("malformed catalog response: {}", e)))
    }

    async fn unexpected(response: Response) -> ListError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        ListError::unavailable(format!("catalog answered {}: {}", status, body.trim()))
    }
}

#[async_trait]
impl CatalogLookup for HttpCatalogClient {
    async fn find(&self, ref_code: &str, kind: MediaKind) -> Result<Option<CatalogEntity>> {
        let url = self.endpoint(kind, &["apicode", ref_code])?;
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        match response.status() {
            status if status.is_success() => Ok(Some(Self::read_entity(response).await?)),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(Self::unexpected(response).await),
        }
    }

    async fn fetch_or_register(&self, ref_code: &str, kind: MediaKind) -> Result<CatalogEntity> {
        let url = self.endpoint(kind, &[])?;
        tracing::debug!("POST {} ({})", url, ref_code);

        let response = self
            .client
            .post(url)
            .json(&RegisterRequest { api_code: ref_code })
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Self::read_entity(response).await,
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                let body = response.text().await.unwrap_or_default();
                let reason = if body.trim().is_empty() {
                    format!("{} '{}' does not exist", kind, ref_code)
                } else {
                    body.trim().to_string()
                };
                Err(ListError::invalid_reference(reason))
            }
            _ => Err(Self::unexpected(response).await),
        }
    }

    async fn delete(&self, catalog: CatalogRef) -> Result<()> {
        let id = catalog.id.to_string();
        let url = self.endpoint(catalog.kind, &[id.as_str()])?;
        tracing::debug!("DELETE {}", url);

        let response = self.client.delete(url).send().await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(ListError::not_found(format!("Catalog entity {}", catalog))),
            _ => Err(Self::unexpected(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpCatalogClient {
        let routes = HashMap::from([
            (MediaKind::Movie, "http://localhost:8081/api/movies".to_string()),
            (MediaKind::Album, "http://localhost:8082/api/musics/albums/".to_string()),
        ]);
        HttpCatalogClient::new(routes, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_endpoint_building() {
        let client = client();
        assert_eq!(
            client
                .endpoint(MediaKind::Movie, &["apicode", "tt0111161"])
                .unwrap()
                .as_str(),
            "http://localhost:8081/api/movies/apicode/tt0111161"
        );
        assert_eq!(
            client.endpoint(MediaKind::Album, &["42"]).unwrap().as_str(),
            "http://localhost:8082/api/musics/albums/42"
        );
    }

    #[test]
    fn test_reference_codes_are_escaped() {
        let url = client()
            .endpoint(MediaKind::Movie, &["apicode", "a/b c"])
            .unwrap();
        assert_eq!(url.path(), "/api/movies/apicode/a%2Fb%20c");
    }

    #[test]
    fn test_unrouted_kind_is_invalid_reference() {
        assert!(matches!(
            client().endpoint(MediaKind::Song, &[]),
            Err(ListError::InvalidReference { .. })
        ));
    }

    #[test]
    fn test_bad_route_is_rejected() {
        let routes = HashMap::from([(MediaKind::Movie, "not a url".to_string())]);
        assert!(matches!(
            HttpCatalogClient::new(routes, Duration::from_secs(1)),
            Err(ListError::InvalidConfigValue { .. })
        ));
    }
}
