//! Vehicle make/model lookup backed by the CarQuery public API. The catalog is
//! decorative: form dropdowns fall back to free text when it is unreachable, so
//! the degraded helpers swallow errors after logging them.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::{AppError, AppResult};

pub const DEFAULT_BASE_URL: &str = "https://www.carqueryapi.com/api/0.3/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Make {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelName {
    pub name: String,
}

#[async_trait]
pub trait VehicleCatalog: Send + Sync {
    async fn makes(&self) -> AppResult<Vec<Make>>;
    async fn models(&self, make_id: &str) -> AppResult<Vec<ModelName>>;
}

#[derive(Deserialize)]
struct RawMake {
    make_id: String,
    make_display: String,
}

#[derive(Deserialize)]
struct MakesPayload {
    #[serde(rename = "Makes")]
    makes: Vec<RawMake>,
}

#[derive(Deserialize)]
struct RawModel {
    model_name: String,
}

#[derive(Deserialize)]
struct ModelsPayload {
    #[serde(rename = "Models")]
    models: Vec<RawModel>,
}

pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        HttpCatalog {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl VehicleCatalog for HttpCatalog {
    async fn makes(&self) -> AppResult<Vec<Make>> {
        let payload: MakesPayload = self
            .client
            .get(&self.base_url)
            .query(&[("cmd", "getMakes")])
            .send()
            .await
            .map_err(AppError::from)?
            .error_for_status()
            .map_err(AppError::from)?
            .json()
            .await
            .map_err(AppError::from)?;
        Ok(payload
            .makes
            .into_iter()
            .map(|m| Make {
                id: m.make_id,
                display_name: m.make_display,
            })
            .collect())
    }

    async fn models(&self, make_id: &str) -> AppResult<Vec<ModelName>> {
        let payload: ModelsPayload = self
            .client
            .get(&self.base_url)
            .query(&[("cmd", "getModels"), ("make", make_id)])
            .send()
            .await
            .map_err(AppError::from)?
            .error_for_status()
            .map_err(AppError::from)?
            .json()
            .await
            .map_err(AppError::from)?;
        Ok(payload
            .models
            .into_iter()
            .map(|m| ModelName { name: m.model_name })
            .collect())
    }
}

/// A catalog response that may have been replaced by an empty fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogList<T> {
    pub items: Vec<T>,
    pub degraded: bool,
}

pub async fn makes_or_empty(catalog: &dyn VehicleCatalog) -> CatalogList<Make> {
    match catalog.makes().await {
        Ok(items) => CatalogList {
            items,
            degraded: false,
        },
        Err(err) => {
            warn!(target: "autovault", event = "catalog_degraded", lookup = "makes", error = %err);
            CatalogList {
                items: Vec::new(),
                degraded: true,
            }
        }
    }
}

pub async fn models_or_empty(catalog: &dyn VehicleCatalog, make_id: &str) -> CatalogList<ModelName> {
    match catalog.models(make_id).await {
        Ok(items) => CatalogList {
            items,
            degraded: false,
        },
        Err(err) => {
            warn!(
                target: "autovault",
                event = "catalog_degraded",
                lookup = "models",
                make = make_id,
                error = %err
            );
            CatalogList {
                items: Vec::new(),
                degraded: true,
            }
        }
    }
}
