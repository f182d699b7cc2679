//! Database module - AppState and the read-only lookup stores
//!
//! The customer and product tables live in two separate SQLite files that are
//! maintained elsewhere; this service only reads them:
//! - `clientes` - customer lookups by name
//! - `produtos` - product thumbnails and autocomplete

mod clientes;
mod produtos;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;

use crate::config::AppConfig;
use crate::documents::render::{ChromiumRenderer, PdfRenderer};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("failed to open lookup store {path}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },
    #[error("lookup query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Identifier and email stored for a customer. Either may be missing.
#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow)]
pub struct CustomerRecord {
    pub id_cliente: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct CustomerSuggestion {
    pub nome: String,
    pub id_cliente: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct ProductSuggestion {
    pub codigo: String,
    pub nome: String,
}

/// Read access to the customer and product records.
///
/// Absence is `Ok(None)`; `Err` means the store itself could not be used.
#[async_trait]
pub trait LookupStore {
    async fn resolve_customer(&self, name: &str) -> Result<Option<CustomerRecord>, LookupError>;

    async fn resolve_product_thumbnail(&self, code: &str) -> Result<Option<String>, LookupError>;

    async fn search_customers(&self, term: &str) -> Result<Vec<CustomerSuggestion>, LookupError>;

    async fn search_products(&self, term: &str) -> Result<Vec<ProductSuggestion>, LookupError>;
}

/// SQLite-backed lookups. Every call opens its own read-only connection and
/// closes it before returning.
#[derive(Debug, Clone)]
pub struct SqliteLookupStore {
    clientes_path: PathBuf,
    produtos_path: PathBuf,
}

impl SqliteLookupStore {
    pub fn new(clientes_path: impl Into<PathBuf>, produtos_path: impl Into<PathBuf>) -> Self {
        Self {
            clientes_path: clientes_path.into(),
            produtos_path: produtos_path.into(),
        }
    }

    async fn open_readonly(path: &Path) -> Result<SqliteConnection, LookupError> {
        let options = SqliteConnectOptions::new().filename(path).read_only(true);
        SqliteConnection::connect_with(&options)
            .await
            .map_err(|source| LookupError::Connect {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Minimum search term length for autocomplete.
pub const MIN_SEARCH_TERM_LEN: usize = 2;
pub const SEARCH_LIMIT: i64 = 10;

#[async_trait]
impl LookupStore for SqliteLookupStore {
    async fn resolve_customer(&self, name: &str) -> Result<Option<CustomerRecord>, LookupError> {
        self.find_customer_by_name(name).await
    }

    async fn resolve_product_thumbnail(&self, code: &str) -> Result<Option<String>, LookupError> {
        self.find_product_image_url(code).await
    }

    async fn search_customers(&self, term: &str) -> Result<Vec<CustomerSuggestion>, LookupError> {
        self.search_customers_by_name(term).await
    }

    async fn search_products(&self, term: &str) -> Result<Vec<ProductSuggestion>, LookupError> {
        self.search_products_by_term(term).await
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub http_client: reqwest::Client,
    pub lookup: Arc<dyn LookupStore + Send + Sync>,
    pub renderer: Arc<dyn PdfRenderer + Send + Sync>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, reqwest::Error> {
        let lookup = Arc::new(SqliteLookupStore::new(
            config.clientes_db_path.clone(),
            config.produtos_db_path.clone(),
        ));
        let renderer = Arc::new(ChromiumRenderer::new(
            config.chrome_executable.clone(),
            config.render_timeout,
        ));
        Self::new_with_services(config, lookup, renderer)
    }

    pub fn new_with_services(
        config: AppConfig,
        lookup: Arc<dyn LookupStore + Send + Sync>,
        renderer: Arc<dyn PdfRenderer + Send + Sync>,
    ) -> Result<Self, reqwest::Error> {
        // Some image hosts reject requests without a browser-like agent.
        let http_client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0")
            .timeout(config.image_fetch_timeout)
            .build()?;

        Ok(AppState {
            config: Arc::new(config),
            http_client,
            lookup,
            renderer,
        })
    }
}
