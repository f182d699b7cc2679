#![allow(dead_code)]

use actix_web::{web, App, HttpResponse, HttpServer};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use documentos_server::config::AppConfig;
use documentos_server::db::{
    AppState, CustomerRecord, CustomerSuggestion, LookupError, LookupStore, ProductSuggestion,
};
use documentos_server::documents::{MeasurementScript, PdfRenderer, RenderError};

pub const MOCK_PDF: &[u8] = b"%PDF-1.4 mock";

/// In-memory customer and product records.
#[derive(Default)]
pub struct MockLookupStore {
    customers: HashMap<String, CustomerRecord>,
    thumbnails: HashMap<String, String>,
    products: Vec<ProductSuggestion>,
    failing: bool,
}

impl MockLookupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails as if the database were unreachable.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_customer(mut self, name: &str, id_cliente: Option<&str>, email: Option<&str>) -> Self {
        self.customers.insert(
            name.to_lowercase(),
            CustomerRecord {
                id_cliente: id_cliente.map(str::to_string),
                email: email.map(str::to_string),
            },
        );
        self
    }

    pub fn with_thumbnail(mut self, code: &str, url: &str) -> Self {
        self.thumbnails.insert(code.to_string(), url.to_string());
        self
    }

    pub fn with_product(mut self, codigo: &str, nome: &str) -> Self {
        self.products.push(ProductSuggestion {
            codigo: codigo.to_string(),
            nome: nome.to_string(),
        });
        self
    }

    fn check(&self) -> Result<(), LookupError> {
        if self.failing {
            Err(LookupError::Query(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LookupStore for MockLookupStore {
    async fn resolve_customer(&self, name: &str) -> Result<Option<CustomerRecord>, LookupError> {
        self.check()?;
        Ok(self.customers.get(&name.to_lowercase()).cloned())
    }

    async fn resolve_product_thumbnail(&self, code: &str) -> Result<Option<String>, LookupError> {
        self.check()?;
        Ok(self.thumbnails.get(code).cloned())
    }

    async fn search_customers(&self, term: &str) -> Result<Vec<CustomerSuggestion>, LookupError> {
        self.check()?;
        let term = term.to_lowercase();
        Ok(self
            .customers
            .iter()
            .filter(|(name, _)| name.contains(&term))
            .map(|(name, record)| CustomerSuggestion {
                nome: name.clone(),
                id_cliente: record.id_cliente.clone(),
                email: record.email.clone(),
            })
            .collect())
    }

    async fn search_products(&self, term: &str) -> Result<Vec<ProductSuggestion>, LookupError> {
        self.check()?;
        let term = term.to_lowercase();
        Ok(self
            .products
            .iter()
            .filter(|p| p.nome.to_lowercase().contains(&term) || p.codigo.contains(&term))
            .cloned()
            .collect())
    }
}

/// One call seen by [`RecordingRenderer`].
#[derive(Debug, Clone)]
pub struct RenderCall {
    pub html: String,
    pub page_height_mm: f64,
}

/// Records what it was asked to render and returns a fixed PDF.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    calls: Arc<Mutex<Vec<RenderCall>>>,
    failing: bool,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PdfRenderer for RecordingRenderer {
    async fn render(&self, html: &str, script: &MeasurementScript) -> Result<Vec<u8>, RenderError> {
        self.calls.lock().unwrap().push(RenderCall {
            html: html.to_string(),
            page_height_mm: script.page_height_mm,
        });
        if self.failing {
            return Err(RenderError::Config("browser unavailable".to_string()));
        }
        Ok(MOCK_PDF.to_vec())
    }
}

/// Config pointing at the repository templates and a private scratch dir.
pub fn test_config(scratch_dir: PathBuf) -> AppConfig {
    AppConfig {
        templates_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates"),
        scratch_dir,
        ..AppConfig::default()
    }
}

pub fn test_state(scratch_dir: PathBuf, lookup: MockLookupStore, renderer: RecordingRenderer) -> AppState {
    AppState::new_with_services(test_config(scratch_dir), Arc::new(lookup), Arc::new(renderer))
        .expect("Failed to build test AppState")
}

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image";

/// How long `/lenta.png` stalls before answering.
pub const SLOW_IMAGE_DELAY: Duration = Duration::from_secs(3);

/// Serve `/foto.png` (200, image/png) and `/lenta.png` (the same image after
/// [`SLOW_IMAGE_DELAY`]) on an ephemeral port; everything else is 404.
/// Returns the base URL. Needs an actix runtime.
pub fn spawn_image_server() -> String {
    let server = HttpServer::new(|| {
        App::new()
            .route(
                "/foto.png",
                web::get().to(|| async { HttpResponse::Ok().content_type("image/png").body(PNG_BYTES) }),
            )
            .route(
                "/lenta.png",
                web::get().to(|| async {
                    actix_web::rt::time::sleep(SLOW_IMAGE_DELAY).await;
                    HttpResponse::Ok().content_type("image/png").body(PNG_BYTES)
                }),
            )
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("Failed to bind image server");

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{}", addr)
}
