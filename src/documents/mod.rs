//! Documents module - quote and exchange receipt generation.
//!
//! One pipeline serves every document kind; the differences live in
//! [`variant::DocumentVariant`]:
//! - `Quote` - orçamento with prices and payment conditions
//! - `ExchangeIn` / `ExchangeOut` - exchange receipts with a technical note

pub mod assets;
pub mod common;
pub mod finance;
pub mod handlers;
pub mod items;
pub mod models;
pub mod payload;
pub mod pipeline;
pub mod render;
pub mod template;
pub mod variant;

pub use models::{AmountOverflow, DocumentKind, DocumentRequest, LineItem, PaymentCondition, Salesperson};
pub use payload::DocumentPayload;
pub use pipeline::DocumentPipeline;
pub use render::{ChromiumRenderer, MeasurementScript, PdfRenderer, RenderError};
pub use variant::DocumentVariant;

use thiserror::Error;

use crate::db::LookupError;

/// Errors that abort a document request.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("failed to load HTML template: {0}")]
    TemplateIo(#[source] std::io::Error),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Amount(#[from] AmountOverflow),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Result of a successful document generation.
#[derive(Debug)]
pub struct GeneratedDocument {
    pub filename: String,
    pub pdf: Vec<u8>,
    pub data: String,
}
