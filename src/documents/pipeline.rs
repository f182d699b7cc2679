//! Document pipeline: lookups, assets, totals, composition and rendering.

use chrono::Utc;

use super::assets::{load_portrait, load_template_assets, AssetFetcher};
use super::common::{escape_html, sanitize_filename, today_br};
use super::finance::{condition_rows, grand_total};
use super::models::{CustomerInfo, DocumentRequest, LineItem};
use super::render::MeasurementScript;
use super::template::{
    compose, condition_rows_html, diagnosis_box, item_row, observations_html, portrait_html,
    thumbnail_cell, ComposedDocument, Placeholder, PlaceholderMap,
};
use super::variant::{DocumentVariant, FilenameScheme};
use super::{GeneratedDocument, GeneratorError};
use crate::db::AppState;

/// Runs one request through every stage. Holds no state of its own beyond
/// the shared services in [`AppState`].
pub struct DocumentPipeline<'a> {
    state: &'a AppState,
}

impl<'a> DocumentPipeline<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Compose and render `request` into a PDF.
    pub async fn generate(
        &self,
        request: &DocumentRequest,
    ) -> Result<GeneratedDocument, GeneratorError> {
        let variant = DocumentVariant::for_kind(request.kind);
        let data = today_br();

        let composed = self.compose(request, &data).await?;
        let script = MeasurementScript::new(variant.page_height_mm);
        let pdf = self.state.renderer.render(&composed.html, &script).await?;

        let filename = output_filename(&variant, &request.customer_name, Utc::now().timestamp_millis());
        log::info!(
            "Generated {} ({} bytes, {} items)",
            filename,
            pdf.len(),
            request.items.len()
        );

        Ok(GeneratedDocument {
            filename,
            pdf,
            data,
        })
    }

    /// Build the final HTML for `request`, dated `data`.
    pub async fn compose(
        &self,
        request: &DocumentRequest,
        data: &str,
    ) -> Result<ComposedDocument, GeneratorError> {
        let variant = DocumentVariant::for_kind(request.kind);
        let assets = load_template_assets(&self.state.config).await?;
        let customer = self.resolve_customer(request).await?;
        let items = self.item_rows(&request.items).await?;

        let summary = if request.kind.is_exchange() {
            diagnosis_box(
                variant.diagnosis_heading.unwrap_or_default(),
                variant.accent_color.unwrap_or_default(),
                request.technical_note.as_deref(),
            )
        } else {
            let total = grand_total(&request.items)?;
            condition_rows_html(&condition_rows(&request.conditions, total))
        };

        let portrait = match request.salesperson.portrait.as_deref() {
            Some(reference) => load_portrait(&self.state.config.public_dir(), reference).await,
            None => None,
        };

        let mut values = PlaceholderMap::new();
        values
            .set(Placeholder::CustomerName, escape_html(&customer.name))
            .set(Placeholder::CustomerIdentifier, escape_html(&customer.identifier))
            .set(Placeholder::CustomerEmail, escape_html(&customer.email))
            .set(Placeholder::SalespersonName, escape_html(&request.salesperson.name))
            .set(Placeholder::SalespersonPortrait, portrait_html(portrait.as_deref()))
            .set(Placeholder::SummaryArea, summary)
            .set(Placeholder::Items, items)
            .set(
                Placeholder::Observations,
                observations_html(&request.observations, variant.observation_start),
            )
            .set(Placeholder::Date, data);

        Ok(compose(&assets, &variant, &values))
    }

    /// Fill identifier and email from the customer store unless the request
    /// already carries them.
    async fn resolve_customer(&self, request: &DocumentRequest) -> Result<CustomerInfo, GeneratorError> {
        let name = request.customer_name.trim();
        let record = if name.is_empty() {
            None
        } else {
            self.state.lookup.resolve_customer(name).await?
        };
        let record = record.unwrap_or_default();

        Ok(CustomerInfo {
            name: request.customer_name.clone(),
            identifier: request
                .customer_identifier
                .clone()
                .or(record.id_cliente)
                .unwrap_or_default(),
            email: request
                .customer_email
                .clone()
                .or(record.email)
                .unwrap_or_default(),
        })
    }

    async fn item_rows(&self, items: &[LineItem]) -> Result<String, GeneratorError> {
        let fetcher = AssetFetcher::new(&self.state.http_client, &self.state.config.scratch_dir);
        let mut rows = String::new();

        for item in items {
            let image = match self.thumbnail_url(&item.code).await? {
                Some(url) => fetcher.fetch_remote_image(&url).await,
                None => None,
            };
            rows.push_str(&item_row(item, &thumbnail_cell(&item.code, image.as_deref()))?);
        }

        Ok(rows)
    }

    /// Remote thumbnail URL for a product code, if it has a usable one.
    async fn thumbnail_url(&self, code: &str) -> Result<Option<String>, GeneratorError> {
        if code.is_empty() {
            return Ok(None);
        }
        let url = self.state.lookup.resolve_product_thumbnail(code).await?;
        Ok(url
            .map(|u| u.trim().to_string())
            .filter(|u| u.starts_with("http")))
    }
}

/// Download filename for a finished document.
pub fn output_filename(variant: &DocumentVariant, customer_name: &str, now_millis: i64) -> String {
    match variant.filename_scheme {
        FilenameScheme::CustomerName => {
            format!("orcamento_{}.pdf", sanitize_filename(customer_name, "cliente"))
        }
        FilenameScheme::MovementTimestamp => format!(
            "troca_{}_{}.pdf",
            variant.kind.movement_label().unwrap_or("SAIDA"),
            now_millis
        ),
    }
}
