//! HTML template composition.
//!
//! The template carries `{{name}}` tokens. Every token in [`Placeholder::ALL`]
//! is always substituted, with an empty string when the document kind has no
//! use for it, so no raw token ever reaches the renderer.

use lazy_static::lazy_static;
use regex::{Captures, NoExpand, Regex};
use std::collections::BTreeMap;

use super::common::escape_html;
use super::finance::{format_item_currency, format_total_currency, ConditionRow};
use super::models::{AmountOverflow, LineItem};
use super::variant::DocumentVariant;

lazy_static! {
    static ref LOGO_SRC: Regex = Regex::new(r#"src="[^"]*?logo\.png""#).unwrap();
    static ref TOKEN: Regex = Regex::new(r"\{\{([a-z_]+)\}\}").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Placeholder {
    CustomerName,
    CustomerIdentifier,
    CustomerEmail,
    SalespersonName,
    SalespersonPortrait,
    /// Payment conditions on quotes, the diagnosis box on exchanges.
    SummaryArea,
    Items,
    Observations,
    Date,
    LegacyPaymentCondition,
    LegacyConditionBoxes,
    LegacyTotal,
}

impl Placeholder {
    pub const ALL: [Placeholder; 12] = [
        Self::CustomerName,
        Self::CustomerIdentifier,
        Self::CustomerEmail,
        Self::SalespersonName,
        Self::SalespersonPortrait,
        Self::SummaryArea,
        Self::Items,
        Self::Observations,
        Self::Date,
        Self::LegacyPaymentCondition,
        Self::LegacyConditionBoxes,
        Self::LegacyTotal,
    ];

    /// Name inside the `{{...}}` token.
    pub fn name(self) -> &'static str {
        match self {
            Self::CustomerName => "cliente_nome",
            Self::CustomerIdentifier => "cliente_cnpj",
            Self::CustomerEmail => "cliente_email",
            Self::SalespersonName => "vendedor_nome",
            Self::SalespersonPortrait => "vendedor_info",
            Self::SummaryArea => "area_condicoes_pagamento",
            Self::Items => "itens",
            Self::Observations => "observacoes_adicionais",
            Self::Date => "data",
            Self::LegacyPaymentCondition => "condicao_pagamento",
            Self::LegacyConditionBoxes => "condicoes_adicionais_boxes",
            Self::LegacyTotal => "total",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Rendered fragment for each placeholder. Unset keys render as empty.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderMap {
    values: BTreeMap<Placeholder, String>,
}

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: Placeholder, value: impl Into<String>) -> &mut Self {
        self.values.insert(key, value.into());
        self
    }

    pub fn get(&self, key: Placeholder) -> &str {
        self.values.get(&key).map(String::as_str).unwrap_or("")
    }

    /// Substitute every known token in a single scan of the template.
    /// Substituted text is never rescanned; unknown tokens are left alone.
    pub fn apply(&self, template: &str) -> String {
        TOKEN
            .replace_all(template, |caps: &Captures| match Placeholder::from_name(&caps[1]) {
                Some(key) => self.get(key).to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// Static files the template needs, loaded once per request.
#[derive(Debug, Clone, Default)]
pub struct TemplateAssets {
    pub template: String,
    pub stylesheet: String,
    /// `data:` URI of the logo, empty when the file is missing.
    pub logo_data_uri: String,
}

/// Final HTML handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedDocument {
    pub html: String,
}

/// Resolve the template into a complete HTML document.
pub fn compose(
    assets: &TemplateAssets,
    variant: &DocumentVariant,
    values: &PlaceholderMap,
) -> ComposedDocument {
    let style = format!(
        "<style>{}\n{}</style></head>",
        assets.stylesheet,
        variant.css_override()
    );
    let html = assets.template.replacen("</head>", &style, 1);
    let html = replace_logo(&html, &assets.logo_data_uri);

    ComposedDocument {
        html: values.apply(&html),
    }
}

/// Point every `src` ending in `logo.png` at the inline logo.
pub fn replace_logo(html: &str, logo_data_uri: &str) -> String {
    let replacement = format!(r#"src="{}""#, logo_data_uri);
    LOGO_SRC.replace_all(html, NoExpand(&replacement)).into_owned()
}

const NO_PHOTO_CELL: &str = r#"<div style="width:50px; height:50px; background:#eee; border:1px solid #ddd; display:flex; align-items:center; justify-content:center; font-size:9px; color:#999; margin:auto;">S/ FOTO</div>"#;

/// Thumbnail cell content: the inline image, or the gray placeholder.
pub fn thumbnail_cell(code: &str, image: Option<&str>) -> String {
    match image {
        Some(data_uri) => format!(
            r#"<img src="{}" alt="{}" style="width:50px; height:50px; object-fit:contain; display:block; margin:auto;" />"#,
            data_uri,
            escape_html(code)
        ),
        None => NO_PHOTO_CELL.to_string(),
    }
}

/// One `<tr>` of the items table. Exchange rows keep six cells so the
/// column-hiding CSS lines up with the header.
pub fn item_row(item: &LineItem, thumbnail: &str) -> Result<String, AmountOverflow> {
    let (unit, total) = match (item.unit_price, item.extended_price()?) {
        (Some(unit), Some(total)) => (
            format!(r#"<td style="vertical-align:middle;">{}</td>"#, format_item_currency(unit)),
            format!(r#"<td style="vertical-align:middle;">{}</td>"#, format_item_currency(total)),
        ),
        _ => (
            r#"<td class="esconder-coluna"></td>"#.to_string(),
            r#"<td class="esconder-coluna"></td>"#.to_string(),
        ),
    };

    Ok(format!(
        r#"
        <tr>
            <td style="width:60px; text-align:center; padding:5px;">{}</td>
            <td style="vertical-align:middle; text-align:center;">{}</td>
            <td style="vertical-align:middle;">{}</td>
            <td style="text-align:center; vertical-align:middle;">{}</td>
            {}
            {}
        </tr>"#,
        thumbnail,
        escape_html(&item.code),
        escape_html(&item.description),
        item.quantity,
        unit,
        total
    ))
}

/// Payment summary boxes for quotes.
pub fn condition_rows_html(rows: &[ConditionRow]) -> String {
    rows.iter()
        .enumerate()
        .map(|(index, row)| match &row.label {
            Some(label) => format!(
                r#"
        <div class="resumo-flex" style="margin-top: 0px; margin-bottom: 2px;">
            <div class="condicoes-box"><span class="titulo-condicao">CONDIÇÃO {}:</span><div class="valor-condicao">{}</div></div>
            <div class="total-box"><span class="total-label">TOTAL:</span><span class="total-value">{}</span></div>
        </div>"#,
                index + 1,
                escape_html(label),
                format_total_currency(row.amount)
            ),
            None => format!(
                r#"<div class="resumo-flex"><div class="condicoes-box"></div><div class="total-box"><span class="total-label">TOTAL:</span><span class="total-value">{}</span></div></div>"#,
                format_total_currency(row.amount)
            ),
        })
        .collect()
}

/// Technical diagnosis box for exchange receipts.
pub fn diagnosis_box(heading: &str, accent_color: &str, note: Option<&str>) -> String {
    let note = note
        .map(escape_html)
        .unwrap_or_else(|| "Nenhum relato informado.".to_string());
    format!(
        r#"
      <div class="relato-tecnico" style="border: 2px solid {accent}; border-radius: 8px; margin: 20px 0; padding: 15px; background-color: #fffaf5; page-break-inside: avoid;">
        <h3 style="margin-top: 0; color: {accent}; font-size: 14px; text-transform: uppercase;">{heading}</h3>
        <p style="margin: 0; font-size: 13px; line-height: 1.5; color: #333; white-space: pre-wrap;">{note}</p>
      </div>
    "#,
        accent = accent_color,
        heading = escape_html(heading),
        note = note
    )
}

/// Numbered `<li>` list of observations.
pub fn observations_html(observations: &[String], start: usize) -> String {
    observations
        .iter()
        .enumerate()
        .map(|(idx, obs)| format!("<li>{}. {}</li>", idx + start, escape_html(obs)))
        .collect()
}

/// Salesperson portrait block, empty when there is no image.
pub fn portrait_html(data_uri: Option<&str>) -> String {
    data_uri
        .map(|uri| {
            format!(
                r#"<img src="{}" style="width: 100%; max-height: 150px; object-fit: contain; display: block; margin: 0 auto;">"#,
                uri
            )
        })
        .unwrap_or_default()
}
