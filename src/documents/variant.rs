//! Per-document-kind settings for the shared template.
//!
//! Quotes and exchange receipts render through the same template; this
//! descriptor holds everything that differs between them.

use super::common::escape_css_string;
use super::models::DocumentKind;

/// How the download filename is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameScheme {
    /// `orcamento_<customer>.pdf`
    CustomerName,
    /// `troca_<movement>_<unix millis>.pdf`
    MovementTimestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentVariant {
    pub kind: DocumentKind,
    /// Title painted over `.titulo-documento`; `None` keeps the template's.
    pub title: Option<&'static str>,
    /// Heading and border color of the technical diagnosis box.
    pub diagnosis_heading: Option<&'static str>,
    pub accent_color: Option<&'static str>,
    /// Hide the unit price and line total columns.
    pub hide_price_columns: bool,
    /// Hide the template's fixed list of standard terms.
    pub hide_standard_terms: bool,
    /// Number given to the first user observation.
    pub observation_start: usize,
    /// Page height used for pagination, a little under A4 so rounding never
    /// pushes content across a page boundary.
    pub page_height_mm: f64,
    /// Base `min-height` of the container before measurement.
    pub base_min_height_mm: u32,
    pub filename_scheme: FilenameScheme,
}

impl DocumentVariant {
    pub fn for_kind(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Quote => Self {
                kind,
                title: None,
                diagnosis_heading: None,
                accent_color: None,
                hide_price_columns: false,
                hide_standard_terms: false,
                observation_start: 5,
                page_height_mm: 280.0,
                base_min_height_mm: 285,
                filename_scheme: FilenameScheme::CustomerName,
            },
            DocumentKind::ExchangeIn => Self {
                kind,
                title: Some("COMPROVANTE DE ENTRADA (TROCA)"),
                diagnosis_heading: Some("RELATO DO CLIENTE / MOTIVO DE ANALISE"),
                accent_color: Some("#B12B30"),
                ..Self::exchange(kind)
            },
            DocumentKind::ExchangeOut => Self {
                kind,
                title: Some("COMPROVANTE DE SAÍDA (TROCA)"),
                diagnosis_heading: Some("RELATÓRIO DE SAÍDA / CONSERTO"),
                accent_color: Some("#22c55e"),
                ..Self::exchange(kind)
            },
        }
    }

    fn exchange(kind: DocumentKind) -> Self {
        Self {
            kind,
            title: None,
            diagnosis_heading: None,
            accent_color: None,
            hide_price_columns: true,
            hide_standard_terms: true,
            observation_start: 1,
            page_height_mm: 296.0,
            base_min_height_mm: 296,
            filename_scheme: FilenameScheme::MovementTimestamp,
        }
    }

    /// CSS injected after the shared stylesheet.
    pub fn css_override(&self) -> String {
        let mut css = String::new();

        if self.hide_price_columns {
            css.push_str(
                "table th:nth-child(5), table th:nth-child(6),\n\
                 table td:nth-child(5), table td:nth-child(6) { display: none !important; }\n\
                 .esconder-coluna { display: none !important; }\n",
            );
        }

        if let Some(title) = self.title {
            css.push_str(&format!(
                ".titulo-documento {{ font-size: 0 !important; }}\n\
                 .titulo-documento::after {{ content: \"{}\"; font-size: 20px; font-weight: bold; display: block; text-align: center; margin-bottom: 15px; }}\n",
                escape_css_string(title)
            ));
        }

        if self.hide_standard_terms {
            css.push_str(".observacoes-padrao { display: none !important; }\n");
        }

        css.push_str(&format!(
            ".page-container {{ display: flex !important; flex-direction: column !important; min-height: {}mm; padding-bottom: 0 !important; }}\n\
             .vendedor-info-section {{ margin-top: auto !important; width: 100%; page-break-inside: avoid; padding-bottom: 10px; text-align: center; }}\n\
             @media print {{ body {{ margin: 0; padding: 0; }} .page-container {{ box-shadow: none; margin: 0; width: 100%; }} }}\n",
            self.base_min_height_mm
        ));

        css
    }
}
