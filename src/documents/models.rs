//! Normalized document data, shared by every pipeline stage.

use rust_decimal::Decimal;
use thiserror::Error;

/// A money amount outside the range exact decimal arithmetic can hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("amount out of range: {0}")]
pub struct AmountOverflow(pub String);

/// Which document is being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Orçamento.
    Quote,
    /// Comprovante de entrada (troca).
    ExchangeIn,
    /// Comprovante de saída (troca).
    ExchangeOut,
}

impl DocumentKind {
    /// Map the exchange form's `tipo_documento`. Anything but `ENTRADA` is an
    /// outgoing receipt.
    pub fn from_movement(tipo_documento: Option<&str>) -> Self {
        match tipo_documento.map(str::trim) {
            Some(t) if t.eq_ignore_ascii_case("ENTRADA") => Self::ExchangeIn,
            _ => Self::ExchangeOut,
        }
    }

    pub fn is_exchange(self) -> bool {
        matches!(self, Self::ExchangeIn | Self::ExchangeOut)
    }

    /// Movement label used in exchange filenames.
    pub fn movement_label(self) -> Option<&'static str> {
        match self {
            Self::Quote => None,
            Self::ExchangeIn => Some("ENTRADA"),
            Self::ExchangeOut => Some("SAIDA"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "orcamento",
            Self::ExchangeIn => "troca_entrada",
            Self::ExchangeOut => "troca_saida",
        }
    }
}

/// Salesperson shown at the foot of the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Salesperson {
    pub name: String,
    /// Portrait file reference; only its basename is used.
    pub portrait: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    /// Raw "CODE - DESCRIPTION" text as typed in the form.
    pub name: String,
    pub code: String,
    pub description: String,
    pub quantity: u64,
    /// `None` for exchange documents, which carry no prices.
    pub unit_price: Option<Decimal>,
}

impl LineItem {
    /// Unit price times quantity, `Ok(None)` for unpriced items.
    pub fn extended_price(&self) -> Result<Option<Decimal>, AmountOverflow> {
        let Some(price) = self.unit_price else {
            return Ok(None);
        };
        price
            .checked_mul(Decimal::from(self.quantity))
            .map(Some)
            .ok_or_else(|| AmountOverflow(format!("extended price of '{}'", self.name)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentCondition {
    pub label: String,
    /// Zero means the row shows the grand total.
    pub fixed_value: Decimal,
}

impl PaymentCondition {
    pub fn absorbs_remainder(&self) -> bool {
        self.fixed_value <= Decimal::ZERO
    }
}

/// Customer fields as they will be printed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerInfo {
    pub name: String,
    pub identifier: String,
    pub email: String,
}

/// Input to the document pipeline after boundary normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRequest {
    pub kind: DocumentKind,
    pub customer_name: String,
    pub customer_identifier: Option<String>,
    pub customer_email: Option<String>,
    pub salesperson: Salesperson,
    pub items: Vec<LineItem>,
    pub conditions: Vec<PaymentCondition>,
    pub technical_note: Option<String>,
    pub observations: Vec<String>,
}
