//! Form payload as posted by the browser, and its normalization into a
//! [`DocumentRequest`].
//!
//! Repeated form fields arrive either as a single value or as an array
//! depending on how many rows the user filled in. [`OneOrMany`] absorbs that
//! at the boundary so nothing downstream ever branches on shape.

use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::finance::build_conditions;
use super::items::normalize_items;
use super::models::{DocumentKind, DocumentRequest, Salesperson};

const DEFAULT_EXCHANGE_SALESPERSON: &str = "Setor Técnico";

/// A single form value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
    Null,
}

impl Scalar {
    /// Textual form of the value; `None` for null and booleans.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Flag(_) | Self::Null => None,
        }
    }

    fn is_blank(&self) -> bool {
        self.as_text().map_or(true, |s| s.trim().is_empty())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A form field that may hold one value or a list of values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    Many(Vec<Scalar>),
    One(Scalar),
}

impl Default for OneOrMany {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl OneOrMany {
    /// Ordered sequence view. A blank single value is an empty sequence.
    pub fn into_vec(self) -> Vec<Scalar> {
        match self {
            Self::Many(values) => values,
            Self::One(value) if value.is_blank() => Vec::new(),
            Self::One(value) => vec![value],
        }
    }
}

/// JSON body of `POST /api/documentos/{orcamento,troca}`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DocumentPayload {
    #[serde(default)]
    pub cliente_nome: Option<String>,
    #[serde(default)]
    pub cliente_cnpj: Option<String>,
    #[serde(default)]
    pub cliente_email: Option<String>,
    /// JSON-encoded `{nome, imagem}` or a plain name.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub vendedor: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub produto_nome: OneOrMany,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub quantidade: OneOrMany,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub valor_unitario: OneOrMany,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub condicao_pagamento: OneOrMany,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub valor_condicao: OneOrMany,
    #[serde(default)]
    pub relato_tecnico: Option<String>,
    /// `ENTRADA` or `SAIDA` (exchange only).
    #[serde(default)]
    pub tipo_documento: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub observacao: OneOrMany,
}

impl DocumentPayload {
    pub fn into_quote_request(self) -> DocumentRequest {
        self.into_request(DocumentKind::Quote)
    }

    pub fn into_exchange_request(self) -> DocumentRequest {
        let kind = DocumentKind::from_movement(self.tipo_documento.as_deref());
        self.into_request(kind)
    }

    fn into_request(self, kind: DocumentKind) -> DocumentRequest {
        let mut salesperson = parse_salesperson(self.vendedor.as_ref());
        if kind.is_exchange() && salesperson.name.trim().is_empty() {
            salesperson.name = DEFAULT_EXCHANGE_SALESPERSON.to_string();
        }

        let names = self.produto_nome.into_vec();
        let quantities = self.quantidade.into_vec();
        let items = if kind.is_exchange() {
            normalize_items(&names, &quantities, None)
        } else {
            let prices = self.valor_unitario.into_vec();
            normalize_items(&names, &quantities, Some(&prices))
        };

        let conditions = if kind.is_exchange() {
            Vec::new()
        } else {
            build_conditions(
                &self.condicao_pagamento.into_vec(),
                &self.valor_condicao.into_vec(),
            )
        };

        let observations = self
            .observacao
            .into_vec()
            .iter()
            .filter_map(Scalar::as_text)
            .map(|obs| obs.trim().to_string())
            .filter(|obs| !obs.is_empty())
            .collect();

        DocumentRequest {
            kind,
            customer_name: self.cliente_nome.unwrap_or_default(),
            customer_identifier: non_blank(self.cliente_cnpj),
            customer_email: non_blank(self.cliente_email),
            salesperson,
            items,
            conditions,
            technical_note: if kind.is_exchange() {
                non_blank(self.relato_tecnico)
            } else {
                None
            },
            observations,
        }
    }
}

/// The salesperson select posts its option value, which is a JSON object
/// string. Free text falls back to being the name.
pub fn parse_salesperson(value: Option<&Value>) -> Salesperson {
    let field = |obj: &serde_json::Map<String, Value>, key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default()
    };
    let from_object = |obj: &serde_json::Map<String, Value>| Salesperson {
        name: field(obj, "nome"),
        portrait: Some(field(obj, "imagem")).filter(|p| !p.trim().is_empty()),
    };

    match value {
        Some(Value::Object(obj)) => from_object(obj),
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(obj)) => from_object(&obj),
            _ => Salesperson {
                name: raw.clone(),
                portrait: None,
            },
        },
        _ => Salesperson::default(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_field_is_promoted() {
        let payload: DocumentPayload = serde_json::from_value(json!({
            "produto_nome": "100 - Widget",
            "quantidade": 2,
            "valor_unitario": "10"
        }))
        .unwrap();

        let request = payload.into_quote_request();
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].code, "100");
        assert_eq!(request.items[0].quantity, 2);
    }

    #[test]
    fn test_missing_and_null_fields_are_empty() {
        let payload: DocumentPayload = serde_json::from_value(json!({
            "cliente_nome": "ACME",
            "condicao_pagamento": null,
            "observacao": ""
        }))
        .unwrap();

        let request = payload.into_quote_request();
        assert!(request.items.is_empty());
        assert!(request.conditions.is_empty());
        assert!(request.observations.is_empty());
    }

    #[test]
    fn test_salesperson_json_string() {
        let value = json!(r#"{"nome":"Ana","imagem":"/public/ana.png"}"#);
        let salesperson = parse_salesperson(Some(&value));
        assert_eq!(salesperson.name, "Ana");
        assert_eq!(salesperson.portrait.as_deref(), Some("/public/ana.png"));
    }

    #[test]
    fn test_salesperson_plain_name() {
        let value = json!("Carlos");
        let salesperson = parse_salesperson(Some(&value));
        assert_eq!(salesperson.name, "Carlos");
        assert_eq!(salesperson.portrait, None);
    }

    #[test]
    fn test_exchange_defaults_salesperson() {
        let request = DocumentPayload {
            tipo_documento: Some("ENTRADA".to_string()),
            ..Default::default()
        }
        .into_exchange_request();

        assert_eq!(request.kind, DocumentKind::ExchangeIn);
        assert_eq!(request.salesperson.name, "Setor Técnico");
    }

    #[test]
    fn test_exchange_ignores_prices_and_conditions() {
        let payload: DocumentPayload = serde_json::from_value(json!({
            "tipo_documento": "SAIDA",
            "produto_nome": ["1 - A"],
            "quantidade": ["4"],
            "valor_unitario": ["99"],
            "condicao_pagamento": ["PIX"],
            "relato_tecnico": "Trocado o driver"
        }))
        .unwrap();

        let request = payload.into_exchange_request();
        assert_eq!(request.kind, DocumentKind::ExchangeOut);
        assert_eq!(request.items[0].unit_price, None);
        assert!(request.conditions.is_empty());
        assert_eq!(request.technical_note.as_deref(), Some("Trocado o driver"));
    }

    #[test]
    fn test_blank_overrides_are_absent() {
        let request = DocumentPayload {
            cliente_cnpj: Some("  ".to_string()),
            cliente_email: Some("a@b.com".to_string()),
            ..Default::default()
        }
        .into_quote_request();

        assert_eq!(request.customer_identifier, None);
        assert_eq!(request.customer_email.as_deref(), Some("a@b.com"));
    }
}
