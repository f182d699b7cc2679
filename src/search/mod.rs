//! Search module - autocomplete over the customer and product stores.

pub mod routes;

use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Partial name or code; shorter than two characters returns nothing.
    #[serde(default)]
    pub search: String,
}
