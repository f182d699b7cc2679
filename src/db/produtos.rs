//! Product store queries

use sqlx::Connection;

use super::{LookupError, ProductSuggestion, SqliteLookupStore, MIN_SEARCH_TERM_LEN, SEARCH_LIMIT};

impl SqliteLookupStore {
    /// Thumbnail URL for an exact product code; at most one row.
    pub async fn find_product_image_url(&self, code: &str) -> Result<Option<String>, LookupError> {
        let mut conn = Self::open_readonly(&self.produtos_path).await?;
        let url = sqlx::query_scalar::<_, Option<String>>(
            "SELECT imagem_url FROM produtos WHERE codigo = ? LIMIT 1",
        )
        .bind(code)
        .fetch_optional(&mut conn)
        .await;
        conn.close().await?;

        Ok(url?.flatten())
    }

    pub async fn search_products_by_term(
        &self,
        term: &str,
    ) -> Result<Vec<ProductSuggestion>, LookupError> {
        let term = term.trim().to_lowercase();
        if term.chars().count() < MIN_SEARCH_TERM_LEN {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", term);
        let mut conn = Self::open_readonly(&self.produtos_path).await?;
        let rows = sqlx::query_as::<_, ProductSuggestion>(
            "SELECT CAST(codigo AS TEXT) AS codigo, COALESCE(descricao, '') AS nome FROM produtos WHERE descricao LIKE ? COLLATE NOCASE OR codigo LIKE ? LIMIT ?",
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(&mut conn)
        .await;
        conn.close().await?;

        Ok(rows?)
    }
}
