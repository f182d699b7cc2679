//! Customer store queries

use sqlx::Connection;

use super::{
    CustomerRecord, CustomerSuggestion, LookupError, SqliteLookupStore, MIN_SEARCH_TERM_LEN,
    SEARCH_LIMIT,
};

impl SqliteLookupStore {
    /// Case-insensitive exact match on the customer name; at most one row.
    pub async fn find_customer_by_name(
        &self,
        name: &str,
    ) -> Result<Option<CustomerRecord>, LookupError> {
        let mut conn = Self::open_readonly(&self.clientes_path).await?;
        let row = sqlx::query_as::<_, CustomerRecord>(
            "SELECT CAST(id_cliente AS TEXT) AS id_cliente, email FROM clientes WHERE nome = ? COLLATE NOCASE LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&mut conn)
        .await;
        conn.close().await?;

        Ok(row?)
    }

    pub async fn search_customers_by_name(
        &self,
        term: &str,
    ) -> Result<Vec<CustomerSuggestion>, LookupError> {
        let term = term.trim().to_lowercase();
        if term.chars().count() < MIN_SEARCH_TERM_LEN {
            return Ok(Vec::new());
        }

        let mut conn = Self::open_readonly(&self.clientes_path).await?;
        let rows = sqlx::query_as::<_, CustomerSuggestion>(
            "SELECT nome, CAST(id_cliente AS TEXT) AS id_cliente, email FROM clientes WHERE nome LIKE ? COLLATE NOCASE ORDER BY nome LIMIT ?",
        )
        .bind(format!("%{}%", term))
        .bind(SEARCH_LIMIT)
        .fetch_all(&mut conn)
        .await;
        conn.close().await?;

        Ok(rows?)
    }
}
