#[cfg(test)]
mod sqlite_lookup_tests {
    use documentos_server::db::{LookupError, LookupStore, SqliteLookupStore};
    use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
    use sqlx::Connection;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    async fn seed(path: &Path, statements: &[&str]) {
        let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
        let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
        for statement in statements {
            sqlx::query(statement).execute(&mut conn).await.unwrap();
        }
        conn.close().await.unwrap();
    }

    async fn setup_stores() -> (TempDir, SqliteLookupStore) {
        let dir = tempfile::tempdir().unwrap();
        let clientes = dir.path().join("clientes.db");
        let produtos = dir.path().join("produtos.db");

        seed(
            &clientes,
            &[
                "CREATE TABLE clientes (id_cliente INTEGER PRIMARY KEY, nome TEXT NOT NULL, email TEXT)",
                "INSERT INTO clientes (id_cliente, nome, email) VALUES (42, 'ACME Ltda', 'compras@acme.com')",
                "INSERT INTO clientes (id_cliente, nome, email) VALUES (43, 'Padaria Central', NULL)",
            ],
        )
        .await;

        let mut product_rows = vec![
            "CREATE TABLE produtos (codigo INTEGER PRIMARY KEY, descricao TEXT, imagem_url TEXT)".to_string(),
            "INSERT INTO produtos VALUES (50501, 'LUM LED 18W', 'https://cdn.example.com/50501.jpg')".to_string(),
            "INSERT INTO produtos VALUES (7, 'Painel solar', NULL)".to_string(),
        ];
        for code in 1000..1015 {
            product_rows.push(format!(
                "INSERT INTO produtos VALUES ({}, 'Cabo flexível {}', NULL)",
                code, code
            ));
        }
        let product_rows: Vec<&str> = product_rows.iter().map(String::as_str).collect();
        seed(&produtos, &product_rows).await;

        (dir, SqliteLookupStore::new(clientes, produtos))
    }

    #[tokio::test]
    async fn test_customer_lookup_is_case_insensitive() {
        let (_dir, store) = setup_stores().await;

        let record = store.resolve_customer("acme ltda").await.unwrap().unwrap();
        assert_eq!(record.id_cliente.as_deref(), Some("42"));
        assert_eq!(record.email.as_deref(), Some("compras@acme.com"));

        let record = store.resolve_customer("PADARIA CENTRAL").await.unwrap().unwrap();
        assert_eq!(record.email, None);
    }

    #[tokio::test]
    async fn test_unknown_customer_is_none() {
        let (_dir, store) = setup_stores().await;
        assert_eq!(store.resolve_customer("ACME").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_product_thumbnail() {
        let (_dir, store) = setup_stores().await;

        assert_eq!(
            store.resolve_product_thumbnail("50501").await.unwrap().as_deref(),
            Some("https://cdn.example.com/50501.jpg")
        );
        assert_eq!(store.resolve_product_thumbnail("7").await.unwrap(), None);
        assert_eq!(store.resolve_product_thumbnail("999").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_product_search_matches_description_or_code() {
        let (_dir, store) = setup_stores().await;

        let by_description = store.search_products("led").await.unwrap();
        assert_eq!(by_description.len(), 1);
        assert_eq!(by_description[0].codigo, "50501");
        assert_eq!(by_description[0].nome, "LUM LED 18W");

        let by_code = store.search_products("505").await.unwrap();
        assert_eq!(by_code.len(), 1);
    }

    #[tokio::test]
    async fn test_search_is_limited_to_ten() {
        let (_dir, store) = setup_stores().await;
        assert_eq!(store.search_products("cabo").await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_short_search_terms_return_nothing() {
        let (_dir, store) = setup_stores().await;
        assert!(store.search_products("l").await.unwrap().is_empty());
        assert!(store.search_customers(" a ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_customer_search() {
        let (_dir, store) = setup_stores().await;

        let customers = store.search_customers("ADAR").await.unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].nome, "Padaria Central");
        assert_eq!(customers[0].id_cliente.as_deref(), Some("43"));
    }

    #[tokio::test]
    async fn test_missing_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing: PathBuf = dir.path().join("nao-existe.db");
        let store = SqliteLookupStore::new(missing.clone(), missing);

        assert!(matches!(
            store.resolve_customer("ACME").await,
            Err(LookupError::Connect { .. })
        ));
    }
}
