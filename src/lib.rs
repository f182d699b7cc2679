use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{error, http::header, web, App, HttpResponse, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod db;
pub mod documents;
pub mod search;

pub use crate::config::AppConfig;
pub use crate::db::AppState;

/// Body of every failed request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    pub erro: String,
}

impl ErrorResponse {
    pub fn new(message: &str, erro: &str) -> Self {
        Self {
            message: message.to_string(),
            erro: erro.to_string(),
        }
    }

    pub fn internal_error(erro: &str) -> Self {
        Self::new("Erro interno", erro)
    }
}

/// Largest accepted JSON body. Long technical notes and item lists must fit.
pub const MAX_JSON_PAYLOAD_BYTES: usize = 8 * 1024 * 1024;

/// Malformed JSON bodies get the same 500 response as any other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_PAYLOAD_BYTES)
        .error_handler(|err, _req| {
            log::error!("Rejected request body: {}", err);
            let response = HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error(&err.to_string()));
            error::InternalError::from_response(err, response).into()
        })
}

/// Everything under `/api`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .configure(documents::handlers::config)
            .configure(search::routes::config),
    );
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::documents::handlers::generate_quote,
        crate::documents::handlers::generate_exchange,
        crate::search::routes::search_customers,
        crate::search::routes::search_products
    ),
    components(
        schemas(
            documents::DocumentPayload,
            db::CustomerSuggestion,
            db::ProductSuggestion,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Document Service", description = "Quote and exchange receipt PDFs."),
        (name = "Search", description = "Customer and product autocomplete.")
    ),
    servers(
        (url = "http://127.0.0.1:8080", description = "Localhost")
    )
)]
pub struct ApiDoc;

pub async fn run() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let bind_addr = config.bind_addr.clone();

    let app_state = match AppState::new(config) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to build HTTP client for image downloads: {}", e);
            std::process::exit(1);
        }
    };

    let prometheus = match PrometheusMetricsBuilder::new("documentos_server")
        .endpoint("/metrics")
        .build()
    {
        Ok(prometheus) => prometheus,
        Err(e) => {
            log::error!("Failed to create Prometheus metrics middleware: {}", e);
            std::process::exit(1);
        }
    };

    log::info!("Starting server at http://{}", bind_addr);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .expose_headers(vec![header::CONTENT_DISPOSITION])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(configure_api)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(bind_addr)?
    .run()
    .await
}
