use actix_web::http::header::ContentDisposition;
use actix_web::{web, HttpResponse, Responder};
use log::{error, info};

use super::models::DocumentRequest;
use super::payload::DocumentPayload;
use super::pipeline::DocumentPipeline;
use crate::{AppState, ErrorResponse};

#[utoipa::path(
    context_path = "/api",
    tag = "Document Service",
    post,
    path = "/documentos/orcamento",
    request_body = DocumentPayload,
    responses(
        (status = 200, description = "Quote PDF", body = Vec<u8>, content_type = "application/pdf"),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn generate_quote(
    payload: web::Json<DocumentPayload>,
    data: web::Data<AppState>,
) -> impl Responder {
    info!("Executing generate_quote handler");
    let request = payload.into_inner().into_quote_request();
    render_response(&data, &request).await
}

#[utoipa::path(
    context_path = "/api",
    tag = "Document Service",
    post,
    path = "/documentos/troca",
    request_body = DocumentPayload,
    responses(
        (status = 200, description = "Exchange receipt PDF", body = Vec<u8>, content_type = "application/pdf"),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn generate_exchange(
    payload: web::Json<DocumentPayload>,
    data: web::Data<AppState>,
) -> impl Responder {
    info!("Executing generate_exchange handler");
    let request = payload.into_inner().into_exchange_request();
    render_response(&data, &request).await
}

async fn render_response(state: &AppState, request: &DocumentRequest) -> HttpResponse {
    info!(
        "Generating {} for '{}' with {} items",
        request.kind.as_str(),
        request.customer_name,
        request.items.len()
    );

    match DocumentPipeline::new(state).generate(request).await {
        Ok(document) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header(ContentDisposition::attachment(document.filename))
            .body(document.pdf),
        Err(e) => {
            error!("Failed to generate {}: {}", request.kind.as_str(), e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&e.to_string()))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/documentos/orcamento").route(web::post().to(generate_quote)))
        .service(web::resource("/documentos/troca").route(web::post().to(generate_exchange)));
}
