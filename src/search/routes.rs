use actix_web::{web, HttpResponse, Responder};
use log;

use super::SearchQuery;
use crate::db::{CustomerSuggestion, ProductSuggestion};
use crate::{AppState, ErrorResponse};

#[utoipa::path(
    get,
    path = "/api/clientes",
    tag = "Search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Up to ten matching customers", body = Vec<CustomerSuggestion>),
        (status = 500, description = "Customer store unavailable", body = ErrorResponse)
    )
)]
pub async fn search_customers(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> impl Responder {
    match state.lookup.search_customers(&query.search).await {
        Ok(customers) => HttpResponse::Ok().json(customers),
        Err(e) => {
            log::error!("Customer search failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&e.to_string()))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/produtos",
    tag = "Search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Up to ten matching products", body = Vec<ProductSuggestion>),
        (status = 500, description = "Product store unavailable", body = ErrorResponse)
    )
)]
pub async fn search_products(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> impl Responder {
    match state.lookup.search_products(&query.search).await {
        Ok(products) => HttpResponse::Ok().json(products),
        Err(e) => {
            log::error!("Product search failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&e.to_string()))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/clientes").route(web::get().to(search_customers)))
        .service(web::resource("/produtos").route(web::get().to(search_products)));
}
