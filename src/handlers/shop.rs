//! Public storefront: browsing, kiosk status and the face verification stub.

use crate::models::*;
use crate::services::{CatalogService, FaceService};
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/home",
    tag = "shop",
    responses(
        (status = 200, description = "Landing page figures", body = HomeStats)
    )
)]
pub async fn home(catalog: web::Data<CatalogService>) -> Result<HttpResponse> {
    match catalog.home_stats().await {
        Ok(stats) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": stats
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/counties",
    tag = "shop",
    responses(
        (status = 200, description = "All counties")
    )
)]
pub async fn counties(catalog: web::Data<CatalogService>) -> Result<HttpResponse> {
    match catalog.counties().await {
        Ok(counties) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": counties
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/categories",
    tag = "shop",
    responses(
        (status = 200, description = "Active top-level categories")
    )
)]
pub async fn categories(catalog: web::Data<CatalogService>) -> Result<HttpResponse> {
    match catalog.top_level_categories().await {
        Ok(categories) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": categories
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/stores",
    tag = "shop",
    params(StoreQuery),
    responses(
        (status = 200, description = "Active stores")
    )
)]
pub async fn list_stores(
    catalog: web::Data<CatalogService>,
    query: web::Query<StoreQuery>,
) -> Result<HttpResponse> {
    match catalog.list_stores(&query).await {
        Ok(stores) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": stores
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/stores/{store_id}",
    tag = "shop",
    params(
        ("store_id" = Uuid, Path, description = "Store id")
    ),
    responses(
        (status = 200, description = "Store with products on its shelves", body = StoreDetail),
        (status = 404, description = "Store not found")
    )
)]
pub async fn store_detail(
    catalog: web::Data<CatalogService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match catalog.store_detail(path.into_inner()).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": detail
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/stores/{store_id}/status",
    tag = "shop",
    params(
        ("store_id" = Uuid, Path, description = "Store id")
    ),
    responses(
        (status = 200, description = "Live store figures", body = StoreStatus),
        (status = 404, description = "Store not found")
    )
)]
pub async fn store_status(
    catalog: web::Data<CatalogService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match catalog.store_status(path.into_inner()).await {
        Ok(status) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": status
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/products",
    tag = "shop",
    params(ProductQuery),
    responses(
        (status = 200, description = "Active products, 24 per page")
    )
)]
pub async fn list_products(
    catalog: web::Data<CatalogService>,
    query: web::Query<ProductQuery>,
) -> Result<HttpResponse> {
    match catalog.list_products(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/products/{product_id}",
    tag = "shop",
    params(
        ("product_id" = Uuid, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "Product with stores stocking it", body = ProductDetail),
        (status = 404, description = "Product not found")
    )
)]
pub async fn product_detail(
    catalog: web::Data<CatalogService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match catalog.product_detail(path.into_inner()).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": detail
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/products/{product_id}/availability/{store_id}",
    tag = "shop",
    params(
        ("product_id" = Uuid, Path, description = "Product id"),
        ("store_id" = Uuid, Path, description = "Store id")
    ),
    responses(
        (status = 200, description = "Shelf availability", body = ProductAvailability)
    )
)]
pub async fn product_availability(
    catalog: web::Data<CatalogService>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (product_id, store_id) = path.into_inner();
    match catalog.product_availability(product_id, store_id).await {
        Ok(availability) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": availability
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/promotions",
    tag = "shop",
    responses(
        (status = 200, description = "Promotions running now")
    )
)]
pub async fn promotions(catalog: web::Data<CatalogService>) -> Result<HttpResponse> {
    match catalog.active_promotions().await {
        Ok(promotions) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": promotions
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/face/verify",
    tag = "shop",
    request_body = VerifyFaceRequest,
    responses(
        (status = 200, description = "Verification result", body = VerifyFaceResponse)
    )
)]
pub async fn verify_face(
    face_service: web::Data<FaceService>,
    request: web::Json<VerifyFaceRequest>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(face_service.verify(&request)))
}

pub fn shop_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/home", web::get().to(home))
        .route("/counties", web::get().to(counties))
        .route("/categories", web::get().to(categories))
        .route("/promotions", web::get().to(promotions))
        .route("/face/verify", web::post().to(verify_face))
        .service(
            web::scope("/stores")
                .route("", web::get().to(list_stores))
                .route("/{store_id}", web::get().to(store_detail))
                .route("/{store_id}/status", web::get().to(store_status)),
        )
        .service(
            web::scope("/products")
                .route("", web::get().to(list_products))
                .route("/{product_id}", web::get().to(product_detail))
                .route(
                    "/{product_id}/availability/{store_id}",
                    web::get().to(product_availability),
                ),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::store_inventory_entity as inventory;
    use actix_web::{App, test};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::Value;
    use std::sync::Arc;

    #[actix_web::test]
    async fn verify_echoes_user_with_mock_confidence() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(FaceService::new(db.clone())))
                .app_data(web::Data::new(CatalogService::new(db)))
                .service(web::scope("/api/v1").configure(shop_config)),
        )
        .await;

        let user_id = Uuid::new_v4();
        let req = test::TestRequest::post()
            .uri("/api/v1/face/verify")
            .set_json(json!({ "user_id": user_id, "face_data": "aGVsbG8=" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["verified"], true);
        assert_eq!(body["user_id"], user_id.to_string());
        assert_eq!(body["confidence"], "97.50");
    }

    #[actix_web::test]
    async fn product_missing_from_store_is_unavailable() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<inventory::Model>::new()])
            .into_connection();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(CatalogService::new(Arc::new(db))))
                .service(web::scope("/api/v1").configure(shop_config)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!(
                "/api/v1/products/{}/availability/{}",
                Uuid::new_v4(),
                Uuid::new_v4()
            ))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["data"]["available"], false);
        assert_eq!(body["data"]["quantity"], 0);
    }
}
