//! Staff back office. Every route requires a staff or superuser principal.

use crate::models::*;
use crate::services::{CatalogAdminService, ReportService, SecurityService, StaffService};
use crate::utils::{RequestContext, local_today, require_staff};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/staff/dashboard",
    tag = "staff",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Today's trading at a glance", body = StaffDashboard),
        (status = 403, description = "Not staff")
    )
)]
pub async fn dashboard(
    staff_service: web::Data<StaffService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    require_staff(&req)?;
    match staff_service.dashboard().await {
        Ok(dashboard) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": dashboard
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/staff/analytics",
    tag = "staff",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Last 30 days", body = Analytics),
        (status = 403, description = "Not staff")
    )
)]
pub async fn analytics(
    staff_service: web::Data<StaffService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    require_staff(&req)?;
    match staff_service.analytics().await {
        Ok(analytics) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": analytics
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/staff/stores",
    tag = "staff",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All stores"),
        (status = 403, description = "Not staff")
    )
)]
pub async fn stores(staff_service: web::Data<StaffService>, req: HttpRequest) -> Result<HttpResponse> {
    require_staff(&req)?;
    match staff_service.stores().await {
        Ok(stores) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": stores
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/staff/products",
    tag = "staff",
    params(ProductQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All products, 50 per page"),
        (status = 403, description = "Not staff")
    )
)]
pub async fn products(
    staff_service: web::Data<StaffService>,
    req: HttpRequest,
    query: web::Query<ProductQuery>,
) -> Result<HttpResponse> {
    require_staff(&req)?;
    match staff_service.products(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/staff/stores/{store_id}/inventory",
    tag = "staff",
    params(
        ("store_id" = Uuid, Path, description = "Store id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Shelf stock with the low-stock subset", body = InventoryOverview),
        (status = 404, description = "Store not found")
    )
)]
pub async fn inventory(
    staff_service: web::Data<StaffService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    require_staff(&req)?;
    match staff_service.inventory(path.into_inner()).await {
        Ok(overview) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": overview
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/staff/inventory/{inventory_id}",
    tag = "staff",
    request_body = UpdateInventoryRequest,
    params(
        ("inventory_id" = Uuid, Path, description = "Inventory row id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Stock updated"),
        (status = 400, description = "Negative quantity"),
        (status = 404, description = "Inventory record not found")
    )
)]
pub async fn update_inventory(
    staff_service: web::Data<StaffService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<UpdateInventoryRequest>,
) -> Result<HttpResponse> {
    let staff = require_staff(&req)?;
    let ctx = RequestContext::from_request(&req);
    match staff_service
        .update_inventory(staff.id, path.into_inner(), request.into_inner(), &ctx)
        .await
    {
        Ok(row) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": row,
            "message": "Inventory updated"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/staff/customers",
    tag = "staff",
    params(CustomerQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Customers, 50 per page"),
        (status = 403, description = "Not staff")
    )
)]
pub async fn customers(
    staff_service: web::Data<StaffService>,
    req: HttpRequest,
    query: web::Query<CustomerQuery>,
) -> Result<HttpResponse> {
    require_staff(&req)?;
    match staff_service.customers(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/staff/alerts",
    tag = "staff",
    params(AlertQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Security alerts, newest first, 20 per page"),
        (status = 403, description = "Not staff")
    )
)]
pub async fn alerts(
    security_service: web::Data<SecurityService>,
    req: HttpRequest,
    query: web::Query<AlertQuery>,
) -> Result<HttpResponse> {
    require_staff(&req)?;
    match security_service.list_alerts(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/staff/alerts/{alert_id}",
    tag = "staff",
    request_body = UpdateAlertRequest,
    params(
        ("alert_id" = Uuid, Path, description = "Security alert id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Alert updated"),
        (status = 404, description = "Security alert not found")
    )
)]
pub async fn update_alert(
    security_service: web::Data<SecurityService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<UpdateAlertRequest>,
) -> Result<HttpResponse> {
    let staff = require_staff(&req)?;
    let ctx = RequestContext::from_request(&req);
    match security_service
        .update_alert(staff.id, path.into_inner(), request.into_inner(), &ctx)
        .await
    {
        Ok(alert) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": alert,
            "message": format!("Alert {} updated", alert.alert_code)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/staff/reports",
    tag = "staff",
    request_body = GenerateReportRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Reports generated"),
        (status = 403, description = "Not staff")
    )
)]
pub async fn generate_reports(
    report_service: web::Data<ReportService>,
    req: HttpRequest,
    request: web::Json<GenerateReportRequest>,
) -> Result<HttpResponse> {
    require_staff(&req)?;
    let date = request.report_date.unwrap_or_else(local_today);
    match report_service.generate(request.store_id, date).await {
        Ok(reports) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": reports,
            "message": format!("Generated {} report(s) for {date}", reports.len())
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/staff/counties",
    tag = "staff",
    request_body = CreateCountyRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "County created"),
        (status = 400, description = "Missing name or code"),
        (status = 409, description = "County already exists")
    )
)]
pub async fn create_county(
    catalog_admin: web::Data<CatalogAdminService>,
    req: HttpRequest,
    request: web::Json<CreateCountyRequest>,
) -> Result<HttpResponse> {
    let staff = require_staff(&req)?;
    let ctx = RequestContext::from_request(&req);
    match catalog_admin
        .create_county(staff.id, request.into_inner(), &ctx)
        .await
    {
        Ok(record) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": record,
            "message": "County created"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/staff/categories",
    tag = "staff",
    request_body = CreateCategoryRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Category created"),
        (status = 404, description = "Parent category not found"),
        (status = 409, description = "Category slug already exists")
    )
)]
pub async fn create_category(
    catalog_admin: web::Data<CatalogAdminService>,
    req: HttpRequest,
    request: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse> {
    let staff = require_staff(&req)?;
    let ctx = RequestContext::from_request(&req);
    match catalog_admin
        .create_category(staff.id, request.into_inner(), &ctx)
        .await
    {
        Ok(record) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": record,
            "message": "Category created"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/staff/categories/{category_id}",
    tag = "staff",
    request_body = UpdateCategoryRequest,
    params(
        ("category_id" = Uuid, Path, description = "Category id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Category updated"),
        (status = 400, description = "Category cannot be its own parent"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn update_category(
    catalog_admin: web::Data<CatalogAdminService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<UpdateCategoryRequest>,
) -> Result<HttpResponse> {
    let staff = require_staff(&req)?;
    let ctx = RequestContext::from_request(&req);
    match catalog_admin
        .update_category(staff.id, path.into_inner(), request.into_inner(), &ctx)
        .await
    {
        Ok(record) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": record,
            "message": "Category updated"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/staff/stores",
    tag = "staff",
    request_body = CreateStoreRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Store created"),
        (status = 400, description = "Invalid phone number or missing trading hours"),
        (status = 404, description = "County not found"),
        (status = 409, description = "Store code already exists")
    )
)]
pub async fn create_store(
    catalog_admin: web::Data<CatalogAdminService>,
    req: HttpRequest,
    request: web::Json<CreateStoreRequest>,
) -> Result<HttpResponse> {
    let staff = require_staff(&req)?;
    let ctx = RequestContext::from_request(&req);
    match catalog_admin
        .create_store(staff.id, request.into_inner(), &ctx)
        .await
    {
        Ok(record) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": record,
            "message": format!("Store {} created", record.store_code)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/staff/stores/{store_id}",
    tag = "staff",
    request_body = UpdateStoreRequest,
    params(
        ("store_id" = Uuid, Path, description = "Store id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Store updated"),
        (status = 400, description = "Invalid phone number"),
        (status = 404, description = "Store not found")
    )
)]
pub async fn update_store(
    catalog_admin: web::Data<CatalogAdminService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<UpdateStoreRequest>,
) -> Result<HttpResponse> {
    let staff = require_staff(&req)?;
    let ctx = RequestContext::from_request(&req);
    match catalog_admin
        .update_store(staff.id, path.into_inner(), request.into_inner(), &ctx)
        .await
    {
        Ok(record) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": record,
            "message": "Store updated"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/staff/stores/{store_id}/cameras",
    tag = "staff",
    request_body = CreateCameraRequest,
    params(
        ("store_id" = Uuid, Path, description = "Store id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Camera registered"),
        (status = 404, description = "Store not found"),
        (status = 409, description = "Camera code already exists")
    )
)]
pub async fn create_camera(
    catalog_admin: web::Data<CatalogAdminService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<CreateCameraRequest>,
) -> Result<HttpResponse> {
    let staff = require_staff(&req)?;
    let ctx = RequestContext::from_request(&req);
    match catalog_admin
        .create_camera(staff.id, path.into_inner(), request.into_inner(), &ctx)
        .await
    {
        Ok(record) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": record,
            "message": format!("Camera {} installed", record.camera_code)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/staff/cameras/{camera_id}",
    tag = "staff",
    request_body = UpdateCameraRequest,
    params(
        ("camera_id" = Uuid, Path, description = "Camera id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Camera updated"),
        (status = 404, description = "Camera not found")
    )
)]
pub async fn update_camera(
    catalog_admin: web::Data<CatalogAdminService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<UpdateCameraRequest>,
) -> Result<HttpResponse> {
    let staff = require_staff(&req)?;
    let ctx = RequestContext::from_request(&req);
    match catalog_admin
        .update_camera(staff.id, path.into_inner(), request.into_inner(), &ctx)
        .await
    {
        Ok(record) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": record,
            "message": "Camera updated"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/staff/products",
    tag = "staff",
    request_body = CreateProductRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Invalid price or VAT rate"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Duplicate name, barcode or SKU")
    )
)]
pub async fn create_product(
    catalog_admin: web::Data<CatalogAdminService>,
    req: HttpRequest,
    request: web::Json<CreateProductRequest>,
) -> Result<HttpResponse> {
    let staff = require_staff(&req)?;
    let ctx = RequestContext::from_request(&req);
    match catalog_admin
        .create_product(staff.id, request.into_inner(), &ctx)
        .await
    {
        Ok(record) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": record,
            "message": format!("Product {} created", record.sku)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/staff/products/{product_id}",
    tag = "staff",
    request_body = UpdateProductRequest,
    params(
        ("product_id" = Uuid, Path, description = "Product id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Product updated"),
        (status = 400, description = "Invalid price or VAT rate"),
        (status = 404, description = "Product or category not found")
    )
)]
pub async fn update_product(
    catalog_admin: web::Data<CatalogAdminService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse> {
    let staff = require_staff(&req)?;
    let ctx = RequestContext::from_request(&req);
    match catalog_admin
        .update_product(staff.id, path.into_inner(), request.into_inner(), &ctx)
        .await
    {
        Ok(record) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": record,
            "message": "Product updated"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/staff/stores/{store_id}/inventory",
    tag = "staff",
    request_body = CreateInventoryRequest,
    params(
        ("store_id" = Uuid, Path, description = "Store id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Inventory row created"),
        (status = 400, description = "Invalid stock levels"),
        (status = 404, description = "Store or product not found"),
        (status = 409, description = "Product is already stocked in this store")
    )
)]
pub async fn create_inventory(
    catalog_admin: web::Data<CatalogAdminService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<CreateInventoryRequest>,
) -> Result<HttpResponse> {
    let staff = require_staff(&req)?;
    let ctx = RequestContext::from_request(&req);
    match catalog_admin
        .create_inventory(staff.id, path.into_inner(), request.into_inner(), &ctx)
        .await
    {
        Ok(record) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": record,
            "message": "Product stocked"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/staff/promotions",
    tag = "staff",
    request_body = CreatePromotionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Promotion created"),
        (status = 400, description = "Invalid discount or window"),
        (status = 409, description = "Promotion code already exists")
    )
)]
pub async fn create_promotion(
    catalog_admin: web::Data<CatalogAdminService>,
    req: HttpRequest,
    request: web::Json<CreatePromotionRequest>,
) -> Result<HttpResponse> {
    let staff = require_staff(&req)?;
    let ctx = RequestContext::from_request(&req);
    match catalog_admin
        .create_promotion(staff.id, request.into_inner(), &ctx)
        .await
    {
        Ok(record) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": record,
            "message": format!("Promotion {} created", record.code)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/staff/promotions/{promotion_id}",
    tag = "staff",
    request_body = UpdatePromotionRequest,
    params(
        ("promotion_id" = Uuid, Path, description = "Promotion id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Promotion updated"),
        (status = 400, description = "Invalid discount or window"),
        (status = 404, description = "Promotion not found")
    )
)]
pub async fn update_promotion(
    catalog_admin: web::Data<CatalogAdminService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<UpdatePromotionRequest>,
) -> Result<HttpResponse> {
    let staff = require_staff(&req)?;
    let ctx = RequestContext::from_request(&req);
    match catalog_admin
        .update_promotion(staff.id, path.into_inner(), request.into_inner(), &ctx)
        .await
    {
        Ok(record) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": record,
            "message": "Promotion updated"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/staff/users/{user_id}/role",
    tag = "staff",
    request_body = UpdateStaffRoleRequest,
    params(
        ("user_id" = Uuid, Path, description = "User id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Role updated"),
        (status = 400, description = "Own role or a superuser demotion"),
        (status = 403, description = "Caller is not a superuser"),
        (status = 404, description = "User not found")
    )
)]
pub async fn set_staff_role(
    catalog_admin: web::Data<CatalogAdminService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<UpdateStaffRoleRequest>,
) -> Result<HttpResponse> {
    let staff = require_staff(&req)?;
    let ctx = RequestContext::from_request(&req);
    match catalog_admin
        .set_staff_role(staff.id, path.into_inner(), request.into_inner(), &ctx)
        .await
    {
        Ok(record) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": record,
            "message": format!("Staff access for {} updated", record.username)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn staff_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/staff")
            .route("/dashboard", web::get().to(dashboard))
            .route("/analytics", web::get().to(analytics))
            .route("/stores", web::get().to(stores))
            .route("/stores/{store_id}/inventory", web::get().to(inventory))
            .route("/products", web::get().to(products))
            .route("/inventory/{inventory_id}", web::put().to(update_inventory))
            .route("/customers", web::get().to(customers))
            .route("/alerts", web::get().to(alerts))
            .route("/alerts/{alert_id}", web::put().to(update_alert))
            .route("/reports", web::post().to(generate_reports))
            .route("/counties", web::post().to(create_county))
            .route("/categories", web::post().to(create_category))
            .route("/categories/{category_id}", web::put().to(update_category))
            .route("/stores", web::post().to(create_store))
            .route("/stores/{store_id}", web::put().to(update_store))
            .route("/stores/{store_id}/cameras", web::post().to(create_camera))
            .route("/stores/{store_id}/inventory", web::post().to(create_inventory))
            .route("/cameras/{camera_id}", web::put().to(update_camera))
            .route("/products", web::post().to(create_product))
            .route("/products/{product_id}", web::put().to(update_product))
            .route("/promotions", web::post().to(create_promotion))
            .route("/promotions/{promotion_id}", web::put().to(update_promotion))
            .route("/users/{user_id}/role", web::put().to(set_staff_role)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::AuthUser;
    use actix_web::dev::Service;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpMessage, test};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[actix_web::test]
    async fn customers_are_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(StaffService::new(Arc::new(db))))
                .wrap_fn(|req, srv| {
                    req.extensions_mut().insert(AuthUser {
                        id: Uuid::new_v4(),
                        is_staff: false,
                    });
                    srv.call(req)
                })
                .service(web::scope("/api/v1").configure(staff_config)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/staff/dashboard")
            .to_request();
        let resp = app.call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn staff_can_list_stores() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<crate::entities::store_entity::Model>::new()])
            .into_connection();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(StaffService::new(Arc::new(db))))
                .wrap_fn(|req, srv| {
                    req.extensions_mut().insert(AuthUser {
                        id: Uuid::new_v4(),
                        is_staff: true,
                    });
                    srv.call(req)
                })
                .service(web::scope("/api/v1").configure(staff_config)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/staff/stores")
            .to_request();
        let resp = app.call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    fn admin_app_data(db: sea_orm::DatabaseConnection) -> web::Data<CatalogAdminService> {
        web::Data::new(CatalogAdminService::new(Arc::new(db)))
    }

    #[actix_web::test]
    async fn customers_cannot_open_stores() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test::init_service(
            App::new()
                .app_data(admin_app_data(db))
                .wrap_fn(|req, srv| {
                    req.extensions_mut().insert(AuthUser {
                        id: Uuid::new_v4(),
                        is_staff: false,
                    });
                    srv.call(req)
                })
                .service(web::scope("/api/v1").configure(staff_config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/staff/stores")
            .set_json(json!({
                "name": "BiashAI Westlands",
                "store_code": "NBO-001",
                "store_type": "UNMANNED",
                "county_id": 47,
                "address": "Waiyaki Way",
                "phone_number": "0712345678",
                "is_24_hours": true
            }))
            .to_request();
        let resp = app.call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn staff_register_a_county() {
        let county = crate::entities::county_entity::Model {
            id: 47,
            name: "Nairobi".into(),
            code: "047".into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![county]])
            .append_exec_results([crate::database::mock::exec_ok()])
            .into_connection();
        let app = test::init_service(
            App::new()
                .app_data(admin_app_data(db))
                .wrap_fn(|req, srv| {
                    req.extensions_mut().insert(AuthUser {
                        id: Uuid::new_v4(),
                        is_staff: true,
                    });
                    srv.call(req)
                })
                .service(web::scope("/api/v1").configure(staff_config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/staff/counties")
            .set_json(json!({ "name": "Nairobi", "code": "047" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["code"], "047");
    }
}
