use crate::models::*;
use crate::services::UserService;
use crate::utils::{RequestContext, current_user};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/customer/dashboard",
    tag = "customer",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Customer overview", body = CustomerDashboard),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn dashboard(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match user_service.dashboard(user.id).await {
        Ok(dashboard) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": dashboard
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/customer/profile",
    tag = "customer",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match user_service.get_profile(user.id).await {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": profile
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/customer/profile",
    tag = "customer",
    request_body = UpdateProfileRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid email or phone"),
        (status = 409, description = "Email or phone already registered")
    )
)]
pub async fn update_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let ctx = RequestContext::from_request(&req);
    match user_service
        .update_profile(user.id, request.into_inner(), &ctx)
        .await
    {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": profile,
            "message": "Profile updated successfully"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/customer/transactions",
    tag = "customer",
    params(PageQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Purchases, newest first, 20 per page"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn transactions(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match user_service.list_transactions(user.id, query.page).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/customer/transactions/{transaction_id}",
    tag = "customer",
    params(
        ("transaction_id" = Uuid, Path, description = "Transaction id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Receipt with items", body = TransactionDetail),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn transaction_detail(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match user_service
        .transaction_detail(user.id, path.into_inner())
        .await
    {
        Ok(detail) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": detail
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn customer_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/customer")
            .route("/dashboard", web::get().to(dashboard))
            .route("/profile", web::get().to(get_profile))
            .route("/profile", web::put().to(update_profile))
            .route("/transactions", web::get().to(transactions))
            .route(
                "/transactions/{transaction_id}",
                web::get().to(transaction_detail),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::transaction_entity as transactions;
    use crate::utils::AuthUser;
    use actix_web::dev::Service;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpMessage, test};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[actix_web::test]
    async fn foreign_transaction_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<transactions::Model>::new()])
            .into_connection();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(UserService::new(Arc::new(db))))
                .wrap_fn(|req, srv| {
                    req.extensions_mut().insert(AuthUser {
                        id: Uuid::new_v4(),
                        is_staff: false,
                    });
                    srv.call(req)
                })
                .service(web::scope("/api/v1").configure(customer_config)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/customer/transactions/{}", Uuid::new_v4()))
            .to_request();
        let resp = app.call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn anonymous_dashboard_is_unauthorized() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(UserService::new(Arc::new(db))))
                .service(web::scope("/api/v1").configure(customer_config)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/customer/dashboard")
            .to_request();
        let resp = app.call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
