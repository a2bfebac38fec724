use crate::models::*;
use crate::services::PaymentAccountService;
use crate::utils::{RequestContext, current_user};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/payment-accounts",
    tag = "payment",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Active payment accounts, primary first"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list(
    accounts: web::Data<PaymentAccountService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match accounts.list(user.id).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": list
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/payment-accounts",
    tag = "payment",
    request_body = AddPaymentAccountRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Payment account added"),
        (status = 400, description = "Invalid account number"),
        (status = 409, description = "Account already registered")
    )
)]
pub async fn add(
    accounts: web::Data<PaymentAccountService>,
    req: HttpRequest,
    request: web::Json<AddPaymentAccountRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let ctx = RequestContext::from_request(&req);
    match accounts.add(user.id, request.into_inner(), &ctx).await {
        Ok(account) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": account,
            "message": "Payment account added successfully"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/payment-accounts/{account_id}/primary",
    tag = "payment",
    params(
        ("account_id" = Uuid, Path, description = "Payment account id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Primary account set"),
        (status = 404, description = "Payment account not found")
    )
)]
pub async fn set_primary(
    accounts: web::Data<PaymentAccountService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let ctx = RequestContext::from_request(&req);
    match accounts.set_primary(user.id, path.into_inner(), &ctx).await {
        Ok(account) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": account,
            "message": "Primary payment account updated"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/payment-accounts/{account_id}",
    tag = "payment",
    params(
        ("account_id" = Uuid, Path, description = "Payment account id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Payment account removed"),
        (status = 404, description = "Payment account not found")
    )
)]
pub async fn delete(
    accounts: web::Data<PaymentAccountService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let ctx = RequestContext::from_request(&req);
    match accounts.delete(user.id, path.into_inner(), &ctx).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Payment account removed"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn payment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payment-accounts")
            .route("", web::get().to(list))
            .route("", web::post().to(add))
            .route("/{account_id}", web::delete().to(delete))
            .route("/{account_id}/primary", web::put().to(set_primary)),
    );
}
