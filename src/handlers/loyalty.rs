use crate::models::*;
use crate::services::LoyaltyService;
use crate::utils::{RequestContext, current_user};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/loyalty",
    tag = "loyalty",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Points program and recent movements", body = LoyaltyDashboard),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn dashboard(
    loyalty_service: web::Data<LoyaltyService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match loyalty_service.dashboard(user.id).await {
        Ok(dashboard) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": dashboard
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/loyalty/redeem",
    tag = "loyalty",
    request_body = RedeemPointsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Points redeemed", body = RedeemPointsResponse),
        (status = 400, description = "Invalid amount or insufficient balance")
    )
)]
pub async fn redeem(
    loyalty_service: web::Data<LoyaltyService>,
    req: HttpRequest,
    request: web::Json<RedeemPointsRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let ctx = RequestContext::from_request(&req);
    match loyalty_service.redeem(user.id, request.into_inner(), &ctx).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response,
            "message": format!("Redeemed {} points", response.entry.points)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn loyalty_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/loyalty")
            .route("", web::get().to(dashboard))
            .route("/redeem", web::post().to(redeem)),
    );
}
