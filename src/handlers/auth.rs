use crate::models::*;
use crate::services::AuthService;
use crate::utils::{RequestContext, current_user};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid registration data"),
        (status = 409, description = "Username, email or phone already taken")
    )
)]
pub async fn register(
    auth_service: web::Data<AuthService>,
    req: HttpRequest,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let ctx = RequestContext::from_request(&req);
    match auth_service.register(request.into_inner(), &ctx).await {
        Ok(user) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": user,
            "message": "Registration successful. Please log in."
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    auth_service: web::Data<AuthService>,
    req: HttpRequest,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let ctx = RequestContext::from_request(&req);
    match auth_service.login(request.into_inner(), &ctx).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = AuthResponse),
        (status = 401, description = "Invalid refresh token")
    )
)]
pub async fn refresh(
    auth_service: web::Data<AuthService>,
    request: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse> {
    match auth_service.refresh_token(&request.refresh_token).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn logout(
    auth_service: web::Data<AuthService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let ctx = RequestContext::from_request(&req);
    // Tokens are stateless; the client discards them.
    match auth_service.logout(user.id, &ctx).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "You have been logged out"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/refresh", web::post().to(refresh))
            .route("/logout", web::post().to(logout)),
    );
}
