use crate::error::AppError;
use crate::utils::{AuthUser, JwtService};
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
    excluded_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec![
                "/swagger-ui",
                "/api/v1/home",
                "/api/v1/counties",
                "/api/v1/categories",
                "/api/v1/promotions",
                "/api/v1/face/verify",
            ],
            prefix_paths: vec![
                "/swagger-ui/",
                "/api-docs/",
                "/api/v1/auth/",
                "/api/v1/stores",
                "/api/v1/products",
            ],
            // Under a public prefix but still authenticated.
            excluded_paths: vec!["/api/v1/auth/logout"],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        if self
            .excluded_paths
            .iter()
            .any(|&excluded| path.starts_with(excluded))
        {
            return false;
        }

        if self.exact_paths.contains(&path) {
            return true;
        }

        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S> AuthMiddlewareService<S> {
    fn authenticate(&self, req: &ServiceRequest) -> Result<AuthUser, AppError> {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))?;

        let claims = self
            .jwt_service
            .verify_access_token(token)
            .map_err(|_| AppError::AuthError("Invalid access token".to_string()))?;

        Ok(AuthUser {
            id: claims.user_id()?,
            is_staff: claims.is_staff,
        })
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        if self.public_paths.is_public_path(req.path()) {
            return Box::pin(self.service.call(req));
        }

        match self.authenticate(&req) {
            Ok(user) => {
                req.extensions_mut().insert(user);
                Box::pin(self.service.call(req))
            }
            Err(error) => Box::pin(async move { Err(error.into()) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::current_user;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpRequest, HttpResponse, test as actix_test, web};
    use uuid::Uuid;

    const SECRET: &str = "middleware-secret";

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match current_user(&req) {
            Ok(user) => HttpResponse::Ok().body(format!("{}:{}", user.id, user.is_staff)),
            Err(_) => HttpResponse::Ok().body("anonymous"),
        }
    }

    #[test]
    fn public_path_rules() {
        let paths = PublicPaths::new();
        assert!(paths.is_public_path("/api/v1/auth/login"));
        assert!(paths.is_public_path("/api/v1/stores/5b1f/status"));
        assert!(paths.is_public_path("/api/v1/home"));
        assert!(!paths.is_public_path("/api/v1/auth/logout"));
        assert!(!paths.is_public_path("/api/v1/face"));
        assert!(!paths.is_public_path("/api/v1/staff/stores"));
    }

    #[actix_web::test]
    async fn public_route_needs_no_token() {
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(JwtService::new(SECRET, 3600, 86400)))
                .route("/api/v1/home", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/api/v1/home").to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, "anonymous");
    }

    #[actix_web::test]
    async fn missing_token_is_rejected() {
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(JwtService::new(SECRET, 3600, 86400)))
                .route("/api/v1/customer/dashboard", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/customer/dashboard")
            .to_request();
        let err = actix_test::try_call_service(&app, req).await.err().unwrap();
        assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn valid_token_sets_principal() {
        let jwt = JwtService::new(SECRET, 3600, 86400);
        let id = Uuid::new_v4();
        let token = jwt.generate_access_token(id, "otieno", true).unwrap();
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt))
                .route("/api/v1/staff/dashboard", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/staff/dashboard")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, format!("{id}:true"));
    }

    #[actix_web::test]
    async fn refresh_token_is_not_an_access_token() {
        let jwt = JwtService::new(SECRET, 3600, 86400);
        let token = jwt
            .generate_refresh_token(Uuid::new_v4(), "otieno", false)
            .unwrap();
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt))
                .route("/api/v1/customer/profile", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/customer/profile")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        assert!(actix_test::try_call_service(&app, req).await.is_err());
    }
}
