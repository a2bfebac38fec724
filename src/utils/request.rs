use crate::error::{AppError, AppResult};
use actix_web::{HttpMessage, HttpRequest};
use uuid::Uuid;

/// Principal placed in request extensions by the auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub is_staff: bool,
}

pub fn current_user(req: &HttpRequest) -> AppResult<AuthUser> {
    req.extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Authentication required".to_string()))
}

/// Staff area gate: staff or superuser, else 403.
pub fn require_staff(req: &HttpRequest) -> AppResult<AuthUser> {
    let user = current_user(req)?;
    if !user.is_staff {
        return Err(AppError::PermissionDenied);
    }
    Ok(user)
}

/// Caller details recorded on audit entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn from_request(req: &HttpRequest) -> Self {
        let ip_address = req.peer_addr().map(|addr| addr.ip().to_string());
        let user_agent = req
            .headers()
            .get(actix_web::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        Self {
            ip_address,
            user_agent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn missing_principal_is_an_auth_error() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(current_user(&req), Err(AppError::AuthError(_))));
    }

    #[test]
    fn customers_are_kept_out_of_staff_area() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(AuthUser {
            id: Uuid::new_v4(),
            is_staff: false,
        });
        assert!(matches!(
            require_staff(&req),
            Err(AppError::PermissionDenied)
        ));
    }

    #[test]
    fn request_context_reads_peer_and_agent() {
        let req = TestRequest::default()
            .peer_addr("10.0.0.7:5555".parse().unwrap())
            .insert_header(("User-Agent", "kiosk/1.0"))
            .to_http_request();
        let ctx = RequestContext::from_request(&req);
        assert_eq!(ctx.ip_address.as_deref(), Some("10.0.0.7"));
        assert_eq!(ctx.user_agent.as_deref(), Some("kiosk/1.0"));
    }
}
