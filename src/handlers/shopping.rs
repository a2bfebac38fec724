//! In-store shopping: sessions, cart and checkout.

use crate::models::*;
use crate::services::session_service::SessionStart;
use crate::services::{CheckoutService, SessionService};
use crate::utils::{RequestContext, current_user};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/sessions",
    tag = "shopping",
    request_body = StartSessionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Shopping session started"),
        (status = 400, description = "No usable face profile"),
        (status = 404, description = "Store not found"),
        (status = 409, description = "Already shopping; carries the active session id")
    )
)]
pub async fn start_session(
    session_service: web::Data<SessionService>,
    req: HttpRequest,
    request: web::Json<StartSessionRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let ctx = RequestContext::from_request(&req);
    match session_service.start(user.id, request.store_id, &ctx).await {
        Ok(SessionStart::Started(session)) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": session,
            "message": "Welcome! Your shopping session has started."
        }))),
        Ok(SessionStart::Existing(session)) => Ok(HttpResponse::Conflict().json(json!({
            "success": false,
            "error": {
                "code": "CONFLICT",
                "message": "You already have an active shopping session",
                "session_id": session.id
            }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/sessions/{session_id}",
    tag = "shopping",
    params(
        ("session_id" = Uuid, Path, description = "Shopping session id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Session with cart and totals", body = SessionView),
        (status = 404, description = "Shopping session not found")
    )
)]
pub async fn view_session(
    session_service: web::Data<SessionService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match session_service.view(user.id, path.into_inner()).await {
        Ok(view) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": view
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/sessions/{session_id}/cancel",
    tag = "shopping",
    params(
        ("session_id" = Uuid, Path, description = "Shopping session id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Session cancelled"),
        (status = 404, description = "No active session with this id")
    )
)]
pub async fn cancel_session(
    session_service: web::Data<SessionService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let ctx = RequestContext::from_request(&req);
    match session_service.cancel(user.id, path.into_inner(), &ctx).await {
        Ok(session) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": session,
            "message": "Shopping session cancelled"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/sessions/{session_id}/cart",
    tag = "shopping",
    request_body = AddToCartRequest,
    params(
        ("session_id" = Uuid, Path, description = "Shopping session id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Cart line after the addition"),
        (status = 400, description = "Bad quantity or product not on the shelf"),
        (status = 404, description = "Session or product not found")
    )
)]
pub async fn add_to_cart(
    session_service: web::Data<SessionService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<AddToCartRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match session_service
        .add_to_cart(user.id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(item) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": item,
            "message": "Added to cart"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/sessions/{session_id}/cart/{item_id}",
    tag = "shopping",
    request_body = UpdateCartItemRequest,
    params(
        ("session_id" = Uuid, Path, description = "Shopping session id"),
        ("item_id" = Uuid, Path, description = "Cart line id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Updated line, or null when removed"),
        (status = 404, description = "Cart item not found")
    )
)]
pub async fn update_cart_item(
    session_service: web::Data<SessionService>,
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
    request: web::Json<UpdateCartItemRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let (session_id, item_id) = path.into_inner();
    match session_service
        .update_cart_item(user.id, session_id, item_id, request.quantity)
        .await
    {
        Ok(Some(item)) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": item,
            "message": "Cart updated"
        }))),
        Ok(None) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": null,
            "message": "Item removed from cart"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/sessions/{session_id}/cart/{item_id}",
    tag = "shopping",
    params(
        ("session_id" = Uuid, Path, description = "Shopping session id"),
        ("item_id" = Uuid, Path, description = "Cart line id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Line removed"),
        (status = 404, description = "Cart item not found")
    )
)]
pub async fn remove_cart_item(
    session_service: web::Data<SessionService>,
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let (session_id, item_id) = path.into_inner();
    match session_service
        .remove_cart_item(user.id, session_id, item_id)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Item removed from cart"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/sessions/{session_id}/checkout",
    tag = "shopping",
    request_body = CheckoutRequest,
    params(
        ("session_id" = Uuid, Path, description = "Shopping session id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Payment completed", body = CheckoutReceipt),
        (status = 400, description = "Empty cart, over the limit or short on stock"),
        (status = 404, description = "Session or payment account not found"),
        (status = 409, description = "Session already closed")
    )
)]
pub async fn checkout(
    checkout_service: web::Data<CheckoutService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<CheckoutRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let ctx = RequestContext::from_request(&req);
    match checkout_service
        .checkout(user.id, path.into_inner(), request.into_inner(), &ctx)
        .await
    {
        Ok(receipt) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": format!(
                "Payment successful! Transaction: {}",
                receipt.transaction.transaction_code
            ),
            "data": receipt
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn shopping_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sessions")
            .route("", web::post().to(start_session))
            .route("/{session_id}", web::get().to(view_session))
            .route("/{session_id}/cancel", web::post().to(cancel_session))
            .route("/{session_id}/cart", web::post().to(add_to_cart))
            .route("/{session_id}/cart/{item_id}", web::put().to(update_cart_item))
            .route(
                "/{session_id}/cart/{item_id}",
                web::delete().to(remove_cart_item),
            )
            .route("/{session_id}/checkout", web::post().to(checkout)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        SessionStatus, facial_data_entity as facial_data, shopping_session_entity as sessions,
        store_entity as stores,
    };
    use crate::utils::AuthUser;
    use actix_web::dev::Service;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpMessage, test};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::Value;
    use std::sync::Arc;

    fn store(id: Uuid) -> stores::Model {
        let now = Utc::now();
        stores::Model {
            id,
            name: "Biashara Street".into(),
            store_code: "NBO-001".into(),
            store_type: crate::entities::StoreType::Unmanned,
            county_id: 47,
            address: "Biashara St, Nairobi".into(),
            latitude: None,
            longitude: None,
            phone_number: "+254700000001".into(),
            email: None,
            opening_time: chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            closing_time: chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            is_24_hours: true,
            is_active: true,
            date_opened: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            manager_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn face(user_id: Uuid) -> facial_data::Model {
        let now = Utc::now();
        facial_data::Model {
            id: Uuid::new_v4(),
            user_id,
            face_encoding: "aGVsbG8=".into(),
            registration_date: now,
            last_updated: now,
            is_active: true,
            confidence_threshold: dec!(95),
            failed_recognition_attempts: 0,
            last_recognition_attempt: None,
            is_locked: false,
        }
    }

    fn session(user_id: Uuid, store_id: Uuid) -> sessions::Model {
        let now = Utc::now();
        sessions::Model {
            id: Uuid::new_v4(),
            session_code: "SHOP-20250309-0A1B2C3D".into(),
            user_id,
            store_id,
            entry_time: now,
            exit_time: None,
            entry_camera_id: None,
            entry_face_confidence: dec!(97.50),
            status: SessionStatus::Active,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[actix_web::test]
    async fn second_entry_returns_conflict_with_session_id() {
        let user_id = Uuid::new_v4();
        let store_id = Uuid::new_v4();
        let active = session(user_id, store_id);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![store(store_id)]])
            .append_query_results([vec![face(user_id)]])
            .append_query_results([vec![active.clone()]])
            .into_connection();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(SessionService::new(Arc::new(db))))
                .wrap_fn(move |req, srv| {
                    req.extensions_mut().insert(AuthUser {
                        id: user_id,
                        is_staff: false,
                    });
                    srv.call(req)
                })
                .service(web::scope("/api/v1").configure(shopping_config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/sessions")
            .set_json(json!({ "store_id": store_id }))
            .to_request();
        let resp = app.call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["session_id"], active.id.to_string());
    }
}
