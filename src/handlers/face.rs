use crate::error::AppError;
use crate::models::*;
use crate::services::FaceService;
use crate::utils::{RequestContext, current_user};
use actix_web::error::JsonPayloadError;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

/// Body limit for `/face`: a 5 MiB image grows to about 7 MiB as base64.
pub const FACE_UPLOAD_LIMIT: usize = 8 * 1024 * 1024;

fn face_json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(FACE_UPLOAD_LIMIT)
        .error_handler(|err, _req| {
            let message = match err {
                JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                    "Image file too large (max 5MB)".to_string()
                }
                other => format!("Invalid face upload: {other}"),
            };
            AppError::ValidationError(message).into()
        })
}

#[utoipa::path(
    get,
    path = "/face",
    tag = "face",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Face profile state", body = FaceStatusResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn status(face_service: web::Data<FaceService>, req: HttpRequest) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    match face_service.status(user.id).await {
        Ok(status) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": status
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/face",
    tag = "face",
    request_body = RegisterFaceRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Face profile registered", body = FaceRegistrationResponse),
        (status = 400, description = "Missing, invalid or oversized image")
    )
)]
pub async fn register(
    face_service: web::Data<FaceService>,
    req: HttpRequest,
    request: web::Json<RegisterFaceRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let ctx = RequestContext::from_request(&req);
    match face_service.register(user.id, &request.face_image, &ctx).await {
        Ok(registration) => {
            let message = if registration.created {
                "Face registered successfully"
            } else {
                "Face data updated successfully"
            };
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "data": registration,
                "message": message
            })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/face",
    tag = "face",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Face profile deleted"),
        (status = 404, description = "No facial data found")
    )
)]
pub async fn delete(face_service: web::Data<FaceService>, req: HttpRequest) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let ctx = RequestContext::from_request(&req);
    match face_service.delete(user.id, &ctx).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Face data deleted successfully"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn face_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/face")
            .app_data(face_json_config())
            .route(web::get().to(status))
            .route(web::post().to(register))
            .route(web::delete().to(delete)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::mock::exec_ok;
    use crate::entities::facial_data_entity as facial_data;
    use crate::utils::AuthUser;
    use actix_web::dev::Service;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpMessage, test};
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use serde_json::Value;
    use std::sync::Arc;
    use uuid::Uuid;

    async fn upload(db: DatabaseConnection, user_id: Uuid, face_image: String) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(FaceService::new(Arc::new(db))))
                .wrap_fn(move |req, srv| {
                    req.extensions_mut().insert(AuthUser {
                        id: user_id,
                        is_staff: false,
                    });
                    srv.call(req)
                })
                .service(web::scope("/api/v1").configure(face_config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/face")
            .set_json(json!({ "face_image": face_image }))
            .to_request();
        let resp = app.call(req).await.unwrap();
        let status = resp.status();
        (status, test::read_body_json(resp).await)
    }

    #[actix_web::test]
    async fn three_megabyte_image_is_registered() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let stored = facial_data::Model {
            id: Uuid::new_v4(),
            user_id,
            face_encoding: "stored".into(),
            registration_date: now,
            last_updated: now,
            is_active: true,
            confidence_threshold: dec!(95),
            failed_recognition_attempts: 0,
            last_recognition_attempt: None,
            is_locked: false,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<facial_data::Model>::new()])
            .append_query_results([vec![stored]])
            .append_exec_results([exec_ok()])
            .into_connection();

        let image = STANDARD.encode(vec![0x5a_u8; 3 * 1024 * 1024]);
        let (status, body) = upload(db, user_id, image).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["created"], true);
    }

    #[actix_web::test]
    async fn body_over_the_upload_limit_is_a_validation_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let image = STANDARD.encode(vec![0x5a_u8; 6 * 1024 * 1024]);
        let (status, body) = upload(db, Uuid::new_v4(), image).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Image file too large (max 5MB)");
    }

    #[actix_web::test]
    async fn empty_image_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(FaceService::new(Arc::new(db))))
                .wrap_fn(|req, srv| {
                    req.extensions_mut().insert(AuthUser {
                        id: uuid::Uuid::new_v4(),
                        is_staff: false,
                    });
                    srv.call(req)
                })
                .service(web::scope("/api/v1").configure(face_config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/face")
            .set_json(json!({ "face_image": "" }))
            .to_request();
        let resp = app.call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["message"], "Please upload a face image");
    }
}
