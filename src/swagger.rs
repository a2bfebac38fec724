use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{self, *};
use crate::handlers;
use crate::models::*;
use crate::services::pricing::{CartTotals, LineTotals};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::shop::home,
        handlers::shop::counties,
        handlers::shop::categories,
        handlers::shop::list_stores,
        handlers::shop::store_detail,
        handlers::shop::store_status,
        handlers::shop::list_products,
        handlers::shop::product_detail,
        handlers::shop::product_availability,
        handlers::shop::promotions,
        handlers::shop::verify_face,
        handlers::customer::dashboard,
        handlers::customer::get_profile,
        handlers::customer::update_profile,
        handlers::customer::transactions,
        handlers::customer::transaction_detail,
        handlers::face::status,
        handlers::face::register,
        handlers::face::delete,
        handlers::payment::list,
        handlers::payment::add,
        handlers::payment::set_primary,
        handlers::payment::delete,
        handlers::loyalty::dashboard,
        handlers::loyalty::redeem,
        handlers::shopping::start_session,
        handlers::shopping::view_session,
        handlers::shopping::cancel_session,
        handlers::shopping::add_to_cart,
        handlers::shopping::update_cart_item,
        handlers::shopping::remove_cart_item,
        handlers::shopping::checkout,
        handlers::staff::dashboard,
        handlers::staff::analytics,
        handlers::staff::stores,
        handlers::staff::products,
        handlers::staff::inventory,
        handlers::staff::update_inventory,
        handlers::staff::customers,
        handlers::staff::alerts,
        handlers::staff::update_alert,
        handlers::staff::generate_reports,
        handlers::staff::create_county,
        handlers::staff::create_category,
        handlers::staff::update_category,
        handlers::staff::create_store,
        handlers::staff::update_store,
        handlers::staff::create_camera,
        handlers::staff::update_camera,
        handlers::staff::create_product,
        handlers::staff::update_product,
        handlers::staff::create_inventory,
        handlers::staff::create_promotion,
        handlers::staff::update_promotion,
        handlers::staff::set_staff_role,
    ),
    components(
        schemas(
            Gender,
            StoreType,
            CameraType,
            PaymentMethod,
            SessionStatus,
            TransactionStatus,
            LoyaltyTier,
            LoyaltyTransactionType,
            RecognitionType,
            RecognitionResult,
            AlertType,
            AlertSeverity,
            AlertStatus,
            DiscountType,
            AuditAction,
            entities::counties::Model,
            entities::stores::Model,
            entities::cameras::Model,
            entities::product_categories::Model,
            entities::products::Model,
            entities::store_inventory::Model,
            entities::promotions::Model,
            entities::payment_accounts::Model,
            entities::facial_data::Model,
            entities::shopping_sessions::Model,
            entities::shopping_cart::Model,
            entities::transactions::Model,
            entities::transaction_items::Model,
            entities::loyalty_programs::Model,
            entities::loyalty_transactions::Model,
            entities::security_alerts::Model,
            entities::face_recognition_logs::Model,
            entities::daily_sales_reports::Model,
            RegisterRequest,
            LoginRequest,
            RefreshTokenRequest,
            UpdateProfileRequest,
            UserResponse,
            CreateCountyRequest,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CreateStoreRequest,
            UpdateStoreRequest,
            CreateCameraRequest,
            UpdateCameraRequest,
            CreateProductRequest,
            UpdateProductRequest,
            CreateInventoryRequest,
            CreatePromotionRequest,
            UpdatePromotionRequest,
            UpdateStaffRoleRequest,
            AuthResponse,
            HomeStats,
            InventoryLine,
            StoreDetail,
            StoreAvailability,
            ProductDetail,
            StoreStatus,
            ProductAvailability,
            CustomerDashboard,
            RegisterFaceRequest,
            FaceStatusResponse,
            FaceRegistrationResponse,
            VerifyFaceRequest,
            VerifyFaceResponse,
            AddPaymentAccountRequest,
            LoyaltyDashboard,
            RedeemPointsRequest,
            RedeemPointsResponse,
            StartSessionRequest,
            AddToCartRequest,
            UpdateCartItemRequest,
            CheckoutRequest,
            LineTotals,
            CartTotals,
            CartLineView,
            SessionView,
            CheckoutReceipt,
            TransactionDetail,
            StoreRevenue,
            StaffDashboard,
            DailyRevenue,
            PaymentMethodBreakdown,
            RecognitionStat,
            Analytics,
            InventoryOverview,
            UpdateInventoryRequest,
            UpdateAlertRequest,
            GenerateReportRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and tokens"),
        (name = "shop", description = "Public storefront"),
        (name = "customer", description = "Customer account"),
        (name = "face", description = "Face profile"),
        (name = "payment", description = "Payment accounts"),
        (name = "loyalty", description = "Loyalty points"),
        (name = "shopping", description = "Sessions, cart and checkout"),
        (name = "staff", description = "Staff back office"),
    ),
    info(
        title = "BiashAI Backend API",
        version = "1.0.0",
        description = "BiashAI face-pay retail REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
