pub mod audit_service;
pub mod auth_service;
pub mod behavior_service;
pub mod catalog_admin_service;
pub mod catalog_service;
pub mod checkout_service;
pub mod face_service;
pub mod loyalty_service;
pub mod payment_account_service;
pub mod pricing;
pub mod report_service;
pub mod security_service;
pub mod session_service;
pub mod staff_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use catalog_admin_service::CatalogAdminService;
pub use catalog_service::CatalogService;
pub use checkout_service::CheckoutService;
pub use face_service::FaceService;
pub use loyalty_service::LoyaltyService;
pub use payment_account_service::PaymentAccountService;
pub use report_service::ReportService;
pub use security_service::SecurityService;
pub use session_service::SessionService;
pub use staff_service::StaffService;
pub use user_service::UserService;
