use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use biashai_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    let pool = Arc::new(pool);

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    let auth_service = AuthService::new(pool.clone(), jwt_service.clone());
    if let Some(admin) = &config.admin {
        auth_service
            .ensure_superuser(admin)
            .await
            .expect("Failed to provision the administrator account");
    }
    let user_service = UserService::new(pool.clone());
    let face_service = FaceService::new(pool.clone());
    let payment_account_service = PaymentAccountService::new(pool.clone());
    let catalog_service = CatalogService::new(pool.clone());
    let session_service = SessionService::new(pool.clone());
    let checkout_service = CheckoutService::new(pool.clone(), config.loyalty.points_expiry_days);
    let loyalty_service = LoyaltyService::new(pool.clone());
    let security_service = SecurityService::new(pool.clone());
    let staff_service = StaffService::new(pool.clone());
    let catalog_admin_service = CatalogAdminService::new(pool.clone());
    let report_service = ReportService::new(pool.clone());

    tasks::spawn_all(report_service.clone(), &config.tasks);

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(face_service.clone()))
            .app_data(web::Data::new(payment_account_service.clone()))
            .app_data(web::Data::new(catalog_service.clone()))
            .app_data(web::Data::new(session_service.clone()))
            .app_data(web::Data::new(checkout_service.clone()))
            .app_data(web::Data::new(loyalty_service.clone()))
            .app_data(web::Data::new(security_service.clone()))
            .app_data(web::Data::new(staff_service.clone()))
            .app_data(web::Data::new(catalog_admin_service.clone()))
            .app_data(web::Data::new(report_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::shop_config)
                    .configure(handlers::customer_config)
                    .configure(handlers::face_config)
                    .configure(handlers::payment_config)
                    .configure(handlers::loyalty_config)
                    .configure(handlers::shopping_config)
                    .configure(handlers::staff_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
