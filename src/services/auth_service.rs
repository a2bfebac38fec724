use crate::config::AdminConfig;
use crate::entities::{AuditAction, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::audit_service::{self, AuditEntry};
use crate::utils::*;
use chrono::{NaiveDate, Utc};
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use serde_json::json;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9@.+_-]{3,150}$").expect("static regex"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"))
}

pub fn validate_username(username: &str) -> AppResult<()> {
    if !username_regex().is_match(username) {
        return Err(AppError::ValidationError(
            "Username must be 3-150 characters: letters, digits and @/./+/-/_ only".to_string(),
        ));
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    if !email_regex().is_match(&email) {
        return Err(AppError::ValidationError(
            "Enter a valid email address".to_string(),
        ));
    }
    Ok(email)
}

fn parse_birth_date(raw: Option<&str>) -> AppResult<Option<NaiveDate>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                AppError::ValidationError("Date of birth must be YYYY-MM-DD".to_string())
            }),
    }
}

#[derive(Clone)]
pub struct AuthService {
    pool: Arc<DatabaseConnection>,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: Arc<DatabaseConnection>, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    pub async fn register(
        &self,
        request: RegisterRequest,
        ctx: &RequestContext,
    ) -> AppResult<UserResponse> {
        let user = self.create_account(request, false, ctx).await?;
        log::info!("Registered user {} ({})", user.username, user.id);
        Ok(user.into())
    }

    /// Makes sure the configured operator account exists with staff and
    /// superuser rights, creating or promoting it as needed.
    pub async fn ensure_superuser(&self, admin: &AdminConfig) -> AppResult<UserResponse> {
        let existing = users::Entity::find()
            .filter(users::Column::Username.eq(admin.username.trim()))
            .one(self.pool.as_ref())
            .await?;

        let user = match existing {
            Some(user) if user.is_staff && user.is_superuser && user.is_active => user,
            Some(user) => {
                let txn = self.pool.begin().await?;
                let user_id = user.id;
                let mut am = user.into_active_model();
                am.is_staff = Set(true);
                am.is_superuser = Set(true);
                am.is_active = Set(true);
                am.updated_at = Set(Utc::now());
                let user = am.update(&txn).await?;
                audit_service::record(
                    &txn,
                    AuditEntry::new(None, AuditAction::Update, "CustomUser")
                        .object(user_id)
                        .changes(json!({ "is_staff": true, "is_superuser": true })),
                    &RequestContext::default(),
                )
                .await?;
                txn.commit().await?;
                log::info!("Promoted {} to superuser", user.username);
                user
            }
            None => {
                let request = RegisterRequest {
                    username: admin.username.clone(),
                    email: admin.email.clone(),
                    phone_number: admin.phone_number.clone(),
                    first_name: "BiashAI".to_string(),
                    last_name: "Admin".to_string(),
                    id_number: None,
                    date_of_birth: None,
                    gender: None,
                    password: admin.password.clone(),
                    password_confirm: admin.password.clone(),
                };
                let user = self
                    .create_account(request, true, &RequestContext::default())
                    .await?;
                log::info!("Created superuser {}", user.username);
                user
            }
        };
        Ok(user.into())
    }

    async fn create_account(
        &self,
        request: RegisterRequest,
        superuser: bool,
        ctx: &RequestContext,
    ) -> AppResult<users::Model> {
        if request.password != request.password_confirm {
            return Err(AppError::ValidationError(
                "Passwords do not match".to_string(),
            ));
        }
        let username = request.username.trim().to_string();
        validate_username(&username)?;
        let email = normalize_email(&request.email)?;
        let phone_number = normalize_kenyan_phone(&request.phone_number)?;
        validate_password(&request.password)?;
        let date_of_birth = parse_birth_date(request.date_of_birth.as_deref())?;

        if users::Entity::find()
            .filter(users::Column::Username.eq(&username))
            .count(self.pool.as_ref())
            .await?
            > 0
        {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }
        if users::Entity::find()
            .filter(users::Column::Email.eq(&email))
            .count(self.pool.as_ref())
            .await?
            > 0
        {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        if users::Entity::find()
            .filter(users::Column::PhoneNumber.eq(&phone_number))
            .count(self.pool.as_ref())
            .await?
            > 0
        {
            return Err(AppError::Conflict(
                "Phone number already registered".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password)?;
        let now = Utc::now();

        let txn = self.pool.begin().await?;
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username),
            email: Set(email),
            phone_number: Set(phone_number),
            password_hash: Set(password_hash),
            first_name: Set(request.first_name.trim().to_string()),
            last_name: Set(request.last_name.trim().to_string()),
            id_number: Set(request.id_number.filter(|s| !s.trim().is_empty())),
            date_of_birth: Set(date_of_birth),
            gender: Set(request.gender),
            is_verified: Set(false),
            kyc_verified: Set(false),
            is_staff: Set(superuser),
            is_superuser: Set(superuser),
            is_active: Set(true),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        // The checks above race with concurrent sign-ups; the unique index decides.
        .map_err(|e| AppError::from_unique_violation(e, "Account already exists"))?;

        audit_service::record(
            &txn,
            AuditEntry::new(Some(user.id), AuditAction::Create, "CustomUser").object(user.id),
            ctx,
        )
        .await?;
        txn.commit().await?;
        Ok(user)
    }

    pub async fn login(
        &self,
        request: LoginRequest,
        ctx: &RequestContext,
    ) -> AppResult<AuthResponse> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(request.username.trim()))
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid username or password".to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::AuthError(
                "Invalid username or password".to_string(),
            ));
        }
        if !user.is_active {
            return Err(AppError::AuthError("Account is disabled".to_string()));
        }

        let txn = self.pool.begin().await?;
        let mut am = user.into_active_model();
        am.last_login = Set(Some(Utc::now()));
        let user = am.update(&txn).await?;
        audit_service::record(
            &txn,
            AuditEntry::new(Some(user.id), AuditAction::Login, "CustomUser").object(user.id),
            ctx,
        )
        .await?;
        txn.commit().await?;

        self.issue_tokens(user)
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user = users::Entity::find_by_id(claims.user_id()?)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;
        if !user.is_active {
            return Err(AppError::AuthError("Account is disabled".to_string()));
        }
        self.issue_tokens(user)
    }

    /// Tokens are stateless, so logging out only leaves an audit trail.
    pub async fn logout(&self, user_id: Uuid, ctx: &RequestContext) -> AppResult<()> {
        audit_service::record(
            self.pool.as_ref(),
            AuditEntry::new(Some(user_id), AuditAction::Logout, "CustomUser").object(user_id),
            ctx,
        )
        .await?;
        Ok(())
    }

    fn issue_tokens(&self, user: users::Model) -> AppResult<AuthResponse> {
        let is_staff = user.can_access_staff_area();
        let access_token =
            self.jwt_service
                .generate_access_token(user.id, &user.username, is_staff)?;
        let refresh_token =
            self.jwt_service
                .generate_refresh_token(user.id, &user.username, is_staff)?;
        Ok(AuthResponse {
            user: user.into(),
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::mock::{exec_ok, transaction_log};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::BTreeMap;

    fn jwt() -> JwtService {
        JwtService::new("test-secret", 3600, 86400)
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, sea_orm::Value> {
        BTreeMap::from([("num_items", sea_orm::Value::BigInt(Some(n)))])
    }

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            username: "wanjiku".into(),
            email: "Wanjiku@Example.com".into(),
            phone_number: "0712345678".into(),
            first_name: "Wanjiku".into(),
            last_name: "Kamau".into(),
            id_number: None,
            date_of_birth: Some("1994-06-01".into()),
            gender: None,
            password: "correct-horse".into(),
            password_confirm: "correct-horse".into(),
        }
    }

    #[test]
    fn usernames_follow_the_allowed_alphabet() {
        assert!(validate_username("jane.doe+1").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
    }

    #[test]
    fn emails_are_lowercased() {
        assert_eq!(
            normalize_email(" Jane@Example.COM ").unwrap(),
            "jane@example.com"
        );
        assert!(normalize_email("not-an-email").is_err());
    }

    #[test]
    fn birth_dates_are_optional() {
        assert_eq!(parse_birth_date(None).unwrap(), None);
        assert_eq!(parse_birth_date(Some("")).unwrap(), None);
        assert!(parse_birth_date(Some("01/06/1994")).is_err());
    }

    #[actix_web::test]
    async fn mismatched_passwords_are_rejected_before_any_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let svc = AuthService::new(Arc::new(db), jwt());
        let mut request = register_request();
        request.password_confirm = "something-else".into();
        let err = svc
            .register(request, &RequestContext::default())
            .await
            .unwrap_err();
        match err {
            AppError::ValidationError(msg) => assert_eq!(msg, "Passwords do not match"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[actix_web::test]
    async fn duplicate_email_is_a_conflict() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(0)]])
            .append_query_results([[count_row(1)]])
            .into_connection();
        let svc = AuthService::new(Arc::new(db), jwt());
        let err = svc
            .register(register_request(), &RequestContext::default())
            .await
            .unwrap_err();
        match err {
            AppError::Conflict(msg) => assert_eq!(msg, "Email already registered"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[actix_web::test]
    async fn unknown_user_cannot_log_in() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();
        let svc = AuthService::new(Arc::new(db), jwt());
        let err = svc
            .login(
                LoginRequest {
                    username: "ghost".into(),
                    password: "whatever1".into(),
                },
                &RequestContext::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));
    }

    #[actix_web::test]
    async fn configured_admin_is_promoted_in_place() {
        let now = Utc::now();
        let customer = users::Model {
            id: Uuid::new_v4(),
            username: "ops".into(),
            email: "ops@biashai.co.ke".into(),
            phone_number: "+254700000001".into(),
            password_hash: "hash".into(),
            first_name: "Ops".into(),
            last_name: "Desk".into(),
            id_number: None,
            date_of_birth: None,
            gender: None,
            is_verified: false,
            kyc_verified: false,
            is_staff: false,
            is_superuser: false,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        let mut promoted = customer.clone();
        promoted.is_staff = true;
        promoted.is_superuser = true;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![customer]])
                .append_query_results([vec![promoted]])
                .append_exec_results([exec_ok()])
                .into_connection(),
        );
        let admin = AdminConfig {
            username: "ops".into(),
            email: "ops@biashai.co.ke".into(),
            phone_number: "0700000001".into(),
            password: "long-enough-secret".into(),
        };
        let user = AuthService::new(db.clone(), jwt())
            .ensure_superuser(&admin)
            .await
            .unwrap();
        assert!(user.is_staff);

        let log = transaction_log(db);
        assert!(log.contains(r#"UPDATE "users""#));
        assert!(!log.contains(r#"INSERT INTO "users""#));
    }
}
