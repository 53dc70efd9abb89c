//! Integration tests for API endpoints.
//!
//! In-memory fakes stand in for the sea-orm stores so the full router,
//! middleware included, can be exercised without a running Postgres.

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use tower::ServiceExt;

use furnitown_api::api::middleware::{optional_auth_middleware, page_auth_middleware, CurrentUser};
use furnitown_api::api::{create_router, AppState};
use furnitown_api::config::Config;
use furnitown_api::domain::{
    Attribute, Banner, BannerView, Category, CategoryWithCount, Color, ColorWithCount, Coupon,
    Notification, Otp, Password, ProductSummary, Room, RoomWithCount, User, UserRole,
    WelcomeCoupon,
};
use furnitown_api::errors::{AppError, AppResult};
use furnitown_api::infra::repositories::{
    AttributeRepository, BannerPatch, BannerRepository, CategoryPatch, CategoryRepository,
    ColorRepository, ColorUpdate, CouponRepository, NewAttribute, NewBanner, NewCategory,
    NewColor, NewRoom, NewUser, NotificationRepository, OtpRepository, RoomPatch, RoomRepository,
    UserRepository,
};
use furnitown_api::infra::{Database, Mailer};
use furnitown_api::services::{AuthService, OtpService, Purpose, TokenService};

// =============================================================================
// In-memory fakes
// =============================================================================

#[derive(Default)]
struct FakeUsers {
    rows: Mutex<Vec<User>>,
    next_id: AtomicI64,
}

impl FakeUsers {
    fn seed(&self, email: &str, password: &str, role: UserRole, email_active: bool) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let hash = Password::new(password).unwrap().into_string();
        self.rows.lock().unwrap().push(User {
            id,
            email: email.to_string(),
            password_hash: Some(hash),
            full_name: "Seeded User".to_string(),
            phone: None,
            address: None,
            role,
            email_active,
            verified_at: email_active.then_some(now),
            disabled_at: None,
            session_token: None,
            created_at: now,
            updated_at: now,
        });
        id
    }

    fn get(&self, id: i64) -> Option<User> {
        self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }
}

#[async_trait]
impl UserRepository for FakeUsers {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn phone_in_use(&self, phone: &str) -> AppResult<bool> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.phone.as_deref() == Some(phone)))
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let user = User {
            id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            full_name: new_user.full_name,
            phone: new_user.phone,
            address: new_user.address,
            role: new_user.role,
            email_active: false,
            verified_at: None,
            disabled_at: None,
            session_token: None,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn set_session_token(&self, id: i64, token: Option<String>) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        user.session_token = token;
        Ok(())
    }

    async fn set_password_hash(&self, id: i64, password_hash: String) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        user.password_hash = Some(password_hash);
        Ok(())
    }

    async fn mark_verified(&self, id: i64) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        user.email_active = true;
        user.verified_at = Some(Utc::now());
        user.session_token = None;
        Ok(())
    }
}

#[derive(Default)]
struct FakeOtps {
    rows: Mutex<Vec<(Otp, String)>>,
    next_id: AtomicI64,
}

#[async_trait]
impl OtpRepository for FakeOtps {
    async fn count_since(&self, user_id: i64, since: DateTime<Utc>) -> AppResult<u64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(o, _)| o.user_id == user_id && o.created_at >= since)
            .count() as u64)
    }

    async fn invalidate_live(&self, user_id: i64, now: DateTime<Utc>) -> AppResult<()> {
        for (otp, _) in self.rows.lock().unwrap().iter_mut() {
            if otp.user_id == user_id && !otp.is_used && otp.expires_at > now {
                otp.is_used = true;
            }
        }
        Ok(())
    }

    async fn insert(
        &self,
        user_id: i64,
        email: String,
        code_hash: String,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Otp> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let otp = Otp {
            id,
            user_id,
            code_hash,
            attempts: 0,
            is_used: false,
            created_at: Utc::now(),
            expires_at,
        };
        self.rows.lock().unwrap().push((otp.clone(), email));
        Ok(otp)
    }

    async fn latest_unused(&self, user_id: i64, email: &str) -> AppResult<Option<Otp>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(o, e)| o.user_id == user_id && e == email && !o.is_used)
            .max_by_key(|(o, _)| o.created_at)
            .map(|(o, _)| o.clone()))
    }

    async fn mark_used(&self, id: i64) -> AppResult<()> {
        for (otp, _) in self.rows.lock().unwrap().iter_mut() {
            if otp.id == id {
                otp.is_used = true;
            }
        }
        Ok(())
    }

    async fn increment_attempts(&self, id: i64) -> AppResult<()> {
        for (otp, _) in self.rows.lock().unwrap().iter_mut() {
            if otp.id == id {
                otp.attempts += 1;
            }
        }
        Ok(())
    }
}

struct FakeCoupons;

#[async_trait]
impl CouponRepository for FakeCoupons {
    async fn grant(&self, _user_id: i64, welcome: WelcomeCoupon) -> AppResult<Coupon> {
        Ok(Coupon {
            id: 1,
            code: welcome.code,
            title: welcome.title,
            percent: welcome.percent,
            description: Some(welcome.description),
            min_order: welcome.min_order,
            start_time: welcome.start_time,
            exp_time: welcome.exp_time,
            status: 1,
        })
    }
}

struct FakeNotifications;

#[async_trait]
impl NotificationRepository for FakeNotifications {
    async fn notify(
        &self,
        _user_id: i64,
        title: String,
        message: String,
    ) -> AppResult<Notification> {
        Ok(Notification {
            id: 1,
            title,
            message,
            created_by: "system".to_string(),
            created_at: Utc::now(),
        })
    }
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingMailer {
    fn last_body(&self) -> String {
        self.sent
            .lock()
            .unwrap()
            .last()
            .map(|(_, _, body)| body.clone())
            .unwrap_or_default()
    }

    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html_body: String) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), html_body));
        Ok(())
    }
}

/// Catalog stand-in: empty listings, not-found mutations. The tests in this
/// file exercise authentication and authorization, not catalog semantics.
struct StubCatalog;

#[async_trait]
impl CategoryRepository for StubCatalog {
    async fn list(&self, _visible_only: bool) -> AppResult<Vec<CategoryWithCount>> {
        Ok(vec![])
    }

    async fn filter_list(&self) -> AppResult<Vec<Category>> {
        Ok(vec![])
    }

    async fn find_by_id(&self, _id: i64) -> AppResult<Option<Category>> {
        Ok(None)
    }

    async fn find_by_slug(&self, _slug: &str) -> AppResult<Option<Category>> {
        Ok(None)
    }

    async fn slug_exists(&self, _slug: &str) -> AppResult<bool> {
        Ok(false)
    }

    async fn name_taken_elsewhere(&self, _name: &str, _slug: &str) -> AppResult<bool> {
        Ok(false)
    }

    async fn create(&self, _new: NewCategory) -> AppResult<Category> {
        Err(AppError::internal("not supported"))
    }

    async fn update(&self, _slug: &str, _patch: CategoryPatch) -> AppResult<Category> {
        Err(AppError::not_found("Category not found"))
    }

    async fn delete_by_slug(&self, _slug: &str) -> AppResult<()> {
        Ok(())
    }

    async fn product_ids(&self, _category_id: i64) -> AppResult<Vec<i64>> {
        Ok(vec![])
    }

    async fn products_page(
        &self,
        _category_id: i64,
        _page: u64,
        _limit: u64,
    ) -> AppResult<(Vec<ProductSummary>, u64)> {
        Ok((vec![], 0))
    }

    async fn by_product_slug(&self, _product_slug: &str) -> AppResult<Vec<Category>> {
        Ok(vec![])
    }
}

#[async_trait]
impl RoomRepository for StubCatalog {
    async fn list(&self, _visible_only: bool) -> AppResult<Vec<RoomWithCount>> {
        Ok(vec![])
    }

    async fn filter_list(&self) -> AppResult<Vec<Room>> {
        Ok(vec![])
    }

    async fn find_by_slug(&self, _slug: &str) -> AppResult<Option<RoomWithCount>> {
        Ok(None)
    }

    async fn exists(&self, _name: &str, _slug: &str) -> AppResult<bool> {
        Ok(false)
    }

    async fn name_taken_elsewhere(&self, _name: &str, _slug: &str) -> AppResult<bool> {
        Ok(false)
    }

    async fn create(&self, _new: NewRoom) -> AppResult<Room> {
        Err(AppError::internal("not supported"))
    }

    async fn update(&self, _slug: &str, _patch: RoomPatch) -> AppResult<Room> {
        Err(AppError::not_found("Room not found"))
    }

    async fn delete(&self, _room_id: i64) -> AppResult<()> {
        Ok(())
    }

    async fn products_page(
        &self,
        _room_id: i64,
        _page: u64,
        _limit: u64,
    ) -> AppResult<(Vec<ProductSummary>, u64)> {
        Ok((vec![], 0))
    }

    async fn product_exists(&self, _product_id: i64) -> AppResult<bool> {
        Ok(false)
    }

    async fn link_exists(&self, _room_id: i64, _product_id: i64) -> AppResult<bool> {
        Ok(false)
    }

    async fn add_product(&self, _room_id: i64, _product_id: i64) -> AppResult<()> {
        Ok(())
    }

    async fn remove_product(&self, _room_id: i64, _product_id: i64) -> AppResult<bool> {
        Ok(false)
    }

    async fn by_product_slug(&self, _product_slug: &str) -> AppResult<Vec<Room>> {
        Ok(vec![])
    }
}

#[async_trait]
impl BannerRepository for StubCatalog {
    async fn list(&self) -> AppResult<Vec<BannerView>> {
        Ok(vec![])
    }

    async fn list_by_page(&self, _page_type: &str) -> AppResult<Vec<BannerView>> {
        Ok(vec![])
    }

    async fn list_by_pages(&self, _page_types: &[String]) -> AppResult<Vec<Banner>> {
        Ok(vec![])
    }

    async fn page_types(&self) -> AppResult<Vec<String>> {
        Ok(vec![])
    }

    async fn find(&self, _id: i64) -> AppResult<Option<BannerView>> {
        Ok(None)
    }

    async fn create(&self, _new: NewBanner) -> AppResult<Banner> {
        Err(AppError::internal("not supported"))
    }

    async fn update(&self, _id: i64, _patch: BannerPatch) -> AppResult<Banner> {
        Err(AppError::not_found("Banner not found"))
    }

    async fn delete(&self, _id: i64) -> AppResult<()> {
        Err(AppError::not_found("Banner not found"))
    }

    async fn toggle_status(&self, _id: i64) -> AppResult<Banner> {
        Err(AppError::not_found("Banner not found"))
    }
}

#[async_trait]
impl ColorRepository for StubCatalog {
    async fn filter_list(&self) -> AppResult<Vec<Color>> {
        Ok(vec![])
    }

    async fn by_product_slug(&self, _product_slug: &str) -> AppResult<Vec<Color>> {
        Ok(vec![])
    }

    async fn list_with_counts(&self) -> AppResult<Vec<ColorWithCount>> {
        Ok(vec![])
    }

    async fn find_by_slug(&self, _slug: &str) -> AppResult<Option<Color>> {
        Ok(None)
    }

    async fn create(&self, _new: NewColor) -> AppResult<Color> {
        Err(AppError::internal("not supported"))
    }

    async fn update(&self, _id: i64, _update: ColorUpdate) -> AppResult<Color> {
        Err(AppError::not_found("Color not found"))
    }

    async fn set_status(&self, _id: i64, _status: i16) -> AppResult<Color> {
        Err(AppError::not_found("Color not found"))
    }

    async fn toggle_status(&self, _id: i64) -> AppResult<Color> {
        Err(AppError::not_found("Color not found"))
    }

    async fn product_count(&self, _color_id: i64) -> AppResult<u64> {
        Ok(0)
    }

    async fn delete(&self, _id: i64) -> AppResult<bool> {
        Ok(false)
    }
}

#[async_trait]
impl AttributeRepository for StubCatalog {
    async fn create(&self, _category_id: i64, _new: NewAttribute) -> AppResult<Attribute> {
        Err(AppError::internal("not supported"))
    }

    async fn list_by_category(&self, _category_id: i64) -> AppResult<Vec<Attribute>> {
        Ok(vec![])
    }
}

// =============================================================================
// Test harness
// =============================================================================

struct TestApp {
    router: Router,
    state: AppState,
    tokens: Arc<TokenService>,
    users: Arc<FakeUsers>,
    mailer: Arc<RecordingMailer>,
}

fn test_app() -> TestApp {
    let config = Config::for_tests("integration-test-secret-32-chars!!");
    let tokens = Arc::new(TokenService::new(&config));
    let users = Arc::new(FakeUsers::default());
    let mailer = Arc::new(RecordingMailer::default());

    let auth_service = Arc::new(AuthService::new(
        users.clone(),
        Arc::new(FakeCoupons),
        Arc::new(FakeNotifications),
        mailer.clone(),
        tokens.clone(),
        config.backend_url.clone(),
    ));
    let otp_service = Arc::new(OtpService::new(
        users.clone(),
        Arc::new(FakeOtps::default()),
        mailer.clone(),
        tokens.clone(),
    ));

    let catalog = Arc::new(StubCatalog);
    let state = AppState {
        config: Arc::new(config),
        tokens: tokens.clone(),
        auth_service,
        otp_service,
        users: users.clone(),
        categories: catalog.clone(),
        rooms: catalog.clone(),
        banners: catalog.clone(),
        colors: catalog.clone(),
        attributes: catalog,
        database: Arc::new(Database::from_connection(
            sea_orm::DatabaseConnection::Disconnected,
        )),
    };

    TestApp {
        router: create_router(state.clone()),
        state,
        tokens,
        users,
        mailer,
    }
}

impl TestApp {
    fn login_token(&self, user_id: i64, role: UserRole) -> String {
        self.tokens
            .issue(user_id, Some(role), Purpose::Login, Duration::hours(1))
            .unwrap()
    }
}

fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Pull the value of a query parameter or tag out of an HTML mail body.
fn extract_between(haystack: &str, start: &str, end: char) -> String {
    let from = haystack.find(start).expect("marker not found") + start.len();
    haystack[from..]
        .chars()
        .take_while(|&c| c != end)
        .collect()
}

// =============================================================================
// Root and error shapes
// =============================================================================

#[tokio::test]
async fn root_serves_welcome_banner() {
    let app = test_app();
    let response = app.router.clone().oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Furnitown API");
}

#[tokio::test]
async fn missing_token_is_structured_401() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(get("/api/auth/profile"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "Authentication required");
    assert_eq!(body["error"]["status"], 401);
}

// =============================================================================
// Registration and verification
// =============================================================================

#[tokio::test]
async fn register_rejects_invalid_fields_per_field() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(json_post(
            "/api/auth/register",
            serde_json::json!({
                "email": "not-an-email",
                "password": "123",
                "full_name": "  "
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["errors"]["email"].is_string());
    assert!(body["errors"]["password"].is_string());
    assert!(body["errors"]["full_name"].is_string());
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = test_app();
    app.users
        .seed("taken@example.com", "password1", UserRole::User, true);

    let response = app
        .router
        .clone()
        .oneshot(json_post(
            "/api/auth/register",
            serde_json::json!({
                "email": "Taken@Example.com",
                "password": "password1",
                "full_name": "Second Comer"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errors"]["email"], "Email is already registered");
}

#[tokio::test]
async fn register_verify_login_round_trip() {
    let app = test_app();

    // Register.
    let response = app
        .router
        .clone()
        .oneshot(json_post(
            "/api/auth/register",
            serde_json::json!({
                "email": "new@example.com",
                "password": "password1",
                "full_name": "New Customer"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], "new@example.com");
    assert_eq!(body["user"]["email_active"], false);
    assert!(body["token"].is_string());
    assert!(body["coupon"]["code"].as_str().unwrap().starts_with("WELCOME"));
    assert_eq!(app.mailer.count(), 1);

    // Login before verification is refused.
    let response = app
        .router
        .clone()
        .oneshot(json_post(
            "/api/auth/login",
            serde_json::json!({"email": "new@example.com", "password": "password1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Follow the mailed verification link.
    let mail = app.mailer.last_body();
    let token = extract_between(&mail, "token=", '"');
    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/api/auth/verify-email?token={}", token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.contains("/verify-email?"));
    assert!(location.contains("status=success"));

    // Now login succeeds and the profile is reachable.
    let response = app
        .router
        .clone()
        .oneshot(json_post(
            "/api/auth/login",
            serde_json::json!({"email": "new@example.com", "password": "password1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["token"].as_str().unwrap().to_string();

    let response = app
        .router
        .clone()
        .oneshot(get_with_bearer("/api/auth/profile", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("new@example.com"));
    assert!(!body.contains("password"));
}

#[tokio::test]
async fn reusing_a_verification_link_reports_already_verified() {
    let app = test_app();
    app.router
        .clone()
        .oneshot(json_post(
            "/api/auth/register",
            serde_json::json!({
                "email": "twice@example.com",
                "password": "password1",
                "full_name": "Twice Clicker"
            }),
        ))
        .await
        .unwrap();

    let mail = app.mailer.last_body();
    let token = extract_between(&mail, "token=", '"');
    let uri = format!("/api/auth/verify-email?token={}", token);

    let first = app.router.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(first.status(), StatusCode::SEE_OTHER);

    let second = app.router.clone().oneshot(get(&uri)).await.unwrap();
    let location = second
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.contains("status=already_verified"));
}

// =============================================================================
// Token extraction and failure collapsing
// =============================================================================

#[tokio::test]
async fn token_is_accepted_from_the_cookie() {
    let app = test_app();
    let id = app
        .users
        .seed("cookie@example.com", "password1", UserRole::User, true);
    let token = app.login_token(id, UserRole::User);

    let request = Request::builder()
        .uri("/api/auth/profile")
        .header(header::COOKIE, format!("token={}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn expired_token_collapses_to_generic_401() {
    let app = test_app();
    let id = app
        .users
        .seed("stale@example.com", "password1", UserRole::User, true);
    let token = app
        .tokens
        .issue(id, Some(UserRole::User), Purpose::Login, Duration::seconds(-60))
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(get_with_bearer("/api/auth/profile", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_string(response).await;
    // The body must not reveal whether the signature or the expiry failed.
    assert!(!body.to_lowercase().contains("expire"));
    assert!(!body.to_lowercase().contains("signature"));
    assert!(body.contains("Authentication required"));
}

#[tokio::test]
async fn reset_purpose_token_cannot_authenticate() {
    let app = test_app();
    let id = app
        .users
        .seed("reset@example.com", "password1", UserRole::User, true);
    let token = app
        .tokens
        .issue(id, None, Purpose::PasswordReset, Duration::minutes(10))
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(get_with_bearer("/api/auth/profile", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Role gates
// =============================================================================

#[tokio::test]
async fn staff_gate_on_admin_catalog_routes() {
    let app = test_app();
    let customer = app
        .users
        .seed("customer@example.com", "password1", UserRole::User, true);
    let staff = app
        .users
        .seed("staff@example.com", "password1", UserRole::Staff, true);

    let response = app
        .router
        .clone()
        .oneshot(get_with_bearer(
            "/api/categories/admin/all",
            &app.login_token(customer, UserRole::User),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .router
        .clone()
        .oneshot(get_with_bearer(
            "/api/categories/admin/all",
            &app.login_token(staff, UserRole::Staff),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn stored_role_overrides_the_token_claim() {
    let app = test_app();
    let customer = app
        .users
        .seed("climber@example.com", "password1", UserRole::User, true);

    // Token claims admin, but the database still says customer.
    let forged = app.login_token(customer, UserRole::Admin);
    let response = app
        .router
        .clone()
        .oneshot(get_with_bearer("/api/categories/admin/all", &forged))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn banner_mutations_are_admin_only() {
    let app = test_app();
    let staff = app
        .users
        .seed("staff2@example.com", "password1", UserRole::Staff, true);
    let admin = app
        .users
        .seed("admin@example.com", "password1", UserRole::Admin, true);

    let toggle = |token: &str| {
        Request::builder()
            .method("PUT")
            .uri("/api/banners/1/toggle-status")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    };

    // Staff clears authentication but not the admin-only gate.
    let response = app
        .router
        .clone()
        .oneshot(toggle(&app.login_token(staff, UserRole::Staff)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin passes the gate and reaches the handler (stub knows no banner 1).
    let response = app
        .router
        .clone()
        .oneshot(toggle(&app.login_token(admin, UserRole::Admin)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_login_sets_http_only_cookie() {
    let app = test_app();
    app.users
        .seed("dash@example.com", "password1", UserRole::Staff, true);
    app.users
        .seed("shopper@example.com", "password1", UserRole::User, true);

    let response = app
        .router
        .clone()
        .oneshot(json_post(
            "/api/auth/admin/login",
            serde_json::json!({"email": "dash@example.com", "password": "password1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    // Plain customers are refused before any session opens.
    let response = app
        .router
        .clone()
        .oneshot(json_post(
            "/api/auth/admin/login",
            serde_json::json!({"email": "shopper@example.com", "password": "password1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn token_introspection_is_admin_only() {
    let app = test_app();
    let staff = app
        .users
        .seed("dashstaff@example.com", "password1", UserRole::Staff, true);
    let admin = app
        .users
        .seed("dashadmin@example.com", "password1", UserRole::Admin, true);

    let response = app
        .router
        .clone()
        .oneshot(get_with_bearer(
            "/api/auth/check-token",
            &app.login_token(staff, UserRole::Staff),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .router
        .clone()
        .oneshot(get_with_bearer(
            "/api/auth/check-token",
            &app.login_token(admin, UserRole::Admin),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["user"]["email"], "dashadmin@example.com");
}

// =============================================================================
// Page and optional authentication variants
// =============================================================================

/// A one-route router mounted the way server-rendered pages are.
fn page_router(app: &TestApp) -> Router {
    Router::new()
        .route("/dashboard", axum::routing::get(|| async { "dashboard" }))
        .route_layer(axum::middleware::from_fn_with_state(
            app.state.clone(),
            page_auth_middleware,
        ))
        .with_state(app.state.clone())
}

#[tokio::test]
async fn page_routes_redirect_anonymous_visitors_home() {
    let app = test_app();

    let response = page_router(&app).oneshot(get("/dashboard")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        &HeaderValue::from_static("/")
    );
}

#[tokio::test]
async fn page_routes_render_for_authenticated_users() {
    let app = test_app();
    let staff = app
        .users
        .seed("pages@example.com", "password1", UserRole::Staff, true);

    let response = page_router(&app)
        .oneshot(get_with_bearer(
            "/dashboard",
            &app.login_token(staff, UserRole::Staff),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "dashboard");
}

/// A one-route router that reports who the optional middleware attached.
fn whoami_router(app: &TestApp) -> Router {
    async fn whoami(user: Option<axum::Extension<CurrentUser>>) -> String {
        match user {
            Some(axum::Extension(u)) => u.email,
            None => "anonymous".to_string(),
        }
    }

    Router::new()
        .route("/whoami", axum::routing::get(whoami))
        .route_layer(axum::middleware::from_fn_with_state(
            app.state.clone(),
            optional_auth_middleware,
        ))
        .with_state(app.state.clone())
}

#[tokio::test]
async fn optional_auth_proceeds_anonymously_on_bad_tokens() {
    let app = test_app();

    let response = whoami_router(&app)
        .oneshot(get_with_bearer("/whoami", "garbage"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "anonymous");
}

#[tokio::test]
async fn optional_auth_attaches_the_user_when_the_token_is_valid() {
    let app = test_app();
    let shopper = app
        .users
        .seed("maybe@example.com", "password1", UserRole::User, true);

    let response = whoami_router(&app)
        .oneshot(get_with_bearer(
            "/whoami",
            &app.login_token(shopper, UserRole::User),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "maybe@example.com");
}

// =============================================================================
// Password reset
// =============================================================================

#[tokio::test]
async fn password_reset_round_trip() {
    let app = test_app();
    app.users
        .seed("forgot@example.com", "oldpassword", UserRole::User, true);

    // Request a code; it arrives by mail.
    let response = app
        .router
        .clone()
        .oneshot(json_post(
            "/api/auth/request-otp",
            serde_json::json!({"email": "forgot@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mail = app.mailer.last_body();
    let code = extract_between(&mail, "<strong>", '<');
    assert_eq!(code.len(), 6);

    // A wrong code is a 401 (and burns an attempt).
    let wrong = if code == "000000" { "111111" } else { "000000" };
    let response = app
        .router
        .clone()
        .oneshot(json_post(
            "/api/auth/verify-otp",
            serde_json::json!({"email": "forgot@example.com", "otp": wrong}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The right code yields a reset token.
    let response = app
        .router
        .clone()
        .oneshot(json_post(
            "/api/auth/verify-otp",
            serde_json::json!({"email": "forgot@example.com", "otp": code}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let reset_token = body["reset_token"].as_str().unwrap().to_string();

    // Set the new password with it.
    let response = app
        .router
        .clone()
        .oneshot(json_post(
            "/api/auth/reset-password",
            serde_json::json!({"token": reset_token, "new_password": "newpassword"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Old password no longer works, the new one does.
    let response = app
        .router
        .clone()
        .oneshot(json_post(
            "/api/auth/login",
            serde_json::json!({"email": "forgot@example.com", "password": "oldpassword"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .router
        .clone()
        .oneshot(json_post(
            "/api/auth/login",
            serde_json::json!({"email": "forgot@example.com", "password": "newpassword"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn otp_requests_are_rate_limited() {
    let app = test_app();
    app.users
        .seed("eager@example.com", "password1", UserRole::User, true);

    for _ in 0..3 {
        let response = app
            .router
            .clone()
            .oneshot(json_post(
                "/api/auth/request-otp",
                serde_json::json!({"email": "eager@example.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .router
        .clone()
        .oneshot(json_post(
            "/api/auth/request-otp",
            serde_json::json!({"email": "eager@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn unknown_email_cannot_request_a_code() {
    let app = test_app();
    let response = app
        .router
        .clone()
        .oneshot(json_post(
            "/api/auth/request-otp",
            serde_json::json!({"email": "nobody@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[tokio::test]
async fn logout_clears_the_stored_session_token() {
    let app = test_app();
    app.users
        .seed("leaver@example.com", "password1", UserRole::User, true);

    let response = app
        .router
        .clone()
        .oneshot(json_post(
            "/api/auth/login",
            serde_json::json!({"email": "leaver@example.com", "password": "password1"}),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let token = body["token"].as_str().unwrap().to_string();
    let id = body["user"]["id"].as_i64().unwrap();
    assert!(app.users.get(id).unwrap().session_token.is_some());

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.users.get(id).unwrap().session_token.is_none());
}
