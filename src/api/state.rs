//! Application state - Dependency injection container.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::repositories::{
    AttributeRepository, AttributeStore, BannerRepository, BannerStore, CategoryRepository,
    CategoryStore, ColorRepository, ColorStore, CouponStore, NotificationStore, OtpStore,
    RoomRepository, RoomStore, UserRepository, UserStore,
};
use crate::infra::{Database, SmtpMailer};
use crate::services::{AuthService, OtpService, TokenService};

/// Application state containing all services and repositories.
///
/// Fields are public so tests can assemble a state from fakes; production
/// code goes through [`AppState::from_config`].
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tokens: Arc<TokenService>,
    pub auth_service: Arc<AuthService>,
    pub otp_service: Arc<OtpService>,
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub rooms: Arc<dyn RoomRepository>,
    pub banners: Arc<dyn BannerRepository>,
    pub colors: Arc<dyn ColorRepository>,
    pub attributes: Arc<dyn AttributeRepository>,
    pub database: Arc<Database>,
}

impl AppState {
    /// Wire the full production object graph from a database connection
    /// and the loaded configuration.
    pub fn from_config(database: Arc<Database>, config: Config) -> crate::errors::AppResult<Self> {
        let conn = database.get_connection();

        let tokens = Arc::new(TokenService::new(&config));
        let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);
        let users: Arc<dyn UserRepository> = Arc::new(UserStore::new(conn.clone()));
        let otps = Arc::new(OtpStore::new(conn.clone()));
        let coupons = Arc::new(CouponStore::new(conn.clone()));
        let notifications = Arc::new(NotificationStore::new(conn.clone()));

        let auth_service = Arc::new(AuthService::new(
            users.clone(),
            coupons,
            notifications,
            mailer.clone(),
            tokens.clone(),
            config.backend_url.clone(),
        ));
        let otp_service = Arc::new(OtpService::new(
            users.clone(),
            otps,
            mailer,
            tokens.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            tokens,
            auth_service,
            otp_service,
            users,
            categories: Arc::new(CategoryStore::new(conn.clone())),
            rooms: Arc::new(RoomStore::new(conn.clone())),
            banners: Arc::new(BannerStore::new(conn.clone())),
            colors: Arc::new(ColorStore::new(conn.clone())),
            attributes: Arc::new(AttributeStore::new(conn)),
            database,
        })
    }
}
