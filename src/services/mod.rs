//! Business logic layer.

pub mod auth_service;
mod mail;
pub mod otp_service;
pub mod token_service;

pub use auth_service::{
    AuthService, LoginResponse, RegisterPayload, RegisterResponse, SessionUser,
    VerifyEmailOutcome,
};
pub use otp_service::{OtpService, VerifyOtpResponse};
pub use token_service::{Claims, Purpose, TokenError, TokenService};
