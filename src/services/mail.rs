//! Outbound mail content.
//!
//! Plain format strings rather than a template engine; the storefront only
//! sends three transactional mails.

/// Subject and HTML body for the verification mail sent on registration.
pub(crate) fn verification_email(full_name: &str, link: &str) -> (&'static str, String) {
    let body = format!(
        "<h2>Welcome to Furnitown, {name}!</h2>\
         <p>Please confirm your email address to activate your account:</p>\
         <p><a href=\"{link}\">Verify my email</a></p>\
         <p>This link expires in 24 hours. If you did not create an account,\
         you can ignore this message.</p>",
        name = full_name,
        link = link,
    );
    ("Verify your Furnitown account", body)
}

/// Subject and HTML body for the password-reset passcode mail.
pub(crate) fn otp_email(full_name: &str, code: &str) -> (&'static str, String) {
    let body = format!(
        "<h2>Password reset requested</h2>\
         <p>Hi {name}, your one-time passcode is:</p>\
         <p style=\"font-size:24px;letter-spacing:4px\"><strong>{code}</strong></p>\
         <p>The code expires in 5 minutes and allows 3 attempts. If you did\
         not request a reset, you can ignore this message.</p>",
        name = full_name,
        code = code,
    );
    ("Your Furnitown password reset code", body)
}

/// Title and message for the welcome notification created on registration.
pub(crate) fn welcome_notification(coupon_code: &str) -> (String, String) {
    (
        "Welcome to Furnitown".to_string(),
        format!(
            "Thanks for joining! Your welcome coupon {} is waiting in your account.",
            coupon_code
        ),
    )
}
