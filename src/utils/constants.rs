//! Shared constants and invariants

/// Upper bound for a decoded `expires_in`. Values above it are clamped so
/// `now + expires_in` cannot overflow downstream. Kept at the 32-bit bound for
/// compatibility with tokens already persisted by consumers.
pub const MAX_EXPIRES_IN_SECONDS: i64 = i32::MAX as i64;

/// A token is treated as expired this many seconds before its real expiry.
pub const EXPIRY_DELTA_SECONDS: i64 = 10;

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;

// Response content types decoded as form pairs instead of JSON
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

// OAuth2 error codes that mean the credentials were placed wrongly
pub const STYLE_REJECTION_CODES: [&str; 3] = ["invalid_client", "unauthorized_client", "invalid_request"];
