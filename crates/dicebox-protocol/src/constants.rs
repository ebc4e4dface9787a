//! Names and numbers every Dicebox service has to agree on.

use std::time::Duration;

/// Header carrying the session token, both on the login response and on
/// every authenticated request.
pub const SESSION_ID_HEADER: &str = "Session-Id";

/// `POST`: exchange Basic credentials for a session token.
pub const LOGIN_PATH: &str = "/auth/login";

/// `DELETE`: end the session named by the `Session-Id` header.
pub const LOGOUT_PATH: &str = "/auth/logout";

/// `POST`: internal-only check used by the other services.
pub const VALIDATION_PATH: &str = "/auth/validation-internal";

/// Plain-text body returned by logout and validation on success.
pub const SUCCESS_BODY: &str = "success";

// Default listen ports of the six services.
pub const AUTH_SERVICE_PORT: u16 = 40001;
pub const DATA_SERVICE_PORT: u16 = 40002;
pub const CONFIG_SERVICE_PORT: u16 = 40003;
pub const PROFILE_SERVICE_PORT: u16 = 40004;
pub const STATS_SERVICE_PORT: u16 = 40005;
pub const GAMEPLAY_SERVICE_PORT: u16 = 40006;

/// Upper bound a caller waits for any service-to-service request.
pub const INTERNAL_REQUEST_DEADLINE: Duration = Duration::from_secs(2);
