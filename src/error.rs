// Gateway Error Types

/// Failure of an authenticated API call, classified by HTTP status.
///
/// The message is what the user sees: the server-supplied `message` when
/// there is one, otherwise a generic fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 422 Unprocessable Entity
    UnprocessableEntity(String),

    // 429 Too Many Requests
    TooManyRequests(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),

    // Any other non-success status
    Http { status: u16, message: String },

    // Transport failure (DNS, refused connection, timeout)
    Network(String),

    // Success status but a body that is not JSON
    InvalidResponse(String),

    // Base URL plus path does not form a URL
    InvalidUrl(String),

    // Request header name or value is not valid HTTP
    InvalidHeader(String),
}

impl GatewayError {
    /// Classify a non-success response
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => GatewayError::BadRequest(message),
            401 => GatewayError::Unauthorized(message),
            403 => GatewayError::Forbidden(message),
            404 => GatewayError::NotFound(message),
            409 => GatewayError::Conflict(message),
            422 => GatewayError::UnprocessableEntity(message),
            429 => GatewayError::TooManyRequests(message),
            500 => GatewayError::InternalServerError(message),
            502 => GatewayError::BadGateway(message),
            503 => GatewayError::ServiceUnavailable(message),
            _ => GatewayError::Http { status, message },
        }
    }

    /// HTTP status, when the server answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GatewayError::BadRequest(_) => Some(400),
            GatewayError::Unauthorized(_) => Some(401),
            GatewayError::Forbidden(_) => Some(403),
            GatewayError::NotFound(_) => Some(404),
            GatewayError::Conflict(_) => Some(409),
            GatewayError::UnprocessableEntity(_) => Some(422),
            GatewayError::TooManyRequests(_) => Some(429),
            GatewayError::InternalServerError(_) => Some(500),
            GatewayError::BadGateway(_) => Some(502),
            GatewayError::ServiceUnavailable(_) => Some(503),
            GatewayError::Http { status, .. } => Some(*status),
            GatewayError::Network(_)
            | GatewayError::InvalidResponse(_)
            | GatewayError::InvalidUrl(_)
            | GatewayError::InvalidHeader(_) => None,
        }
    }

    /// User-facing message
    pub fn message(&self) -> &str {
        match self {
            GatewayError::BadRequest(msg) => msg,
            GatewayError::Unauthorized(msg) => msg,
            GatewayError::Forbidden(msg) => msg,
            GatewayError::NotFound(msg) => msg,
            GatewayError::Conflict(msg) => msg,
            GatewayError::UnprocessableEntity(msg) => msg,
            GatewayError::TooManyRequests(msg) => msg,
            GatewayError::InternalServerError(msg) => msg,
            GatewayError::BadGateway(msg) => msg,
            GatewayError::ServiceUnavailable(msg) => msg,
            GatewayError::Http { message, .. } => message,
            GatewayError::Network(msg) => msg,
            GatewayError::InvalidResponse(msg) => msg,
            GatewayError::InvalidUrl(msg) => msg,
            GatewayError::InvalidHeader(msg) => msg,
        }
    }

    /// Stable code for scripted consumers (CLI `--json` output)
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::BadRequest(_) => "BAD_REQUEST",
            GatewayError::Unauthorized(_) => "UNAUTHORIZED",
            GatewayError::Forbidden(_) => "FORBIDDEN",
            GatewayError::NotFound(_) => "NOT_FOUND",
            GatewayError::Conflict(_) => "CONFLICT",
            GatewayError::UnprocessableEntity(_) => "UNPROCESSABLE_ENTITY",
            GatewayError::TooManyRequests(_) => "TOO_MANY_REQUESTS",
            GatewayError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            GatewayError::BadGateway(_) => "BAD_GATEWAY",
            GatewayError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            GatewayError::Http { .. } => "HTTP_ERROR",
            GatewayError::Network(_) => "NETWORK_ERROR",
            GatewayError::InvalidResponse(_) => "INVALID_RESPONSE",
            GatewayError::InvalidUrl(_) => "INVALID_URL",
            GatewayError::InvalidHeader(_) => "INVALID_HEADER",
        }
    }

    /// 401 or 403: the session no longer entitles the caller to this call
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, GatewayError::Unauthorized(_) | GatewayError::Forbidden(_))
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Network(err.to_string())
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        GatewayError::InvalidUrl(err.to_string())
    }
}
