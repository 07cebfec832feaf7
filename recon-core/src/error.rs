use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl AppError {
    /// Short machine-friendly label, used as a metrics dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::InternalError(_) => "internal",
            AppError::BadGateway(_) => "bad_gateway",
            AppError::ServiceUnavailable(_) => "service_unavailable",
            AppError::ConfigError(_) => "config",
        }
    }

    /// Human-readable message suitable for showing to an operator.
    ///
    /// Upstream failures keep the upstream wording; internal failures are
    /// collapsed to a generic sentence so stack context never leaks into a
    /// notification.
    pub fn display_message(&self) -> String {
        match self {
            AppError::BadRequest(err) | AppError::NotFound(err) | AppError::Conflict(err) => {
                err.to_string()
            }
            AppError::BadGateway(msg) | AppError::ServiceUnavailable(msg) => msg.clone(),
            AppError::InternalError(_) => "An unexpected error occurred".to_string(),
            AppError::ConfigError(err) => format!("Configuration error: {}", err),
        }
    }
}
