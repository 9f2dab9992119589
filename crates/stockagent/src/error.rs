//! Error types for stock analysis operations

use thiserror::Error;

/// Stock analysis specific errors
#[derive(Debug, Error)]
pub enum StockError {
    /// API request failed
    #[error("API error: {0}")]
    ApiError(String),

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Provider does not know the ticker
    #[error("Ticker '{0}' not found. Please check the symbol and try again.")]
    TickerNotFound(String),

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {provider}. Please wait a moment and try again.")]
    RateLimitExceeded { provider: String },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for stock operations
pub type Result<T> = std::result::Result<T, StockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StockError::InvalidSymbol("".to_string());
        assert_eq!(err.to_string(), "Invalid symbol: ");

        let err = StockError::TickerNotFound("ZZZZ".to_string());
        assert_eq!(
            err.to_string(),
            "Ticker 'ZZZZ' not found. Please check the symbol and try again."
        );

        let err = StockError::ConfigError("history_days must be between 1 and 11000".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: history_days must be between 1 and 11000"
        );
    }

    #[test]
    fn test_rate_limit_names_provider() {
        let err = StockError::RateLimitExceeded {
            provider: "Polygon".to_string(),
        };
        assert!(err.to_string().contains("Polygon"));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StockError = parse_err.into();
        assert!(matches!(err, StockError::JsonError(_)));
    }
}
