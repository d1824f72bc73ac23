use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Insertion error: {0}")]
    Insertion(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Index info error: {0}")]
    IndexInfo(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConnectorError {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn insertion(msg: impl Into<String>) -> Self {
        Self::Insertion(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    pub fn index_info(msg: impl Into<String>) -> Self {
        Self::IndexInfo(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Write failures are reported as transient; the caller may retry the
    /// whole `store` or delete call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Insertion(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    pub fn is_insertion(&self) -> bool {
        matches!(self, Self::Insertion(_))
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    pub fn is_index_info(&self) -> bool {
        matches!(self, Self::IndexInfo(_))
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
