use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoyaltyError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("No aggregatable revenue columns found in report")]
    NoAggregatableColumns,

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Unexpected failure: {0}")]
    UnexpectedFailure(String),
}

impl RoyaltyError {
    /// Stable machine-readable category name.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingColumn(_) => "missing_column",
            Self::NoAggregatableColumns => "no_aggregatable_columns",
            Self::MalformedInput(_) => "malformed_input",
            Self::UnexpectedFailure(_) => "unexpected_failure",
        }
    }

    /// HTTP-equivalent status for the envelope response.
    pub fn status(&self) -> u16 {
        match self {
            Self::UnexpectedFailure(_) => 500,
            _ => 400,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UnexpectedFailure(_))
    }

    /// Message safe to return to a caller. Internal failure details stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            Self::UnexpectedFailure(_) => "Internal error while processing the report".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<csv::Error> for RoyaltyError {
    fn from(e: csv::Error) -> Self {
        if e.is_io_error() {
            return Self::UnexpectedFailure(e.to_string());
        }
        match e.kind() {
            csv::ErrorKind::UnequalLengths { pos, expected_len, len } => {
                let line = pos.as_ref().map(|p| p.line()).unwrap_or(0);
                Self::MalformedInput(format!(
                    "line {line} has {len} fields, expected {expected_len}"
                ))
            }
            _ => Self::MalformedInput(e.to_string()),
        }
    }
}

impl From<std::io::Error> for RoyaltyError {
    fn from(e: std::io::Error) -> Self {
        Self::UnexpectedFailure(e.to_string())
    }
}

impl From<serde_json::Error> for RoyaltyError {
    fn from(e: serde_json::Error) -> Self {
        Self::UnexpectedFailure(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RoyaltyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_not_retryable() {
        let errs = [
            RoyaltyError::MissingColumn("Asset ID".into()),
            RoyaltyError::NoAggregatableColumns,
            RoyaltyError::MalformedInput("bad".into()),
        ];
        for e in &errs {
            assert_eq!(e.status(), 400);
            assert!(!e.is_retryable());
            assert_eq!(e.public_message(), e.to_string());
        }
    }

    #[test]
    fn test_unexpected_failure_hides_details() {
        let e = RoyaltyError::UnexpectedFailure("disk on fire at /srv/x".into());
        assert_eq!(e.status(), 500);
        assert!(e.is_retryable());
        assert_eq!(e.code(), "unexpected_failure");
        assert!(!e.public_message().contains("/srv/x"));
    }

    #[test]
    fn test_ragged_csv_maps_to_malformed_input() {
        let data = "a,b\n1,2\n3\n";
        let mut rdr = csv::ReaderBuilder::new().from_reader(data.as_bytes());
        let err = rdr.records().find_map(|r| r.err()).unwrap();
        let e: RoyaltyError = err.into();
        assert_eq!(e.code(), "malformed_input");
        assert!(e.to_string().contains("expected 2"));
    }
}
