use thiserror::Error;

/// Why a form submission could not become a target date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing form field '{0}'")]
    MissingField(&'static str),

    #[error("form field '{field}' is not an integer: {value:?}")]
    NotAnInteger { field: &'static str, value: String },

    #[error("{year:04}-{month:02}-{day:02} is not a calendar date")]
    InvalidDate { year: i64, month: i64, day: i64 },

    #[error("{0:?} is not an ISO-8601 date (YYYY-MM-DD)")]
    MalformedIsoDate(String),

    #[error("request body is not valid UTF-8")]
    NonUtf8Body,
}

/// Clock or display access failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HardwareError {
    #[error("clock unavailable: {0}")]
    Clock(String),

    #[error("display unavailable: {0}")]
    Display(String),
}

/// Boot-time time service failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("time service request failed: {0}")]
    Request(String),

    #[error("time service returned status {0}")]
    Status(u16),

    #[error("malformed time payload: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CountdownError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("transient i/o error: {0}")]
    TransientIo(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Hardware(#[from] HardwareError),
}

/// What the control loop does with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// Boot cannot proceed; retry or abort startup.
    BootFault,
    /// Log and carry on with the next iteration.
    Continue,
    /// Abandon the current operation, keep the process.
    SkipOperation,
    /// Answer the affected request with an error page.
    RejectRequest,
}

impl CountdownError {
    pub fn disposition(&self) -> ErrorDisposition {
        match self {
            Self::Network(_) => ErrorDisposition::BootFault,
            Self::TransientIo(_) => ErrorDisposition::Continue,
            Self::Validation(_) => ErrorDisposition::RejectRequest,
            Self::Hardware(_) => ErrorDisposition::SkipOperation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_error_kind_has_a_disposition() {
        let cases = [
            (
                CountdownError::from(NetworkError::Status(502)),
                ErrorDisposition::BootFault,
            ),
            (
                CountdownError::TransientIo("connection reset".to_string()),
                ErrorDisposition::Continue,
            ),
            (
                CountdownError::from(ValidationError::MissingField("fday")),
                ErrorDisposition::RejectRequest,
            ),
            (
                CountdownError::from(HardwareError::Display("i2c nack".to_string())),
                ErrorDisposition::SkipOperation,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.disposition(), expected, "{err}");
        }
    }

    #[test]
    fn validation_messages_name_the_field() {
        let err = ValidationError::NotAnInteger {
            field: "fmonth",
            value: "april".to_string(),
        };
        assert!(err.to_string().contains("fmonth"));
        assert!(err.to_string().contains("april"));

        let err = ValidationError::InvalidDate {
            year: 2025,
            month: 2,
            day: 30,
        };
        assert_eq!(err.to_string(), "2025-02-30 is not a calendar date");
    }
}
