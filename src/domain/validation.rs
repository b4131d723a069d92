use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty { field: &'static str },
    InvalidEndpoint { input: String, reason: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::InvalidEndpoint { input, reason } => {
                write!(f, "invalid endpoint url {input:?}: {reason}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
