use std::fmt;

#[derive(Debug)]
pub enum ReportError {
    MissingFont(String),
    InvalidFont(String),
    InvalidDocument(String),
    IntegrityViolation {
        entity: &'static str,
        index: usize,
        expected: String,
        found: String,
    },
    InvalidConfiguration(String),
    InvalidState(String),
    Io(std::io::Error),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::MissingFont(path) => write!(f, "required font not found: {}", path),
            ReportError::InvalidFont(message) => write!(f, "invalid font data: {}", message),
            ReportError::InvalidDocument(message) => write!(f, "invalid report: {}", message),
            ReportError::IntegrityViolation {
                entity,
                index,
                expected,
                found,
            } => write!(
                f,
                "{} #{} belongs to report {} but report {} is being rendered",
                entity,
                index + 1,
                found,
                expected
            ),
            ReportError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            ReportError::InvalidState(message) => write!(f, "invalid assembler state: {}", message),
            ReportError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReportError {
    fn from(value: std::io::Error) -> Self {
        ReportError::Io(value)
    }
}
