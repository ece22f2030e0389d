use super::{AppError, ValidationError};

impl From<&'static str> for ValidationError {
    fn from(message: &'static str) -> Self {
        ValidationError::TestExpectation { message }
    }
}

impl From<String> for ValidationError {
    fn from(value: String) -> Self {
        ValidationError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        }
    }
}

impl From<&'static str> for AppError {
    fn from(message: &'static str) -> Self {
        AppError::Validation(ValidationError::from(message))
    }
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        AppError::Validation(ValidationError::from(value))
    }
}
