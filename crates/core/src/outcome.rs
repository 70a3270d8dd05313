use std::fmt;

/// Uniform result of a domain operation: whether it succeeded and a message
/// that can be shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    success: bool,
    message: String,
}

impl OperationResult {
    pub fn new(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(true, message)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(false, message)
    }

    pub fn default_success() -> Self {
        Self::success("Operation successful")
    }

    pub fn default_failure() -> Self {
        Self::failure("Operation failed")
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_generic_messages() {
        let ok = OperationResult::default_success();
        assert!(ok.is_success());
        assert_eq!(ok.message(), "Operation successful");

        let failed = OperationResult::default_failure();
        assert!(!failed.is_success());
        assert_eq!(failed.to_string(), "Operation failed");
    }
}
