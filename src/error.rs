/*
 * Error types shared by every module of the crate. The enum keeps the
 * distinctions that matter to callers: initialization failures make the whole
 * subsystem unusable, operation failures abort one command, invalid handles
 * point at bookkeeping that went stale, and contract violations flag bugs in
 * the caller's own layout bookkeeping rather than runtime conditions.
 */

use std::fmt;

pub type Result<T> = std::result::Result<T, PlatformError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Window class registration or initial-parent creation failed. The
    /// container subsystem must be considered unusable.
    InitializationFailed(String),
    /// A platform call failed while executing a single operation.
    OperationFailed(String),
    /// A native handle was missing or no longer valid.
    InvalidHandle(String),
    /// The caller broke an API contract (e.g. destroying a container that
    /// still has a parent). Indicates a bug upstream, not a runtime condition.
    ContractViolation(String),
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::InitializationFailed(msg) => {
                write!(f, "initialization failed: {msg}")
            }
            PlatformError::OperationFailed(msg) => write!(f, "operation failed: {msg}"),
            PlatformError::InvalidHandle(msg) => write!(f, "invalid handle: {msg}"),
            PlatformError::ContractViolation(msg) => write!(f, "contract violation: {msg}"),
        }
    }
}

impl std::error::Error for PlatformError {}

#[cfg(target_os = "windows")]
impl From<windows::core::Error> for PlatformError {
    fn from(err: windows::core::Error) -> Self {
        PlatformError::OperationFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_variant_context() {
        let err = PlatformError::ContractViolation("destroy while parented".to_string());
        let message = err.to_string();
        assert!(message.contains("contract violation"));
        assert!(message.contains("destroy while parented"));
    }
}
