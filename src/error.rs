use std::fmt;

use anyhow::anyhow;

pub type Result<T> = std::result::Result<T, LibError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request is well-formed but not allowed against the current tree.
    InvalidOperation,
    NotFound,
    /// The tree (usually a loaded snapshot) breaks a structural invariant.
    InvariantViolation,
    InvalidInput,
    Serialization,
    Unknown,
}

#[derive(Debug)]
pub struct LibError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub public: &'static str,
    pub source: anyhow::Error,
}

impl LibError {
    pub fn invalid_operation(
        code: &'static str,
        public: &'static str,
        source: anyhow::Error,
    ) -> Self {
        Self {
            kind: ErrorKind::InvalidOperation,
            code,
            public,
            source,
        }
    }

    pub fn not_found(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            code: "member_not_found",
            public,
            source,
        }
    }

    pub fn invariant(code: &'static str, public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::InvariantViolation,
            code,
            public,
            source,
        }
    }

    pub fn invalid(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            code: "invalid_input",
            public,
            source,
        }
    }

    pub fn invalid_with_code(
        code: &'static str,
        public: &'static str,
        source: anyhow::Error,
    ) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            code,
            public,
            source,
        }
    }

    pub fn serialization(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Serialization,
            code: "serialization_error",
            public,
            source,
        }
    }

    pub fn unknown(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            code: "unknown_error",
            public,
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

impl fmt::Display for LibError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.public, self.code)
    }
}

impl std::error::Error for LibError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl From<serde_json::Error> for LibError {
    fn from(value: serde_json::Error) -> Self {
        Self::serialization("Tree snapshot could not be encoded or decoded", anyhow!(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_public_message_and_code() {
        let err = LibError::invalid_operation(
            "already_partnered",
            "Member already has a partner",
            anyhow!("member 1 is partnered"),
        );
        assert_eq!(
            err.to_string(),
            "Member already has a partner (already_partnered)"
        );
        assert_eq!(err.kind, ErrorKind::InvalidOperation);
    }

    #[test]
    fn json_errors_map_to_serialization_kind() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").expect_err("bad json");
        let err = LibError::from(json_err);
        assert_eq!(err.kind, ErrorKind::Serialization);
        assert_eq!(err.code, "serialization_error");
    }
}
