use std::fmt;

/// Error codes for interpreter diagnostics.
///
/// Format: E#### / W#### where the first digit indicates the phase:
/// - E6xxx: Call dispatch and evaluation errors
/// - W6xxx: Call dispatch warnings
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Call dispatch errors (E6xxx)
    /// Callee is not a function
    E6001,
    /// Unused argument (more arguments than free parameters)
    E6002,
    /// Argument name matches no parameter
    E6003,
    /// Two arguments bind the same parameter
    E6004,
    /// Variadic (`...`) collection is not supported
    E6005,
    /// Parameter read while missing, with no default
    E6006,
    /// Undefined variable
    E6007,
    /// Maximum call depth exceeded
    E6008,

    // Call dispatch warnings (W6xxx)
    /// Arguments would need collecting into `...`
    W6001,
}

impl ErrorCode {
    /// Get the code as a string (e.g., "E6002").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E6001 => "E6001",
            ErrorCode::E6002 => "E6002",
            ErrorCode::E6003 => "E6003",
            ErrorCode::E6004 => "E6004",
            ErrorCode::E6005 => "E6005",
            ErrorCode::E6006 => "E6006",
            ErrorCode::E6007 => "E6007",
            ErrorCode::E6008 => "E6008",
            ErrorCode::W6001 => "W6001",
        }
    }

    /// Check if this is a warning code (Wxxx range).
    pub fn is_warning(&self) -> bool {
        self.as_str().starts_with('W')
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
