use std::fmt;
use thiserror::Error;

/// Error codes recorded on a codec handle
///
/// The numeric values are stable and are what [`errmsg`] indexes. The
/// `#[error]` texts double as the code-to-message lookup table used by
/// callers for diagnostics.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OdrErrorCode {
    #[error("No (unknown) error")]
    None = 0,

    #[error("Memory allocation failed")]
    Memory = 1,

    #[error("System error")]
    SysErr = 2,

    #[error("No space in buffer")]
    Space = 3,

    #[error("Required data element missing")]
    Required = 4,

    #[error("Unexpected data element")]
    Unexpected = 5,

    #[error("Other error")]
    Other = 6,

    #[error("Protocol error")]
    Proto = 7,

    #[error("Malformed data")]
    Data = 8,

    #[error("Stack overflow")]
    Stack = 9,

    #[error("Length of constructed type different from sum of members")]
    ConLen = 10,

    #[error("Overflow writing definite length of constructed type")]
    LenOv = 11,
}

impl OdrErrorCode {
    /// All codes in numeric order
    pub const ALL: [OdrErrorCode; 12] = [
        OdrErrorCode::None,
        OdrErrorCode::Memory,
        OdrErrorCode::SysErr,
        OdrErrorCode::Space,
        OdrErrorCode::Required,
        OdrErrorCode::Unexpected,
        OdrErrorCode::Other,
        OdrErrorCode::Proto,
        OdrErrorCode::Data,
        OdrErrorCode::Stack,
        OdrErrorCode::ConLen,
        OdrErrorCode::LenOv,
    ];

    /// Numeric value of the code
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map a numeric value back to a code
    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }
}

/// Message for a numeric error code
///
/// Unknown codes map to the message of [`OdrErrorCode::None`].
pub fn errmsg(code: i32) -> String {
    OdrErrorCode::from_code(code)
        .unwrap_or(OdrErrorCode::None)
        .to_string()
}

/// Error raised by an ODR operation
///
/// Besides the code, an error carries optional additional information
/// (usually the name of the element that was missing or malformed) and the
/// element path that was open when the error was recorded, e.g.
/// `searchRequest/query/attrList`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct OdrError {
    code: OdrErrorCode,
    addinfo: Option<String>,
    element: String,
}

impl OdrError {
    pub fn new(code: OdrErrorCode) -> Self {
        Self {
            code,
            addinfo: None,
            element: String::new(),
        }
    }

    /// Attach additional information to the error
    pub fn with_addinfo(mut self, addinfo: impl Into<String>) -> Self {
        self.addinfo = Some(addinfo.into());
        self
    }

    /// Attach the element path that was being processed
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = element.into();
        self
    }

    pub fn code(&self) -> OdrErrorCode {
        self.code
    }

    pub fn addinfo(&self) -> Option<&str> {
        self.addinfo.as_deref()
    }

    pub fn element(&self) -> &str {
        &self.element
    }
}

impl fmt::Display for OdrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if let Some(addinfo) = &self.addinfo {
            write!(f, ": {}", addinfo)?;
        }
        if !self.element.is_empty() {
            write!(f, " (element {})", self.element)?;
        }
        Ok(())
    }
}

impl From<OdrErrorCode> for OdrError {
    fn from(code: OdrErrorCode) -> Self {
        OdrError::new(code)
    }
}

/// Result type alias for ODR operations
pub type OdrResult<T> = Result<T, OdrError>;
