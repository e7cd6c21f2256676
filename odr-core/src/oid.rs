use crate::error::{OdrError, OdrErrorCode, OdrResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static DOTTED_OID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)+$").expect("static OID pattern"));

/// OBJECT IDENTIFIER value
///
/// Object identifiers name registered objects such as record syntaxes,
/// attribute sets and EXTERNAL payload types, e.g. `1.2.840.10003.5.10`
/// (USMARC).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Oid(Vec<u32>);

impl Oid {
    /// Create an OID from its arcs
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than two arcs, the first arc is
    /// greater than 2, or the second arc is 40 or more under arcs 0 and 1.
    pub fn new(arcs: Vec<u32>) -> OdrResult<Self> {
        if arcs.len() < 2 {
            return Err(invalid("an object identifier needs at least 2 arcs"));
        }
        if arcs[0] > 2 {
            return Err(invalid(format!("first arc {} is not 0, 1 or 2", arcs[0])));
        }
        if arcs[0] < 2 && arcs[1] >= 40 {
            return Err(invalid(format!("second arc {} must be below 40", arcs[1])));
        }
        Ok(Self(arcs))
    }

    /// Parse an OID from dotted-decimal notation such as "1.2.840.10003"
    pub fn from_string(s: &str) -> OdrResult<Self> {
        if !DOTTED_OID.is_match(s) {
            return Err(invalid(format!("invalid object identifier: {}", s)));
        }
        let arcs = s
            .split('.')
            .map(|arc| {
                arc.parse::<u32>()
                    .map_err(|_| invalid(format!("arc {} out of range", arc)))
            })
            .collect::<OdrResult<Vec<u32>>>()?;
        Self::new(arcs)
    }

    /// Arcs of the OID
    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    /// Whether `self` starts with all arcs of `prefix`
    pub fn starts_with(&self, prefix: &[u32]) -> bool {
        self.0.starts_with(prefix)
    }
}

fn invalid(msg: impl Into<String>) -> OdrError {
    OdrError::new(OdrErrorCode::Data).with_addinfo(msg)
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arc) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = OdrError;

    fn from_str(s: &str) -> OdrResult<Self> {
        Self::from_string(s)
    }
}
