//! Codec handle configuration

use crate::error::{OdrError, OdrErrorCode, OdrResult};
use serde::{Deserialize, Serialize};

/// Default maximum nesting depth of constructed values
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Default size of a nibble memory block
pub const DEFAULT_MEM_BLOCK_SIZE: usize = 4096;

/// Configuration of a codec handle
///
/// Deserializable so that hosts can carry it in their own configuration
/// files; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OdrConfig {
    /// Maximum number of simultaneously open constructed values
    pub max_depth: usize,
    /// Size of the blocks the arena carves allocations from
    pub mem_block_size: usize,
    /// Upper bound on arena bytes per generation; `None` is unlimited
    pub mem_limit: Option<usize>,
    /// Octets reserved for the length of a constructed value while encoding
    pub length_reserve: usize,
}

impl Default for OdrConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            mem_block_size: DEFAULT_MEM_BLOCK_SIZE,
            mem_limit: None,
            length_reserve: 1,
        }
    }
}

impl OdrConfig {
    /// Check that the configuration is usable
    pub fn validate(&self) -> OdrResult<()> {
        if self.max_depth == 0 {
            return Err(OdrError::new(OdrErrorCode::Other).with_addinfo("max_depth must be positive"));
        }
        if self.mem_block_size == 0 {
            return Err(
                OdrError::new(OdrErrorCode::Other).with_addinfo("mem_block_size must be positive")
            );
        }
        // one octet of length-of-length plus at most eight length octets
        if !(1..=9).contains(&self.length_reserve) {
            return Err(
                OdrError::new(OdrErrorCode::Other).with_addinfo("length_reserve must be 1..=9")
            );
        }
        Ok(())
    }
}
