//! Value types shared by the codec and its callers

pub mod bit_string;

pub use bit_string::BitString;
