//! Wire-level and environment constants for the annotation client.
//!
//! # Categories
//!
//! - **Wire**: framing bytes shared by every record kind
//! - **Limits**: largest values the length fields can carry
//! - **Environment**: paths and variable names read by [`crate::Config`]

// ============================================================================
// Wire
// ============================================================================

/// Byte that opens every annotation record.
pub const ESCAPE_CODE: u8 = 0x1c;

/// Byte that opens a colour sub-record inside text and marker records.
///
/// Followed by exactly three bytes: red, green, blue.
pub const COLOR_CODE: u8 = 0x1b;

/// Size a colour sub-record adds to a record's declared length.
pub const COLOR_RECORD_LEN: usize = 4;

// ============================================================================
// Limits
// ============================================================================

/// Largest payload a `u16` length field can describe.
pub const MAX_SHORT_FIELD_LEN: usize = u16::MAX as usize;

/// Largest image a visual annotation's `u32` length field can describe.
pub const MAX_IMAGE_LEN: usize = u32::MAX as usize;

// ============================================================================
// Environment
// ============================================================================

/// Device file exposed by the collector's kernel driver.
pub const DEFAULT_SINK_PATH: &str = "/dev/gator/annotate";

/// Overrides the sink path.
pub const ENV_SINK_PATH: &str = "STREAMLINE_ANNOTATE_PATH";

/// When set to `1`, `true` or `yes`, annotations are disabled without
/// touching the filesystem.
pub const ENV_DISABLE: &str = "STREAMLINE_ANNOTATE_DISABLE";
