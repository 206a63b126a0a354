//! Streamline annotation client.
//!
//! Emits text, marker, image and channel/group naming annotations to the
//! Streamline collector as a compact binary stream written to the
//! collector's device file (`/dev/gator/annotate` by default).
//!
//! Annotation is best-effort: if the device is absent the [`Annotator`] is
//! disabled and every call is a silent no-op.
//!
//! # Modules
//!
//! - [`annotator`] - Sink ownership and the public annotation operations
//! - [`frame`] - Record types and the wire encoder
//! - [`sink`] - File and in-memory sinks
//! - [`color`] - Colours and predefined constants
//! - [`config`] - Sink path and enable flag

pub mod annotator;
pub mod color;
pub mod config;
pub mod constants;
pub mod error;
pub mod frame;
pub mod sink;

// Re-export commonly used types
pub use annotator::{AnnotationRegion, Annotator};
pub use color::Color;
pub use config::Config;
pub use error::{AnnotateError, ColorParseError, EncodeError};
pub use frame::{record_type, Record};
pub use sink::{AnnotationSink, FileSink, MemorySink};
