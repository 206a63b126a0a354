//! Fire-and-forget annotation emitter.
//!
//! An [`Annotator`] owns the optional sink for its whole lifetime. If the
//! sink cannot be opened at construction the annotator is disabled and
//! every call returns immediately without touching the filesystem again.
//!
//! The plain operations (`annotate`, `marker`, ...) never fail and never
//! log: instrumentation must not disturb the program it instruments. The
//! `try_*` forms run the same path but hand back the [`AnnotateError`].
//!
//! # Example
//!
//! ```rust,no_run
//! use streamline_annotate::{Annotator, Color};
//!
//! let annotator = Annotator::open("/dev/gator/annotate");
//! annotator.name_group(1, Some("workers"));
//! annotator.name_channel(1, 1, Some("decode"));
//! annotator.annotate_channel_color(1, Some(Color::GREEN), Some("frame 42"));
//! annotator.end_channel(1);
//! annotator.marker_str("checkpoint");
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::color::Color;
use crate::config::Config;
use crate::error::AnnotateError;
use crate::frame::Record;
use crate::sink::{AnnotationSink, FileSink};

/// Emits annotation records to the collector.
///
/// `Annotator` is `Send + Sync`; share it behind an `Arc` or a `&'static`.
/// Records from concurrent callers are never interleaved.
pub struct Annotator {
    sink: Option<Mutex<Box<dyn AnnotationSink>>>,
}

impl fmt::Debug for Annotator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Annotator")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl Annotator {
    /// Open the sink at `path`, or build a disabled annotator if that fails.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match FileSink::open(path) {
            Ok(sink) => Self::with_sink(sink),
            Err(e) => {
                log::debug!(
                    "Annotation sink {} unavailable, annotations disabled: {e}",
                    path.display()
                );
                Self::disabled()
            }
        }
    }

    /// Build an annotator from a [`Config`].
    pub fn from_config(config: &Config) -> Self {
        if config.enabled {
            Self::open(&config.sink_path)
        } else {
            log::trace!("Annotations disabled by configuration");
            Self::disabled()
        }
    }

    /// Build an annotator from defaults plus environment overrides.
    pub fn from_env() -> Self {
        Self::from_config(&Config::load())
    }

    /// Emit to an arbitrary sink.
    pub fn with_sink(sink: impl AnnotationSink + 'static) -> Self {
        Self {
            sink: Some(Mutex::new(Box::new(sink))),
        }
    }

    /// An annotator that drops everything.
    #[must_use]
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// Whether a sink was opened.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Encode and emit one record, reporting failures.
    ///
    /// A disabled annotator returns `Ok(())`. The record is fully encoded
    /// before the writer lock is taken, and written, flushed and synced
    /// before it is released.
    pub fn try_send(&self, record: &Record<'_>) -> Result<(), AnnotateError> {
        let Some(sink) = &self.sink else {
            return Ok(());
        };
        let bytes = record.encode()?;

        // Sinks keep no state between records, so a poisoned lock is still usable.
        let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.write_record(&bytes).map_err(AnnotateError::Write)?;
        sink.flush().map_err(AnnotateError::Flush)?;
        sink.sync().map_err(AnnotateError::Sync)
    }

    /// Encode and emit one record, discarding any failure.
    pub fn send(&self, record: &Record<'_>) {
        let _ = self.try_send(record);
    }

    // ------------------------------------------------------------------------
    // Text annotations
    // ------------------------------------------------------------------------

    /// Text annotation on channel 0.
    pub fn annotate(&self, msg: &str) {
        self.annotate_channel_color(0, None, Some(msg));
    }

    /// Text annotation on `channel`.
    pub fn annotate_channel(&self, channel: i32, msg: &str) {
        self.annotate_channel_color(channel, None, Some(msg));
    }

    /// Coloured text annotation on channel 0.
    pub fn annotate_color(&self, color: Color, msg: &str) {
        self.annotate_channel_color(0, Some(color), Some(msg));
    }

    /// Text annotation with every field optional.
    ///
    /// Channels are per thread: channel 1 on two threads is two channels.
    /// With neither colour nor message this ends the annotation on `channel`.
    pub fn annotate_channel_color(&self, channel: i32, color: Option<Color>, msg: Option<&str>) {
        let _ = self.try_annotate_channel_color(channel, color, msg);
    }

    /// [`Annotator::annotate_channel_color`], reporting failures.
    pub fn try_annotate_channel_color(
        &self,
        channel: i32,
        color: Option<Color>,
        msg: Option<&str>,
    ) -> Result<(), AnnotateError> {
        self.try_send(&Record::Annotation {
            channel,
            color,
            text: msg,
        })
    }

    /// End the annotation on channel 0.
    pub fn end(&self) {
        self.end_channel(0);
    }

    /// End the annotation on `channel`.
    ///
    /// Emitting a new annotation on the channel also ends the previous one.
    pub fn end_channel(&self, channel: i32) {
        self.annotate_channel_color(channel, None, None);
    }

    /// Annotate `channel` until the returned guard is dropped.
    ///
    /// The guard is not `Send`, so the end record comes from the thread
    /// that owns the channel.
    #[must_use = "the annotation ends as soon as the region is dropped"]
    pub fn region(&self, channel: i32, color: Option<Color>, msg: &str) -> AnnotationRegion<'_> {
        self.annotate_channel_color(channel, color, Some(msg));
        AnnotationRegion {
            annotator: self,
            channel,
            _thread_bound: PhantomData,
        }
    }

    // ------------------------------------------------------------------------
    // Channel and group names
    // ------------------------------------------------------------------------

    /// Name `channel` and bind it to `group` for the calling thread.
    ///
    /// A channel belongs to one group per thread. Calling again with another
    /// group rebinds it; conflicting bindings are not detected.
    pub fn name_channel(&self, channel: i32, group: i32, name: Option<&str>) {
        let _ = self.try_name_channel(channel, group, name);
    }

    /// [`Annotator::name_channel`], reporting failures.
    pub fn try_name_channel(
        &self,
        channel: i32,
        group: i32,
        name: Option<&str>,
    ) -> Result<(), AnnotateError> {
        self.try_send(&Record::NameChannel { channel, group, name })
    }

    /// Name `group`.
    pub fn name_group(&self, group: i32, name: Option<&str>) {
        let _ = self.try_name_group(group, name);
    }

    /// [`Annotator::name_group`], reporting failures.
    pub fn try_name_group(&self, group: i32, name: Option<&str>) -> Result<(), AnnotateError> {
        self.try_send(&Record::NameGroup { group, name })
    }

    // ------------------------------------------------------------------------
    // Visual annotations
    // ------------------------------------------------------------------------

    /// Image annotation without a label.
    pub fn visual_image(&self, image: &[u8]) {
        self.visual(None, Some(image));
    }

    /// Image annotation with an optional label.
    ///
    /// `image` should be PNG, GIF, TIFF, JPEG or BMP data; it is not checked.
    pub fn visual(&self, label: Option<&str>, image: Option<&[u8]>) {
        let _ = self.try_visual(label, image);
    }

    /// [`Annotator::visual`], reporting failures.
    pub fn try_visual(
        &self,
        label: Option<&str>,
        image: Option<&[u8]>,
    ) -> Result<(), AnnotateError> {
        self.try_send(&Record::Visual { label, image })
    }

    // ------------------------------------------------------------------------
    // Markers
    // ------------------------------------------------------------------------

    /// Bare marker.
    pub fn marker(&self) {
        self.marker_color_str(None, None);
    }

    /// Marker with text.
    pub fn marker_str(&self, msg: &str) {
        self.marker_color_str(None, Some(msg));
    }

    /// Coloured marker.
    pub fn marker_color(&self, color: Color) {
        self.marker_color_str(Some(color), None);
    }

    /// Marker with optional colour and text.
    pub fn marker_color_str(&self, color: Option<Color>, msg: Option<&str>) {
        let _ = self.try_marker_color_str(color, msg);
    }

    /// [`Annotator::marker_color_str`], reporting failures.
    pub fn try_marker_color_str(
        &self,
        color: Option<Color>,
        msg: Option<&str>,
    ) -> Result<(), AnnotateError> {
        self.try_send(&Record::Marker { color, text: msg })
    }
}

/// An open text annotation that ends when dropped.
///
/// Created by [`Annotator::region`].
#[derive(Debug)]
pub struct AnnotationRegion<'a> {
    annotator: &'a Annotator,
    channel: i32,
    // Channels are scoped to a thread.
    _thread_bound: PhantomData<*const ()>,
}

impl AnnotationRegion<'_> {
    /// Channel this region annotates.
    #[must_use]
    pub fn channel(&self) -> i32 {
        self.channel
    }
}

impl Drop for AnnotationRegion<'_> {
    fn drop(&mut self) {
        self.annotator.end_channel(self.channel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EncodeError;
    use crate::sink::MemorySink;
    use std::io;

    /// Sink that fails at a chosen step.
    #[derive(Debug)]
    enum FailAt {
        Write,
        Flush,
        Sync,
    }

    impl AnnotationSink for FailAt {
        fn write_record(&mut self, _record: &[u8]) -> io::Result<()> {
            match self {
                FailAt::Write => Err(io::Error::other("write")),
                _ => Ok(()),
            }
        }

        fn flush(&mut self) -> io::Result<()> {
            match self {
                FailAt::Flush => Err(io::Error::other("flush")),
                _ => Ok(()),
            }
        }

        fn sync(&mut self) -> io::Result<()> {
            match self {
                FailAt::Sync => Err(io::Error::other("sync")),
                _ => Ok(()),
            }
        }
    }

    fn capture() -> (Annotator, MemorySink) {
        let sink = MemorySink::new();
        (Annotator::with_sink(sink.clone()), sink)
    }

    #[test]
    fn test_annotate_defaults_to_channel_zero() {
        let (annotator, sink) = capture();
        annotator.annotate("go");
        assert_eq!(sink.contents(), [0x1c, 0x06, 0, 0, 0, 0, 2, 0, b'g', b'o']);
    }

    #[test]
    fn test_annotate_color_layout() {
        let (annotator, sink) = capture();
        annotator.annotate_color(Color::new(9, 8, 7), "x");
        let bytes = sink.contents();
        assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]), 5);
        assert_eq!(&bytes[8..12], &[0x1b, 9, 8, 7]);
        assert_eq!(&bytes[12..], b"x");
    }

    #[test]
    fn test_end_matches_empty_annotation() {
        let (annotator, sink) = capture();
        annotator.end_channel(4);
        let end = sink.take();
        annotator.annotate_channel_color(4, None, None);
        assert_eq!(end, sink.take());

        annotator.end();
        assert_eq!(sink.contents(), [0x1c, 0x06, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_region_ends_on_drop() {
        let (annotator, sink) = capture();
        {
            let region = annotator.region(3, None, "load");
            assert_eq!(region.channel(), 3);
            sink.take();
        }
        assert_eq!(sink.contents(), [0x1c, 0x06, 3, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_marker_forms() {
        let (annotator, sink) = capture();
        annotator.marker();
        assert_eq!(sink.take(), [0x1c, 0x05, 0, 0]);
        annotator.marker_str("a");
        assert_eq!(sink.take(), [0x1c, 0x05, 1, 0, b'a']);
        annotator.marker_color(Color::BLUE);
        assert_eq!(sink.take(), [0x1c, 0x05, 4, 0, 0x1b, 0, 0, 0xff]);
    }

    #[test]
    fn test_visual_image_without_label() {
        let (annotator, sink) = capture();
        annotator.visual_image(&[1, 2, 3]);
        assert_eq!(sink.contents(), [0x1c, 0x04, 0, 0, 3, 0, 0, 0, 1, 2, 3]);
    }

    #[test]
    fn test_disabled_is_silent() {
        let annotator = Annotator::disabled();
        assert!(!annotator.is_enabled());
        annotator.annotate("dropped");
        annotator.marker();
        assert!(annotator.try_name_group(1, Some("g")).is_ok());
    }

    #[test]
    fn test_from_config_disabled_skips_open() {
        let config = Config {
            sink_path: "/definitely/not/here".into(),
            enabled: false,
        };
        assert!(!Annotator::from_config(&config).is_enabled());
    }

    #[test]
    fn test_failures_reported_by_try_and_swallowed_otherwise() {
        let annotator = Annotator::with_sink(FailAt::Write);
        assert!(matches!(
            annotator.try_marker_color_str(None, Some("m")),
            Err(AnnotateError::Write(_))
        ));
        annotator.marker_str("m");

        let annotator = Annotator::with_sink(FailAt::Flush);
        assert!(matches!(
            annotator.try_name_group(0, None),
            Err(AnnotateError::Flush(_))
        ));

        let annotator = Annotator::with_sink(FailAt::Sync);
        assert!(matches!(
            annotator.try_visual(None, None),
            Err(AnnotateError::Sync(_))
        ));
        annotator.visual(Some("label"), None);
    }

    #[test]
    fn test_oversized_text_writes_nothing() {
        let (annotator, sink) = capture();
        let text = "x".repeat(70_000);
        let err = annotator
            .try_annotate_channel_color(0, None, Some(&text))
            .unwrap_err();
        assert!(matches!(err, AnnotateError::Encode(EncodeError::FieldTooLong { .. })));
        annotator.annotate(&text);
        assert!(sink.contents().is_empty());
    }

    #[test]
    fn test_debug_reports_state() {
        assert_eq!(format!("{:?}", Annotator::disabled()), "Annotator { enabled: false }");
    }

    #[test]
    fn test_annotator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Annotator>();
    }
}
