//! Wire encoder for annotation records.
//!
//! Every record opens with an escape byte and a type byte. All integers
//! are little-endian:
//!
//! ```text
//! 0x06 string     [1c][06][i32 channel][u16 len][color?][text]
//! 0x07 name chan  [1c][07][i32 channel][i32 group][u16 len][name]
//! 0x08 name group [1c][08][i32 group][u16 len][name]
//! 0x04 visual     [1c][04][u16 len][label][u32 len][image]
//! 0x05 marker     [1c][05][u16 len][color?][text]
//! ```
//!
//! `color?` is the optional four byte sub-record `[1b][r][g][b]`. When it is
//! present the preceding `u16 len` counts it, so `len = text bytes + 4`.
//!
//! The stream has no resynchronisation marker, so a record is always
//! encoded completely in memory before anything is written.

use crate::color::Color;
use crate::constants::{COLOR_RECORD_LEN, ESCAPE_CODE, MAX_IMAGE_LEN, MAX_SHORT_FIELD_LEN};
use crate::error::EncodeError;

/// Record type constants.
pub mod record_type {
    /// Image with an optional text label.
    pub const VISUAL: u8 = 0x04;
    /// Instantaneous, channel-less marker.
    pub const MARKER: u8 = 0x05;
    /// Text annotation on a channel.
    pub const STRING: u8 = 0x06;
    /// Channel name and group binding.
    pub const NAME_CHANNEL: u8 = 0x07;
    /// Group name.
    pub const NAME_GROUP: u8 = 0x08;
}

/// One annotation, borrowed from the caller for the duration of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record<'a> {
    /// Text annotation. `text: None, color: None` ends the open annotation
    /// on `channel`.
    Annotation {
        /// Per-thread channel number.
        channel: i32,
        /// Optional display colour.
        color: Option<Color>,
        /// Annotation text.
        text: Option<&'a str>,
    },

    /// Bind a channel to a group and give it a display name.
    NameChannel {
        /// Per-thread channel number.
        channel: i32,
        /// Group the channel belongs to.
        group: i32,
        /// Display name.
        name: Option<&'a str>,
    },

    /// Give a group a display name.
    NameGroup {
        /// Group number.
        group: i32,
        /// Display name.
        name: Option<&'a str>,
    },

    /// Image annotation. The image bytes are not inspected.
    Visual {
        /// Optional text label.
        label: Option<&'a str>,
        /// Encoded image (PNG, GIF, TIFF, JPEG, BMP).
        image: Option<&'a [u8]>,
    },

    /// Point-in-time marker, global to the stream.
    Marker {
        /// Optional display colour.
        color: Option<Color>,
        /// Marker text.
        text: Option<&'a str>,
    },
}

impl Record<'_> {
    /// The record's type byte.
    #[must_use]
    pub fn record_type(&self) -> u8 {
        match self {
            Record::Annotation { .. } => record_type::STRING,
            Record::NameChannel { .. } => record_type::NAME_CHANNEL,
            Record::NameGroup { .. } => record_type::NAME_GROUP,
            Record::Visual { .. } => record_type::VISUAL,
            Record::Marker { .. } => record_type::MARKER,
        }
    }

    /// Encode this record into a wire-format byte vector.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::FieldTooLong`] if a payload does not fit its
    /// length prefix. Nothing is produced in that case.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Append this record to `buf`.
    ///
    /// On error `buf` is left as it was.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
        match *self {
            Record::Annotation { channel, color, text } => {
                let len = text_len("text", color, text)?;
                buf.reserve(8 + usize::from(len));
                buf.extend_from_slice(&[ESCAPE_CODE, record_type::STRING]);
                buf.extend_from_slice(&channel.to_le_bytes());
                buf.extend_from_slice(&len.to_le_bytes());
                put_colored_text(buf, color, text);
            }
            Record::NameChannel { channel, group, name } => {
                let len = short_len("name", opt_len(name))?;
                buf.reserve(12 + usize::from(len));
                buf.extend_from_slice(&[ESCAPE_CODE, record_type::NAME_CHANNEL]);
                buf.extend_from_slice(&channel.to_le_bytes());
                buf.extend_from_slice(&group.to_le_bytes());
                buf.extend_from_slice(&len.to_le_bytes());
                put_str(buf, name);
            }
            Record::NameGroup { group, name } => {
                let len = short_len("name", opt_len(name))?;
                buf.reserve(8 + usize::from(len));
                buf.extend_from_slice(&[ESCAPE_CODE, record_type::NAME_GROUP]);
                buf.extend_from_slice(&group.to_le_bytes());
                buf.extend_from_slice(&len.to_le_bytes());
                put_str(buf, name);
            }
            Record::Visual { label, image } => {
                let label_len = short_len("label", opt_len(label))?;
                let image = image.unwrap_or_default();
                let image_len = u32::try_from(image.len())
                    .ok()
                    .ok_or(EncodeError::FieldTooLong {
                        field: "image",
                        len: image.len(),
                        max: MAX_IMAGE_LEN,
                    })?;
                buf.reserve(8 + usize::from(label_len) + image.len());
                buf.extend_from_slice(&[ESCAPE_CODE, record_type::VISUAL]);
                buf.extend_from_slice(&label_len.to_le_bytes());
                put_str(buf, label);
                buf.extend_from_slice(&image_len.to_le_bytes());
                buf.extend_from_slice(image);
            }
            Record::Marker { color, text } => {
                let len = text_len("text", color, text)?;
                buf.reserve(4 + usize::from(len));
                buf.extend_from_slice(&[ESCAPE_CODE, record_type::MARKER]);
                buf.extend_from_slice(&len.to_le_bytes());
                put_colored_text(buf, color, text);
            }
        }
        Ok(())
    }
}

fn opt_len(s: Option<&str>) -> usize {
    s.map_or(0, str::len)
}

/// Narrow a payload length to a `u16` field.
fn short_len(field: &'static str, len: usize) -> Result<u16, EncodeError> {
    u16::try_from(len)
        .ok()
        .ok_or(EncodeError::FieldTooLong {
            field,
            len,
            max: MAX_SHORT_FIELD_LEN,
        })
}

/// Declared length of a text payload plus its optional colour sub-record.
fn text_len(
    field: &'static str,
    color: Option<Color>,
    text: Option<&str>,
) -> Result<u16, EncodeError> {
    let color_len = if color.is_some() { COLOR_RECORD_LEN } else { 0 };
    short_len(field, opt_len(text) + color_len)
}

fn put_str(buf: &mut Vec<u8>, s: Option<&str>) {
    if let Some(s) = s {
        buf.extend_from_slice(s.as_bytes());
    }
}

fn put_colored_text(buf: &mut Vec<u8>, color: Option<Color>, text: Option<&str>) {
    if let Some(color) = color {
        buf.extend_from_slice(&color.to_wire());
    }
    put_str(buf, text);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation<'a>(channel: i32, color: Option<Color>, text: Option<&'a str>) -> Record<'a> {
        Record::Annotation { channel, color, text }
    }

    #[test]
    fn test_annotation_without_color() {
        let bytes = annotation(3, None, Some("hello")).encode().unwrap();
        assert_eq!(
            bytes,
            [&[0x1c, 0x06, 3, 0, 0, 0, 5, 0][..], &b"hello"[..]].concat()
        );
    }

    #[test]
    fn test_annotation_with_color() {
        let bytes = annotation(0, Some(Color::new(1, 2, 3)), Some("hi")).encode().unwrap();
        // Length counts the colour sub-record.
        assert_eq!(&bytes[6..8], &[6, 0]);
        assert_eq!(&bytes[8..12], &[0x1b, 1, 2, 3]);
        assert_eq!(&bytes[12..], b"hi");
    }

    #[test]
    fn test_annotation_color_only() {
        let bytes = annotation(1, Some(Color::RED), None).encode().unwrap();
        assert_eq!(bytes, [0x1c, 0x06, 1, 0, 0, 0, 4, 0, 0x1b, 0xff, 0, 0]);
    }

    #[test]
    fn test_end_record_is_empty_annotation() {
        let bytes = annotation(7, None, None).encode().unwrap();
        assert_eq!(bytes, [0x1c, 0x06, 7, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_negative_channel_is_twos_complement() {
        let bytes = annotation(-1, None, None).encode().unwrap();
        assert_eq!(&bytes[2..6], &[0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn test_length_counts_utf8_bytes() {
        let bytes = annotation(0, None, Some("héllo")).encode().unwrap();
        assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]), 6);
    }

    #[test]
    fn test_name_channel() {
        let record = Record::NameChannel { channel: 5, group: 2, name: Some("cpu") };
        assert_eq!(
            record.encode().unwrap(),
            [0x1c, 0x07, 5, 0, 0, 0, 2, 0, 0, 0, 3, 0, b'c', b'p', b'u']
        );
    }

    #[test]
    fn test_name_channel_without_name() {
        let record = Record::NameChannel { channel: 1, group: 1, name: None };
        assert_eq!(record.encode().unwrap(), [0x1c, 0x07, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_name_group() {
        let record = Record::NameGroup { group: 0x0102, name: Some("io") };
        assert_eq!(
            record.encode().unwrap(),
            [0x1c, 0x08, 0x02, 0x01, 0, 0, 2, 0, b'i', b'o']
        );
    }

    #[test]
    fn test_visual_empty_label() {
        let image = [0xaa; 10];
        let record = Record::Visual { label: Some(""), image: Some(&image) };
        let bytes = record.encode().unwrap();
        assert_eq!(&bytes[..8], &[0x1c, 0x04, 0, 0, 0x0a, 0, 0, 0]);
        assert_eq!(&bytes[8..], &image);
    }

    #[test]
    fn test_visual_with_label_and_no_image() {
        let record = Record::Visual { label: Some("shot"), image: None };
        assert_eq!(
            record.encode().unwrap(),
            [0x1c, 0x04, 4, 0, b's', b'h', b'o', b't', 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_marker_black_tick() {
        let record = Record::Marker { color: Some(Color::BLACK), text: Some("tick") };
        assert_eq!(
            record.encode().unwrap(),
            [0x1c, 0x05, 8, 0, 0x1b, 0, 0, 0, b't', b'i', b'c', b'k']
        );
    }

    #[test]
    fn test_bare_marker() {
        let record = Record::Marker { color: None, text: None };
        assert_eq!(record.encode().unwrap(), [0x1c, 0x05, 0, 0]);
    }

    #[test]
    fn test_text_at_limit_accepted() {
        let text = "x".repeat(MAX_SHORT_FIELD_LEN);
        let bytes = annotation(0, None, Some(&text)).encode().unwrap();
        assert_eq!(&bytes[6..8], &[0xff, 0xff]);
    }

    #[test]
    fn test_color_pushes_text_over_limit() {
        let text = "x".repeat(MAX_SHORT_FIELD_LEN - 3);
        let err = annotation(0, Some(Color::WHITE), Some(&text)).encode().unwrap_err();
        assert_eq!(
            err,
            EncodeError::FieldTooLong {
                field: "text",
                len: MAX_SHORT_FIELD_LEN + 1,
                max: MAX_SHORT_FIELD_LEN,
            }
        );
    }

    #[test]
    fn test_encode_into_leaves_buffer_on_error() {
        let mut buf = vec![1, 2, 3];
        let name = "n".repeat(MAX_SHORT_FIELD_LEN + 1);
        let result = Record::NameGroup { group: 0, name: Some(&name) }.encode_into(&mut buf);
        assert!(result.is_err());
        assert_eq!(buf, [1, 2, 3]);
    }

    #[test]
    fn test_encode_into_appends() {
        let mut buf = Vec::new();
        Record::Marker { color: None, text: None }.encode_into(&mut buf).unwrap();
        Record::Marker { color: None, text: Some("a") }.encode_into(&mut buf).unwrap();
        assert_eq!(buf, [0x1c, 0x05, 0, 0, 0x1c, 0x05, 1, 0, b'a']);
    }

    #[test]
    fn test_record_type() {
        assert_eq!(annotation(0, None, None).record_type(), record_type::STRING);
        assert_eq!(
            Record::Visual { label: None, image: None }.record_type(),
            record_type::VISUAL
        );
    }
}
