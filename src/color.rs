//! Annotation colours.
//!
//! Colours travel on the wire as a four byte sub-record:
//!
//! ```text
//! [0x1b] [red] [green] [blue]
//! ```
//!
//! The C client packs the same four bytes into a little-endian `u32`
//! (`0xBBGGRR1B`), which [`Color::to_packed`] and [`Color::from_packed`]
//! convert to and from.

use std::fmt;
use std::str::FromStr;

use crate::constants::COLOR_CODE;
use crate::error::ColorParseError;

/// An RGB colour attached to text annotations and markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
}

impl Color {
    /// Pure red.
    pub const RED: Color = Color::new(0xff, 0, 0);
    /// Pure blue.
    pub const BLUE: Color = Color::new(0, 0, 0xff);
    /// Pure green.
    pub const GREEN: Color = Color::new(0, 0xff, 0);
    /// Red plus blue.
    pub const PURPLE: Color = Color::new(0xff, 0, 0xff);
    /// Red plus green.
    pub const YELLOW: Color = Color::new(0xff, 0xff, 0);
    /// Green plus blue.
    pub const CYAN: Color = Color::new(0, 0xff, 0xff);
    /// Full intensity gray.
    pub const WHITE: Color = Color::gray(0xff);
    /// Light gray.
    pub const LTGRAY: Color = Color::gray(0xbb);
    /// Dark gray.
    pub const DKGRAY: Color = Color::gray(0x55);
    /// Zero intensity gray.
    pub const BLACK: Color = Color::gray(0);

    /// Named constants, in the order the collector documents them.
    pub const NAMED: [(&'static str, Color); 10] = [
        ("red", Color::RED),
        ("blue", Color::BLUE),
        ("green", Color::GREEN),
        ("purple", Color::PURPLE),
        ("yellow", Color::YELLOW),
        ("cyan", Color::CYAN),
        ("white", Color::WHITE),
        ("ltgray", Color::LTGRAY),
        ("dkgray", Color::DKGRAY),
        ("black", Color::BLACK),
    ];

    /// Create a colour from its three channels.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Create a gray with every channel set to `intensity`.
    #[must_use]
    pub const fn gray(intensity: u8) -> Self {
        Self::new(intensity, intensity, intensity)
    }

    /// Create a colour from wide integers, clamping each channel to `0..=255`.
    #[must_use]
    pub fn clamped(red: i32, green: i32, blue: i32) -> Self {
        let clamp = |v: i32| u8::try_from(v.clamp(0, 255)).unwrap_or(u8::MAX);
        Self::new(clamp(red), clamp(green), clamp(blue))
    }

    /// The colour sub-record as written after a record's length field.
    #[must_use]
    pub const fn to_wire(self) -> [u8; 4] {
        [COLOR_CODE, self.red, self.green, self.blue]
    }

    /// Pack into the C client's `u32` form (`0xBBGGRR1B`).
    #[must_use]
    pub const fn to_packed(self) -> u32 {
        u32::from_le_bytes(self.to_wire())
    }

    /// Unpack the C client's `u32` form. The low (escape) byte is ignored.
    #[must_use]
    pub const fn from_packed(packed: u32) -> Self {
        let [_, red, green, blue] = packed.to_le_bytes();
        Self::new(red, green, blue)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    /// Accepts a constant name (`red`, `LTGRAY`), `#rrggbb`, or `r,g,b`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some((_, color)) = Self::NAMED
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
        {
            return Ok(*color);
        }

        let invalid = |component: &str| ColorParseError::InvalidComponent {
            input: s.to_string(),
            component: component.to_string(),
        };

        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(invalid(hex));
            }
            let channel = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range.clone()], 16)
                    .ok()
                    .ok_or_else(|| invalid(&hex[range]))
            };
            return Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?));
        }

        if s.contains(',') {
            let parts: Vec<&str> = s.split(',').map(str::trim).collect();
            if parts.len() != 3 {
                return Err(invalid(s));
            }
            let channel = |part: &str| part.parse::<u8>().ok().ok_or_else(|| invalid(part));
            return Ok(Self::new(
                channel(parts[0])?,
                channel(parts[1])?,
                channel(parts[2])?,
            ));
        }

        Err(ColorParseError::Unknown(s.to_string()))
    }
}
