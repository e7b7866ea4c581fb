//! Shared geometric and color primitives used by the handlers and the host contract.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Offset of `self` measured from `origin`.
    pub fn delta_from(self, origin: Point) -> (f64, f64) {
        (self.x - origin.x, self.y - origin.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width over height, or `None` when either side is degenerate.
    pub fn aspect_ratio(self) -> Option<f64> {
        if self.width > 0.0 && self.height > 0.0 {
            Some(self.width / self.height)
        } else {
            None
        }
    }

    pub fn floor(self) -> Self {
        Self::new(self.width.floor(), self.height.floor())
    }
}

/// Absolute positioning of an overlay element inside its wrapper. `None` leaves
/// the property unset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxStyle {
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl BoxStyle {
    pub const fn insets(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left: Some(left),
            top: Some(top),
            right: Some(right),
            bottom: Some(bottom),
            width: None,
            height: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rgb` or `#rrggbb`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            3 => {
                let channel = |index: usize| {
                    u8::from_str_radix(&hex[index..=index], 16)
                        .ok()
                        .map(|value| value * 17)
                };
                Some(Self::new(channel(0)?, channel(1)?, channel(2)?))
            }
            6 => {
                let channel = |index: usize| u8::from_str_radix(&hex[index..index + 2], 16).ok();
                Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Reads the angle of a `rotate(<n>deg)` transform. Other transforms and an
/// empty string read as no rotation.
pub fn parse_rotation(transform: &str) -> Option<f64> {
    let inner = transform
        .trim()
        .strip_prefix("rotate(")?
        .strip_suffix(')')?
        .trim();
    if let Some(deg) = inner.strip_suffix("deg") {
        return deg.trim().parse::<f64>().ok().filter(|deg| deg.is_finite());
    }
    if let Some(rad) = inner.strip_suffix("rad") {
        return rad
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|rad| rad.is_finite())
            .map(f64::to_degrees);
    }
    None
}

pub fn rotation_transform(degrees: f64) -> String {
    format!("rotate({degrees}deg)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ratio_is_none_for_degenerate_sizes() {
        assert_eq!(Size::new(200.0, 100.0).aspect_ratio(), Some(2.0));
        assert_eq!(Size::new(0.0, 100.0).aspect_ratio(), None);
        assert_eq!(Size::new(100.0, 0.0).aspect_ratio(), None);
    }

    #[test]
    fn color_parses_short_and_long_hex() {
        assert_eq!(Color::from_hex("#DB626C"), Some(Color::new(0xDB, 0x62, 0x6C)));
        assert_eq!(Color::from_hex("#fff"), Some(Color::new(255, 255, 255)));
        assert_eq!(Color::from_hex("DB626C"), None);
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
        assert_eq!(Color::new(0xDB, 0x62, 0x6C).to_hex(), "#DB626C");
    }

    #[test]
    fn rotation_reads_degrees_and_radians() {
        assert_eq!(parse_rotation("rotate(45deg)"), Some(45.0));
        assert_eq!(parse_rotation(" rotate( -12.5deg ) "), Some(-12.5));
        let rad = parse_rotation("rotate(3.141592653589793rad)").expect("radians parse");
        assert!((rad - 180.0).abs() < 1e-9);
        assert_eq!(parse_rotation(""), None);
        assert_eq!(parse_rotation("scale(2)"), None);
    }

    #[test]
    fn rotation_transform_round_trips_through_parser() {
        let transform = rotation_transform(37.5);
        assert_eq!(transform, "rotate(37.5deg)");
        assert_eq!(parse_rotation(&transform), Some(37.5));
    }
}
