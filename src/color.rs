//! Color helpers shared by the particle field and the globe shells.

use glam::Vec3;

/// How a layer combines with what is already on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Standard alpha blending.
    #[default]
    Alpha,

    /// Colors are added together; overlapping sprites glow brighter.
    Additive,
}

/// Parse a `#rrggbb` or `#rgb` color into RGB components in [0, 1].
///
/// The leading `#` is optional. Returns `None` for anything else.
///
/// ```ignore
/// let slate = parse_hex("#94a3b8").unwrap();
/// ```
pub fn parse_hex(hex: &str) -> Option<Vec3> {
    let digits = hex.trim().trim_start_matches('#');
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);

    match digits.len() {
        6 => Some(Vec3::new(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        3 => {
            // #abc is shorthand for #aabbcc
            let expand = |i: usize| {
                let c = &digits[i..i + 1];
                channel(&format!("{c}{c}"))
            };
            Some(Vec3::new(expand(0)?, expand(1)?, expand(2)?))
        }
        _ => None,
    }
}

/// Convert HSL to RGB.
///
/// `hue` is in degrees and wraps into [0, 360); `saturation` and
/// `lightness` are clamped to [0, 1].
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Vec3 {
    let h = hue.rem_euclid(360.0) / 60.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Vec3::new(r + m, g + m, b + m)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-3
    }

    #[test]
    fn test_parse_hex_long_and_short() {
        assert!(close(parse_hex("#ff0000").unwrap(), Vec3::new(1.0, 0.0, 0.0)));
        assert!(close(parse_hex("0ea5e9").unwrap(), Vec3::new(14.0, 165.0, 233.0) / 255.0));
        assert!(close(parse_hex("#fff").unwrap(), Vec3::ONE));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_none());
        assert!(parse_hex("#gg0000").is_none());
        assert!(parse_hex("").is_none());
        assert!(parse_hex("#ÿÿÿ").is_none());
    }

    #[test]
    fn test_hsl_primaries() {
        assert!(close(hsl_to_rgb(0.0, 1.0, 0.5), Vec3::new(1.0, 0.0, 0.0)));
        assert!(close(hsl_to_rgb(120.0, 1.0, 0.5), Vec3::new(0.0, 1.0, 0.0)));
        assert!(close(hsl_to_rgb(240.0, 1.0, 0.5), Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_hsl_wraps_hue() {
        assert!(close(hsl_to_rgb(360.0 + 120.0, 1.0, 0.5), hsl_to_rgb(120.0, 1.0, 0.5)));
        assert!(close(hsl_to_rgb(-120.0, 1.0, 0.5), hsl_to_rgb(240.0, 1.0, 0.5)));
    }

    #[test]
    fn test_hsl_grey_without_saturation() {
        assert!(close(hsl_to_rgb(200.0, 0.0, 0.25), Vec3::splat(0.25)));
    }
}
