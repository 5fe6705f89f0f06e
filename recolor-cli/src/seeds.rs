//! Seed records read from JSON.
//!
//! Accepted shapes, freely mixed in one array:
//!
//! ```json
//! [
//!   { "x": 120, "y": 40, "color": "#ff8800" },
//!   { "x": 300.5, "y": 210, "color": [20, 40, 200, 255] },
//!   { "x": 12, "y": 99 },
//!   [64, 64]
//! ]
//! ```
//!
//! Records without a color get a random opaque one from the caller's RNG, in
//! record order.

use std::path::Path;

use anyhow::Context;
use rand::Rng;
use recolor_core::{random_color, Color, Point, Seed};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeedRecord {
    Full {
        x: f64,
        y: f64,
        #[serde(default)]
        color: Option<ColorSpec>,
    },
    Pair([f64; 2]),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ColorSpec {
    Channels(Vec<u8>),
    Hex(String),
}

impl ColorSpec {
    fn to_color(&self) -> anyhow::Result<Color> {
        match self {
            ColorSpec::Channels(c) => match c.as_slice() {
                &[r, g, b] => Ok(image::Rgba([r, g, b, 255])),
                &[r, g, b, a] => Ok(image::Rgba([r, g, b, a])),
                _ => anyhow::bail!("color needs 3 or 4 channels, got {}", c.len()),
            },
            ColorSpec::Hex(s) => parse_hex(s),
        }
    }
}

/// Parse `#rrggbb` or `#rrggbbaa`
fn parse_hex(s: &str) -> anyhow::Result<Color> {
    let digits = s.strip_prefix('#').unwrap_or(s);
    if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
        anyhow::bail!("invalid hex color '{}' (expected #rrggbb or #rrggbbaa)", s);
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .with_context(|| format!("invalid hex color '{}'", s))
    };
    let alpha = if digits.len() == 8 { channel(6)? } else { 255 };
    Ok(image::Rgba([channel(0)?, channel(2)?, channel(4)?, alpha]))
}

/// Parse seed records, scaling coordinates by `scale`.
pub fn parse_seeds<R: Rng + ?Sized>(
    json: &str,
    scale: f64,
    rng: &mut R,
) -> anyhow::Result<Vec<Seed>> {
    let records: Vec<SeedRecord> =
        serde_json::from_str(json).context("malformed seed records")?;
    if records.is_empty() {
        anyhow::bail!("seed file contains no records");
    }

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let (x, y, color) = match record {
                SeedRecord::Full { x, y, color } => (*x, *y, color.as_ref()),
                SeedRecord::Pair([x, y]) => (*x, *y, None),
            };
            let color = match color {
                Some(spec) => spec.to_color().with_context(|| format!("seed record {}", i))?,
                None => random_color(rng),
            };
            Ok(Seed::new(Point::new(x, y).scaled(scale), color))
        })
        .collect()
}

/// Read and parse a seed file.
pub fn load_seeds<R: Rng + ?Sized>(
    path: &Path,
    scale: f64,
    rng: &mut R,
) -> anyhow::Result<Vec<Seed>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file: {:?}", path))?;
    parse_seeds(&contents, scale, rng)
        .with_context(|| format!("failed to parse seed file: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(0)
    }

    #[test]
    fn test_mixed_records() {
        let json = r##"[
            {"x": 10, "y": 20, "color": "#ff8800"},
            {"x": 1.5, "y": 2.5, "color": [1, 2, 3]},
            {"x": 0, "y": 0, "color": [1, 2, 3, 4]},
            [7, 8]
        ]"##;
        let seeds = parse_seeds(json, 1.0, &mut rng()).unwrap();

        assert_eq!(seeds.len(), 4);
        assert_eq!(seeds[0].pos, Point::new(10.0, 20.0));
        assert_eq!(seeds[0].color, image::Rgba([255, 136, 0, 255]));
        assert_eq!(seeds[1].color, image::Rgba([1, 2, 3, 255]));
        assert_eq!(seeds[2].color, image::Rgba([1, 2, 3, 4]));
        assert_eq!(seeds[3].pos, Point::new(7.0, 8.0));
        assert_eq!(seeds[3].color[3], 255);
    }

    #[test]
    fn test_scale_applies_before_seeds() {
        let seeds = parse_seeds(r#"[{"x": 3, "y": 4}]"#, 2.5, &mut rng()).unwrap();
        assert_eq!(seeds[0].pos, Point::new(7.5, 10.0));
    }

    #[test]
    fn test_random_colors_follow_rng_seed() {
        let json = r#"[[1, 1], [2, 2], [3, 3]]"#;
        let a = parse_seeds(json, 1.0, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        let b = parse_seeds(json, 1.0, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_and_malformed() {
        assert!(parse_seeds("[]", 1.0, &mut rng()).is_err());
        assert!(parse_seeds("{}", 1.0, &mut rng()).is_err());
        assert!(parse_seeds(r#"[{"x": 1}]"#, 1.0, &mut rng()).is_err());
        let two_channels = r#"[{"x": 1, "y": 1, "color": [1, 2]}]"#;
        assert!(parse_seeds(two_channels, 1.0, &mut rng()).is_err());
        let short_hex = r##"[{"x": 1, "y": 1, "color": "#12345"}]"##;
        assert!(parse_seeds(short_hex, 1.0, &mut rng()).is_err());
    }

    #[test]
    fn test_hex_string_with_hash_inside_record() {
        let json = r##"[
            {"x": 1, "y": 1, "color": "#0a0b0c"},
            {"x": 2, "y": 2, "color": "#12345"}
        ]"##;
        let err = parse_seeds(json, 1.0, &mut rng()).unwrap_err();
        assert!(format!("{:#}", err).contains("seed record 1"));

        let json = r##"[{"x": 1, "y": 1, "color": "#0a0b0c"}]"##;
        let ok = parse_seeds(json, 1.0, &mut rng()).unwrap();
        assert_eq!(ok[0].color, image::Rgba([10, 11, 12, 255]));
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#00ff7f").unwrap(), image::Rgba([0, 255, 127, 255]));
        assert_eq!(parse_hex("0a0b0c80").unwrap(), image::Rgba([10, 11, 12, 128]));
        assert!(parse_hex("#gg0000").is_err());
    }
}
