//! Latitude/longitude detection in normalized query tokens.
//!
//! Four layouts are recognized, always latitude first:
//!
//! | tokens | layout | sign |
//! |---|---|---|
//! | 8 | `D M S N|S D M S E|W` | from the hemisphere letters |
//! | 6 | `±D M S ±D M S` | longitude forced west |
//! | 4 | `DD.DD N|S DDD.D E|W` | from the hemisphere letters |
//! | 2 | `±DD.DD ±DDD.D` | longitude forced west |
//!
//! Anything else is not a coordinate and the query falls through to text search.
use serde::{Deserialize, Serialize};

/// Decimal places kept on parsed coordinates.
pub const COORDINATE_PRECISION: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// `"lat, lon"` at the fixed parser precision.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

pub(crate) fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10_f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Signed decimal number; rejects exponents, `inf` and `nan`.
fn number(token: &str) -> Option<f64> {
    let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
    if digits.is_empty()
        || !digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        || !digits.chars().any(|c| c.is_ascii_digit())
    {
        return None;
    }
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Degrees, minutes and seconds to signed decimal degrees.
///
/// The sign comes from the degrees token (so `-0 30 0` is `-0.5`).
fn dms(degrees: &str, minutes: &str, seconds: &str) -> Option<f64> {
    let d = number(degrees)?;
    let m = number(minutes)?;
    let s = number(seconds)?;
    if !(0.0..60.0).contains(&m) || !(0.0..60.0).contains(&s) {
        return None;
    }
    let magnitude = d.abs() + m / 60.0 + s / 3600.0;
    Some(if degrees.starts_with('-') {
        -magnitude
    } else {
        magnitude
    })
}

fn latitude_sign(hemisphere: &str) -> Option<f64> {
    match hemisphere {
        "N" => Some(1.0),
        "S" => Some(-1.0),
        _ => None,
    }
}

fn longitude_sign(hemisphere: &str) -> Option<f64> {
    match hemisphere {
        "E" => Some(1.0),
        "W" => Some(-1.0),
        _ => None,
    }
}

/// Parse normalized (upper-cased) tokens as a coordinate.
///
/// Returns `None` for unrecognized layouts, non-numeric parts, bad hemisphere
/// letters, or values outside the valid latitude/longitude ranges.
#[must_use]
pub fn parse_coordinate<S: AsRef<str>>(tokens: &[S]) -> Option<Coordinate> {
    let t: Vec<&str> = tokens.iter().map(|token| token.as_ref()).collect();
    let (latitude, longitude) = match t.as_slice() {
        [lat_d, lat_m, lat_s, lat_h, lon_d, lon_m, lon_s, lon_h] => (
            dms(lat_d, lat_m, lat_s)?.abs() * latitude_sign(lat_h)?,
            dms(lon_d, lon_m, lon_s)?.abs() * longitude_sign(lon_h)?,
        ),
        [lat_d, lat_m, lat_s, lon_d, lon_m, lon_s] => (
            dms(lat_d, lat_m, lat_s)?,
            -dms(lon_d, lon_m, lon_s)?.abs(),
        ),
        [lat, lat_h, lon, lon_h] => (
            number(lat)?.abs() * latitude_sign(lat_h)?,
            number(lon)?.abs() * longitude_sign(lon_h)?,
        ),
        [lat, lon] => (number(lat)?, -number(lon)?.abs()),
        _ => return None,
    };

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }

    Some(Coordinate {
        latitude: round_to(latitude, COORDINATE_PRECISION),
        longitude: round_to(longitude, COORDINATE_PRECISION),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Option<Coordinate> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        parse_coordinate(&tokens)
    }

    #[test]
    fn test_eight_token_dms_with_hemispheres() {
        let c = parse("44 57 53.2728 N 93 14 27.4812 W").unwrap();
        assert_eq!(c.latitude, 44.964798);
        assert_eq!(c.longitude, -93.240967);
    }

    #[test]
    fn test_eight_token_southern_eastern() {
        let c = parse("33 51 35.9 S 151 12 40 E").unwrap();
        assert!(c.latitude < 0.0);
        assert!(c.longitude > 0.0);
        assert_eq!(c.latitude, -33.859972);
        assert_eq!(c.longitude, 151.211111);
    }

    #[test]
    fn test_six_token_dms_forces_west() {
        let c = parse("44 57 53.2728 93 14 27.4812").unwrap();
        assert_eq!(c.latitude, 44.964798);
        assert_eq!(c.longitude, -93.240967);

        let c = parse("-12 30 0 -77 0 0").unwrap();
        assert_eq!(c.latitude, -12.5);
        assert_eq!(c.longitude, -77.0);
    }

    #[test]
    fn test_four_token_decimal_with_hemispheres() {
        let c = parse("30.2672 N 97.7431 W").unwrap();
        assert_eq!(c.latitude, 30.2672);
        assert_eq!(c.longitude, -97.7431);

        let c = parse("51.5 N 0.12 E").unwrap();
        assert_eq!(c.longitude, 0.12);
    }

    #[test]
    fn test_two_token_decimal_forces_west() {
        let c = parse("30.2672 97.7431").unwrap();
        assert_eq!(c.longitude, -97.7431);
        let c = parse("30.2672 -97.7431").unwrap();
        assert_eq!(c.longitude, -97.7431);
        let c = parse("-14.27 170.7").unwrap();
        assert_eq!(c.latitude, -14.27);
    }

    #[test]
    fn test_rounds_to_six_places() {
        let c = parse("30.12345678 97.87654321").unwrap();
        assert_eq!(c.latitude, 30.123457);
        assert_eq!(c.longitude, -97.876543);
    }

    #[test]
    fn test_unsupported_token_counts() {
        for text in ["30.2", "30.2 97.7 12", "1 2 3 4 5", "1 2 3 4 5 6 7", "1 2 3 N 4 5 6 W 7"] {
            assert!(parse(text).is_none(), "{text} should not parse");
        }
    }

    #[test]
    fn test_non_numeric_components() {
        assert!(parse("AUSTIN TX").is_none());
        assert!(parse("30.2 NAN").is_none());
        assert!(parse("INF 97").is_none());
        assert!(parse("1E2 97").is_none());
        assert!(parse("- 97").is_none());
    }

    #[test]
    fn test_bad_hemisphere_letters() {
        assert!(parse("30.2 E 97.7 W").is_none());
        assert!(parse("30.2 N 97.7 N").is_none());
        assert!(parse("44 57 53 X 93 14 27 W").is_none());
    }

    #[test]
    fn test_out_of_range_values() {
        assert!(parse("91 97.7").is_none());
        assert!(parse("45 181").is_none());
        assert!(parse("44 61 0 N 93 0 0 W").is_none());
        assert!(parse("44 0 60 93 0 0").is_none());
    }

    #[test]
    fn test_all_valid_results_are_in_bounds() {
        for text in [
            "90 180",
            "-90 -180",
            "89 59 59.99 N 179 59 59.99 E",
            "0 0",
            "45.5 S 100.25 W",
        ] {
            let c = parse(text).unwrap();
            assert!((-90.0..=90.0).contains(&c.latitude));
            assert!((-180.0..=180.0).contains(&c.longitude));
        }
    }

    #[test]
    fn test_display_name() {
        let c = parse("44 57 53.2728 N 93 14 27.4812 W").unwrap();
        assert_eq!(c.display_name(), "44.964798, -93.240967");
    }
}
