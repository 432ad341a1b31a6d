//! Quantities shared across the workspace.
//!
//! Angles are the only physical quantity with more than one unit in play:
//! acquisition angles are specified in degrees and consumed in radians, so
//! they are carried around as `uom` quantities and converted at the edges.

pub mod todo;

pub use uom;

pub use uom::si::f32::Angle;
use uom::si::angle::{degree, radian};

pub fn deg(x: f32) -> Angle { Angle::new::<degree>(x) }
pub fn rad(x: f32) -> Angle { Angle::new::<radian>(x) }

pub fn deg_(x: Angle) -> f32 { x.get::<degree>() }
pub fn rad_(x: Angle) -> f32 { x.get::<radian>() }

/// Error returned by [`parse_angle`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot parse `{0}` as an angle (expected e.g. `179.9 deg` or `1.5 rad`)")]
pub struct ParseAngleError(pub String);

/// Parse an angle written as a number followed by an optional unit.
///
/// Recognized units: `deg`, `degree(s)`, `°`, `rad`, `radian(s)`. A bare
/// number is interpreted as degrees, because that is how acquisition angles
/// are conventionally written down.
pub fn parse_angle(s: &str) -> Result<Angle, ParseAngleError> {
    let err = || ParseAngleError(s.to_string());
    let s = s.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let value: f32 = number.trim().parse().map_err(|_| err())?;
    match unit.trim() {
        "" | "deg" | "degree" | "degrees" | "°" => Ok(deg(value)),
        "rad" | "radian" | "radians"            => Ok(rad(value)),
        _ => Err(err()),
    }
}

/// Assert that two `uom` quantities are equal in the given unit
#[macro_export]
macro_rules! assert_uom_eq {
    ($unit:ident, $lhs:expr, $rhs:expr, $algo:ident <= $tol:expr) => {
        float_eq::assert_float_eq!($lhs.get::<$unit>(), $rhs.get::<$unit>(), $algo <= $tol)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use float_eq::assert_float_eq;

    #[rstest(/**/   input     , expected_deg,
             case("179.9 deg" ,  179.9      ),
             case("90 degrees",   90.0      ),
             case("45°"       ,   45.0      ),
             case("  30  "    ,   30.0      ),
             case("-15deg"    ,  -15.0      ),
             case("3.14159265 rad", 180.0   ),
    )]
    fn angles_parse(input: &str, expected_deg: f32) {
        let angle = parse_angle(input).unwrap();
        assert_float_eq!(deg_(angle), expected_deg, abs <= 1e-3);
    }

    #[rstest(input, case("ninety"), case("90 grad"), case(""), case("deg"))]
    fn bad_angles_are_rejected(input: &str) {
        let err = parse_angle(input).unwrap_err();
        assert!(err.to_string().contains(&format!("`{}`", input.trim())), "{err}");
    }

    #[test]
    fn degree_radian_conversion() {
        use uom::si::angle::radian;
        assert_uom_eq!(radian, deg(180.0), rad(std::f32::consts::PI), ulps <= 2);
        assert_float_eq!(rad_(deg(90.0)), std::f32::consts::FRAC_PI_2, ulps <= 2);
    }
}
