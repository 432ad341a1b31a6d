//! Configuration files, and the serde helpers they share.

pub mod demo;

use std::str::FromStr;

use serde::{Deserialize, Deserializer, de};

/// Deserialize a `FromStr` value from a TOML string, such as `"179.9 deg"`
fn deserialize_parsed<'d, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    String::deserialize(deserializer)?
        .parse::<T>()
        .map_err(de::Error::custom)
}

fn deserialize_angle<'d, D: Deserializer<'d>>(deserializer: D) -> Result<units::Angle, D::Error> {
    let text = String::deserialize(deserializer)?;
    units::parse_angle(&text).map_err(de::Error::custom)
}
