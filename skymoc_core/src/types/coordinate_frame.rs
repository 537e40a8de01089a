//! This module defines the `CoordinateFrame` enum, the reference-frame tag
//! carried by every coverage map. Two maps can only be combined by set
//! algebra when their tags agree.

use anyhow::{Result, bail};
use std::fmt;
use std::str::FromStr;

/// The celestial reference frame a coverage map is expressed in.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CoordinateFrame {
	#[default]
	Equatorial,
	Galactic,
	Ecliptic,
}

impl CoordinateFrame {
	/// The single-letter code used in serialized headers (`C`, `G`, `E`).
	pub fn as_code(&self) -> char {
		match self {
			CoordinateFrame::Equatorial => 'C',
			CoordinateFrame::Galactic => 'G',
			CoordinateFrame::Ecliptic => 'E',
		}
	}
}

impl FromStr for CoordinateFrame {
	type Err = anyhow::Error;

	/// Accepts the single-letter header codes as well as spelled-out names,
	/// case-insensitively.
	fn from_str(value: &str) -> Result<Self> {
		Ok(match value.to_uppercase().as_str() {
			"C" | "CEL" | "EQ" | "EQUATORIAL" => CoordinateFrame::Equatorial,
			"G" | "GAL" | "GALACTIC" => CoordinateFrame::Galactic,
			"E" | "ECL" | "ECLIPTIC" => CoordinateFrame::Ecliptic,
			_ => bail!("unknown coordinate frame: \"{value}\""),
		})
	}
}

impl fmt::Display for CoordinateFrame {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			CoordinateFrame::Equatorial => "equatorial",
			CoordinateFrame::Galactic => "galactic",
			CoordinateFrame::Ecliptic => "ecliptic",
		})
	}
}
