//! This module defines the `Pixelization` trait, the narrow interface to the
//! spherical projection math. The coverage index consumes it; implementing
//! the actual pixel/angle mapping is the provider's business.

use crate::{Cell, CoverageMap};
use anyhow::Result;

/// Provider of the sphere-to-pixel mapping for the hierarchical
/// tessellation. Angles are in degrees, `radius` as well.
pub trait Pixelization {
	/// The id of the cell at `order` containing the position.
	fn angle_to_pixel(&self, order: u8, lon: f64, lat: f64) -> Result<u64>;

	/// The center position of a cell.
	fn pixel_to_angle(&self, order: u8, idx: u64) -> Result<(f64, f64)>;

	/// All cell ids at `order` overlapping the disc around the position.
	fn pixels_covering_disc(&self, order: u8, lon: f64, lat: f64, radius: f64) -> Result<Vec<u64>>;
}

impl CoverageMap {
	/// Whether the position lies inside the coverage.
	///
	/// Thin wrapper: asks the provider for the containing cell at the
	/// deepest used order, then tests intersection.
	pub fn contains_point(&self, pixelization: &dyn Pixelization, lon: f64, lat: f64) -> Result<bool> {
		let Some(order) = self.max_used_order() else {
			return Ok(false);
		};
		let idx = pixelization.angle_to_pixel(order, lon, lat)?;
		Ok(self.is_intersecting_cell(&Cell::new(order, idx)?))
	}

	/// Whether the disc around the position overlaps the coverage.
	pub fn intersects_disc(
		&self,
		pixelization: &dyn Pixelization,
		lon: f64,
		lat: f64,
		radius: f64,
	) -> Result<bool> {
		let Some(order) = self.max_used_order() else {
			return Ok(false);
		};
		for idx in pixelization.pixels_covering_disc(order, lon, lat, radius)? {
			if self.is_intersecting_cell(&Cell::new(order, idx)?) {
				return Ok(true);
			}
		}
		Ok(false)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use anyhow::bail;

	/// A fake projection: the sphere is one flat strip of cells, longitude
	/// picks the cell directly. Good enough to exercise the wrappers.
	struct StripPixelization;

	impl Pixelization for StripPixelization {
		fn angle_to_pixel(&self, _order: u8, lon: f64, _lat: f64) -> Result<u64> {
			if lon < 0.0 {
				bail!("longitude must be >= 0");
			}
			Ok(lon as u64)
		}

		fn pixel_to_angle(&self, _order: u8, idx: u64) -> Result<(f64, f64)> {
			Ok((idx as f64, 0.0))
		}

		fn pixels_covering_disc(&self, _order: u8, lon: f64, _lat: f64, radius: f64) -> Result<Vec<u64>> {
			let lo = (lon - radius).max(0.0) as u64;
			let hi = (lon + radius) as u64;
			Ok((lo..=hi).collect())
		}
	}

	#[test]
	fn test_contains_point() -> Result<()> {
		let mut map = CoverageMap::new_empty();
		map.add(2, 17)?;

		assert!(map.contains_point(&StripPixelization, 17.0, 0.0)?);
		assert!(!map.contains_point(&StripPixelization, 18.0, 0.0)?);
		assert!(map.contains_point(&StripPixelization, 17.9, 0.0)?);

		let empty = CoverageMap::new_empty();
		assert!(!empty.contains_point(&StripPixelization, 17.0, 0.0)?);
		Ok(())
	}

	#[test]
	fn test_intersects_disc() -> Result<()> {
		let mut map = CoverageMap::new_empty();
		map.add(2, 17)?;

		assert!(map.intersects_disc(&StripPixelization, 15.0, 0.0, 2.0)?);
		assert!(!map.intersects_disc(&StripPixelization, 10.0, 0.0, 2.0)?);
		Ok(())
	}

	#[test]
	fn test_provider_errors_propagate() {
		let mut map = CoverageMap::new_empty();
		map.add(2, 17).unwrap();
		assert!(map.contains_point(&StripPixelization, -1.0, 0.0).is_err());
	}
}
