//! Constructors for `CoverageMap`.

use super::{CoverageMap, LimitPolicy};
use crate::{Cell, CoordinateFrame, LevelStore, MAX_ORDER};
use anyhow::Result;
use std::sync::OnceLock;

impl CoverageMap {
	/// Creates an empty map: all level stores empty, full order band,
	/// default frame, consistent.
	pub fn new_empty() -> CoverageMap {
		CoverageMap {
			levels: (0..=MAX_ORDER).map(LevelStore::for_order).collect(),
			min_order: 0,
			max_order: MAX_ORDER,
			limit_policy: LimitPolicy::default(),
			frame: CoordinateFrame::default(),
			consistent: true,
			range_form: OnceLock::new(),
		}
	}

	/// Creates the full-sphere map: the twelve order-0 root cells.
	pub fn new_full_sphere(frame: CoordinateFrame) -> CoverageMap {
		let mut map = CoverageMap::new_empty();
		map.frame = frame;
		for idx in 0..12 {
			map.levels[0].add(idx, false);
		}
		map
	}

	/// Builds a map by checked insertion of the given cells.
	pub fn from_cells(cells: impl IntoIterator<Item = Cell>, frame: CoordinateFrame) -> Result<CoverageMap> {
		let mut map = CoverageMap::new_empty();
		map.frame = frame;
		for cell in cells {
			map.add_cell(&cell)?;
		}
		Ok(map)
	}
}
