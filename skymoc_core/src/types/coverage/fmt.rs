//! Debug and Display implementations for `CoverageMap`.

use super::CoverageMap;
use crate::MAX_ORDER;
use std::fmt;

impl fmt::Debug for CoverageMap {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		// Show only non-empty levels.
		let mut map = f.debug_map();
		for order in 0..=MAX_ORDER {
			let level = self.level(order);
			if !level.is_empty() {
				map.entry(&order, &level.iter().collect::<Vec<_>>());
			}
		}
		map.finish()
	}
}

impl fmt::Display for CoverageMap {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.max_used_order() {
			None => write!(f, "CoverageMap(empty, frame={})", self.frame),
			Some(max_used) => write!(
				f,
				"CoverageMap(frame={}, cells={}, max order={}, coverage={:.3}%)",
				self.frame,
				self.count_cells(),
				max_used,
				self.coverage() * 100.0
			),
		}
	}
}
