//! Read-only queries on `CoverageMap`: single-cell containment tests,
//! whole-map intersection, and coverage metrics.

use super::CoverageMap;
use crate::{Cell, LevelStore, MAX_ORDER};
use anyhow::{Result, ensure};

/// How to test two sorted id sets for a common element.
///
/// The chooser compares `n1*(1+log2 n2)`, `n2*(1+log2 n1)` and `n1+n2` and
/// picks the cheapest; ties favor the merge scan. The skewed-size cases fall
/// back to driving a binary search from the smaller set into the larger one.
#[derive(Debug, Eq, PartialEq)]
enum ProbeStrategy {
	MergeScan,
	ProbeWithCoarse,
	ProbeWithFine,
}

fn choose_strategy(n_coarse: usize, n_fine: usize) -> ProbeStrategy {
	let merge = (n_coarse + n_fine) as f64;
	let by_coarse = n_coarse as f64 * (1.0 + (n_fine as f64).log2());
	let by_fine = n_fine as f64 * (1.0 + (n_coarse as f64).log2());

	if merge <= by_coarse && merge <= by_fine {
		ProbeStrategy::MergeScan
	} else if by_coarse <= by_fine {
		ProbeStrategy::ProbeWithCoarse
	} else {
		ProbeStrategy::ProbeWithFine
	}
}

/// Whether `coarse` and `fine` share a covered cell, where each value of
/// `fine` descends from the value of `coarse` it right-shifts onto.
/// Both stores must be sorted; `shift` is `2 * (order_fine - order_coarse)`.
fn levels_overlap(coarse: &LevelStore, fine: &LevelStore, shift: u32) -> bool {
	match choose_strategy(coarse.len(), fine.len()) {
		ProbeStrategy::MergeScan => {
			let (mut i, mut j) = (0, 0);
			while i < coarse.len() && j < fine.len() {
				let a = coarse.get(i);
				let b = fine.get(j) >> shift;
				if a == b {
					return true;
				}
				if a < b {
					i += 1;
				} else {
					j += 1;
				}
			}
			false
		}
		ProbeStrategy::ProbeWithCoarse => (0..coarse.len()).any(|i| {
			let a = coarse.get(i);
			fine.intersects_range(a << shift, ((a + 1) << shift) - 1)
		}),
		ProbeStrategy::ProbeWithFine => (0..fine.len()).any(|j| coarse.search(fine.get(j) >> shift).is_ok()),
	}
}

impl CoverageMap {
	/// Whether the exact cell `(order, idx)` is stored.
	pub fn contains_cell(&self, cell: &Cell) -> bool {
		self.levels[cell.order as usize].contains(cell.idx)
	}

	/// Whether a strict ancestor of `cell` is stored.
	pub fn has_ancestor_of(&self, cell: &Cell) -> bool {
		(0..cell.order).any(|o| {
			let level = &self.levels[o as usize];
			!level.is_empty() && level.contains(cell.ancestor_at(o).idx)
		})
	}

	/// Whether a strict descendant of `cell` is stored.
	pub fn has_descendant_of(&self, cell: &Cell) -> bool {
		let Some(max_used) = self.max_used_order() else {
			return false;
		};
		(cell.order + 1..=max_used).any(|o| {
			let level = &self.levels[o as usize];
			if level.is_empty() {
				return false;
			}
			let range = cell.descendants_at(o);
			level.intersects_range(range.start, range.end - 1)
		})
	}

	/// Whether `cell` overlaps the coverage: stored itself, below a stored
	/// ancestor, or above stored descendants.
	pub fn is_intersecting_cell(&self, cell: &Cell) -> bool {
		self.contains_cell(cell) || self.has_ancestor_of(cell) || self.has_descendant_of(cell)
	}

	/// Whether two coverages overlap anywhere.
	///
	/// Every non-empty level pair is tested for a common covered cell with
	/// the strategy picked per pair sizes (merge scan vs. binary-search
	/// probing). Both maps must be sorted and share a coordinate frame.
	pub fn intersects(&self, other: &CoverageMap) -> Result<bool> {
		ensure!(
			self.frame == other.frame,
			"incompatible coordinate frames: {} vs {}",
			self.frame,
			other.frame
		);
		ensure!(
			self.is_sorted() && other.is_sorted(),
			"intersects requires sorted maps; call sort_levels or check_and_fix first"
		);

		for o1 in 0..=MAX_ORDER {
			if self.levels[o1 as usize].is_empty() {
				continue;
			}
			for o2 in 0..=MAX_ORDER {
				if other.levels[o2 as usize].is_empty() {
					continue;
				}
				// Probe with the coarser level against the finer one.
				let overlap = if o1 <= o2 {
					levels_overlap(
						&self.levels[o1 as usize],
						&other.levels[o2 as usize],
						2 * u32::from(o2 - o1),
					)
				} else {
					levels_overlap(
						&other.levels[o2 as usize],
						&self.levels[o1 as usize],
						2 * u32::from(o1 - o2),
					)
				};
				if overlap {
					return Ok(true);
				}
			}
		}
		Ok(false)
	}

	/// Covered area in units of order-29 cells.
	pub fn used_area(&self) -> u64 {
		self
			.levels
			.iter()
			.enumerate()
			.map(|(order, level)| (level.len() as u64) << (2 * (u32::from(MAX_ORDER) - order as u32)))
			.sum()
	}

	/// Total sphere area in units of order-29 cells: `12 * 4^29`.
	pub fn total_area() -> u64 {
		12u64 << (2 * u32::from(MAX_ORDER))
	}

	/// Covered fraction of the sphere, in `0.0..=1.0`.
	pub fn coverage(&self) -> f64 {
		self.used_area() as f64 / Self::total_area() as f64
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::CoordinateFrame;

	fn single_cell_map(order: u8, idx: u64) -> CoverageMap {
		let mut map = CoverageMap::new_empty();
		map.add(order, idx).unwrap();
		map
	}

	#[test]
	fn test_choose_strategy_cost_model() {
		// Comparable sizes: merge scan wins.
		assert_eq!(choose_strategy(100, 100), ProbeStrategy::MergeScan);
		// Strongly skewed sizes: probe driven by the smaller set.
		assert_eq!(choose_strategy(4, 1_000_000), ProbeStrategy::ProbeWithCoarse);
		assert_eq!(choose_strategy(1_000_000, 4), ProbeStrategy::ProbeWithFine);
		// Ties favor the merge scan: costs are 4, 4 and 4 here.
		assert_eq!(choose_strategy(2, 2), ProbeStrategy::MergeScan);
	}

	#[test]
	fn test_levels_overlap_all_strategies() {
		let mut coarse = LevelStore::for_order(1);
		for idx in [2, 5] {
			coarse.add(idx, true);
		}
		let mut fine = LevelStore::for_order(3);
		for idx in [7, 40, 100] {
			fine.add(idx, true);
		}

		// 40 >> 4 == 2, so the pair overlaps.
		assert!(levels_overlap(&coarse, &fine, 4));

		let mut disjoint = LevelStore::for_order(3);
		for idx in [7, 100, 111] {
			disjoint.add(idx, true);
		}
		assert!(!levels_overlap(&coarse, &disjoint, 4));
	}

	#[test]
	fn test_containment_walks() -> Result<()> {
		let map = single_cell_map(2, 16);

		assert!(map.contains_cell(&Cell::new(2, 16)?));
		assert!(!map.contains_cell(&Cell::new(2, 17)?));

		// A child of the stored cell sees an ancestor.
		assert!(map.has_ancestor_of(&Cell::new(3, 64)?));
		assert!(!map.has_ancestor_of(&Cell::new(3, 80)?));
		assert!(!map.has_ancestor_of(&Cell::new(2, 16)?));

		// The parent of the stored cell sees a descendant.
		assert!(map.has_descendant_of(&Cell::new(1, 4)?));
		assert!(!map.has_descendant_of(&Cell::new(1, 5)?));
		assert!(!map.has_descendant_of(&Cell::new(2, 16)?));
		Ok(())
	}

	#[test]
	fn test_is_intersecting_cell() -> Result<()> {
		let map = single_cell_map(2, 16);
		assert!(map.is_intersecting_cell(&Cell::new(2, 16)?));
		assert!(map.is_intersecting_cell(&Cell::new(3, 64)?));
		assert!(map.is_intersecting_cell(&Cell::new(0, 1)?));
		assert!(!map.is_intersecting_cell(&Cell::new(2, 20)?));
		assert!(!map.is_intersecting_cell(&Cell::new(0, 2)?));
		Ok(())
	}

	#[test]
	fn test_intersects_across_orders() -> Result<()> {
		let a = single_cell_map(1, 4);
		let b = single_cell_map(3, 70);
		// 70 >> 4 == 4: b lies inside a.
		assert!(a.intersects(&b)?);
		assert!(b.intersects(&a)?);

		let c = single_cell_map(3, 90);
		assert!(!a.intersects(&c)?);
		Ok(())
	}

	#[test]
	fn test_intersects_requires_matching_frames() {
		let a = single_cell_map(1, 4);
		let mut b = single_cell_map(1, 4);
		b.set_frame(CoordinateFrame::Galactic);
		assert!(a.intersects(&b).is_err());
	}

	#[test]
	fn test_coverage_metrics() -> Result<()> {
		let empty = CoverageMap::new_empty();
		assert_eq!(empty.used_area(), 0);
		assert_eq!(empty.coverage(), 0.0);

		let full = CoverageMap::new_full_sphere(CoordinateFrame::default());
		assert_eq!(full.used_area(), CoverageMap::total_area());
		assert_eq!(full.coverage(), 1.0);

		let mut half_root = CoverageMap::new_empty();
		half_root.add(0, 3)?;
		let fraction = half_root.coverage();
		assert!(fraction > 0.0 && fraction < 1.0);
		assert_eq!(half_root.used_area(), CoverageMap::total_area() / 12);
		Ok(())
	}
}
