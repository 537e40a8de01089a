//! Set algebra on `CoverageMap`, implemented on the flat interval form.
//!
//! The interval form is computed lazily, cached on the map and invalidated
//! by every mutation. Rebuilding a map from intervals emits the coarsest
//! possible cells order by order, so algebra results are always canonical.

use super::CoverageMap;
use crate::{CoordinateFrame, MAX_ORDER, RangeSet};
use anyhow::{Result, ensure};

impl CoverageMap {
	/// The interval form of this coverage, computed on first use and cached
	/// until the next mutation.
	pub fn ranges(&self) -> &RangeSet {
		self.range_form.get_or_init(|| {
			RangeSet::from_pairs(self.cells().map(|cell| {
				let range = cell.descendants_at(MAX_ORDER);
				(range.start, range.end)
			}))
		})
	}

	/// Rebuilds a canonical map from an interval set, order by order from 0
	/// upward: at each order every fully covered, boundary-aligned cell is
	/// emitted and subtracted, and the remainders move on to the next finer
	/// order. Each interval thus becomes the coarsest possible cell set.
	pub fn from_ranges(ranges: &RangeSet, frame: CoordinateFrame) -> CoverageMap {
		let mut map = CoverageMap::new_empty();
		map.frame = frame;

		let mut remainder: Vec<(u64, u64)> = ranges.iter().collect();
		for order in 0..=MAX_ORDER {
			if remainder.is_empty() {
				break;
			}
			let shift = 2 * u32::from(MAX_ORDER - order);
			let cell_size = 1u64 << shift;
			let mut next = Vec::new();

			for (lo, hi) in remainder {
				let first_cell = lo.div_ceil(cell_size);
				let last_cell = hi >> shift;
				if first_cell >= last_cell {
					next.push((lo, hi));
					continue;
				}
				for idx in first_cell..last_cell {
					map.levels[order as usize].add(idx, false);
				}
				if lo < first_cell << shift {
					next.push((lo, first_cell << shift));
				}
				if last_cell << shift < hi {
					next.push((last_cell << shift, hi));
				}
			}
			remainder = next;
		}

		map.trim();
		map
	}

	fn rebuild(&self, ranges: &RangeSet) -> CoverageMap {
		let mut map = CoverageMap::from_ranges(ranges, self.frame);
		map.limit_policy = self.limit_policy;
		map
	}

	fn check_compatible(&self, other: &CoverageMap) -> Result<()> {
		ensure!(
			self.frame == other.frame,
			"incompatible coordinate frames: {} vs {}",
			self.frame,
			other.frame
		);
		Ok(())
	}

	/// The canonical union of two compatible coverages.
	pub fn union(&self, other: &CoverageMap) -> Result<CoverageMap> {
		self.check_compatible(other)?;
		Ok(self.rebuild(&self.ranges().union(other.ranges())))
	}

	/// The canonical intersection of two compatible coverages.
	pub fn intersection(&self, other: &CoverageMap) -> Result<CoverageMap> {
		self.check_compatible(other)?;
		Ok(self.rebuild(&self.ranges().intersection(other.ranges())))
	}

	/// The canonical difference `self \ other` of two compatible coverages.
	pub fn difference(&self, other: &CoverageMap) -> Result<CoverageMap> {
		self.check_compatible(other)?;
		Ok(self.rebuild(&self.ranges().difference(other.ranges())))
	}

	/// The canonical complement: the whole sphere minus this coverage.
	pub fn complement(&self) -> CoverageMap {
		self.rebuild(&self.ranges().complement())
	}
}

/// Two maps are equal when they cover the same region in the same frame,
/// regardless of how the cells are cut.
impl PartialEq for CoverageMap {
	fn eq(&self, other: &Self) -> bool {
		self.frame == other.frame && self.ranges() == other.ranges()
	}
}

impl Eq for CoverageMap {}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Cell;

	fn map_of(cells: &[(u8, u64)]) -> CoverageMap {
		let mut map = CoverageMap::new_empty();
		for &(order, idx) in cells {
			map.add(order, idx).unwrap();
		}
		map
	}

	#[test]
	fn test_ranges_cached_and_invalidated() -> Result<()> {
		let mut map = map_of(&[(1, 2)]);
		let range = Cell::new(1, 2)?.descendants_at(MAX_ORDER);
		assert_eq!(map.ranges().iter().collect::<Vec<_>>(), vec![(range.start, range.end)]);

		map.add(1, 3)?;
		let wider = Cell::new(1, 2)?.descendants_at(MAX_ORDER).start
			..Cell::new(1, 3)?.descendants_at(MAX_ORDER).end;
		assert_eq!(
			map.ranges().iter().collect::<Vec<_>>(),
			vec![(wider.start, wider.end)]
		);
		Ok(())
	}

	#[test]
	fn test_from_ranges_emits_coarsest_cells() -> Result<()> {
		// The full subtree of 1/2 plus one extra order-2 cell.
		let lo = Cell::new(1, 2)?.descendants_at(MAX_ORDER).start;
		let hi = Cell::new(2, 12)?.descendants_at(MAX_ORDER).end;
		let map = CoverageMap::from_ranges(
			&RangeSet::from_pairs([(lo, hi)]),
			CoordinateFrame::default(),
		);

		assert_eq!(map.level(1).iter().collect::<Vec<_>>(), vec![2]);
		assert_eq!(map.level(2).iter().collect::<Vec<_>>(), vec![12]);
		assert!(map.is_consistent());
		assert!(map.is_sorted());
		Ok(())
	}

	#[test]
	fn test_round_trip_through_ranges() {
		let map = map_of(&[(1, 2), (2, 20), (3, 85), (3, 87)]);
		let rebuilt = CoverageMap::from_ranges(map.ranges(), map.frame());
		for order in 0..=MAX_ORDER {
			assert_eq!(
				map.level(order).iter().collect::<Vec<_>>(),
				rebuilt.level(order).iter().collect::<Vec<_>>(),
				"order {order} differs"
			);
		}
	}

	#[test]
	fn test_union_is_commutative() -> Result<()> {
		let a = map_of(&[(1, 2), (3, 85)]);
		let b = map_of(&[(2, 16), (3, 86)]);
		assert_eq!(a.union(&b)?, b.union(&a)?);
		Ok(())
	}

	#[test]
	fn test_intersection_with_self_is_identity() -> Result<()> {
		let a = map_of(&[(1, 2), (2, 20)]);
		assert_eq!(a.intersection(&a)?, a);
		Ok(())
	}

	#[test]
	fn test_union_with_complement_is_whole_sphere() -> Result<()> {
		let a = map_of(&[(0, 3), (2, 100)]);
		let whole = CoverageMap::new_full_sphere(a.frame());
		assert_eq!(a.union(&a.complement())?, whole);
		Ok(())
	}

	#[test]
	fn test_symmetric_difference_identity() -> Result<()> {
		let a = map_of(&[(1, 2), (2, 20)]);
		let b = map_of(&[(1, 3), (2, 20)]);

		let via_union = a.union(&b)?.difference(&a.intersection(&b)?)?;
		let via_differences = a.difference(&b)?.union(&b.difference(&a)?)?;
		assert_eq!(via_union, via_differences);
		Ok(())
	}

	#[test]
	fn test_algebra_rejects_mixed_frames() {
		let a = map_of(&[(0, 0)]);
		let mut b = map_of(&[(0, 1)]);
		b.set_frame(CoordinateFrame::Ecliptic);
		assert!(a.union(&b).is_err());
		assert!(a.intersection(&b).is_err());
		assert!(a.difference(&b).is_err());
	}

	#[test]
	fn test_quartet_and_parent_cover_equally() -> Result<()> {
		// Four unchecked sibling cells equal their parent cell as coverage.
		let mut quartet = CoverageMap::new_empty();
		for idx in 16..20 {
			quartet.add_unchecked(2, idx)?;
		}
		let parent = map_of(&[(1, 4)]);
		assert_eq!(quartet, parent);
		Ok(())
	}
}
