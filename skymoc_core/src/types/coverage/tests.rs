//! Cross-cutting properties of `CoverageMap`: canonical form, coalescing
//! cascades, containment, coverage bounds.

use super::CoverageMap;
use crate::{Cell, CoordinateFrame, MAX_ORDER};
use anyhow::Result;

/// Asserts that no stored cell has a stored ancestor.
fn assert_no_ancestor_pairs(map: &CoverageMap) {
	for cell in map.cells() {
		assert!(
			!map.has_ancestor_of(&cell),
			"{cell} is stored together with an ancestor"
		);
	}
}

/// Asserts that no sibling quartet is fully present.
fn assert_no_complete_quartets(map: &CoverageMap) {
	for cell in map.cells() {
		let base = cell.sibling_base();
		let level = map.level(cell.order);
		let complete = (base..base + 4).all(|s| level.contains(s));
		assert!(!complete, "complete quartet around {cell}");
	}
}

#[test]
fn test_checked_insertion_stays_canonical() -> Result<()> {
	let mut map = CoverageMap::new_empty();
	// A mix that provokes coalescing, absorption and descendant purging.
	for (order, idx) in [
		(3, 85),
		(3, 84),
		(3, 86),
		(3, 87), // quartet: becomes 2/21
		(2, 20),
		(2, 22),
		(2, 23), // completes the quartet of 2/21: becomes 1/5
		(4, 341),
		(1, 5), // already covered
		(0, 3),
		(4, 192),
	] {
		map.add(order, idx)?;
	}
	assert!(map.is_consistent());
	assert_no_ancestor_pairs(&map);
	assert_no_complete_quartets(&map);
	assert!(map.level(1).contains(5));
	Ok(())
}

#[test]
fn test_check_and_fix_removes_ancestor_pairs() -> Result<()> {
	let mut map = CoverageMap::new_empty();
	for (order, idx) in [(0, 2), (1, 8), (2, 35), (3, 141), (2, 100), (1, 25)] {
		map.add_unchecked(order, idx)?;
	}
	map.check_and_fix();
	assert_no_ancestor_pairs(&map);
	// 1/8, 2/35 and 3/141 all live below root 0/2; 2/100 below 1/25.
	assert_eq!(map.level(0).iter().collect::<Vec<_>>(), vec![2]);
	assert_eq!(map.level(1).iter().collect::<Vec<_>>(), vec![25]);
	assert!(map.level(2).is_empty());
	assert!(map.level(3).is_empty());
	Ok(())
}

#[test]
fn test_coalescing_chain_to_root() -> Result<()> {
	// Completing quartets all the way up collapses to a single root cell.
	let mut map = CoverageMap::new_empty();
	map.add(3, 1)?;
	map.add(3, 2)?;
	map.add(3, 3)?;
	map.add(2, 1)?;
	map.add(2, 2)?;
	map.add(2, 3)?;
	map.add(1, 1)?;
	map.add(1, 2)?;
	map.add(1, 3)?;
	assert_eq!(map.count_cells(), 9);

	// The last leaf completes every quartet in the chain.
	map.add(3, 0)?;
	assert_eq!(map.count_cells(), 1);
	assert!(map.level(0).contains(0));
	Ok(())
}

#[test]
fn test_containment_of_inserted_cell_and_child() -> Result<()> {
	let mut map = CoverageMap::new_empty();
	map.add(4, 123)?;
	assert!(map.is_intersecting_cell(&Cell::new(4, 123)?));
	// One of its children intersects through the stored ancestor.
	assert!(map.is_intersecting_cell(&Cell::new(5, 4 * 123)?));
	Ok(())
}

#[test]
fn test_coverage_stays_in_unit_interval() -> Result<()> {
	let mut map = CoverageMap::new_empty();
	assert!(map.coverage() >= 0.0);
	for (order, idx) in [(0, 1), (1, 17), (5, 900), (MAX_ORDER, 42)] {
		map.add(order, idx)?;
		let coverage = map.coverage();
		assert!((0.0..=1.0).contains(&coverage), "coverage {coverage} out of bounds");
	}

	let full = CoverageMap::new_full_sphere(CoordinateFrame::default());
	assert_eq!(full.coverage(), 1.0);
	Ok(())
}

#[test]
fn test_equality_ignores_cell_granularity() -> Result<()> {
	let mut coarse = CoverageMap::new_empty();
	coarse.add(1, 5)?;

	let mut fine = CoverageMap::new_empty();
	for idx in 20..24 {
		fine.add_unchecked(2, idx)?;
	}
	assert_eq!(coarse, fine);

	fine.add(5, 0)?;
	assert_ne!(coarse, fine);
	Ok(())
}
