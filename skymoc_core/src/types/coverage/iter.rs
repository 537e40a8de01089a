//! Iteration over a `CoverageMap`: stored cells level by level, and the
//! lazy expansion into finest-resolution pixels.

use super::CoverageMap;
use crate::{Cell, LevelStore, MAX_ORDER};
use std::ops::Range;

impl CoverageMap {
	/// Iterates the stored cells level by level, from order 0 upward.
	///
	/// Within one level the ids come in store order; sort the map first for
	/// ascending ids.
	pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
		self.levels.iter().enumerate().flat_map(|(order, level)| {
			level.iter().map(move |idx| Cell {
				order: order as u8,
				idx,
			})
		})
	}

	/// Iterates every covered pixel at the finest resolution (order 29) in
	/// strictly ascending global order.
	///
	/// Each call creates fresh per-level cursors, so the iteration is
	/// restartable. The map must be sorted (and should be canonical — an
	/// ancestor stored with a descendant would repeat pixels).
	///
	/// # Panics
	/// Panics if any level store is unsorted.
	pub fn flat_pixels(&self) -> FlatPixelIter<'_> {
		assert!(
			self.is_sorted(),
			"flat_pixels requires sorted levels; call sort_levels or check_and_fix first"
		);
		FlatPixelIter {
			levels: &self.levels,
			cursors: vec![0; self.levels.len()],
			current: 0..0,
		}
	}
}

/// Lazy iterator over the finest-resolution pixels of a coverage.
///
/// Repeatedly selects, across all orders, the numerically smallest remaining
/// head pixel scaled to order 29, then enumerates its whole represented
/// range before advancing that level's cursor.
pub struct FlatPixelIter<'a> {
	levels: &'a [LevelStore],
	cursors: Vec<usize>,
	current: Range<u64>,
}

impl Iterator for FlatPixelIter<'_> {
	type Item = u64;

	fn next(&mut self) -> Option<u64> {
		loop {
			if let Some(pixel) = self.current.next() {
				return Some(pixel);
			}

			// Pick the level whose next cell starts earliest on the sphere.
			let mut best: Option<(usize, Range<u64>)> = None;
			for (order, level) in self.levels.iter().enumerate() {
				let cursor = self.cursors[order];
				if cursor >= level.len() {
					continue;
				}
				let shift = 2 * (u32::from(MAX_ORDER) - order as u32);
				let idx = level.get(cursor);
				let range = (idx << shift)..((idx + 1) << shift);
				if best.as_ref().is_none_or(|(_, b)| range.start < b.start) {
					best = Some((order, range));
				}
			}

			let (order, range) = best?;
			self.cursors[order] += 1;
			self.current = range;
		}
	}
}
