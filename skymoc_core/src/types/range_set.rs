//! This module defines the `RangeSet` struct, the flat interval form of a
//! coverage: a sorted list of disjoint half-open `[lo, hi)` ranges of pixel
//! ids at the finest resolution (order 29).
//!
//! # Overview
//!
//! Set algebra on coverages (union, intersection, difference, complement) is
//! implemented entirely on this representation with merge-style sweeps over
//! two sorted interval lists. Conversion to and from `CoverageMap` lives in
//! the coverage module; this module is pure interval arithmetic.

use crate::{MAX_ORDER, n_cells};

/// Number of pixels tessellating the sphere at the finest resolution.
pub fn n_finest_pixels() -> u64 {
	n_cells(MAX_ORDER)
}

/// A sorted list of disjoint, non-adjacent half-open pixel-id ranges at the
/// finest resolution.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RangeSet {
	ranges: Vec<(u64, u64)>,
}

impl RangeSet {
	pub fn new_empty() -> RangeSet {
		RangeSet { ranges: Vec::new() }
	}

	/// The single range covering the whole sphere.
	pub fn new_full() -> RangeSet {
		RangeSet {
			ranges: vec![(0, n_finest_pixels())],
		}
	}

	/// Builds a set from arbitrary `[lo, hi)` pairs: empty pairs are
	/// dropped, the rest are sorted and overlapping or adjacent pairs are
	/// merged.
	pub fn from_pairs(pairs: impl IntoIterator<Item = (u64, u64)>) -> RangeSet {
		let mut pairs: Vec<(u64, u64)> = pairs.into_iter().filter(|(lo, hi)| lo < hi).collect();
		pairs.sort_unstable();

		let mut ranges: Vec<(u64, u64)> = Vec::with_capacity(pairs.len());
		for (lo, hi) in pairs {
			match ranges.last_mut() {
				Some((_, last_hi)) if *last_hi >= lo => *last_hi = (*last_hi).max(hi),
				_ => ranges.push((lo, hi)),
			}
		}
		RangeSet { ranges }
	}

	pub fn is_empty(&self) -> bool {
		self.ranges.is_empty()
	}

	/// Number of disjoint ranges.
	pub fn len(&self) -> usize {
		self.ranges.len()
	}

	/// Total number of covered finest-resolution pixels.
	pub fn n_pixels(&self) -> u64 {
		self.ranges.iter().map(|(lo, hi)| hi - lo).sum()
	}

	pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
		self.ranges.iter().copied()
	}

	pub fn contains_pixel(&self, pixel: u64) -> bool {
		let index = self.ranges.partition_point(|&(lo, _)| lo <= pixel);
		index > 0 && pixel < self.ranges[index - 1].1
	}

	/// Merge-sweep union of two sorted range lists.
	pub fn union(&self, other: &RangeSet) -> RangeSet {
		let (a, b) = (&self.ranges, &other.ranges);
		let mut out: Vec<(u64, u64)> = Vec::with_capacity(a.len() + b.len());
		let (mut i, mut j) = (0, 0);

		while i < a.len() || j < b.len() {
			let take_a = j >= b.len() || (i < a.len() && a[i].0 <= b[j].0);
			let (lo, hi) = if take_a {
				i += 1;
				a[i - 1]
			} else {
				j += 1;
				b[j - 1]
			};
			match out.last_mut() {
				Some((_, last_hi)) if *last_hi >= lo => *last_hi = (*last_hi).max(hi),
				_ => out.push((lo, hi)),
			}
		}
		RangeSet { ranges: out }
	}

	/// Merge-sweep intersection of two sorted range lists.
	pub fn intersection(&self, other: &RangeSet) -> RangeSet {
		let (a, b) = (&self.ranges, &other.ranges);
		let mut out = Vec::new();
		let (mut i, mut j) = (0, 0);

		while i < a.len() && j < b.len() {
			let lo = a[i].0.max(b[j].0);
			let hi = a[i].1.min(b[j].1);
			if lo < hi {
				out.push((lo, hi));
			}
			// Advance whichever range ends first.
			if a[i].1 <= b[j].1 {
				i += 1;
			} else {
				j += 1;
			}
		}
		RangeSet { ranges: out }
	}

	/// Ranges of `self` not covered by `other`.
	pub fn difference(&self, other: &RangeSet) -> RangeSet {
		let b = &other.ranges;
		let mut out = Vec::new();
		let mut j = 0;

		for &(lo, hi) in &self.ranges {
			let mut cursor = lo;
			// Skip subtrahend ranges entirely before this range.
			while j < b.len() && b[j].1 <= lo {
				j += 1;
			}
			let mut k = j;
			while k < b.len() && b[k].0 < hi {
				if cursor < b[k].0 {
					out.push((cursor, b[k].0));
				}
				cursor = cursor.max(b[k].1);
				k += 1;
			}
			if cursor < hi {
				out.push((cursor, hi));
			}
		}
		RangeSet { ranges: out }
	}

	/// The whole sphere minus `self`.
	pub fn complement(&self) -> RangeSet {
		RangeSet::new_full().difference(self)
	}

	/// Whether the two sets share at least one pixel.
	pub fn intersects(&self, other: &RangeSet) -> bool {
		let (a, b) = (&self.ranges, &other.ranges);
		let (mut i, mut j) = (0, 0);
		while i < a.len() && j < b.len() {
			if a[i].0.max(b[j].0) < a[i].1.min(b[j].1) {
				return true;
			}
			if a[i].1 <= b[j].1 {
				i += 1;
			} else {
				j += 1;
			}
		}
		false
	}
}
