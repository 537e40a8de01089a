//! This module defines the `CoverageMap` struct, the multi-order coverage of
//! a region on the sphere. It owns one [`LevelStore`] per resolution order
//! and keeps the stored cells canonical: no cell has a stored ancestor, and
//! no sibling quartet is stored instead of its parent.
//!
//! Mutation happens through [`add`](CoverageMap::add) /
//! [`delete`](CoverageMap::delete) (or their unchecked fast paths followed by
//! [`check_and_fix`](CoverageMap::check_and_fix)); queries, iteration, set
//! algebra and serialization consume the map read-only.

mod algebra;
mod constructors;
mod fmt;
mod iter;
mod mutate;
mod queries;
#[cfg(test)]
mod tests;

pub use iter::FlatPixelIter;

use crate::{CoordinateFrame, LevelStore, MAX_ORDER, RangeSet};
use anyhow::{Result, ensure};
use std::sync::OnceLock;

/// How [`CoverageMap::add`] treats a cell outside the configured order band.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LimitPolicy {
	/// Rewrite the cell silently: expand below the band into descendants,
	/// coarsen above the band to the ancestor.
	#[default]
	Rewrite,
	/// Report an out-of-range order as an error.
	Strict,
}

/// A multi-order coverage of the sphere: one id store per resolution order.
#[derive(Clone)]
pub struct CoverageMap {
	pub(super) levels: Vec<LevelStore>,
	pub(super) min_order: u8,
	pub(super) max_order: u8,
	pub(super) limit_policy: LimitPolicy,
	pub(super) frame: CoordinateFrame,
	pub(super) consistent: bool,
	pub(super) range_form: OnceLock<RangeSet>,
}

impl CoverageMap {
	/// The id store of one resolution order.
	pub fn level(&self, order: u8) -> &LevelStore {
		&self.levels[order as usize]
	}

	/// The deepest order holding at least one cell, `None` while empty.
	pub fn max_used_order(&self) -> Option<u8> {
		self
			.levels
			.iter()
			.rposition(|level| !level.is_empty())
			.map(|order| order as u8)
	}

	/// Total number of stored cells across all orders.
	pub fn count_cells(&self) -> u64 {
		self.levels.iter().map(|level| level.len() as u64).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.levels.iter().all(|level| level.is_empty())
	}

	/// Whether the canonical-form invariant is known to hold.
	pub fn is_consistent(&self) -> bool {
		self.consistent
	}

	pub fn frame(&self) -> CoordinateFrame {
		self.frame
	}

	pub fn set_frame(&mut self, frame: CoordinateFrame) {
		self.frame = frame;
	}

	pub fn min_limit_order(&self) -> u8 {
		self.min_order
	}

	pub fn max_limit_order(&self) -> u8 {
		self.max_order
	}

	/// Restricts the inclusive order band accepted by [`CoverageMap::add`].
	///
	/// The band only affects future insertions; cells already stored outside
	/// it are left alone until the next [`check_and_fix`](Self::check_and_fix).
	pub fn set_limit_orders(&mut self, min_order: u8, max_order: u8) -> Result<()> {
		ensure!(
			min_order <= max_order,
			"min order ({min_order}) must be <= max order ({max_order})"
		);
		ensure!(max_order <= MAX_ORDER, "max order ({max_order}) must be <= {MAX_ORDER}");
		self.min_order = min_order;
		self.max_order = max_order;
		Ok(())
	}

	pub fn limit_policy(&self) -> LimitPolicy {
		self.limit_policy
	}

	pub fn set_limit_policy(&mut self, policy: LimitPolicy) {
		self.limit_policy = policy;
	}

	/// Sorts every level store in place (needed before order-dependent
	/// algorithms after unchecked bulk insertion).
	pub fn sort_levels(&mut self) {
		for level in &mut self.levels {
			level.sort();
		}
	}

	/// Whether every level store is currently sorted.
	pub fn is_sorted(&self) -> bool {
		self.levels.iter().all(|level| level.is_sorted())
	}

	/// Releases unused backing capacity of every level store.
	pub fn trim(&mut self) {
		for level in &mut self.levels {
			level.trim();
		}
	}

	pub(super) fn invalidate(&mut self) {
		self.range_form.take();
	}
}

impl Default for CoverageMap {
	/// Creates an empty map in the default (equatorial) frame.
	fn default() -> Self {
		Self::new_empty()
	}
}
