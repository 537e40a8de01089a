//! Mutating operations for `CoverageMap`: checked and unchecked insertion,
//! deletion, and the consistency repair pass.
//!
//! All mutations invalidate the cached interval form.

use super::{CoverageMap, LimitPolicy};
use crate::{Cell, LevelStore, MAX_ORDER, n_cells};
use anyhow::{Result, bail, ensure};
use log::debug;

impl CoverageMap {
	/// Inserts the cell `(order, idx)`, keeping the map canonical.
	///
	/// The central recursive algorithm:
	/// 1. An order outside the configured band is rewritten (expanded below,
	///    coarsened above) or rejected, per the limit policy.
	/// 2. If an ancestor is already stored the insertion is a no-op.
	/// 3. Stored descendants become redundant and are removed.
	/// 4. If the three other siblings are stored, the quartet coalesces into
	///    the parent cell, recursively.
	/// 5. Otherwise the id is inserted into its level store.
	///
	/// Returns whether the map changed.
	pub fn add(&mut self, order: u8, idx: u64) -> Result<bool> {
		ensure!(order <= MAX_ORDER, "order ({order}) must be <= {MAX_ORDER}");
		ensure!(
			idx < n_cells(order),
			"cell id ({idx}) must be < {} at order {order}",
			n_cells(order)
		);
		self.invalidate();
		self.add_rec(order, idx)
	}

	/// Checked insertion of a [`Cell`].
	pub fn add_cell(&mut self, cell: &Cell) -> Result<bool> {
		self.add(cell.order, cell.idx)
	}

	fn add_rec(&mut self, order: u8, idx: u64) -> Result<bool> {
		// Rewrite orders outside the configured band.
		if order < self.min_order {
			if self.limit_policy == LimitPolicy::Strict {
				bail!("order ({order}) is below the minimum limit order ({})", self.min_order);
			}
			let mut inserted = false;
			for child in (Cell { order, idx }).descendants_at(self.min_order) {
				inserted |= self.add_rec(self.min_order, child)?;
			}
			return Ok(inserted);
		}
		if order > self.max_order {
			if self.limit_policy == LimitPolicy::Strict {
				bail!("order ({order}) is above the maximum limit order ({})", self.max_order);
			}
			return self.add_rec(self.max_order, idx >> (2 * u64::from(order - self.max_order)));
		}

		// Already covered by a stored ancestor?
		for o in 0..order {
			let level = &self.levels[o as usize];
			if !level.is_empty() && level.contains(idx >> (2 * u64::from(order - o))) {
				return Ok(false);
			}
		}

		// Stored descendants are now redundant.
		for o in order + 1..=MAX_ORDER {
			if self.levels[o as usize].is_empty() {
				continue;
			}
			let range = (Cell { order, idx }).descendants_at(o);
			self.levels[o as usize].delete_range(range.start, range.end - 1);
		}

		// A complete sibling quartet coalesces into the parent.
		if order > self.min_order && self.levels[order as usize].delete_siblings_of(idx) {
			return self.add_rec(order - 1, idx >> 2).map(|_| true);
		}

		Ok(self.levels[order as usize].add(idx, true))
	}

	/// Raw append without uniqueness or hierarchy checking: O(1), but the
	/// map must be repaired by [`check_and_fix`](Self::check_and_fix) before
	/// canonical-form guarantees apply.
	pub fn add_unchecked(&mut self, order: u8, idx: u64) -> Result<()> {
		ensure!(order <= MAX_ORDER, "order ({order}) must be <= {MAX_ORDER}");
		ensure!(
			idx < n_cells(order),
			"cell id ({idx}) must be < {} at order {order}",
			n_cells(order)
		);
		self.invalidate();
		self.levels[order as usize].add(idx, false);
		self.consistent = false;
		Ok(())
	}

	/// Removes the cell `(order, idx)` if stored, without re-expanding
	/// ancestors or descendants.
	pub fn delete(&mut self, order: u8, idx: u64) -> Result<bool> {
		ensure!(order <= MAX_ORDER, "order ({order}) must be <= {MAX_ORDER}");
		self.invalidate();
		Ok(self.levels[order as usize].delete(idx))
	}

	/// Removes every stored cell strictly below `cell` in the hierarchy.
	/// Returns how many cells were removed.
	pub fn delete_descendants_of(&mut self, cell: &Cell) -> usize {
		self.invalidate();
		let mut removed = 0;
		for o in cell.order + 1..=MAX_ORDER {
			if self.levels[o as usize].is_empty() {
				continue;
			}
			let range = cell.descendants_at(o);
			removed += self.levels[o as usize].delete_range(range.start, range.end - 1);
		}
		removed
	}

	/// Restores canonical form: sorts every level, then rebuilds the map in
	/// one top-down pass from the twelve root cells.
	///
	/// Per-level position cursors make the pass linear in input plus output:
	/// each stored id is visited O(1) times. A subtree below a kept cell is
	/// consumed wholesale; content below the maximum limit order is coarsened
	/// to a stand-in cell at that order.
	pub fn check_and_fix(&mut self) {
		self.sort_levels();
		self.invalidate();

		let Some(max_used) = self.max_used_order() else {
			self.consistent = true;
			return;
		};

		let before = self.count_cells();
		let mut fixed: Vec<LevelStore> = (0..=MAX_ORDER).map(LevelStore::for_order).collect();
		let mut cursors = vec![0usize; usize::from(max_used) + 1];
		for root in 0..12 {
			self.fix_node(0, root, max_used, &mut cursors, &mut fixed);
		}

		self.levels = fixed;
		self.trim();
		self.consistent = true;
		debug!("check_and_fix: {} cells in, {} cells out", before, self.count_cells());
	}

	fn fix_node(&self, order: u8, idx: u64, max_used: u8, cursors: &mut [usize], fixed: &mut [LevelStore]) {
		let level = &self.levels[order as usize];
		let cursor = cursors[order as usize];

		// The cell itself is stored: keep it, drop its whole subtree.
		if cursor < level.len() && level.get(cursor) == idx {
			cursors[order as usize] += 1;
			self.consume_subtree(order, idx, max_used, cursors);
			fixed[order as usize].add(idx, false);
			return;
		}

		if order >= max_used || !self.subtree_has_content(order, idx, max_used, cursors) {
			return;
		}

		// Content below the limit order is represented by a coarsened stand-in.
		if order >= self.max_order {
			self.consume_subtree(order, idx, max_used, cursors);
			fixed[order as usize].add(idx, false);
			return;
		}

		for child in 0..4 {
			self.fix_node(order + 1, (idx << 2) | child, max_used, cursors, fixed);
		}
	}

	/// Advances every deeper cursor past the subtree of `(order, idx)`.
	fn consume_subtree(&self, order: u8, idx: u64, max_used: u8, cursors: &mut [usize]) {
		for o in order + 1..=max_used {
			let level = &self.levels[o as usize];
			let upper = (idx + 1) << (2 * u64::from(o - order));
			while cursors[o as usize] < level.len() && level.get(cursors[o as usize]) < upper {
				cursors[o as usize] += 1;
			}
		}
	}

	/// Whether any deeper level still holds an id inside the subtree of
	/// `(order, idx)`. Cursors never point below the subtree's lower bound,
	/// so a single upper-bound comparison per level suffices.
	fn subtree_has_content(&self, order: u8, idx: u64, max_used: u8, cursors: &[usize]) -> bool {
		for o in order + 1..=max_used {
			let level = &self.levels[o as usize];
			let cursor = cursors[o as usize];
			if cursor < level.len() && level.get(cursor) < (idx + 1) << (2 * u64::from(o - order)) {
				return true;
			}
		}
		false
	}
}
