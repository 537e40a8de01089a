//! This module defines the per-order storage of cell ids: a growable,
//! optionally-sorted flat array of unsigned integers.
//!
//! # Overview
//!
//! A [`FlatStore`] keeps the ids of one resolution order in a single backing
//! vector that grows geometrically. Many operations tolerate a temporarily
//! unsorted state so that bulk appends stay O(1); [`FlatStore::sort`]
//! restores strict ascending order (and uniqueness) before any algorithm
//! that requires it.
//!
//! Three backing widths exist so that deep orders do not pay for 64-bit ids
//! they can never hold: [`LevelStore::for_order`] picks `u16` for orders
//! 0..=5, `u32` for 6..=14 and `u64` beyond. The width is an implementation
//! detail — every operation speaks `u64` at the interface.

use num_traits::PrimInt;
use std::fmt::{self, Debug};

/// A backing integer width usable by [`FlatStore`].
pub trait StoreValue: PrimInt + Debug {
	fn from_u64(value: u64) -> Self;
	fn to_u64(self) -> u64;
}

impl StoreValue for u16 {
	fn from_u64(value: u64) -> Self {
		debug_assert!(value <= u64::from(u16::MAX));
		value as u16
	}
	fn to_u64(self) -> u64 {
		u64::from(self)
	}
}

impl StoreValue for u32 {
	fn from_u64(value: u64) -> Self {
		debug_assert!(value <= u64::from(u32::MAX));
		value as u32
	}
	fn to_u64(self) -> u64 {
		u64::from(self)
	}
}

impl StoreValue for u64 {
	fn from_u64(value: u64) -> Self {
		value
	}
	fn to_u64(self) -> u64 {
		self
	}
}

/// A growable, optionally-sorted sequence of cell ids.
///
/// Invariant: while `sorted` is true, the values are strictly ascending
/// (no duplicates).
#[derive(Clone, Eq, PartialEq)]
pub struct FlatStore<T> {
	values: Vec<T>,
	sorted: bool,
}

impl<T: StoreValue> FlatStore<T> {
	pub fn new() -> FlatStore<T> {
		FlatStore {
			values: Vec::new(),
			sorted: true,
		}
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn is_sorted(&self) -> bool {
		self.sorted
	}

	pub fn get(&self, index: usize) -> u64 {
		self.values[index].to_u64()
	}

	/// Overwrites the value at `index`. The store is conservatively marked
	/// unsorted; call [`FlatStore::sort`] before order-dependent operations.
	pub fn set(&mut self, index: usize, value: u64) {
		self.values[index] = T::from_u64(value);
		self.sorted = false;
	}

	/// Inserts `value`, returning whether it was actually inserted.
	///
	/// With `test_uniqueness` an exact duplicate is rejected and, while the
	/// store is sorted, the value is placed by binary search so the store
	/// stays sorted. Without it the value is appended in O(1); appending
	/// keeps the sorted flag only when the value extends the ascending run.
	pub fn add(&mut self, value: u64, test_uniqueness: bool) -> bool {
		if !test_uniqueness {
			if self.sorted {
				if let Some(last) = self.values.last() {
					if value <= (*last).to_u64() {
						self.sorted = false;
					}
				}
			}
			self.values.push(T::from_u64(value));
			return true;
		}

		if self.sorted {
			match self.values.binary_search(&T::from_u64(value)) {
				Ok(_) => false,
				Err(position) => {
					self.values.insert(position, T::from_u64(value));
					true
				}
			}
		} else {
			if self.values.iter().any(|v| (*v).to_u64() == value) {
				return false;
			}
			self.values.push(T::from_u64(value));
			true
		}
	}

	/// Removes `value`, returning whether it was present.
	///
	/// The sorted path closes the gap by shifting (order preserved); the
	/// unsorted path swaps with the last element (O(1), order is not
	/// promised while unsorted anyway).
	pub fn delete(&mut self, value: u64) -> bool {
		if self.sorted {
			if let Ok(position) = self.values.binary_search(&T::from_u64(value)) {
				self.values.remove(position);
				return true;
			}
			false
		} else if let Some(position) = self.values.iter().position(|v| (*v).to_u64() == value) {
			self.values.swap_remove(position);
			true
		} else {
			false
		}
	}

	/// Removes every value in the inclusive range `[lo, hi]` and returns how
	/// many were removed.
	pub fn delete_range(&mut self, lo: u64, hi: u64) -> usize {
		if self.sorted {
			let start = self.values.partition_point(|v| (*v).to_u64() < lo);
			let end = start + self.values[start..].partition_point(|v| (*v).to_u64() <= hi);
			self.values.drain(start..end);
			end - start
		} else {
			let before = self.values.len();
			self.values.retain(|v| {
				let v = (*v).to_u64();
				v < lo || v > hi
			});
			before - self.values.len()
		}
	}

	/// Removes the three siblings of `idx` (its quartet excluding `idx`
	/// itself), succeeding only if all three are present.
	///
	/// A `true` result means the quartet was complete apart from `idx`, so
	/// the caller can coalesce into the parent cell instead of inserting.
	pub fn delete_siblings_of(&mut self, idx: u64) -> bool {
		let base = idx & !3;
		let siblings: Vec<u64> = (base..base + 4).filter(|&s| s != idx).collect();

		if self.sorted {
			// Siblings are consecutive ids, so they must sit contiguously.
			let start = self.values.partition_point(|v| (*v).to_u64() < base);
			if start + 3 > self.values.len() {
				return false;
			}
			for (offset, &sibling) in siblings.iter().enumerate() {
				if self.values[start + offset].to_u64() != sibling {
					return false;
				}
			}
			self.values.drain(start..start + 3);
			true
		} else {
			let mut positions = [0usize; 3];
			for (slot, &sibling) in siblings.iter().enumerate() {
				match self.values.iter().position(|v| (*v).to_u64() == sibling) {
					Some(position) => positions[slot] = position,
					None => return false,
				}
			}
			// Remove back to front so earlier positions stay valid.
			positions.sort_unstable();
			for &position in positions.iter().rev() {
				self.values.swap_remove(position);
			}
			true
		}
	}

	/// Restores strict ascending order, dropping duplicates accumulated by
	/// unchecked appends.
	pub fn sort(&mut self) {
		if !self.sorted {
			self.values.sort_unstable();
			self.values.dedup();
			self.sorted = true;
		}
	}

	/// Locates `value`, by binary search while sorted, by linear scan
	/// otherwise.
	pub fn find(&self, value: u64) -> Option<usize> {
		if self.sorted {
			self.values.binary_search(&T::from_u64(value)).ok()
		} else {
			self.values.iter().position(|v| (*v).to_u64() == value)
		}
	}

	/// Standard binary-search contract on a sorted store: `Ok(index)` when
	/// present, `Err(insertion_point)` when absent.
	///
	/// # Panics
	/// Panics if the store is not sorted.
	pub fn search(&self, value: u64) -> Result<usize, usize> {
		assert!(self.sorted, "search requires a sorted store");
		self.values.binary_search(&T::from_u64(value))
	}

	pub fn contains(&self, value: u64) -> bool {
		self.find(value).is_some()
	}

	/// Whether any stored value lies in the inclusive range `[lo, hi]`.
	pub fn intersects_range(&self, lo: u64, hi: u64) -> bool {
		if self.sorted {
			let index = self.values.partition_point(|v| (*v).to_u64() < lo);
			index < self.values.len() && self.values[index].to_u64() <= hi
		} else {
			self.values.iter().any(|v| {
				let v = (*v).to_u64();
				lo <= v && v <= hi
			})
		}
	}

	/// Number of runs of consecutive values, counting each run as one unit.
	///
	/// Used to predict the record count of the run-length binary encoding.
	/// The store must be sorted.
	pub fn size_compressed(&self) -> usize {
		debug_assert!(self.sorted, "size_compressed requires a sorted store");
		let mut runs = 0;
		let mut previous: Option<u64> = None;
		for v in &self.values {
			let v = (*v).to_u64();
			if previous != Some(v.wrapping_sub(1)) {
				runs += 1;
			}
			previous = Some(v);
		}
		runs
	}

	/// Releases unused backing capacity.
	pub fn trim(&mut self) {
		self.values.shrink_to_fit();
	}

	pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
		self.values.iter().map(|v| (*v).to_u64())
	}
}

impl<T: StoreValue> Default for FlatStore<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: StoreValue> Debug for FlatStore<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.values.iter()).finish()
	}
}

/// Dispatches a [`LevelStore`] method to the concrete backing width.
macro_rules! dispatch {
	($self:expr, $store:ident => $body:expr) => {
		match $self {
			LevelStore::Narrow($store) => $body,
			LevelStore::Medium($store) => $body,
			LevelStore::Wide($store) => $body,
		}
	};
}

/// The id store of one resolution order, with the backing width chosen by
/// the maximum id representable at that order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LevelStore {
	Narrow(FlatStore<u16>),
	Medium(FlatStore<u32>),
	Wide(FlatStore<u64>),
}

impl LevelStore {
	/// Creates an empty store wide enough for every id of `order`
	/// (`12 * 4^order - 1` must fit the backing integer).
	pub fn for_order(order: u8) -> LevelStore {
		match order {
			0..=5 => LevelStore::Narrow(FlatStore::new()),
			6..=14 => LevelStore::Medium(FlatStore::new()),
			_ => LevelStore::Wide(FlatStore::new()),
		}
	}

	pub fn len(&self) -> usize {
		dispatch!(self, store => store.len())
	}

	pub fn is_empty(&self) -> bool {
		dispatch!(self, store => store.is_empty())
	}

	pub fn is_sorted(&self) -> bool {
		dispatch!(self, store => store.is_sorted())
	}

	pub fn get(&self, index: usize) -> u64 {
		dispatch!(self, store => store.get(index))
	}

	pub fn set(&mut self, index: usize, value: u64) {
		dispatch!(self, store => store.set(index, value))
	}

	pub fn add(&mut self, value: u64, test_uniqueness: bool) -> bool {
		dispatch!(self, store => store.add(value, test_uniqueness))
	}

	pub fn delete(&mut self, value: u64) -> bool {
		dispatch!(self, store => store.delete(value))
	}

	pub fn delete_range(&mut self, lo: u64, hi: u64) -> usize {
		dispatch!(self, store => store.delete_range(lo, hi))
	}

	pub fn delete_siblings_of(&mut self, idx: u64) -> bool {
		dispatch!(self, store => store.delete_siblings_of(idx))
	}

	pub fn sort(&mut self) {
		dispatch!(self, store => store.sort())
	}

	pub fn find(&self, value: u64) -> Option<usize> {
		dispatch!(self, store => store.find(value))
	}

	pub fn search(&self, value: u64) -> Result<usize, usize> {
		dispatch!(self, store => store.search(value))
	}

	pub fn contains(&self, value: u64) -> bool {
		dispatch!(self, store => store.contains(value))
	}

	pub fn intersects_range(&self, lo: u64, hi: u64) -> bool {
		dispatch!(self, store => store.intersects_range(lo, hi))
	}

	pub fn size_compressed(&self) -> usize {
		dispatch!(self, store => store.size_compressed())
	}

	pub fn trim(&mut self) {
		dispatch!(self, store => store.trim())
	}

	pub fn iter(&self) -> Box<dyn Iterator<Item = u64> + '_> {
		dispatch!(self, store => Box::new(store.iter()))
	}
}
