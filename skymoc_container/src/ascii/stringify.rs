//! Writing the brace-delimited text form.

use itertools::Itertools;
use skymoc_core::{CoverageMap, MAX_ORDER};

fn sorted_ids(map: &CoverageMap, order: u8) -> Vec<u64> {
	let mut ids: Vec<u64> = map.level(order).iter().collect();
	ids.sort_unstable();
	ids.dedup();
	ids
}

fn entries(map: &CoverageMap, format_ids: impl Fn(&[u64]) -> String) -> String {
	let mut parts = Vec::new();
	for order in 0..=MAX_ORDER {
		if map.level(order).is_empty() {
			continue;
		}
		let ids = sorted_ids(map, order);
		parts.push(format!("\"{}\":[{}]", order, format_ids(&ids)));
	}
	format!("{{{}}}", parts.join(","))
}

/// Serializes the map with every id written out.
pub fn stringify(map: &CoverageMap) -> String {
	entries(map, |ids| ids.iter().join(","))
}

/// Serializes the map with consecutive ids folded into `start-end` runs.
pub fn stringify_compact(map: &CoverageMap) -> String {
	entries(map, |ids| {
		let mut pieces = Vec::new();
		let mut start = 0;
		while start < ids.len() {
			let mut end = start;
			while end + 1 < ids.len() && ids[end + 1] == ids[end] + 1 {
				end += 1;
			}
			if end > start {
				pieces.push(format!("{}-{}", ids[start], ids[end]));
			} else {
				pieces.push(ids[start].to_string());
			}
			start = end + 1;
		}
		pieces.join(",")
	})
}
