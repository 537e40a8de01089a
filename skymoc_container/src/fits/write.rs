//! Writing the binary container.

use super::header::{BLOCK_SIZE, Header};
use anyhow::Result;
use byteorder::{BigEndian, WriteBytesExt};
use log::debug;
use skymoc_core::CoverageMap;
use std::io::Write;

/// Orders up to this depth have uniq values fitting a signed 32-bit record.
const MAX_NARROW_ORDER: u8 = 13;

/// Writes the map as a FITS-convention binary stream.
///
/// With `compressed`, runs of consecutive uniq values collapse into
/// `(start, n)` record pairs: `n > 0` encodes `n` consecutive values from
/// `start`, `n < 0` packs the two single values `start` and `-n`.
pub fn write(map: &CoverageMap, writer: &mut dyn Write, compressed: bool) -> Result<()> {
	let mut uniqs: Vec<u64> = map.cells().map(|cell| cell.uniq()).collect();
	uniqs.sort_unstable();
	uniqs.dedup();

	let records = if compressed {
		run_length_records(&uniqs)
	} else {
		uniqs.iter().map(|&uniq| uniq as i64).collect()
	};

	let wide = map.max_used_order().is_some_and(|order| order > MAX_NARROW_ORDER);
	let record_size: usize = if wide { 8 } else { 4 };

	let mut primary = Header::new();
	primary.push_bool("SIMPLE", true);
	primary.push_int("BITPIX", 8);
	primary.push_int("NAXIS", 0);
	primary.push_bool("EXTEND", true);
	primary.write_to(writer)?;

	let mut table = Header::new();
	table.push_str("XTENSION", "BINTABLE");
	table.push_int("BITPIX", 8);
	table.push_int("NAXIS", 2);
	table.push_int("NAXIS1", record_size as i64);
	table.push_int("NAXIS2", records.len() as i64);
	table.push_int("PCOUNT", 0);
	table.push_int("GCOUNT", 1);
	table.push_int("TFIELDS", 1);
	table.push_str("TTYPE1", if compressed { "RANGE" } else { "UNIQ" });
	table.push_str("TFORM1", if wide { "1K" } else { "1J" });
	table.push_str("PIXTYPE", "HEALPIX");
	table.push_str("ORDERING", "NUNIQ");
	table.push_str("COORDSYS", &map.frame().as_code().to_string());
	table.push_int("MOCORDER", i64::from(map.max_used_order().unwrap_or(0)));
	table.write_to(writer)?;

	for &record in &records {
		if wide {
			writer.write_i64::<BigEndian>(record)?;
		} else {
			writer.write_i32::<BigEndian>(record as i32)?;
		}
	}

	// Zero-pad the data section to a block boundary.
	let data_len = records.len() * record_size;
	let padding = (BLOCK_SIZE - data_len % BLOCK_SIZE) % BLOCK_SIZE;
	writer.write_all(&vec![0u8; padding])?;

	debug!(
		"wrote {} records of {} bytes ({})",
		records.len(),
		record_size,
		if compressed { "run-length" } else { "plain" }
	);
	Ok(())
}

/// Collapses a sorted uniq list into `(start, ±n)` record pairs.
fn run_length_records(uniqs: &[u64]) -> Vec<i64> {
	let mut records = Vec::new();
	let mut pending_single: Option<u64> = None;
	let mut start = 0;

	while start < uniqs.len() {
		let mut end = start;
		while end + 1 < uniqs.len() && uniqs[end + 1] == uniqs[end] + 1 {
			end += 1;
		}
		let length = (end - start + 1) as i64;

		if length == 1 {
			match pending_single.take() {
				None => pending_single = Some(uniqs[start]),
				Some(first) => {
					records.push(first as i64);
					records.push(-(uniqs[start] as i64));
				}
			}
		} else {
			if let Some(first) = pending_single.take() {
				records.push(first as i64);
				records.push(1);
			}
			records.push(uniqs[start] as i64);
			records.push(length);
		}
		start = end + 1;
	}

	if let Some(first) = pending_single {
		records.push(first as i64);
		records.push(1);
	}
	records
}
