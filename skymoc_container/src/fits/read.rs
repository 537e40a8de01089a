//! Reading the binary container.

use super::header::Header;
use anyhow::{Context, Result, bail, ensure};
use byteorder::{BigEndian, ReadBytesExt};
use skymoc_core::{Cell, CoverageMap};
use std::io::Read;

/// Reads a coverage map from a FITS-convention binary stream.
///
/// Accepts both the plain uniq table (`TTYPE1 = 'UNIQ'`) and the run-length
/// table (`TTYPE1 = 'RANGE'`). Only 4- and 8-byte records are supported.
pub fn read(reader: &mut dyn Read) -> Result<CoverageMap> {
	let first = Header::read_from(reader).context("failed to read primary header")?;
	let table = if first.get("XTENSION").is_some() {
		first
	} else {
		Header::read_from(reader).context("failed to read table header")?
	};

	let record_size = table.get_int("NAXIS1")?;
	ensure!(
		record_size == 4 || record_size == 8,
		"unsupported record width: {record_size} bytes (expected 4 or 8)"
	);
	let record_count = table.get_int("NAXIS2")?;
	ensure!(record_count >= 0, "negative record count: {record_count}");

	let compressed = match table.get("TTYPE1") {
		None | Some("UNIQ") => false,
		Some("RANGE") => true,
		Some(other) => bail!("unsupported table column type: \"{other}\""),
	};
	if let Some(form) = table.get("TFORM1") {
		let matches = match record_size {
			4 => form.ends_with('J'),
			_ => form.ends_with('K'),
		};
		ensure!(matches, "table form '{form}' contradicts a {record_size}-byte record");
	}

	let mut records = Vec::with_capacity(record_count as usize);
	for index in 0..record_count {
		let record = if record_size == 4 {
			i64::from(
				reader
					.read_i32::<BigEndian>()
					.with_context(|| format!("truncated data: record {index} of {record_count}"))?,
			)
		} else {
			reader
				.read_i64::<BigEndian>()
				.with_context(|| format!("truncated data: record {index} of {record_count}"))?
		};
		records.push(record);
	}

	let mut map = CoverageMap::new_empty();
	if compressed {
		ensure!(
			records.len() % 2 == 0,
			"run-length data must come in pairs, got {} records",
			records.len()
		);
		for pair in records.chunks(2) {
			let (start, n) = (pair[0], pair[1]);
			ensure!(start > 0, "invalid uniq value: {start}");
			if n > 0 {
				for uniq in start..start + n {
					add_uniq(&mut map, uniq)?;
				}
			} else if n < 0 {
				add_uniq(&mut map, start)?;
				add_uniq(&mut map, -n)?;
			} else {
				bail!("zero run length after uniq {start}");
			}
		}
	} else {
		for &record in &records {
			ensure!(record > 0, "invalid uniq value: {record}");
			add_uniq(&mut map, record)?;
		}
	}

	if let Some(code) = table.get("COORDSYS") {
		map.set_frame(code.parse()?);
	}
	map.check_and_fix();
	Ok(map)
}

fn add_uniq(map: &mut CoverageMap, uniq: i64) -> Result<()> {
	let cell = Cell::from_uniq(uniq as u64)?;
	map.add_unchecked(cell.order, cell.idx)
}

#[cfg(test)]
mod tests {
	use super::super::write::write;
	use super::*;
	use rstest::rstest;
	use skymoc_core::{CoordinateFrame, MAX_ORDER};
	use std::io::Cursor;

	fn example_map() -> CoverageMap {
		let mut map = CoverageMap::new_empty();
		map.set_frame(CoordinateFrame::Galactic);
		for idx in 16..=20 {
			map.add_unchecked(2, idx).unwrap();
		}
		for idx in [85, 87, 99] {
			map.add_unchecked(3, idx).unwrap();
		}
		map.check_and_fix();
		map
	}

	fn assert_same_content(a: &CoverageMap, b: &CoverageMap) {
		assert_eq!(a.frame(), b.frame());
		for order in 0..=MAX_ORDER {
			assert_eq!(
				a.level(order).iter().collect::<Vec<_>>(),
				b.level(order).iter().collect::<Vec<_>>(),
				"order {order} differs"
			);
		}
	}

	#[rstest]
	#[case(false)]
	#[case(true)]
	fn test_round_trip(#[case] compressed: bool) -> Result<()> {
		let map = example_map();
		let mut buffer = Vec::new();
		write(&map, &mut buffer, compressed)?;
		let decoded = read(&mut Cursor::new(buffer))?;
		assert_same_content(&map, &decoded);
		Ok(())
	}

	#[rstest]
	#[case(false)]
	#[case(true)]
	fn test_round_trip_wide_records(#[case] compressed: bool) -> Result<()> {
		let mut map = CoverageMap::new_empty();
		map.add(20, 1_000_000)?;
		map.add(20, 1_000_001)?;
		map.add(29, 42)?;
		let mut buffer = Vec::new();
		write(&map, &mut buffer, compressed)?;
		let decoded = read(&mut Cursor::new(buffer))?;
		assert_same_content(&map, &decoded);
		Ok(())
	}

	#[test]
	fn test_round_trip_empty() -> Result<()> {
		let map = CoverageMap::new_empty();
		let mut buffer = Vec::new();
		write(&map, &mut buffer, true)?;
		let decoded = read(&mut Cursor::new(buffer))?;
		assert!(decoded.is_empty());
		Ok(())
	}

	#[test]
	fn test_truncated_stream_fails() -> Result<()> {
		let map = example_map();
		let mut buffer = Vec::new();
		write(&map, &mut buffer, false)?;
		// Cut into the data section.
		buffer.truncate(2 * super::super::header::BLOCK_SIZE + 5);
		assert!(read(&mut Cursor::new(buffer)).is_err());
		Ok(())
	}

	#[test]
	fn test_garbage_stream_fails() {
		let garbage = vec![0x42u8; 64];
		assert!(read(&mut Cursor::new(garbage)).is_err());
	}
}
