//! Fixed-size header records: 80-byte `KEY     = value` cards collected
//! into 2880-byte blocks, terminated by an `END` card.

use anyhow::{Context, Result, bail, ensure};
use std::io::{Read, Write};

pub(crate) const CARD_SIZE: usize = 80;
pub(crate) const BLOCK_SIZE: usize = 2880;

/// One parsed or pending header: an ordered list of key/value cards.
///
/// Pending cards hold their value in card syntax (quoted strings, aligned
/// numbers); parsed cards hold the bare value, unquoted and trimmed.
pub(crate) struct Header {
	cards: Vec<(String, String)>,
}

impl Header {
	pub fn new() -> Header {
		Header { cards: Vec::new() }
	}

	pub fn push_str(&mut self, key: &str, value: &str) {
		self.cards.push((key.to_string(), format!("'{value}'")));
	}

	pub fn push_int(&mut self, key: &str, value: i64) {
		self.cards.push((key.to_string(), format!("{value:>20}")));
	}

	pub fn push_bool(&mut self, key: &str, value: bool) {
		let letter = if value { "T" } else { "F" };
		self.cards.push((key.to_string(), format!("{letter:>20}")));
	}

	/// The raw value of a card, unquoted and trimmed.
	pub fn get(&self, key: &str) -> Option<&str> {
		self
			.cards
			.iter()
			.find(|(k, _)| k == key)
			.map(|(_, value)| value.as_str())
	}

	pub fn get_int(&self, key: &str) -> Result<i64> {
		let value = self
			.get(key)
			.with_context(|| format!("missing header card {key}"))?;
		value
			.parse()
			.with_context(|| format!("header card {key} is not an integer: \"{value}\""))
	}

	/// Writes all cards plus `END`, space-padded to a block boundary.
	pub fn write_to(&self, writer: &mut dyn Write) -> Result<()> {
		let mut block = String::new();
		for (key, value) in &self.cards {
			block.push_str(&format!("{key:<8}= {value:<70}")[..CARD_SIZE]);
		}
		block.push_str(&format!("{:<80}", "END"));
		while block.len() % BLOCK_SIZE != 0 {
			block.push(' ');
		}
		writer.write_all(block.as_bytes())?;
		Ok(())
	}

	/// Reads blocks until the `END` card. Non-value cards (COMMENT and the
	/// like) are skipped; string values lose their quotes, and everything
	/// after a `/` comment separator is dropped.
	pub fn read_from(reader: &mut dyn Read) -> Result<Header> {
		let mut header = Header::new();
		loop {
			let mut block = [0u8; BLOCK_SIZE];
			reader.read_exact(&mut block).context("truncated header block")?;

			for card in block.chunks(CARD_SIZE) {
				let key = std::str::from_utf8(&card[0..8]).context("malformed header card key")?;
				let key = key.trim_end();
				if key == "END" {
					return Ok(header);
				}
				if key.is_empty() || &card[8..10] != b"= " {
					continue;
				}
				let raw = std::str::from_utf8(&card[10..]).context("malformed header card value")?;
				header.cards.push((key.to_string(), parse_value(raw)?));
			}
		}
	}
}

fn parse_value(raw: &str) -> Result<String> {
	let raw = raw.trim_start();
	if let Some(rest) = raw.strip_prefix('\'') {
		match rest.find('\'') {
			Some(end) => Ok(rest[..end].trim_end().to_string()),
			None => bail!("unterminated string value in header card"),
		}
	} else {
		let value = raw.split('/').next().unwrap_or("").trim();
		ensure!(!value.is_empty(), "empty header card value");
		Ok(value.to_string())
	}
}
