//! Reading both text forms.
//!
//! The first non-blank character decides the format: `{` starts the
//! brace-delimited form, anything else the legacy line-oriented form.
//! Decoding appends ids without consistency checking and finishes with one
//! repair pass, so the result is always consistent.

use anyhow::{Context, Error, Result, anyhow, bail, ensure};
use skymoc_core::{CoverageMap, MAX_ORDER};
use std::io::Read;

/// Reads a coverage map from a text stream (wholesale).
pub fn read(reader: &mut dyn Read) -> Result<CoverageMap> {
	let mut text = String::new();
	reader
		.read_to_string(&mut text)
		.context("failed to read coverage text")?;
	parse(&text)
}

/// Parses a coverage map from either text form.
pub fn parse(text: &str) -> Result<CoverageMap> {
	match text.bytes().find(|b| !b.is_ascii_whitespace()) {
		None => bail!("empty coverage text"),
		Some(b'{') => parse_braced(text),
		Some(_) => parse_legacy(text),
	}
}

/// Byte cursor over the brace-delimited form. All parser state lives here,
/// not on the map being built.
struct AsciiParser<'a> {
	bytes: &'a [u8],
	position: usize,
}

impl<'a> AsciiParser<'a> {
	fn new(text: &'a str) -> AsciiParser<'a> {
		AsciiParser {
			bytes: text.as_bytes(),
			position: 0,
		}
	}

	fn error(&self, message: &str) -> Error {
		anyhow!("{message} at position {}", self.position)
	}

	fn peek(&self) -> Option<u8> {
		self.bytes.get(self.position).copied()
	}

	fn advance(&mut self) {
		self.position += 1;
	}

	fn skip_whitespace(&mut self) {
		while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
			self.advance();
		}
	}

	fn expect(&mut self, expected: u8) -> Result<()> {
		match self.peek() {
			Some(b) if b == expected => {
				self.advance();
				Ok(())
			}
			_ => Err(self.error(&format!("expected '{}'", expected as char))),
		}
	}

	fn parse_u64(&mut self) -> Result<u64> {
		let start = self.position;
		while self.peek().is_some_and(|b| b.is_ascii_digit()) {
			self.advance();
		}
		if start == self.position {
			return Err(self.error("expected a number"));
		}
		std::str::from_utf8(&self.bytes[start..self.position])?
			.parse()
			.map_err(|_| self.error("number too large"))
	}

	fn at_end(&self) -> bool {
		self.position >= self.bytes.len()
	}
}

/// Parses one `id` or `id-id` entry and appends it to `map`.
fn parse_id_entry(parser: &mut AsciiParser, map: &mut CoverageMap, order: u8) -> Result<()> {
	let lo = parser.parse_u64()?;
	parser.skip_whitespace();
	let hi = if parser.peek() == Some(b'-') {
		parser.advance();
		parser.skip_whitespace();
		parser.parse_u64()?
	} else {
		lo
	};
	ensure!(lo <= hi, "invalid id range {lo}-{hi}");
	for idx in lo..=hi {
		map.add_unchecked(order, idx)?;
	}
	Ok(())
}

fn parse_braced(text: &str) -> Result<CoverageMap> {
	let mut parser = AsciiParser::new(text);
	let mut map = CoverageMap::new_empty();

	parser.skip_whitespace();
	parser.expect(b'{')?;
	parser.skip_whitespace();

	if parser.peek() == Some(b'}') {
		parser.advance();
	} else {
		'entries: loop {
			parser.skip_whitespace();

			// Order key, with or without quotes.
			let quoted = parser.peek() == Some(b'"');
			if quoted {
				parser.advance();
			}
			let order = parser.parse_u64()?;
			ensure!(order <= u64::from(MAX_ORDER), "order ({order}) must be <= {MAX_ORDER}");
			if quoted {
				parser.expect(b'"')?;
			}

			parser.skip_whitespace();
			parser.expect(b':')?;
			parser.skip_whitespace();
			parser.expect(b'[')?;
			parser.skip_whitespace();

			if parser.peek() == Some(b']') {
				parser.advance();
			} else {
				loop {
					parser.skip_whitespace();
					parse_id_entry(&mut parser, &mut map, order as u8)?;
					parser.skip_whitespace();
					match parser.peek() {
						Some(b',') => parser.advance(),
						Some(b']') => {
							parser.advance();
							break;
						}
						_ => return Err(parser.error("expected ',' or ']'")),
					}
				}
			}

			parser.skip_whitespace();
			match parser.peek() {
				Some(b',') => {
					parser.advance();
					parser.skip_whitespace();
					// Tolerate a trailing comma before the closing brace.
					if parser.peek() == Some(b'}') {
						parser.advance();
						break 'entries;
					}
				}
				Some(b'}') => {
					parser.advance();
					break 'entries;
				}
				_ => return Err(parser.error("expected ',' or '}'")),
			}
		}
	}

	parser.skip_whitespace();
	if !parser.at_end() {
		return Err(parser.error("unexpected trailing content"));
	}

	map.check_and_fix();
	Ok(map)
}

fn parse_legacy(text: &str) -> Result<CoverageMap> {
	let mut map = CoverageMap::new_empty();
	let mut current_order: Option<u8> = None;

	for (line_number, line) in text.lines().enumerate() {
		let line = line.split_once('#').map_or(line, |(head, _)| head);
		for token in line.split_whitespace() {
			parse_legacy_token(token, &mut map, &mut current_order)
				.with_context(|| format!("in line {}", line_number + 1))?;
		}
	}

	map.check_and_fix();
	Ok(map)
}

fn parse_legacy_token(token: &str, map: &mut CoverageMap, current_order: &mut Option<u8>) -> Result<()> {
	if let Some(value) = token.strip_prefix("ORDER=") {
		let order: u64 = value.parse().with_context(|| format!("invalid order \"{value}\""))?;
		ensure!(order <= u64::from(MAX_ORDER), "order ({order}) must be <= {MAX_ORDER}");
		*current_order = Some(order as u8);
	} else if let Some(value) = token.strip_prefix("NSIDE=") {
		let nside: u64 = value.parse().with_context(|| format!("invalid nside \"{value}\""))?;
		ensure!(nside.is_power_of_two(), "nside ({nside}) must be a power of two");
		let order = nside.trailing_zeros();
		ensure!(order <= u32::from(MAX_ORDER), "nside ({nside}) exceeds the maximum order");
		*current_order = Some(order as u8);
	} else if let Some(value) = token.strip_prefix("COORDSYS=") {
		map.set_frame(value.parse()?);
	} else {
		let order = current_order.ok_or_else(|| anyhow!("id \"{token}\" before any ORDER/NSIDE header"))?;
		let (lo, hi) = match token.split_once('-') {
			None => {
				let idx = token.parse().with_context(|| format!("invalid id \"{token}\""))?;
				(idx, idx)
			}
			Some((lo, hi)) => (
				lo.parse().with_context(|| format!("invalid id range \"{token}\""))?,
				hi.parse().with_context(|| format!("invalid id range \"{token}\""))?,
			),
		};
		ensure!(lo <= hi, "invalid id range \"{token}\"");
		for idx in lo..=hi {
			map.add_unchecked(order, idx)?;
		}
	}
	Ok(())
}
