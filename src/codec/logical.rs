//! Logical type conversions (§4.5)
//!
//! A logical type rides on top of a regular type's wire encoding (an `int`,
//! `long`, `bytes` or `fixed`); these functions translate between that wire
//! representation and the dynamic [`Value`] shape a caller actually wants to
//! work with. An unrecognized `logicalType` (`LogicalType::Unknown`) is
//! handled by the caller simply not invoking any of these and falling back
//! to the underlying regular type, per the Avro specification.

use crate::error::{CodecError, ErrorKind};
use crate::schema::Value;
use rust_decimal::Decimal;

const OP: &str = "logical_type";

fn err(msg: impl Into<String>) -> CodecError {
	ErrorKind::InvalidEncoding(msg.into()).at(OP)
}

/// Encode a [`rust_decimal::Decimal`] as the two's-complement big-endian
/// unscaled integer bytes Avro's `decimal` logical type specifies, either
/// bare (`bytes`) or left-zero-padded to `fixed_size` (`fixed`).
pub fn decimal_to_bytes(
	value: &Decimal,
	scale: usize,
	fixed_size: Option<usize>,
) -> Result<Vec<u8>, CodecError> {
	let mut value = *value;
	value.rescale(scale as u32);
	let unscaled = value.mantissa();
	let negative = unscaled < 0;
	let magnitude = unscaled.unsigned_abs().to_be_bytes(); // i128 -> 16 bytes, big-endian
	let mut bytes: Vec<u8> = magnitude.to_vec();
	// Strip leading 0x00 bytes that aren't needed to keep the sign bit correct.
	while bytes.len() > 1 && bytes[0] == 0 && (bytes[1] & 0x80) == 0 {
		bytes.remove(0);
	}
	if negative {
		twos_complement_negate(&mut bytes);
		if bytes[0] & 0x80 == 0 {
			bytes.insert(0, 0xff);
		}
	} else if bytes[0] & 0x80 != 0 {
		bytes.insert(0, 0x00);
	}
	match fixed_size {
		None => Ok(bytes),
		Some(size) => {
			if bytes.len() > size {
				return Err(err(format!(
					"decimal unscaled value needs {} bytes, fixed size is {size}",
					bytes.len()
				)));
			}
			let pad = if negative { 0xff } else { 0x00 };
			let mut out = vec![pad; size - bytes.len()];
			out.extend_from_slice(&bytes);
			Ok(out)
		}
	}
}

/// Check that `value`, rescaled to `scale`, has no more than `precision`
/// significant (unscaled) decimal digits, per the encode-time precision guard
pub fn check_decimal_precision(value: &Decimal, scale: usize, precision: usize) -> Result<(), CodecError> {
	let mut rescaled = *value;
	rescaled.rescale(scale as u32);
	let digits = decimal_digit_count(rescaled.mantissa().unsigned_abs());
	if digits > precision {
		return Err(err(format!(
			"decimal value has {digits} significant digits, schema precision is {precision}"
		)));
	}
	Ok(())
}

fn decimal_digit_count(mut magnitude: u128) -> usize {
	if magnitude == 0 {
		return 1;
	}
	let mut digits = 0;
	while magnitude > 0 {
		digits += 1;
		magnitude /= 10;
	}
	digits
}

fn twos_complement_negate(bytes: &mut [u8]) {
	let mut carry = 1u16;
	for b in bytes.iter_mut().rev() {
		let inverted = !*b as u16 + carry;
		*b = inverted as u8;
		carry = inverted >> 8;
	}
}

/// Decode Avro `decimal` logical-type bytes (two's-complement big-endian
/// unscaled integer) into a [`rust_decimal::Decimal`]
pub fn bytes_to_decimal(bytes: &[u8], scale: usize) -> Result<Decimal, CodecError> {
	if bytes.is_empty() {
		return Err(err("empty decimal bytes"));
	}
	if bytes.len() > 16 {
		return Err(err(format!(
			"decimal unscaled value of {} bytes overflows i128",
			bytes.len()
		)));
	}
	let negative = bytes[0] & 0x80 != 0;
	let pad = if negative { 0xff } else { 0x00 };
	let mut buf = [pad; 16];
	buf[16 - bytes.len()..].copy_from_slice(bytes);
	let unscaled = i128::from_be_bytes(buf);
	Ok(Decimal::from_i128_with_scale(unscaled, scale as u32))
}

/// Encode an Avro `duration` logical value (months, days, milliseconds) as
/// its 12-byte little-endian triple
pub fn duration_to_bytes(months: u32, days: u32, millis: u32) -> [u8; 12] {
	let mut out = [0u8; 12];
	out[0..4].copy_from_slice(&months.to_le_bytes());
	out[4..8].copy_from_slice(&days.to_le_bytes());
	out[8..12].copy_from_slice(&millis.to_le_bytes());
	out
}

/// Decode a `duration` logical value's 12-byte little-endian triple
pub fn bytes_to_duration(bytes: &[u8]) -> Result<(u32, u32, u32), CodecError> {
	if bytes.len() != 12 {
		return Err(err(format!(
			"duration logical type requires fixed(12), got {} bytes",
			bytes.len()
		)));
	}
	let months = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
	let days = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
	let millis = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
	Ok((months, days, millis))
}

/// Validate that `s` is a canonical (hyphenated, lowercase-or-uppercase hex)
/// UUID string, per the `uuid` logical type
pub fn validate_uuid(s: &str) -> Result<(), CodecError> {
	let bytes = s.as_bytes();
	if bytes.len() != 36 {
		return Err(err(format!("invalid uuid string length {}", bytes.len())));
	}
	for (i, b) in bytes.iter().enumerate() {
		let expect_dash = matches!(i, 8 | 13 | 18 | 23);
		if expect_dash {
			if *b != b'-' {
				return Err(err("invalid uuid string: expected '-'"));
			}
		} else if !b.is_ascii_hexdigit() {
			return Err(err("invalid uuid string: expected hex digit"));
		}
	}
	Ok(())
}

/// Extract the `i64` payload of a [`Value::TimeLike`], or error
pub fn time_like(value: &Value) -> Result<i64, CodecError> {
	match value {
		Value::TimeLike(v) => Ok(*v),
		other => Err(ErrorKind::SchemaMismatch(format!(
			"expected a date/time/timestamp value, got {}",
			other.kind_name()
		))
		.at(OP)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decimal_round_trips() {
		for (value, scale) in [
			(Decimal::new(12345, 2), 2),
			(Decimal::new(-12345, 2), 2),
			(Decimal::new(0, 0), 0),
			(Decimal::new(-1, 0), 0),
		] {
			let bytes = decimal_to_bytes(&value, scale, None).unwrap();
			let back = bytes_to_decimal(&bytes, scale).unwrap();
			assert_eq!(value, back, "scale={scale}");
		}
	}

	#[test]
	fn decimal_fixed_padding() {
		let value = Decimal::new(1, 2); // 0.01
		let bytes = decimal_to_bytes(&value, 2, Some(8)).unwrap();
		assert_eq!(bytes.len(), 8);
		assert_eq!(bytes_to_decimal(&bytes, 2).unwrap(), value);
	}

	#[test]
	fn decimal_precision_guard_rejects_too_many_digits() {
		let value = Decimal::new(123456, 2); // 1234.56, 6 significant digits
		assert!(check_decimal_precision(&value, 2, 6).is_ok());
		assert!(check_decimal_precision(&value, 2, 5).is_err());
	}

	#[test]
	fn duration_round_trips() {
		let bytes = duration_to_bytes(1, 2, 3);
		assert_eq!(bytes_to_duration(&bytes).unwrap(), (1, 2, 3));
	}

	#[test]
	fn uuid_validation() {
		assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
		assert!(validate_uuid("not-a-uuid").is_err());
	}
}
