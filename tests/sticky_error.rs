//! Once a non-EOF error is recorded on a `Reader`, it must stick: every
//! further call returns the same error without touching the stream again.

use avro_codec_core::config::Config;
use avro_codec_core::io::Reader;

#[test]
fn non_eof_error_is_sticky_and_idempotent() {
	let config = Config::default();
	let bytes = [0x02u8]; // not a valid boolean (only 0x00/0x01 are)
	let mut reader = Reader::new(&bytes[..], &config);

	let first = reader.read_bool().unwrap_err();
	assert!(!first.is_eof());

	// Further reads must return the exact same error, not whatever the
	// underlying stream would otherwise yield (here: clean EOF).
	let second = reader.read_bool().unwrap_err();
	assert_eq!(first.to_string(), second.to_string());
	assert_eq!(reader.error().unwrap().to_string(), first.to_string());

	let third = reader.read_int().unwrap_err();
	assert_eq!(third.to_string(), first.to_string());
}

#[test]
fn eof_does_not_mask_a_later_real_error_but_is_itself_sticky() {
	let config = Config::default();
	let bytes: [u8; 0] = [];
	let mut reader = Reader::new(&bytes[..], &config);

	let err = reader.read_byte().unwrap_err();
	assert!(err.is_eof());

	let err2 = reader.read_byte().unwrap_err();
	assert!(err2.is_eof());
	assert_eq!(err.to_string(), err2.to_string());
}
