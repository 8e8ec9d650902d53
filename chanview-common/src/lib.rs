#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

pub trait HexEncode {
	fn to_hex(&self) -> String;
}

impl<T: hex::ToHex> HexEncode for T {
	fn to_hex(&self) -> String {
		self.encode_hex()
	}
}

/// Decode a hex string, accepting either case
pub fn decode_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
	hex::decode(s)
}

/// Render bytes as an abbreviated hex string for log lines
pub fn short_hex(bytes: &[u8], prefix_len: usize) -> String {
	let full = bytes.to_hex();
	if full.len() <= prefix_len {
		full
	} else {
		let mut s = String::from(&full[..prefix_len]);
		s.push_str("..");
		s
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hex_encode_test() {
		assert_eq!([0xabu8, 0x01].to_hex(), "ab01");
		assert_eq!(decode_hex("AB01").unwrap(), vec![0xab, 0x01]);
		assert!(decode_hex("abc").is_err());
	}

	#[test]
	fn short_hex_test() {
		assert_eq!(short_hex(&[0x12, 0x34, 0x56], 4), "1234..");
		assert_eq!(short_hex(&[0x12], 4), "12");
	}
}
