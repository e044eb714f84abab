//! HAP pairing setup values.
//!
//! The setup code and setup identifier are static configuration. They are
//! validated at startup and combined into the `X-HM://` setup URI that iOS
//! encodes in the pairing QR code.

use crate::error::{BridgeError, Result};
use crate::hap::types::AccessoryCategory;
use std::fmt;
use std::str::FromStr;

/// Transport flag for IP accessories in the setup payload.
const SETUP_FLAG_IP: u64 = 2;

/// Codes HomeKit refuses as too easy to guess.
const TRIVIAL_CODES: [u32; 12] = [
    0, 11111111, 22222222, 33333333, 44444444, 55555555, 66666666, 77777777, 88888888, 99999999,
    12345678, 87654321,
];

/// Eight-digit setup code, written `XXX-XX-XXX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupCode(u32);

impl SetupCode {
    pub fn value(self) -> u32 {
        self.0
    }

    /// True for codes iOS refuses to pair with (`111-11-111`, `123-45-678`, ...).
    pub fn is_trivial(self) -> bool {
        TRIVIAL_CODES.contains(&self.0)
    }
}

impl FromStr for SetupCode {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || BridgeError::InvalidConfig(format!("setup code {:?} is not XXX-XX-XXX", s));

        let groups: Vec<&str> = s.split('-').collect();
        let shape_ok = groups.len() == 3
            && groups[0].len() == 3
            && groups[1].len() == 2
            && groups[2].len() == 3
            && groups.iter().all(|g| g.bytes().all(|b| b.is_ascii_digit()));
        if !shape_ok {
            return Err(invalid());
        }

        groups.concat().parse().map(Self).map_err(|_| invalid())
    }
}

impl fmt::Display for SetupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = format!("{:08}", self.0);
        write!(f, "{}-{}-{}", &digits[..3], &digits[3..5], &digits[5..])
    }
}

/// Four character setup identifier (`0-9`, `A-Z`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupId(String);

impl SetupId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SetupId {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        let valid = s.len() == 4
            && s
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase());
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(BridgeError::InvalidConfig(format!(
                "setup id {:?} must be 4 characters of 0-9/A-Z",
                s
            )))
        }
    }
}

impl fmt::Display for SetupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the `X-HM://` setup URI.
///
/// Payload bits: category (31..39), flags (27..31), setup code (0..27). The
/// payload is written in upper-case base 36, padded to 9 characters, and the
/// setup id is appended.
pub fn setup_uri(code: SetupCode, id: &SetupId, category: AccessoryCategory) -> String {
    let payload = (u64::from(category.code()) << 31)
        | (SETUP_FLAG_IP << 27)
        | u64::from(code.value() & 0x07FF_FFFF);
    format!("X-HM://{}{}", base36(payload, 9), id)
}

fn base36(mut value: u64, width: usize) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    while out.len() < width {
        out.push(b'0');
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_setup_code() {
        let code: SetupCode = "031-45-154".parse().unwrap();
        assert_eq!(code.value(), 3145154);
        assert_eq!(code.to_string(), "031-45-154");
        assert!(!code.is_trivial());
    }

    #[test]
    fn test_reject_malformed_setup_code() {
        for bad in ["11111111", "111-111-11", "11a-11-111", "111-11-1111", ""] {
            assert!(bad.parse::<SetupCode>().is_err(), "{} accepted", bad);
        }
    }

    #[test]
    fn test_trivial_codes_are_flagged() {
        assert!("111-11-111".parse::<SetupCode>().unwrap().is_trivial());
        assert!("123-45-678".parse::<SetupCode>().unwrap().is_trivial());
    }

    #[test]
    fn test_setup_id() {
        assert_eq!("ABCD".parse::<SetupId>().unwrap().as_str(), "ABCD");
        assert!("abcd".parse::<SetupId>().is_err());
        assert!("ABC".parse::<SetupId>().is_err());
    }

    #[test]
    fn test_setup_uri() {
        let code: SetupCode = "111-11-111".parse().unwrap();
        let id: SetupId = "ABCD".parse().unwrap();
        assert_eq!(
            setup_uri(code, &id, AccessoryCategory::Thermostat),
            "X-HM://00909FWEFABCD"
        );

        let code: SetupCode = "031-45-154".parse().unwrap();
        assert_eq!(
            setup_uri(code, &id, AccessoryCategory::Other),
            "X-HM://001408XXEABCD"
        );
    }

    #[test]
    fn test_base36_padding() {
        assert_eq!(base36(0, 9), "000000000");
        assert_eq!(base36(35, 2), "0Z");
        assert_eq!(base36(36, 1), "10");
    }
}
