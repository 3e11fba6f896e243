//! Banner protocol: the programmer's identification line.
//!
//! After the wake-up byte the programmer answers with one line of the form
//! `<device> <capacity_bytes>`, e.g. `EPCQ16A 2097152`.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Parsed identification line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Banner {
    /// Flash device identifier as reported by the programmer.
    pub device_name: String,
    /// Addressable flash capacity in bytes.
    pub capacity_bytes: usize,
}

impl Banner {
    /// Parse a banner line (without its newline).
    pub fn parse(line: &str) -> Result<Self> {
        let fail = |reason: &str| Error::Banner {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let mut fields = line.split_whitespace();
        let device_name = fields.next().ok_or_else(|| fail("empty line"))?;
        let capacity = fields
            .next()
            .ok_or_else(|| fail("missing capacity"))?;
        if fields.next().is_some() {
            return Err(fail("unexpected trailing fields"));
        }

        let capacity_bytes = capacity
            .parse::<usize>()
            .map_err(|e| fail(&format!("invalid capacity '{capacity}': {e}")))?;

        Ok(Self {
            device_name: device_name.to_string(),
            capacity_bytes,
        })
    }
}

impl FromStr for Banner {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Banner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device: {} Capacity: {}",
            self.device_name, self.capacity_bytes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_banner() {
        let banner = Banner::parse("EPCQ16A 2097152").unwrap();
        assert_eq!(banner.device_name, "EPCQ16A");
        assert_eq!(banner.capacity_bytes, 2097152);
    }

    #[test]
    fn test_parse_banner_extra_whitespace() {
        let banner: Banner = "  W25Q32\t 4194304 \r".parse().unwrap();
        assert_eq!(banner.device_name, "W25Q32");
        assert_eq!(banner.capacity_bytes, 4194304);
    }

    #[test]
    fn test_parse_banner_zero_capacity() {
        assert_eq!(Banner::parse("blank 0").unwrap().capacity_bytes, 0);
    }

    #[test]
    fn test_parse_banner_recovers_fields() {
        let names = ["A", "EPCQ4A", "x-y_z.1", "名前"];
        let capacities = [0usize, 1, 256, 65_536, 16_777_216, usize::MAX];
        for name in names {
            for capacity in capacities {
                let banner = Banner::parse(&format!("{name} {capacity}")).unwrap();
                assert_eq!(banner.device_name, name);
                assert_eq!(banner.capacity_bytes, capacity);
            }
        }
    }

    #[test]
    fn test_parse_banner_rejects_malformed() {
        for line in ["", "   ", "EPCQ16A", "EPCQ16A -1", "EPCQ16A big", "EPCQ16A 12 extra"] {
            let err = Banner::parse(line).unwrap_err();
            assert!(matches!(err, Error::Banner { .. }), "accepted {line:?}");
        }
    }

    #[test]
    fn test_parse_banner_rejects_overflow() {
        let line = format!("EPCQ16A {}0", usize::MAX);
        assert!(Banner::parse(&line).is_err());
    }

    #[test]
    fn test_banner_error_keeps_line() {
        let err = Banner::parse("garbage").unwrap_err();
        assert!(err.to_string().contains("[garbage]"));
    }

    #[test]
    fn test_display() {
        let banner = Banner::parse("EPCQ4A 524288").unwrap();
        assert_eq!(banner.to_string(), "Device: EPCQ4A Capacity: 524288");
    }
}
