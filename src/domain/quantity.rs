// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Kubernetes resource quantity normalization.
//!
//! CPU quantities are normalized to millicores and memory quantities to
//! mebibytes (2^20 bytes). Fractional results are truncated toward zero.
//! Arithmetic is done on the decimal mantissa with integers so that values
//! like `1.005` or `0.29` never lose a unit to binary rounding.

use crate::shared::error::{JeraError, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

const MEBIBYTE: u128 = 1 << 20;

/// Which resource a quantity string describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Normalized to millicores.
    Cpu,
    /// Normalized to mebibytes.
    Memory,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Cpu => write!(f, "cpu"),
            ResourceKind::Memory => write!(f, "memory"),
        }
    }
}

fn quantity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([0-9]+)(?:\.([0-9]+))?([a-zA-Z]*)$").expect("quantity regex is valid")
    })
}

/// Ratio `numerator / denominator` that converts one suffix unit into the
/// normalized unit of its kind.
fn suffix_ratio(kind: ResourceKind, suffix: &str) -> Option<(u128, u128)> {
    match kind {
        ResourceKind::Cpu => match suffix {
            "" => Some((1000, 1)),
            "m" => Some((1, 1)),
            "u" => Some((1, 1_000)),
            "n" => Some((1, 1_000_000)),
            _ => None,
        },
        ResourceKind::Memory => {
            let bytes: u128 = match suffix {
                "" => 1,
                "Ki" => 1 << 10,
                "Mi" => 1 << 20,
                "Gi" => 1 << 30,
                "Ti" => 1 << 40,
                "Pi" => 1 << 50,
                "Ei" => 1 << 60,
                "k" | "K" => 1_000,
                "M" => 1_000_000,
                "G" => 1_000_000_000,
                "T" => 1_000_000_000_000,
                "P" => 1_000_000_000_000_000,
                "E" => 1_000_000_000_000_000_000,
                _ => return None,
            };
            Some((bytes, MEBIBYTE))
        }
    }
}

/// Parse a Kubernetes quantity string into millicores or mebibytes.
///
/// An empty string means "unset" and yields zero. Unknown suffixes,
/// negative numbers and anything non-numeric are rejected with
/// [`JeraError::InvalidQuantity`].
pub fn parse_quantity(value: &str, kind: ResourceKind) -> Result<u64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    let invalid = || JeraError::invalid_quantity(value, kind.to_string());

    let caps = quantity_regex().captures(trimmed).ok_or_else(invalid)?;
    let whole = &caps[1];
    let fraction = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    let suffix = caps.get(3).map(|m| m.as_str()).unwrap_or("");

    let (numerator, denominator) = suffix_ratio(kind, suffix).ok_or_else(invalid)?;

    if fraction.len() > 18 {
        return Err(invalid());
    }
    let mantissa: u128 = format!("{}{}", whole, fraction)
        .parse()
        .map_err(|_| invalid())?;
    let scale = 10u128.pow(fraction.len() as u32);

    let scaled = mantissa.checked_mul(numerator).ok_or_else(invalid)?;
    let normalized = scaled / (scale * denominator);

    u64::try_from(normalized).map_err(|_| invalid())
}

/// Parse an optional quantity, treating `None` as zero.
pub fn parse_optional(value: Option<&str>, kind: ResourceKind) -> Result<u64> {
    value.map_or(Ok(0), |v| parse_quantity(v, kind))
}

/// Canonical CPU form, e.g. `250m`.
pub fn format_cpu(millicores: u64) -> String {
    format!("{}m", millicores)
}

/// Canonical memory form, e.g. `512Mi`.
pub fn format_memory(mebibytes: u64) -> String {
    format!("{}Mi", mebibytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu(v: &str) -> u64 {
        parse_quantity(v, ResourceKind::Cpu).unwrap()
    }

    fn mem(v: &str) -> u64 {
        parse_quantity(v, ResourceKind::Memory).unwrap()
    }

    #[test]
    fn test_cpu_quantities() {
        assert_eq!(cpu("0"), 0);
        assert_eq!(cpu(""), 0);
        assert_eq!(cpu("500m"), 500);
        assert_eq!(cpu("2"), 2000);
        assert_eq!(cpu("0.5"), 500);
        assert_eq!(cpu("1.005"), 1005);
        assert_eq!(cpu("0.29"), 290);
        assert_eq!(cpu("250000u"), 250);
        assert_eq!(cpu("1500000n"), 1);
        assert_eq!(cpu(" 100m "), 100);
    }

    #[test]
    fn test_memory_quantities() {
        assert_eq!(mem(""), 0);
        assert_eq!(mem("128Mi"), 128);
        assert_eq!(mem("1Gi"), 1024);
        assert_eq!(mem("1024Ki"), 1);
        assert_eq!(mem("1536Ki"), 1);
        assert_eq!(mem("1.5Gi"), 1536);
        assert_eq!(mem("1Ti"), 1024 * 1024);
        assert_eq!(mem("1048576"), 1);
        assert_eq!(mem("1G"), 953);
        assert_eq!(mem("500M"), 476);
    }

    #[test]
    fn test_invalid_quantities() {
        for bad in ["abc", "-1", "12Xi", "1.2.3", "m", "1e3", "NaN"] {
            let err = parse_quantity(bad, ResourceKind::Memory).unwrap_err();
            assert!(
                matches!(err, JeraError::InvalidQuantity { .. }),
                "{} should be rejected",
                bad
            );
        }
        assert!(parse_quantity("128Mi", ResourceKind::Cpu).is_err());
        assert!(parse_quantity("2Gi", ResourceKind::Cpu).is_err());
    }

    #[test]
    fn test_overflow_is_rejected() {
        let huge = "999999999999999999999999999Ei";
        assert!(parse_quantity(huge, ResourceKind::Memory).is_err());
    }

    #[test]
    fn test_canonical_forms_reparse() {
        for v in [0u64, 1, 250, 1000, 123_456] {
            assert_eq!(cpu(&format_cpu(v)), v);
            assert_eq!(mem(&format_memory(v)), v);
        }
    }

    #[test]
    fn test_parse_optional() {
        assert_eq!(parse_optional(None, ResourceKind::Cpu).unwrap(), 0);
        assert_eq!(parse_optional(Some("1"), ResourceKind::Cpu).unwrap(), 1000);
    }
}
