use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::codec::decode_registers;
use crate::error::Result;

/// Decoded register values from one successful poll.
///
/// Readings are never mutated after construction; a newer poll produces a new Reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    values: Vec<i64>,
    captured_at: DateTime<Utc>,
}

impl Reading {
    pub fn new(values: Vec<i64>, captured_at: DateTime<Utc>) -> Self {
        Self {
            values,
            captured_at,
        }
    }

    /// Decode a raw register payload captured now.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        Ok(Self::new(decode_registers(payload)?, Utc::now()))
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Bracketed, space-separated rendering served by `/modbus-data`, e.g. `[10 20]`.
    pub fn legacy_format(&self) -> String {
        let joined = self
            .values
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        format!("[{joined}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_format() {
        let reading = Reading::new(vec![10, 20], Utc::now());
        assert_eq!(reading.legacy_format(), "[10 20]");
    }

    #[test]
    fn test_legacy_format_single_and_empty() {
        assert_eq!(Reading::new(vec![7], Utc::now()).legacy_format(), "[7]");
        assert_eq!(Reading::new(vec![], Utc::now()).legacy_format(), "[]");
    }

    #[test]
    fn test_from_payload() {
        let reading = Reading::from_payload(&[0x00, 0x0A, 0x00, 0x14]).unwrap();
        assert_eq!(reading.values(), &[10, 20]);
    }

    #[test]
    fn test_from_odd_payload_fails() {
        assert!(Reading::from_payload(&[0x00, 0x0A, 0x00]).is_err());
    }
}
