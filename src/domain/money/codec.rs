//! Byte encoding of monetary amounts for cache storage
//!
//! The payload is the canonical decimal string of the minor-unit integer.
//! The currency is not carried in the payload; the codec is configured with
//! exactly one currency and stamps it onto every decoded amount.

use std::fmt::Debug;

use thiserror::Error;

use super::{Currency, Money};

/// Failure to turn stored bytes back into an amount
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty payload")]
    Empty,

    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("payload '{0}' is not an integer minor-unit amount")]
    NotAnInteger(String),

    #[error("payload '{0}' is not in canonical form")]
    NonCanonical(String),

    #[error("currency mismatch: codec is configured for {expected}, amount is in {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

/// Bidirectional conversion between `Money` and bytes
pub trait MoneyCodec: Send + Sync + Debug {
    /// Encodes an amount; `None` produces the absent sentinel
    fn encode(&self, amount: Option<&Money>) -> Vec<u8>;

    /// Decodes a non-sentinel payload
    fn decode(&self, bytes: &[u8]) -> Result<Money, DecodeError>;

    /// True when `bytes` is the sentinel written for an absent amount
    fn is_absent(&self, bytes: &[u8]) -> bool;

    /// The currency stamped on decoded amounts
    fn currency(&self) -> &Currency;

    /// Encodes an amount, refusing one in a foreign currency
    fn encode_checked(&self, amount: Option<&Money>) -> Result<Vec<u8>, DecodeError> {
        if let Some(money) = amount {
            if money.currency() != self.currency() {
                return Err(DecodeError::CurrencyMismatch {
                    expected: self.currency().code().to_string(),
                    actual: money.currency().code().to_string(),
                });
            }
        }

        Ok(self.encode(amount))
    }
}

/// Codec writing the minor-unit amount as a decimal string (`15000` for TWD 150.00)
#[derive(Debug, Clone)]
pub struct DecimalMinorCodec {
    currency: Currency,
}

impl DecimalMinorCodec {
    pub fn new(currency: Currency) -> Self {
        Self { currency }
    }
}

impl MoneyCodec for DecimalMinorCodec {
    fn encode(&self, amount: Option<&Money>) -> Vec<u8> {
        match amount {
            Some(money) => money.amount_minor().to_string().into_bytes(),
            None => Vec::new(),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<Money, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;
        let amount_minor: i64 = text
            .parse()
            .map_err(|_| DecodeError::NotAnInteger(text.to_string()))?;

        // "+5", "007" and "-0" all parse, only the canonical spelling is accepted
        if amount_minor.to_string() != text {
            return Err(DecodeError::NonCanonical(text.to_string()));
        }

        Ok(Money::of_minor(self.currency.clone(), amount_minor))
    }

    fn is_absent(&self, bytes: &[u8]) -> bool {
        bytes.is_empty()
    }

    fn currency(&self) -> &Currency {
        &self.currency
    }
}
