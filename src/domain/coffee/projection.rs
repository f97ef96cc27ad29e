//! The narrowed view of a coffee kept in the cache

use serde::{Deserialize, Serialize};

use super::{Coffee, CoffeeId};
use crate::domain::money::{DecodeError, Money, MoneyCodec};

/// Cached subset of a `Coffee`: identifier, name and price
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedCoffee {
    pub id: CoffeeId,
    pub name: String,
    pub price: Option<Money>,
}

/// Stored form; `price` holds the codec payload verbatim
#[derive(Debug, Serialize, Deserialize)]
struct CachedCoffeeRecord {
    id: i64,
    name: String,
    price: String,
}

impl CachedCoffee {
    /// Encodes the projection for storage
    pub fn encode(&self, codec: &dyn MoneyCodec) -> Result<Vec<u8>, DecodeError> {
        let payload = codec.encode_checked(self.price.as_ref())?;
        let price = String::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8)?;

        let record = CachedCoffeeRecord {
            id: self.id.value(),
            name: self.name.clone(),
            price,
        };

        serde_json::to_vec(&record).map_err(|e| DecodeError::MalformedRecord(e.to_string()))
    }

    /// Decodes stored bytes, checking the absent-price sentinel before the codec
    pub fn decode(bytes: &[u8], codec: &dyn MoneyCodec) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let record: CachedCoffeeRecord = serde_json::from_slice(bytes)
            .map_err(|e| DecodeError::MalformedRecord(e.to_string()))?;

        let payload = record.price.as_bytes();
        let price = if codec.is_absent(payload) {
            None
        } else {
            Some(codec.decode(payload)?)
        };

        Ok(Self {
            id: CoffeeId::new(record.id),
            name: record.name,
            price,
        })
    }

    /// Widens back to a `Coffee`; bookkeeping stays empty
    pub fn into_coffee(self) -> Coffee {
        Coffee::new(self.id, self.name, self.price)
    }
}

impl From<&Coffee> for CachedCoffee {
    fn from(coffee: &Coffee) -> Self {
        Self {
            id: coffee.id(),
            name: coffee.name().to_string(),
            price: coffee.price().cloned(),
        }
    }
}
