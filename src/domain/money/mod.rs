//! Money domain - exact amounts and their cache encoding

mod codec;
mod currency;
#[allow(clippy::module_inception)]
mod money;

pub use codec::{DecimalMinorCodec, DecodeError, MoneyCodec};
pub use currency::Currency;
pub use money::Money;
