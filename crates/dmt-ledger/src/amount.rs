/// Quantity in base units (18 fractional digits).
pub type Amount = u128;

pub const DECIMALS: u8 = 18;

/// One whole token in base units.
pub const UNIT: Amount = 1_000_000_000_000_000_000;

/// Scale a whole-token quantity into base units.
///
/// Cannot overflow: `u64::MAX * 10^18` fits comfortably in a `u128`.
pub const fn to_base_units(tokens: u64) -> Amount {
    tokens as Amount * UNIT
}

/// Render base units as a decimal token quantity, trimming trailing zeros.
pub fn format_units(amount: Amount) -> String {
    let whole = amount / UNIT;
    let frac = amount % UNIT;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", frac, width = DECIMALS as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Serde helper that writes amounts as decimal strings, since JSON consumers
/// routinely lose precision above 2^53.
pub mod units {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Amount;

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
