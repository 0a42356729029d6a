//! Serde helpers for the wire formats of the remote services.

use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{de, ser, Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    String(String),
}

impl NumberOrString {
    fn into_text(self) -> String {
        match self {
            NumberOrString::Number(n) => n.to_string(),
            NumberOrString::String(s) => s,
        }
    }
}

/// Accept `10`, `9.99` or `"9.99"`.
///
/// JSON numbers are buffered as `f64` and re-read from their shortest decimal
/// form, which is exact up to 15 significant digits. Prices that need more
/// must be sent as strings.
pub fn decimal_from_number_or_string<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let text = NumberOrString::deserialize(deserializer)?.into_text();
    BigDecimal::from_str(text.trim()).map_err(de::Error::custom)
}

/// Product ids are opaque; catalogs keyed by integers are accepted too.
pub fn string_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(NumberOrString::deserialize(deserializer)?.into_text())
}

/// Integral amounts are written as integers, anything else as a float.
pub fn decimal_as_number<S>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_integer() {
        if let Some(n) = value.to_i64() {
            return serializer.serialize_i64(n);
        }
    }
    let n = value
        .to_f64()
        .ok_or_else(|| ser::Error::custom(format!("{value} is not representable as a number")))?;
    serializer.serialize_f64(n)
}
