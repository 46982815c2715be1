//! Exact decimal deserialization for document fields.
//!
//! JSON numbers arrive as their literal text (serde_json's
//! `arbitrary_precision`), strings are parsed as written, and TOML floats
//! go through their shortest round-trip spelling, so `0.1` reads as
//! exactly one tenth in every format.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserializer;
use serde::de::{self, MapAccess, Visitor};

const JSON_NUMBER_TOKEN: &str = "$serde_json::private::Number";

pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DecimalVisitor)
}

pub(crate) fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(OptionVisitor)
}

pub(crate) fn parse<E: de::Error>(text: &str) -> Result<BigDecimal, E> {
    BigDecimal::from_str(text).map_err(|e| E::custom(format!("{text:?} is not a decimal: {e}")))
}

/// Reads a JSON number that `arbitrary_precision` wrapped in its private map.
pub(crate) fn visit_json_number<'de, A: MapAccess<'de>>(mut map: A) -> Result<BigDecimal, A::Error> {
    match map.next_key::<String>()? {
        Some(key) if key == JSON_NUMBER_TOKEN => {
            let text: String = map.next_value()?;
            parse(&text)
        }
        _ => Err(de::Error::invalid_type(de::Unexpected::Map, &"a decimal number")),
    }
}

struct DecimalVisitor;

impl<'de> Visitor<'de> for DecimalVisitor {
    type Value = BigDecimal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal number or decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<BigDecimal, E> {
        Ok(BigDecimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<BigDecimal, E> {
        Ok(BigDecimal::from(v))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<BigDecimal, E> {
        Ok(BigDecimal::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<BigDecimal, E> {
        Ok(BigDecimal::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<BigDecimal, E> {
        if !v.is_finite() {
            return Err(E::invalid_value(de::Unexpected::Float(v), &self));
        }
        parse(&v.to_string())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<BigDecimal, E> {
        parse(v)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<BigDecimal, A::Error> {
        visit_json_number(map)
    }
}

struct OptionVisitor;

impl<'de> Visitor<'de> for OptionVisitor {
    type Value = Option<BigDecimal>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an optional decimal")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(deserialize_with = "deserialize")]
        value: BigDecimal,
        #[serde(default, deserialize_with = "deserialize_option")]
        limit: Option<BigDecimal>,
    }

    #[test]
    fn json_fraction_is_exact() {
        let h: Holder = serde_json::from_str(r#"{ "value": 0.1, "limit": 0.3 }"#).unwrap();
        assert_eq!(h.value, "0.1".parse::<BigDecimal>().unwrap());
        assert_eq!(h.limit, Some("0.3".parse::<BigDecimal>().unwrap()));
    }

    #[test]
    fn json_wide_integer_is_exact() {
        let h: Holder = serde_json::from_str(r#"{ "value": 123456789012345678901 }"#).unwrap();
        assert_eq!(h.value, "123456789012345678901".parse::<BigDecimal>().unwrap());
        assert_eq!(h.limit, None);
    }

    #[test]
    fn toml_float_uses_shortest_spelling() {
        let h: Holder = toml::from_str("value = 0.1\nlimit = \"2.50\"\n").unwrap();
        assert_eq!(h.value, "0.1".parse::<BigDecimal>().unwrap());
        assert_eq!(h.limit, Some("2.5".parse::<BigDecimal>().unwrap()));
    }

    #[test]
    fn json_null_limit_is_none() {
        let h: Holder = serde_json::from_str(r#"{ "value": "7", "limit": null }"#).unwrap();
        assert_eq!(h.value, BigDecimal::from(7));
        assert_eq!(h.limit, None);
    }
}
