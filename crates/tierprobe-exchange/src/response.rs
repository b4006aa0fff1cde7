//! REST response types.
//!
//! Every endpoint wraps its payload as `{"code": 0, "msg": "", "data": ...}`.
//! Numeric fields arrive as either JSON numbers or strings depending on the
//! endpoint, so they are read through [`deserialize_decimal`].

use rust_decimal::Decimal;
use serde::Deserialize;

/// Response envelope shared by all endpoints.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

/// Payload of `GET /openApi/swap/v2/trade/leverage`.
#[derive(Debug, Clone, Deserialize)]
pub struct LeverageData {
    #[serde(rename = "longLeverage", deserialize_with = "deserialize_decimal")]
    pub long_leverage: Decimal,
    #[serde(rename = "shortLeverage", default, deserialize_with = "deserialize_opt_decimal")]
    pub short_leverage: Option<Decimal>,
    #[serde(rename = "maxLongLeverage", default, deserialize_with = "deserialize_opt_decimal")]
    pub max_long_leverage: Option<Decimal>,
}

/// Payload of `POST /openApi/swap/v2/trade/leverage`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetLeverageData {
    #[serde(default, deserialize_with = "deserialize_opt_decimal")]
    pub leverage: Option<Decimal>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(
        rename = "maxPositionLongVal",
        default,
        deserialize_with = "deserialize_opt_decimal"
    )]
    pub max_position_long_val: Option<Decimal>,
}

/// One entry of `GET /openApi/swap/v2/quote/contracts`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractInfo {
    pub symbol: String,
    #[serde(rename = "maxLongLeverage", default)]
    pub max_long_leverage: Option<u32>,
    #[serde(rename = "maxShortLeverage", default)]
    pub max_short_leverage: Option<u32>,
    #[serde(rename = "pricePrecision", default)]
    pub price_precision: Option<u32>,
    #[serde(
        rename = "tradeMinUSDT",
        default,
        deserialize_with = "deserialize_opt_decimal"
    )]
    pub trade_min_usdt: Option<Decimal>,
    #[serde(default)]
    pub status: Option<i64>,
}

fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_opt_decimal(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("expected a number, got null"))
}

/// Deserialize a Decimal from a string, number, or null.
fn deserialize_opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct DecimalVisitor;

    impl<'de> Visitor<'de> for DecimalVisitor {
        type Value = Option<Decimal>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number, or null")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.trim().is_empty() {
                return Ok(None);
            }
            v.trim().parse::<Decimal>().map(Some).map_err(de::Error::custom)
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            // Go through the shortest string repr to avoid binary float artifacts.
            v.to_string()
                .parse::<Decimal>()
                .map(Some)
                .map_err(de::Error::custom)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Decimal::from(v)))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Decimal::from(v)))
        }
    }

    deserializer.deserialize_any(DecimalVisitor)
}
