//! Lenient deserializers.
//!
//! Catalog documents are filled in by hand, so price, yield and quantity
//! fields arrive as numbers, numeric strings, `null`, or garbage. Anything
//! that is not a finite number becomes "absent" and the engine falls back to
//! its defaults instead of rejecting the whole document.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::models::{ItemKind, YieldPercentage, YieldQuantity};

/// Deserialize an optional finite number.
///
/// Use together with `#[serde(default)]` so a missing field is also `None`.
pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(finite_number))
}

/// Deserialize a yield percentage, defaulting to 100% when unusable.
pub fn yield_percentage<'de, D>(deserializer: D) -> Result<YieldPercentage, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(deserializer)?
        .map(YieldPercentage::new)
        .unwrap_or_default())
}

/// Deserialize a yield quantity; unusable values become zero.
pub fn yield_quantity<'de, D>(deserializer: D) -> Result<YieldQuantity, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(deserializer)?
        .map(YieldQuantity::new)
        .unwrap_or_default())
}

/// Deserialize an optional composition item kind; unknown spellings become `None`.
pub fn item_kind<'de, D>(deserializer: D) -> Result<Option<ItemKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn finite_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "number")]
        value: Option<f64>,
        #[serde(default, deserialize_with = "yield_percentage")]
        percent: YieldPercentage,
        #[serde(default, deserialize_with = "item_kind")]
        kind: Option<ItemKind>,
    }

    fn sample(json: &str) -> Sample {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_accepts_numbers_and_numeric_strings() {
        assert_eq!(sample(r#"{"value": 12.5}"#).value, Some(12.5));
        assert_eq!(sample(r#"{"value": "12.5"}"#).value, Some(12.5));
        assert_eq!(sample(r#"{"value": " 7 "}"#).value, Some(7.0));
        assert_eq!(sample(r#"{"value": "3,25"}"#).value, Some(3.25));
    }

    #[test]
    fn test_garbage_becomes_absent() {
        assert_eq!(sample(r#"{"value": "abc"}"#).value, None);
        assert_eq!(sample(r#"{"value": null}"#).value, None);
        assert_eq!(sample(r#"{"value": true}"#).value, None);
        assert_eq!(sample(r#"{"value": [1]}"#).value, None);
        assert_eq!(sample("{}").value, None);
    }

    #[test]
    fn test_yield_defaults_to_full() {
        assert_eq!(sample("{}").percent, YieldPercentage::FULL);
        assert_eq!(sample(r#"{"percent": "n/a"}"#).percent, YieldPercentage::FULL);
        assert_eq!(sample(r#"{"percent": 80}"#).percent.value(), 80.0);
        // Zero is kept; the resolver decides what to do with it.
        assert_eq!(sample(r#"{"percent": 0}"#).percent.value(), 0.0);
    }

    #[test]
    fn test_unknown_item_kind_becomes_absent() {
        assert_eq!(sample(r#"{"kind": "SubRecipe"}"#).kind, Some(ItemKind::SubRecipe));
        assert_eq!(sample(r#"{"kind": "ingredient"}"#).kind, Some(ItemKind::Ingredient));
        assert_eq!(sample(r#"{"kind": "Recipe"}"#).kind, None);
        assert_eq!(sample(r#"{"kind": null}"#).kind, None);
        assert_eq!(sample("{}").kind, None);
    }
}
