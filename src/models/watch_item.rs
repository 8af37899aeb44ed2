use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Sku,
    Url,
}

impl IdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Sku => "sku",
            IdentifierKind::Url => "url",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct Identifier {
    #[serde(rename = "type")]
    pub kind: IdentifierKind,
    #[validate(length(min = 1))]
    pub value: String,
}

/// A product tracked at one retailer. Loaded from configuration and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct WatchItem {
    #[validate(length(min = 1))]
    pub retailer: String,
    #[validate(length(min = 1))]
    pub label: String,
    #[validate(nested)]
    pub identifier: Identifier,
}

impl WatchItem {
    pub fn new(retailer: impl Into<String>, label: impl Into<String>, kind: IdentifierKind, value: impl Into<String>) -> Self {
        Self {
            retailer: retailer.into(),
            label: label.into(),
            identifier: Identifier {
                kind,
                value: value.into(),
            },
        }
    }

    /// Stable lookup key, `"{kind}:{value}"`.
    pub fn item_key(&self) -> String {
        format!("{}:{}", self.identifier.kind, self.identifier.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_key_format() {
        let item = WatchItem::new("target", "Booster Box", IdentifierKind::Url, "https://x");
        assert_eq!(item.item_key(), "url:https://x");

        let item = WatchItem::new("bestbuy", "ETB", IdentifierKind::Sku, "6543210");
        assert_eq!(item.item_key(), "sku:6543210");
    }

    #[test]
    fn test_identifier_deserializes_type_field() {
        let item: WatchItem = serde_json::from_value(serde_json::json!({
            "retailer": "gamestop",
            "label": "Tin",
            "identifier": { "type": "url", "value": "https://gs/tin" }
        }))
        .unwrap();
        assert_eq!(item.identifier.kind, IdentifierKind::Url);
        assert_eq!(item.item_key(), "url:https://gs/tin");
    }

    #[test]
    fn test_empty_identifier_value_fails_validation() {
        let item = WatchItem::new("target", "Empty", IdentifierKind::Url, "");
        assert!(item.validate().is_err());
    }
}
