//! External Records
//!
//! Payloads handed to the aggregate by the storefront and the card readers.
//! Vendor fields we don't interpret are kept verbatim so fact events carry
//! the full record.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Metadata key holding the comma-separated access card numbers
pub const ACCESS_CARD_META_KEY: &str = "access_card_number";

/// Storefront ids arrive as numbers or strings depending on the endpoint
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// A single key/value metadata entry on a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaDataEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

impl MetaDataEntry {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            id: None,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Customer record as reported by the storefront
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default)]
    pub meta_data: Vec<MetaDataEntry>,

    /// Everything else the vendor sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CustomerRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            meta_data: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta_data.push(MetaDataEntry::new(key, value));
        self
    }

    /// Shorthand for a record declaring the given card field
    pub fn with_cards(self, card_field: &str) -> Self {
        self.with_meta(ACCESS_CARD_META_KEY, card_field)
    }

    /// First metadata entry with the given key
    pub fn meta(&self, key: &str) -> Option<&MetaDataEntry> {
        self.meta_data.iter().find(|entry| entry.key == key)
    }

    /// Card numbers declared on this record.
    ///
    /// `None` means the record carries no usable card field (absent, or a
    /// value that is neither a string nor a number). `Some(vec![])` is an
    /// explicit empty declaration.
    pub fn card_numbers(&self) -> Option<Vec<String>> {
        let entry = self.meta(ACCESS_CARD_META_KEY)?;

        let field = match &entry.value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        Some(
            field
                .split(',')
                .map(str::trim)
                .filter(|card| !card.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

/// Subscription record as reported by the storefront
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    pub status: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubscriptionRecord {
    pub fn new(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
            extra: Map::new(),
        }
    }
}

/// Kind of card reader request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardUpdateType {
    Activation,
    Deactivation,
}

impl CardUpdateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardUpdateType::Activation => "activation",
            CardUpdateType::Deactivation => "deactivation",
        }
    }

    /// Parse a request type string; `None` for anything unrecognized
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "activation" => Some(CardUpdateType::Activation),
            "deactivation" => Some(CardUpdateType::Deactivation),
            _ => None,
        }
    }
}

impl std::fmt::Display for CardUpdateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request sent to the card readers, echoed back with its outcome.
///
/// The type stays a plain string because it comes back from an external
/// processor and may hold values we don't know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardUpdateRequest {
    #[serde(rename = "type")]
    pub request_type: String,
    pub customer_id: String,
    pub card: String,
}

impl CardUpdateRequest {
    pub fn new(
        request_type: impl Into<String>,
        customer_id: impl Into<String>,
        card: impl Into<String>,
    ) -> Self {
        Self {
            request_type: request_type.into(),
            customer_id: customer_id.into(),
            card: card.into(),
        }
    }

    pub fn activation(customer_id: impl Into<String>, card: impl Into<String>) -> Self {
        Self::new(CardUpdateType::Activation.as_str(), customer_id, card)
    }

    pub fn deactivation(customer_id: impl Into<String>, card: impl Into<String>) -> Self {
        Self::new(CardUpdateType::Deactivation.as_str(), customer_id, card)
    }

    pub fn kind(&self) -> Option<CardUpdateType> {
        CardUpdateType::parse(&self.request_type)
    }
}

/// Outcome reported by the card reader processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardUpdateOutcome {
    Success,
    Failure,
}
