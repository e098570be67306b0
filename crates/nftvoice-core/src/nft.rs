//! NFT and collection metadata as returned by the metadata API

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single `{trait_type, value}` attribute pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trait {
    #[serde(deserialize_with = "string_or_number")]
    pub trait_type: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub value: String,
}

impl Trait {
    pub fn new(trait_type: &str, value: &str) -> Self {
        Self {
            trait_type: trait_type.to_string(),
            value: value.to_string(),
        }
    }

    /// Providers use the literal "None" for traits a token doesn't have.
    pub fn is_present(&self) -> bool {
        let value = self.value.trim();
        !value.is_empty() && value != "None"
    }
}

/// The currently selected NFT. Replaced wholesale on every selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Nft {
    pub token_id: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub attributes: Vec<Trait>,
    pub generated_personality: Option<String>,
}

#[derive(Deserialize)]
struct ExtraMetadata {
    #[serde(default)]
    attributes: Vec<Trait>,
}

#[derive(Deserialize)]
struct RawNft {
    #[serde(deserialize_with = "string_or_number")]
    token_id: String,
    name: Option<String>,
    image_url: Option<String>,
    attributes: Option<Vec<Trait>>,
    extra_metadata: Option<ExtraMetadata>,
    generated_personality: Option<String>,
}

impl<'de> Deserialize<'de> for Nft {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawNft::deserialize(deserializer)?;
        // Top-level attributes win; the upstream provider nests them
        let attributes = raw
            .attributes
            .or_else(|| raw.extra_metadata.map(|m| m.attributes))
            .unwrap_or_default();
        Ok(Nft {
            token_id: raw.token_id,
            name: raw.name,
            image_url: raw.image_url,
            attributes,
            generated_personality: raw.generated_personality,
        })
    }
}

impl Nft {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("#{}", self.token_id),
        }
    }

    pub fn visible_traits(&self) -> impl Iterator<Item = &Trait> {
        self.attributes.iter().filter(|t| t.is_present())
    }
}

/// Entry in a collection or NFT listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftSummary {
    #[serde(deserialize_with = "string_or_number")]
    pub token_id: String,
    pub image_url: Option<String>,
    pub name: Option<String>,
}

impl NftSummary {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("NFT #{}", self.token_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentToken {
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorPrice {
    pub value: Value,
    pub payment_token: PaymentToken,
}

/// Collection metadata. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub banner_image_url: Option<String>,
    #[serde(default)]
    pub floor_prices: Vec<FloorPrice>,
    pub distinct_nft_count: Option<u64>,
    pub distinct_owner_count: Option<u64>,
    pub twitter_username: Option<String>,
    pub discord_url: Option<String>,
    pub external_url: Option<String>,
    #[serde(default)]
    pub nfts: Vec<NftSummary>,
}

impl Collection {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed Collection")
    }

    pub fn description_or_default(&self) -> &str {
        self.description.as_deref().unwrap_or("No description available")
    }

    pub fn floor_price_display(&self) -> String {
        match self.floor_prices.first() {
            Some(price) => {
                let value = match &price.value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!("{} {}", value, price.payment_token.symbol)
            }
            None => "N/A".to_string(),
        }
    }

    pub fn twitter_url(&self) -> Option<String> {
        self.twitter_username
            .as_ref()
            .filter(|name| !name.is_empty())
            .map(|name| format!("https://twitter.com/{}", name))
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}
