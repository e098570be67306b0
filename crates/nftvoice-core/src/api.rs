use crate::error::ApiError;
use crate::nft::{Collection, Nft, NftSummary};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Deserialize)]
struct ChainsResponse {
    chains: Vec<String>,
}

#[derive(Deserialize)]
struct NftsResponse {
    nfts: Vec<NftSummary>,
}

/// Client for the chains/collection/NFT metadata endpoints
#[derive(Clone)]
pub struct NftApiClient {
    client: Client,
    base_url: String,
}

impl NftApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn chains(&self) -> Result<Vec<String>, ApiError> {
        let url = format!("{}/api/chains", self.base_url);
        let response = self.client.get(&url).send().await?;
        let chains: ChainsResponse = Self::decode(response).await?;
        Ok(chains.chains)
    }

    pub async fn collection(&self, chain: &str, contract: &str) -> Result<Collection, ApiError> {
        let url = format!("{}/api/collection", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("chain", chain), ("contract", contract)])
            .send()
            .await?;
        let value: Value = Self::decode(response).await?;
        parse_collection(value)
    }

    pub async fn nfts(&self) -> Result<Vec<NftSummary>, ApiError> {
        let url = format!("{}/api/nfts", self.base_url);
        let response = self.client.get(&url).send().await?;
        let value: Value = Self::decode(response).await?;
        parse_nft_list(value)
    }

    pub async fn nft(&self, token_id: &str, chain: &str, contract: &str) -> Result<Nft, ApiError> {
        let url = format!("{}/api/nft/{}", self.base_url, token_id);
        let response = self
            .client
            .get(&url)
            .query(&[("chain", chain), ("contract", contract)])
            .send()
            .await?;
        let nft: Nft = Self::decode(response).await?;
        debug!(token_id = %nft.token_id, traits = nft.attributes.len(), "loaded NFT metadata");
        Ok(nft)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        Ok(response.json().await?)
    }
}

fn require_nfts_array(value: &Value) -> Result<(), ApiError> {
    match value.get("nfts") {
        Some(Value::Array(_)) => Ok(()),
        _ => Err(ApiError::Malformed("Invalid NFT data format received".to_string())),
    }
}

pub fn parse_collection(value: Value) -> Result<Collection, ApiError> {
    require_nfts_array(&value)?;
    serde_json::from_value(value).map_err(|e| ApiError::Malformed(e.to_string()))
}

pub fn parse_nft_list(value: Value) -> Result<Vec<NftSummary>, ApiError> {
    require_nfts_array(&value)?;
    let list: NftsResponse =
        serde_json::from_value(value).map_err(|e| ApiError::Malformed(e.to_string()))?;
    Ok(list.nfts)
}
