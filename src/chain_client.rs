//! Chain API client - fetches the latest round and per-round blocks
//!
//! Endpoints:
//! - `GET {base}/api/status` -> `{ "last-round": N }`
//! - `GET {base}/api/blocks/{round}` -> `{ "round": N, "txs": [...] }`
//!
//! Every failure mode (unreachable endpoint, non-2xx response, malformed
//! payload) is transient from the ingestor's point of view: the cycle aborts
//! and the same fetch is retried on the next timer fire.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Models `/api/status`
#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    #[serde(rename = "last-round")]
    pub last_round: u64,
}

/// Inner transaction payload.
///
/// The recipient historically appeared under two spellings (`recipient` and
/// `receipient`); both are decoded and [`Transaction::recipient`] resolves
/// them to one canonical value.
#[derive(Debug, Clone, Deserialize)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub sender: i64,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    recipient: i64,
    #[serde(default, rename = "receipient")]
    recipient_compat: i64,
}

impl Transaction {
    pub fn new(kind: impl Into<String>, sender: i64, recipient: i64, amount: i64) -> Self {
        Self {
            kind: kind.into(),
            sender,
            amount,
            recipient,
            recipient_compat: 0,
        }
    }

    /// Canonical recipient: prefers the non-zero spelling.
    pub fn recipient(&self) -> i64 {
        if self.recipient != 0 {
            return self.recipient;
        }
        self.recipient_compat
    }
}

/// Outer entry carrying the transaction and its signature.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionEnvelope {
    pub sig: String,
    pub tx: Transaction,
}

/// Models `/api/blocks/{round}`
#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub round: u64,
    #[serde(default)]
    pub txs: Vec<TransactionEnvelope>,
}

#[derive(Debug)]
pub enum ClientError {
    Http(reqwest::Error),
    Status(u16),
    Decode(serde_json::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err)
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Http(e) => write!(f, "HTTP error: {}", e),
            ClientError::Status(code) => write!(f, "Unexpected status code: {}", code),
            ClientError::Decode(e) => write!(f, "Decode error: {}", e),
        }
    }
}

impl std::error::Error for ClientError {}

/// Read capability against the remote ledger.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Fetch the latest finalized round number.
    async fn latest_round(&self) -> Result<u64, ClientError>;

    /// Fetch one block with its ordered transaction list.
    async fn fetch_round(&self, round: u64) -> Result<Block, ClientError>;
}

pub struct HttpChainClient {
    base: String,
    http: reqwest::Client,
}

impl HttpChainClient {
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base: base.into(),
            http,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let response = self.http.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn latest_round(&self) -> Result<u64, ClientError> {
        let url = format!("{}/api/status", self.base);
        let status: Status = self.get_json(&url).await?;
        Ok(status.last_round)
    }

    async fn fetch_round(&self, round: u64) -> Result<Block, ClientError> {
        let url = format!("{}/api/blocks/{}", self.base, round);
        self.get_json(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_decodes_hyphenated_field() {
        let status: Status = serde_json::from_str(r#"{"last-round": 42}"#).unwrap();
        assert_eq!(status.last_round, 42);
    }

    #[test]
    fn test_block_decodes_canonical_recipient() {
        let json = r#"{
            "round": 7,
            "txs": [
                {"sig": "abc", "tx": {"type": "txfer", "sender": 2, "recipient": 1, "amount": 1000}}
            ]
        }"#;

        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.round, 7);
        assert_eq!(block.txs.len(), 1);
        assert_eq!(block.txs[0].sig, "abc");
        assert_eq!(block.txs[0].tx.kind, "txfer");
        assert_eq!(block.txs[0].tx.recipient(), 1);
    }

    #[test]
    fn test_block_decodes_legacy_recipient_spelling() {
        let json = r#"{
            "round": 8,
            "txs": [
                {"sig": "def", "tx": {"type": "txfer", "sender": 4, "receipient": 3, "amount": 100}}
            ]
        }"#;

        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.txs[0].tx.recipient(), 3);
    }

    #[test]
    fn test_preferred_spelling_wins_when_both_present() {
        let json = r#"{"type": "txfer", "sender": 1, "recipient": 5, "receipient": 9, "amount": 10}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.recipient(), 5);
    }

    #[test]
    fn test_block_with_missing_txs_decodes_empty() {
        let block: Block = serde_json::from_str(r#"{"round": 3}"#).unwrap();
        assert!(block.txs.is_empty());
    }

    #[test]
    fn test_malformed_payload_is_decode_error() {
        let result: Result<Status, serde_json::Error> = serde_json::from_str("not json");
        let err: ClientError = result.unwrap_err().into();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
