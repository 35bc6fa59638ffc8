//! Headless wallet backed by a local private key.
//!
//! Answers the wallet JSON-RPC surface from a `PrivateKeySigner` and an
//! HTTP node connection, so the client can run against a node without a
//! browser wallet.
//!
//! # Security
//! - Private keys are loaded from a hex string or an environment variable
//! - Keys are never logged or serialized

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::TransportError;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::schema::LocalWalletConfig;
use crate::error::{ClientError, ClientResult};
use crate::wallet::provider::{
    format_chain_id, parse_chain_id, EventHandler, HandlerRegistry, ProviderRpcError,
    SubscriptionId, WalletEvent, WalletEventKind, WalletProvider, INTERNAL_ERROR,
    UNRECOGNIZED_CHAIN,
};

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "CROWDFUND_PRIVATE_KEY";

/// A wallet that signs locally and talks to a JSON-RPC node.
pub struct LocalWallet {
    signer: PrivateKeySigner,
    provider: Arc<dyn Provider + Send + Sync>,
    registry: HandlerRegistry,
    rpc_url: String,
}

impl LocalWallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `config` - Node endpoint settings
    pub fn from_private_key(private_key_hex: &str, config: &LocalWalletConfig) -> ClientResult<Self> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex.parse().map_err(|e| {
            ClientError::WalletUnavailable(format!("Invalid private key format: {}", e))
        })?;

        let url: url::Url = config.rpc_url.parse().map_err(|e| {
            ClientError::WalletUnavailable(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(url);

        tracing::info!(
            address = %signer.address(),
            rpc_url = %config.rpc_url,
            "Local wallet initialized"
        );

        Ok(Self {
            signer,
            provider: Arc::new(provider),
            registry: HandlerRegistry::new(),
            rpc_url: config.rpc_url.clone(),
        })
    }

    /// Load the key from `CROWDFUND_PRIVATE_KEY`.
    pub fn from_env(config: &LocalWalletConfig) -> ClientResult<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            ClientError::WalletUnavailable(format!(
                "Environment variable {} not set",
                PRIVATE_KEY_ENV_VAR
            ))
        })?;

        Self::from_private_key(&private_key, config)
    }

    /// The signing account.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Deliver a notification to subscribers, e.g. after the host rotates
    /// the node it points at.
    pub fn emit(&self, event: &WalletEvent) -> usize {
        self.registry.emit(event)
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        match method {
            "eth_accounts" | "eth_requestAccounts" => Ok(json!([self.address()])),
            "eth_chainId" => {
                let chain_id = self.provider.get_chain_id().await.map_err(rpc_error)?;
                Ok(json!(format_chain_id(chain_id)))
            }
            "wallet_switchEthereumChain" => {
                let requested = params
                    .get(0)
                    .and_then(|p| p.get("chainId"))
                    .and_then(parse_chain_id)
                    .ok_or_else(|| ProviderRpcError::new(-32602, "missing chainId parameter"))?;
                let chain_id = self.provider.get_chain_id().await.map_err(rpc_error)?;
                if requested == chain_id {
                    Ok(Value::Null)
                } else {
                    Err(ProviderRpcError::new(
                        UNRECOGNIZED_CHAIN,
                        format!("node at {} serves chain {}, not {}", self.rpc_url, chain_id, requested),
                    ))
                }
            }
            "eth_sendTransaction" => {
                let raw = params
                    .get(0)
                    .cloned()
                    .ok_or_else(|| ProviderRpcError::new(-32602, "missing transaction parameter"))?;
                let tx: TransactionRequest = serde_json::from_value(raw).map_err(|e| {
                    ProviderRpcError::new(-32602, format!("invalid transaction: {}", e))
                })?;
                let pending = self.provider.send_transaction(tx).await.map_err(rpc_error)?;
                tracing::debug!(tx_hash = %pending.tx_hash(), "Local wallet broadcast transaction");
                Ok(json!(pending.tx_hash()))
            }
            _ => self
                .provider
                .client()
                .request::<Value, Value>(method.to_string(), params)
                .await
                .map_err(rpc_error),
        }
    }
}

impl WalletProvider for LocalWallet {
    fn request<'a>(
        &'a self,
        method: &'a str,
        params: Value,
    ) -> BoxFuture<'a, Result<Value, ProviderRpcError>> {
        self.dispatch(method, params).boxed()
    }

    fn subscribe(&self, kind: WalletEventKind, handler: EventHandler) -> SubscriptionId {
        self.registry.subscribe(kind, handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.registry.unsubscribe(id)
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.signer.address())
            .field("rpc_url", &self.rpc_url)
            .finish()
    }
}

fn rpc_error(err: TransportError) -> ProviderRpcError {
    match err.as_error_resp() {
        Some(payload) => ProviderRpcError::new(payload.code, payload.message.to_string()),
        None => ProviderRpcError::new(INTERNAL_ERROR, err.to_string()),
    }
}
