//! Shared utilities for integration testing.
//!
//! `MockWallet` stands in for a browser wallet on top of an in-memory
//! crowdfunding contract. Calls are decoded and answered with the same ABI
//! bindings the client uses.

#![allow(dead_code)]

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::{SolEvent, SolInterface, SolValue};
use crowdfund_client::config::schema::{ClientConfig, SEPOLIA_CHAIN_ID};
use crowdfund_client::contract::bindings::ICrowdFund;
use crowdfund_client::wallet::provider::{
    format_chain_id, parse_chain_id, EventHandler, HandlerRegistry, ProviderRpcError,
    SubscriptionId, WalletEvent, WalletEventKind, WalletProvider, UNRECOGNIZED_CHAIN,
};
use crowdfund_client::CrowdfundClient;
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CONTRACT: &str = "0x0B06fDF056D642d9FF1297102a1227c7B2c7ca57";
pub const MAINNET_CHAIN_ID: u64 = 1;

pub fn creator() -> Address {
    Address::repeat_byte(0xc1)
}

pub fn backer() -> Address {
    Address::repeat_byte(0xb2)
}

pub fn contract() -> Address {
    CONTRACT.parse().unwrap()
}

/// Client config tuned for fast receipt polling.
pub fn test_config() -> ClientConfig {
    let mut config = ClientConfig::default();
    config.contract.address = CONTRACT.to_string();
    config.transactions.receipt_poll_interval_ms = 10;
    config
}

pub fn client_with(wallet: &Arc<MockWallet>) -> CrowdfundClient {
    let provider: Arc<dyn WalletProvider> = wallet.clone();
    CrowdfundClient::new(Some(provider), test_config()).unwrap()
}

/// How the wallet answers `wallet_switchEthereumChain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchBehavior {
    /// Switch to the requested chain.
    Accept,
    /// The user declines the prompt.
    Reject,
    /// The chain is unknown to the wallet.
    Unsupported,
    /// Report success but stay on the current chain.
    Ignore,
}

#[derive(Debug, Clone)]
pub struct Behavior {
    pub switch: SwitchBehavior,
    pub reject_accounts: bool,
    pub request_accounts_delay: Duration,
    pub chain_id_delay: Duration,
    pub fail_accounts_read: bool,
    pub read_delay: Duration,
    /// Fail the n-th `eth_call` from now (1-based).
    pub fail_read_in: Option<usize>,
    pub reject_next_send: bool,
    pub fail_next_send: bool,
    pub revert_next: bool,
    /// Number of receipt polls answered with `null` before inclusion.
    pub pending_polls: usize,
    pub receipt_error: bool,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            switch: SwitchBehavior::Accept,
            reject_accounts: false,
            request_accounts_delay: Duration::ZERO,
            chain_id_delay: Duration::ZERO,
            fail_accounts_read: false,
            read_delay: Duration::ZERO,
            fail_read_in: None,
            reject_next_send: false,
            fail_next_send: false,
            revert_next: false,
            pending_polls: 0,
            receipt_error: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Slot {
    pub creator: Address,
    pub goal: U256,
    pub pledged: U256,
    pub start_at: u32,
    pub end_at: u32,
    pub claimed: bool,
}

struct StoredReceipt {
    value: Value,
    polls_left: usize,
}

struct ChainState {
    chain_id: u64,
    accounts: Vec<Address>,
    /// Index `i` holds campaign `i + 1`; cancelled slots are `None`.
    slots: Vec<Option<Slot>>,
    pledges: HashMap<(u64, Address), U256>,
    block_number: u64,
    receipts: HashMap<B256, StoredReceipt>,
    nonce: u64,
}

/// An in-memory wallet and crowdfunding contract.
pub struct MockWallet {
    state: Mutex<ChainState>,
    behavior: Mutex<Behavior>,
    calls: Mutex<Vec<String>>,
    registry: HandlerRegistry,
}

impl MockWallet {
    /// A wallet on Sepolia exposing `account`.
    pub fn new(account: Address) -> Arc<Self> {
        Self::on_chain(account, SEPOLIA_CHAIN_ID)
    }

    pub fn on_chain(account: Address, chain_id: u64) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ChainState {
                chain_id,
                accounts: vec![account],
                slots: Vec::new(),
                pledges: HashMap::new(),
                block_number: 100,
                receipts: HashMap::new(),
                nonce: 0,
            }),
            behavior: Mutex::new(Behavior::default()),
            calls: Mutex::new(Vec::new()),
            registry: HandlerRegistry::new(),
        })
    }

    pub fn configure(&self, f: impl FnOnce(&mut Behavior)) {
        f(&mut self.behavior.lock().unwrap());
    }

    /// Seed a campaign directly into contract storage.
    pub fn add_campaign(&self, slot: Slot) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.slots.push(Some(slot));
        state.slots.len() as u64
    }

    /// Seed a cancelled slot.
    pub fn add_cancelled(&self) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.slots.push(None);
        state.slots.len() as u64
    }

    pub fn slot_count(&self) -> usize {
        self.state.lock().unwrap().slots.len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|m| *m == method).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    /// Change the exposed accounts and notify subscribers.
    pub fn change_accounts(&self, accounts: Vec<Address>) {
        self.state.lock().unwrap().accounts = accounts.clone();
        self.registry.emit(&WalletEvent::AccountsChanged(accounts));
    }

    /// Move to another chain and notify subscribers.
    pub fn change_chain(&self, chain_id: u64) {
        self.state.lock().unwrap().chain_id = chain_id;
        self.registry.emit(&WalletEvent::ChainChanged(chain_id));
    }

    async fn handle(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        self.calls.lock().unwrap().push(method.to_string());
        let behavior = self.behavior.lock().unwrap().clone();

        match method {
            "wallet_switchEthereumChain" => {
                let requested = parse_chain_id(&params[0]["chainId"])
                    .ok_or_else(|| ProviderRpcError::new(-32602, "invalid chainId"))?;
                match behavior.switch {
                    SwitchBehavior::Accept => {
                        self.state.lock().unwrap().chain_id = requested;
                        Ok(Value::Null)
                    }
                    SwitchBehavior::Reject => Err(ProviderRpcError::user_rejected()),
                    SwitchBehavior::Unsupported => Err(ProviderRpcError::new(
                        UNRECOGNIZED_CHAIN,
                        "Unrecognized chain ID",
                    )),
                    SwitchBehavior::Ignore => Ok(Value::Null),
                }
            }
            "eth_requestAccounts" => {
                if !behavior.request_accounts_delay.is_zero() {
                    tokio::time::sleep(behavior.request_accounts_delay).await;
                }
                if behavior.reject_accounts {
                    return Err(ProviderRpcError::user_rejected());
                }
                Ok(json!(self.state.lock().unwrap().accounts))
            }
            "eth_accounts" => {
                if behavior.fail_accounts_read {
                    return Err(ProviderRpcError::new(-32603, "internal error"));
                }
                Ok(json!(self.state.lock().unwrap().accounts))
            }
            "eth_chainId" => {
                if !behavior.chain_id_delay.is_zero() {
                    tokio::time::sleep(behavior.chain_id_delay).await;
                }
                Ok(json!(format_chain_id(self.state.lock().unwrap().chain_id)))
            }
            "eth_blockNumber" => Ok(json!(format!("0x{:x}", self.state.lock().unwrap().block_number))),
            "eth_call" => {
                if !behavior.read_delay.is_zero() {
                    tokio::time::sleep(behavior.read_delay).await;
                }
                if self.take_read_failure() {
                    return Err(ProviderRpcError::new(-32000, "header not found"));
                }
                let data: Bytes = serde_json::from_value(params[0]["data"].clone())
                    .map_err(|e| ProviderRpcError::new(-32602, e.to_string()))?;
                self.read(&data).map(|out| json!(Bytes::from(out)))
            }
            "eth_sendTransaction" => self.send(&params[0]),
            "eth_getTransactionReceipt" => {
                if behavior.receipt_error {
                    return Err(ProviderRpcError::new(-32000, "receipt lookup failed"));
                }
                let hash: B256 = serde_json::from_value(params[0].clone())
                    .map_err(|e| ProviderRpcError::new(-32602, e.to_string()))?;
                let mut state = self.state.lock().unwrap();
                match state.receipts.get_mut(&hash) {
                    Some(stored) if stored.polls_left > 0 => {
                        stored.polls_left -= 1;
                        Ok(Value::Null)
                    }
                    Some(stored) => Ok(stored.value.clone()),
                    None => Ok(Value::Null),
                }
            }
            other => Err(ProviderRpcError::new(-32601, format!("method {} not supported", other))),
        }
    }

    fn take_read_failure(&self) -> bool {
        let mut behavior = self.behavior.lock().unwrap();
        match behavior.fail_read_in {
            Some(1) => {
                behavior.fail_read_in = None;
                true
            }
            Some(n) => {
                behavior.fail_read_in = Some(n - 1);
                false
            }
            None => false,
        }
    }

    fn read(&self, data: &[u8]) -> Result<Vec<u8>, ProviderRpcError> {
        let call = ICrowdFund::ICrowdFundCalls::abi_decode(data)
            .map_err(|e| ProviderRpcError::new(3, format!("execution reverted: {}", e)))?;
        let state = self.state.lock().unwrap();

        match call {
            ICrowdFund::ICrowdFundCalls::count(_) => Ok(U256::from(state.slots.len()).abi_encode()),
            ICrowdFund::ICrowdFundCalls::campaigns(c) => {
                let index = c.id.to::<usize>();
                let slot = index
                    .checked_sub(1)
                    .and_then(|i| state.slots.get(i))
                    .cloned()
                    .flatten();
                let encoded = match slot {
                    Some(s) => (s.creator, s.goal, s.pledged, s.start_at, s.end_at, s.claimed)
                        .abi_encode_params(),
                    None => (Address::ZERO, U256::ZERO, U256::ZERO, 0u32, 0u32, false)
                        .abi_encode_params(),
                };
                Ok(encoded)
            }
            ICrowdFund::ICrowdFundCalls::pledgedAmount(c) => {
                let amount = state
                    .pledges
                    .get(&(c.id.to::<u64>(), c.account))
                    .copied()
                    .unwrap_or_default();
                Ok(amount.abi_encode())
            }
            _ => Err(ProviderRpcError::new(3, "execution reverted: not a view")),
        }
    }

    fn send(&self, tx: &Value) -> Result<Value, ProviderRpcError> {
        {
            let mut behavior = self.behavior.lock().unwrap();
            if behavior.reject_next_send {
                behavior.reject_next_send = false;
                return Err(ProviderRpcError::user_rejected());
            }
            if behavior.fail_next_send {
                behavior.fail_next_send = false;
                return Err(ProviderRpcError::new(-32000, "insufficient funds for gas"));
            }
        }
        let (revert, pending_polls) = {
            let mut behavior = self.behavior.lock().unwrap();
            let revert = behavior.revert_next;
            behavior.revert_next = false;
            (revert, behavior.pending_polls)
        };

        let from: Address = serde_json::from_value(tx["from"].clone())
            .map_err(|e| ProviderRpcError::new(-32602, e.to_string()))?;
        let to: Address = serde_json::from_value(tx["to"].clone())
            .map_err(|e| ProviderRpcError::new(-32602, e.to_string()))?;
        let data: Bytes = serde_json::from_value(tx["data"].clone())
            .map_err(|e| ProviderRpcError::new(-32602, e.to_string()))?;

        let mut state = self.state.lock().unwrap();
        state.nonce += 1;
        state.block_number += 1;
        let hash = B256::left_padding_from(&state.nonce.to_be_bytes());
        let block_number = state.block_number;

        let logs = if revert {
            Vec::new()
        } else {
            Self::execute(&mut state, from, to, &data)
        };

        let receipt = json!({
            "transactionHash": hash,
            "blockNumber": format!("0x{:x}", block_number),
            "status": if revert { "0x0" } else { "0x1" },
            "logs": logs,
        });
        state.receipts.insert(
            hash,
            StoredReceipt {
                value: receipt,
                polls_left: pending_polls,
            },
        );

        Ok(json!(hash))
    }

    fn execute(state: &mut ChainState, from: Address, to: Address, data: &[u8]) -> Vec<Value> {
        let Ok(call) = ICrowdFund::ICrowdFundCalls::abi_decode(data) else {
            return Vec::new();
        };
        let log = |event: alloy::primitives::LogData| {
            json!({ "address": to, "topics": event.topics(), "data": event.data })
        };

        match call {
            ICrowdFund::ICrowdFundCalls::launch(c) => {
                state.slots.push(Some(Slot {
                    creator: from,
                    goal: c.goal,
                    pledged: U256::ZERO,
                    start_at: c.startAt,
                    end_at: c.endAt,
                    claimed: false,
                }));
                let event = ICrowdFund::Launch {
                    id: U256::from(state.slots.len()),
                    creator: from,
                    goal: c.goal,
                    startAt: c.startAt,
                    endAt: c.endAt,
                };
                vec![log(event.encode_log_data())]
            }
            ICrowdFund::ICrowdFundCalls::cancel(c) => {
                if let Some(slot) = Self::slot_mut(state, c.id) {
                    *slot = None;
                }
                vec![log(ICrowdFund::Cancel { id: c.id }.encode_log_data())]
            }
            ICrowdFund::ICrowdFundCalls::pledge(c) => {
                if let Some(Some(slot)) = Self::slot_mut(state, c.id) {
                    slot.pledged += c.amount;
                }
                *state.pledges.entry((c.id.to::<u64>(), from)).or_default() += c.amount;
                Vec::new()
            }
            ICrowdFund::ICrowdFundCalls::unpledge(c) => {
                if let Some(Some(slot)) = Self::slot_mut(state, c.id) {
                    slot.pledged -= c.amount;
                }
                *state.pledges.entry((c.id.to::<u64>(), from)).or_default() -= c.amount;
                Vec::new()
            }
            ICrowdFund::ICrowdFundCalls::claim(c) => {
                if let Some(Some(slot)) = Self::slot_mut(state, c.id) {
                    slot.claimed = true;
                }
                Vec::new()
            }
            ICrowdFund::ICrowdFundCalls::refund(c) => {
                let key = (c.id.to::<u64>(), from);
                let amount = state.pledges.remove(&key).unwrap_or_default();
                if let Some(Some(slot)) = Self::slot_mut(state, c.id) {
                    slot.pledged -= amount;
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn slot_mut(state: &mut ChainState, id: U256) -> Option<&mut Option<Slot>> {
        id.to::<usize>()
            .checked_sub(1)
            .and_then(|i| state.slots.get_mut(i))
    }
}

impl WalletProvider for MockWallet {
    fn request<'a>(
        &'a self,
        method: &'a str,
        params: Value,
    ) -> BoxFuture<'a, Result<Value, ProviderRpcError>> {
        self.handle(method, params).boxed()
    }

    fn subscribe(&self, kind: WalletEventKind, handler: EventHandler) -> SubscriptionId {
        self.registry.subscribe(kind, handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.registry.unsubscribe(id)
    }
}

/// Wait until `condition` holds, giving background tasks time to run.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

pub fn slot(creator: Address, goal: u64, pledged: u64, start_at: u32, end_at: u32) -> Slot {
    Slot {
        creator,
        goal: U256::from(goal),
        pledged: U256::from(pledged),
        start_at,
        end_at,
        claimed: false,
    }
}
