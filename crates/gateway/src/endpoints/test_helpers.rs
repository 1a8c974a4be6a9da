//! # エンドポイントテスト用共通ヘルパー
//!
//! ノードを模したモック [`SuiRpc`] と、テスト用Gateway状態の構築。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use movegate_crypto::{Ed25519SigningKey, SuiKeypair};
use serde_json::{json, Value};

use crate::config::{GatewayConfig, GatewayState};
use crate::rpc::{MoveCallParams, Page, RpcError, SuiRpc};

/// モックノードが構築するトランザクションバイト列（Base64）
pub const MOCK_TX_BYTES: &str = "AAECAw==";
/// モックノードが返すトランザクションダイジェスト
pub const MOCK_DIGEST: &str = "5EZ1aTs8mockDigest";

/// インメモリのイベント・トランザクションを返すモックノード。
#[derive(Default)]
pub struct MockRpc {
    /// イベント（昇順）
    pub events: Mutex<Vec<Value>>,
    /// トランザクション（昇順、イベント付き）
    pub transactions: Mutex<Vec<Value>>,
    /// チェックポイント
    pub checkpoints: Mutex<HashMap<u64, Value>>,
    /// sui_getTransactionBlock の結果
    pub transaction_blocks: Mutex<HashMap<String, Value>>,
    /// トランザクション総数
    pub total_tx: AtomicU64,
    /// 受け付けたmove call
    pub move_calls: Mutex<Vec<MoveCallParams>>,
    /// 実行したトランザクション（tx_bytes, signature）
    pub executed: Mutex<Vec<(String, String)>>,
    event_query_count: AtomicUsize,
}

impl MockRpc {
    /// イベントを持つモックを構築する。
    pub fn with_events(events: Vec<Value>) -> Self {
        Self {
            events: Mutex::new(events),
            ..Default::default()
        }
    }

    /// `query_events` が呼ばれた回数。
    pub fn event_queries(&self) -> usize {
        self.event_query_count.load(Ordering::SeqCst)
    }
}

fn node_error(code: i64, message: impl Into<String>) -> RpcError {
    RpcError::Node {
        code,
        message: message.into(),
    }
}

/// `cursor` の次の要素から `limit` 件を切り出す。
fn paginate(
    items: Vec<Value>,
    cursor: Option<Value>,
    limit: usize,
    id_of: impl Fn(&Value) -> Value,
) -> Page {
    let start = match cursor {
        Some(cursor) => match items.iter().position(|item| id_of(item) == cursor) {
            Some(i) => i + 1,
            None => items.len(),
        },
        None => 0,
    };
    let end = (start + limit).min(items.len());
    let data = items[start..end].to_vec();
    Page {
        next_cursor: data.last().map(&id_of),
        has_next_page: end < items.len(),
        data,
    }
}

#[async_trait::async_trait]
impl SuiRpc for MockRpc {
    async fn move_call(&self, call: &MoveCallParams) -> Result<String, RpcError> {
        self.move_calls.lock().unwrap().push(call.clone());
        if call.function == "missing_function" {
            return Err(node_error(-32602, "Invalid params: function is not part of the module"));
        }
        Ok(MOCK_TX_BYTES.to_string())
    }

    async fn execute_transaction(
        &self,
        tx_bytes: &str,
        signature: &str,
    ) -> Result<Value, RpcError> {
        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(tx_bytes)
            .map_err(|e| node_error(-32602, e.to_string()))?;
        movegate_crypto::verify_transaction_signature(signature, &bytes)
            .map_err(|e| node_error(-32002, format!("Invalid user signature: {e}")))?;

        self.executed
            .lock()
            .unwrap()
            .push((tx_bytes.to_string(), signature.to_string()));
        Ok(json!({
            "digest": MOCK_DIGEST,
            "effects": {"status": {"status": "success"}},
        }))
    }

    async fn query_events(
        &self,
        filter: Value,
        cursor: Option<Value>,
        limit: usize,
        descending: bool,
    ) -> Result<Page, RpcError> {
        self.event_query_count.fetch_add(1, Ordering::SeqCst);
        let event_type = filter["MoveEventType"].clone();
        let mut matching: Vec<Value> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event["type"] == event_type)
            .cloned()
            .collect();
        if descending {
            matching.reverse();
        }
        Ok(paginate(matching, cursor, limit, |event| event["id"].clone()))
    }

    async fn query_transactions(
        &self,
        _filter: Value,
        cursor: Option<Value>,
        limit: usize,
    ) -> Result<Page, RpcError> {
        let transactions = self.transactions.lock().unwrap().clone();
        Ok(paginate(transactions, cursor, limit, |tx| tx["digest"].clone()))
    }

    async fn get_transaction(&self, digest: &str) -> Result<Value, RpcError> {
        self.transaction_blocks
            .lock()
            .unwrap()
            .get(digest)
            .cloned()
            .ok_or_else(|| {
                node_error(
                    -32602,
                    format!("Could not find the referenced transaction [TransactionDigest({digest})]."),
                )
            })
    }

    async fn get_checkpoint(&self, sequence_number: u64) -> Result<Value, RpcError> {
        self.checkpoints
            .lock()
            .unwrap()
            .get(&sequence_number)
            .cloned()
            .ok_or_else(|| node_error(-32602, format!("Could not find checkpoint {sequence_number}")))
    }

    async fn total_transactions(&self) -> Result<u64, RpcError> {
        Ok(self.total_tx.load(Ordering::SeqCst))
    }
}

/// ノードが返す形式のイベントを生成する。
pub fn mock_event(event_type: &str, seq: usize, timestamp_ms: i64, fields: Value) -> Value {
    json!({
        "id": {"txDigest": format!("tx{seq}"), "eventSeq": "0"},
        "packageId": "0x2",
        "transactionModule": "m",
        "sender": "0xabc",
        "type": event_type,
        "parsedJson": fields,
        "timestampMs": timestamp_ms.to_string(),
    })
}

/// ノードが返す形式のトランザクション（イベント付き）を生成する。
pub fn mock_transaction(digest: &str, timestamp_ms: i64, events: Vec<Value>) -> Value {
    json!({
        "digest": digest,
        "timestampMs": timestamp_ms.to_string(),
        "events": events,
    })
}

/// テスト用GatewayStateを構築するヘルパー
pub fn test_state(
    rpc: Arc<MockRpc>,
    event_page_limit: usize,
    max_event_pages: usize,
) -> Arc<GatewayState> {
    let config = GatewayConfig {
        private_key: String::new(),
        port: 0,
        rpc_url: "http://mock-node".to_string(),
        gas_budget: 10_000,
        event_page_limit,
        max_event_pages,
        scan_interval: None,
    };
    let keypair = SuiKeypair::new(Ed25519SigningKey::generate(&mut rand::rngs::OsRng));
    Arc::new(GatewayState::new(&config, keypair, rpc, reqwest::Client::new()))
}
