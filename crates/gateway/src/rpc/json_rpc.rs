//! # HTTP JSON-RPC 実装
//!
//! Suiフルノードの JSON-RPC 2.0 エンドポイントを呼び出す [`SuiRpc`] 実装。

use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{MoveCallParams, Page, RpcError, SuiRpc};

/// `unsafe_moveCall` のレスポンス
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionBlockBytes {
    tx_bytes: String,
}

/// HTTP JSON-RPC によるノード呼び出し。
pub struct JsonRpcClient {
    /// ノードのJSON-RPC URL
    endpoint: String,
    /// HTTPクライアント
    http_client: reqwest::Client,
    /// リクエストID採番
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// ノードのURLとHTTPクライアントから構築する。
    pub fn new(endpoint: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            http_client,
            next_id: AtomicU64::new(1),
        }
    }

    /// JSON-RPCメソッドを呼び出し、`result` をデシリアライズして返す。
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::debug!(method, id, "RPC呼び出し");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RpcError::Transport(format!("レスポンス読み取り失敗: {e}")))?;

        let envelope: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(_) if !status.is_success() => {
                return Err(RpcError::Transport(format!("HTTP {status} - {body}")));
            }
            Err(e) => {
                return Err(RpcError::InvalidResponse(format!("JSONのパースに失敗: {e}")));
            }
        };

        if let Some(error) = envelope.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            tracing::debug!(method, code, %message, "ノードがエラーを返しました");
            return Err(RpcError::Node { code, message });
        }

        let result = envelope
            .get("result")
            .cloned()
            .ok_or_else(|| RpcError::InvalidResponse(format!("{method}: resultがありません")))?;

        serde_json::from_value(result)
            .map_err(|e| RpcError::InvalidResponse(format!("{method}: resultのパースに失敗: {e}")))
    }
}

#[async_trait::async_trait]
impl SuiRpc for JsonRpcClient {
    async fn move_call(&self, call: &MoveCallParams) -> Result<String, RpcError> {
        let params = json!([
            call.signer,
            call.package_object_id,
            call.module,
            call.function,
            call.type_arguments,
            call.arguments,
            Value::Null,
            call.gas_budget.to_string(),
            Value::Null,
        ]);
        let bytes: TransactionBlockBytes = self.call("unsafe_moveCall", params).await?;
        Ok(bytes.tx_bytes)
    }

    async fn execute_transaction(
        &self,
        tx_bytes: &str,
        signature: &str,
    ) -> Result<Value, RpcError> {
        let params = json!([
            tx_bytes,
            [signature],
            {"showEffects": true, "showEvents": true},
            "WaitForLocalExecution",
        ]);
        self.call("sui_executeTransactionBlock", params).await
    }

    async fn query_events(
        &self,
        filter: Value,
        cursor: Option<Value>,
        limit: usize,
        descending: bool,
    ) -> Result<Page, RpcError> {
        self.call("suix_queryEvents", json!([filter, cursor, limit, descending]))
            .await
    }

    async fn query_transactions(
        &self,
        filter: Value,
        cursor: Option<Value>,
        limit: usize,
    ) -> Result<Page, RpcError> {
        let query = json!({
            "filter": filter,
            "options": {"showEvents": true, "showInput": false, "showEffects": false},
        });
        self.call("suix_queryTransactionBlocks", json!([query, cursor, limit, false]))
            .await
    }

    async fn get_transaction(&self, digest: &str) -> Result<Value, RpcError> {
        let params = json!([digest, {"showEffects": true, "showInput": false}]);
        self.call("sui_getTransactionBlock", params).await
    }

    async fn get_checkpoint(&self, sequence_number: u64) -> Result<Value, RpcError> {
        self.call("sui_getCheckpoint", json!([sequence_number.to_string()]))
            .await
    }

    async fn total_transactions(&self) -> Result<u64, RpcError> {
        let total: Value = self.call("sui_getTotalTransactionBlocks", json!([])).await?;
        let parsed = match &total {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| {
            RpcError::InvalidResponse(format!("トランザクション総数が数値ではありません: {total}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use std::sync::{Arc, Mutex};

    /// JSON-RPCリクエストを記録し、メソッドごとに固定のレスポンスを返すモックノードを起動する。
    async fn start_mock_node(recorded: Arc<Mutex<Vec<Value>>>) -> String {
        let app = axum::Router::new().route(
            "/",
            axum::routing::post(move |Json(body): Json<Value>| {
                let recorded = recorded.clone();
                async move {
                    recorded.lock().unwrap().push(body.clone());
                    let id = body["id"].clone();
                    let response = match body["method"].as_str().unwrap() {
                        "unsafe_moveCall" => json!({
                            "jsonrpc": "2.0", "id": id,
                            "result": {"txBytes": "AAEC", "gas": [], "inputObjects": []}
                        }),
                        "sui_getTotalTransactionBlocks" => json!({
                            "jsonrpc": "2.0", "id": id, "result": "1234"
                        }),
                        "suix_queryEvents" => json!({
                            "jsonrpc": "2.0", "id": id,
                            "result": {
                                "data": [{"type": "0x2::m::E", "parsedJson": {}, "timestampMs": "1"}],
                                "nextCursor": {"txDigest": "d", "eventSeq": "0"},
                                "hasNextPage": false
                            }
                        }),
                        _ => json!({
                            "jsonrpc": "2.0", "id": id,
                            "error": {"code": -32602, "message": "Could not find the referenced transaction"}
                        }),
                    };
                    Json(response)
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        format!("http://127.0.0.1:{port}/")
    }

    #[tokio::test]
    async fn test_move_call_params_and_result() {
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let client = JsonRpcClient::new(start_mock_node(recorded.clone()).await, reqwest::Client::new());

        let tx_bytes = client
            .move_call(&MoveCallParams {
                signer: "0xabc".to_string(),
                package_object_id: "0x2".to_string(),
                module: "devnet_nft".to_string(),
                function: "mint".to_string(),
                type_arguments: vec![],
                arguments: vec![json!("Example NFT")],
                gas_budget: 10000,
            })
            .await
            .unwrap();
        assert_eq!(tx_bytes, "AAEC");

        let request = recorded.lock().unwrap()[0].clone();
        assert_eq!(request["jsonrpc"], "2.0");
        assert_eq!(request["method"], "unsafe_moveCall");
        assert_eq!(
            request["params"],
            json!(["0xabc", "0x2", "devnet_nft", "mint", [], ["Example NFT"], null, "10000", null])
        );
    }

    #[tokio::test]
    async fn test_query_events_page() {
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let client = JsonRpcClient::new(start_mock_node(recorded.clone()).await, reqwest::Client::new());

        let page = client
            .query_events(json!({"MoveEventType": "0x2::m::E"}), None, 50, false)
            .await
            .unwrap();
        assert_eq!(page.data.len(), 1);
        assert!(!page.has_next_page);
        assert_eq!(page.next_cursor, Some(json!({"txDigest": "d", "eventSeq": "0"})));

        let request = recorded.lock().unwrap()[0].clone();
        assert_eq!(request["params"], json!([{"MoveEventType": "0x2::m::E"}, null, 50, false]));
    }

    #[tokio::test]
    async fn test_total_transactions_parses_string() {
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let client = JsonRpcClient::new(start_mock_node(recorded).await, reqwest::Client::new());
        assert_eq!(client.total_transactions().await.unwrap(), 1234);
    }

    #[tokio::test]
    async fn test_node_error_is_surfaced() {
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let client = JsonRpcClient::new(start_mock_node(recorded).await, reqwest::Client::new());

        let err = client.get_transaction("missing").await.unwrap_err();
        assert!(err.is_not_found(), "{err}");
        match err {
            RpcError::Node { code, .. } => assert_eq!(code, -32602),
            other => panic!("予期しない結果: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_error() {
        // 使われていないポート
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = JsonRpcClient::new(format!("http://127.0.0.1:{port}"), reqwest::Client::new());
        assert!(matches!(
            client.total_transactions().await,
            Err(RpcError::Transport(_))
        ));
    }
}
