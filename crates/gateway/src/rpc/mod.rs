//! # Sui RPC
//!
//! Gatewayが必要とするノード呼び出しの抽象インターフェース。
//! HTTP JSON-RPC実装は `json_rpc` サブモジュールを参照。

pub mod json_rpc;

pub use json_rpc::JsonRpcClient;

use serde::Deserialize;
use serde_json::Value;

/// ノード呼び出しのエラー型
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// HTTP送信・受信に失敗
    #[error("RPC送信失敗: {0}")]
    Transport(String),
    /// ノードがJSON-RPCエラーを返した
    #[error("ノードがエラーを返しました (code={code}): {message}")]
    Node {
        /// JSON-RPCエラーコード
        code: i64,
        /// エラーメッセージ
        message: String,
    },
    /// レスポンスが想定した形式ではない
    #[error("RPCレスポンスが不正です: {0}")]
    InvalidResponse(String),
}

/// JSON-RPC 2.0 の Invalid params
const INVALID_PARAMS: i64 = -32602;

impl RpcError {
    /// 対象オブジェクト・トランザクションが存在しないことを示すエラーか。
    pub fn is_not_found(&self) -> bool {
        match self {
            RpcError::Node { message, .. } => {
                let message = message.to_ascii_lowercase();
                message.contains("could not find")
                    || message.contains("not found")
                    || message.contains("does not exist")
            }
            _ => false,
        }
    }

    /// 呼び出し引数が不正であることを示すエラーか。
    pub fn is_invalid_params(&self) -> bool {
        matches!(self, RpcError::Node { code, .. } if *code == INVALID_PARAMS)
    }
}

/// ページングされたクエリ結果。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// 結果（イベントまたはトランザクション）
    #[serde(default)]
    pub data: Vec<Value>,
    /// 次ページのカーソル（最後の要素を指す）
    #[serde(default)]
    pub next_cursor: Option<Value>,
    /// 次ページがあるか
    #[serde(default)]
    pub has_next_page: bool,
}

/// Move関数呼び出しのパラメータ。
#[derive(Debug, Clone, PartialEq)]
pub struct MoveCallParams {
    /// 署名者アドレス（ガス支払者）
    pub signer: String,
    /// パッケージID
    pub package_object_id: String,
    /// モジュール名
    pub module: String,
    /// 関数名
    pub function: String,
    /// 型引数
    pub type_arguments: Vec<String>,
    /// 関数引数
    pub arguments: Vec<Value>,
    /// ガス予算
    pub gas_budget: u64,
}

/// ノード呼び出しの抽象インターフェース。
///
/// トランザクションの構築・実行・照会はすべてノードに委譲する。
/// Gatewayが行うのは署名と結果の整形のみ。
#[async_trait::async_trait]
pub trait SuiRpc: Send + Sync {
    /// Move関数呼び出しのトランザクションをノードに構築させ、
    /// Base64エンコードされたトランザクションバイト列を返す。
    async fn move_call(&self, call: &MoveCallParams) -> Result<String, RpcError>;

    /// 署名済みトランザクションを実行し、ノードのレスポンスをそのまま返す。
    async fn execute_transaction(
        &self,
        tx_bytes: &str,
        signature: &str,
    ) -> Result<Value, RpcError>;

    /// イベントを照会する。`cursor` は前ページの `next_cursor`。
    async fn query_events(
        &self,
        filter: Value,
        cursor: Option<Value>,
        limit: usize,
        descending: bool,
    ) -> Result<Page, RpcError>;

    /// トランザクションを照会する（発行イベント付き）。
    async fn query_transactions(
        &self,
        filter: Value,
        cursor: Option<Value>,
        limit: usize,
    ) -> Result<Page, RpcError>;

    /// トランザクションを取得する（effects付き）。
    async fn get_transaction(&self, digest: &str) -> Result<Value, RpcError>;

    /// チェックポイントを取得する。
    async fn get_checkpoint(&self, sequence_number: u64) -> Result<Value, RpcError>;

    /// ノードが処理したトランザクションの総数。
    async fn total_transactions(&self) -> Result<u64, RpcError>;
}
