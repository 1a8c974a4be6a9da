//! # Movegate 共有型定義
//!
//! GatewayのREST APIで送受信するリクエスト・レスポンス構造体と、
//! チェーンイベントの正規化表現を提供する。
//!
//! ## エンコーディング規則
//! - JSONフィールド名: camelCase（既存クライアントとの互換性のため）
//! - Suiアドレス・オブジェクトID: `0x` プレフィックス付き16進数
//! - トランザクションダイジェスト: Base58（ノードが返す形式そのまま）

use serde::{Deserialize, Serialize};

/// 成功レスポンスの `result` フィールド値。
pub const RESULT_SUCCESSFUL: &str = "successful";

// ---------------------------------------------------------------------------
// チェーンイベント
// ---------------------------------------------------------------------------

/// 正規化済みのチェーンイベント。Event Transformerの入力。
///
/// `timestamp` はエポックミリ秒。ノードはu64を文字列で返すため、
/// 数値・数値文字列のどちらも保持できるよう `Value` のまま受け取る。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// イベント発生時刻（エポックミリ秒）
    pub timestamp: serde_json::Value,
    /// イベントを発行したトランザクションのダイジェスト
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_digest: Option<String>,
    /// イベント本体
    pub event: ChainEvent,
}

/// イベント本体。Moveイベント以外（コイン移動等）は `move_event` が `None`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEvent {
    /// Moveコントラクトが発行したイベント
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_event: Option<MoveEvent>,
}

/// Moveコントラクトが発行したイベント。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveEvent {
    /// 発行元パッケージID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    /// 発行元モジュール名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_module: Option<String>,
    /// トランザクション送信者アドレス
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// イベント型タグ (例: "0x2::devnet_nft::MintNFTEvent")
    #[serde(rename = "type")]
    pub event_type: String,
    /// イベントのフィールド（ノードが返した順序を保持する）
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// 変換後のイベント。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedEvent {
    /// ISO-8601形式のタイムスタンプ (例: "2022-11-21T14:06:44.014Z")
    pub iso_timestamp: String,
    /// イベントフィールドを平坦化したパラメータ列
    pub parameters: Vec<EventParameter>,
}

/// 変換後のイベントパラメータ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventParameter {
    /// フィールド名
    pub name: String,
    /// フィールド値（ノードが返した値そのまま）
    pub value: serde_json::Value,
    /// 値の種類 ("string", "number", "boolean", "object", "array", "null")
    #[serde(rename = "type")]
    pub value_type: String,
}

/// 関数呼び出しクエリの結果1件。呼び出しトランザクションと、そこで発行された生イベント。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationRecord {
    /// トランザクションダイジェスト
    pub transaction_hash: String,
    /// チェックポイント確定時刻（エポックミリ秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
    /// 発行されたイベント（ノードの表現そのまま）
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// 共通
// ---------------------------------------------------------------------------

/// 時間範囲（エポックミリ秒、両端を含む）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFrame {
    /// 開始時刻。`None` は下限なし
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<i64>,
    /// 終了時刻。`None` は上限なし
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<i64>,
}

/// フィールド名 → 期待値 の一致条件。
pub type FieldFilter = serde_json::Map<String, serde_json::Value>;

/// エラーレスポンス。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// エラー種別 ("bad_request", "not_found", "rpc", "signing", "internal")
    pub error: String,
    /// 人間向けメッセージ
    pub message: String,
}

// ---------------------------------------------------------------------------
// POST /invoke
// ---------------------------------------------------------------------------

/// /invoke リクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeRequest {
    /// "パッケージID/モジュール名"
    pub smart_contract_path: String,
    /// 呼び出す関数名
    pub function_identifier: String,
    /// 型引数 (例: ["0x2::sui::SUI"])
    #[serde(default)]
    pub type_arguments: Vec<String>,
    /// 関数引数
    #[serde(default)]
    pub inputs: Vec<InvokeInput>,
}

/// /invoke の引数1つ。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeInput {
    /// 引数値（純粋値またはオブジェクトID）
    pub value: serde_json::Value,
}

/// /invoke レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeResponse {
    /// 実行されたトランザクションのダイジェスト
    pub transaction_hash: String,
}

// ---------------------------------------------------------------------------
// POST /query
// ---------------------------------------------------------------------------

/// /query リクエスト。
///
/// `function_identifier` と `event_identifier` はどちらか一方のみ指定する。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// "パッケージID/モジュール名"
    pub smart_contract_path: String,
    /// 関数名（呼び出し履歴を取得する場合）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_identifier: Option<String>,
    /// イベント構造体名（イベントを取得する場合）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_identifier: Option<String>,
    /// フィールド一致条件
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FieldFilter>,
    /// 時間範囲
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_frame: Option<TimeFrame>,
    /// 出力するフィールド名（空なら全フィールド）
    #[serde(default)]
    pub parameters: Vec<String>,
}

/// /query レスポンス。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResponse {
    /// イベントクエリの変換結果
    Events(Vec<TransformedEvent>),
    /// 関数呼び出しクエリの結果
    Invocations(Vec<InvocationRecord>),
}

// ---------------------------------------------------------------------------
// POST /subscribe, /unsubscribe
// ---------------------------------------------------------------------------

/// /subscribe リクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    /// "パッケージID/モジュール名"
    pub smart_contract_path: String,
    /// 購読するイベント構造体名
    pub event_identifier: String,
    /// 新規イベントの配送先URL（省略時は登録のみ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

/// /subscribe レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    /// 常に "successful"
    pub result: String,
    /// 発行された購読ID
    pub subscription_id: String,
}

/// /unsubscribe リクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsubscribeRequest {
    /// 解除する購読ID
    pub subscription_id: String,
}

/// /unsubscribe レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubscribeResponse {
    /// 常に "successful"
    pub result: String,
}

/// 購読先に配送するイベントバッチ。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDelivery {
    /// 購読ID
    pub subscription_id: String,
    /// 購読対象のイベント型
    pub event_type: String,
    /// 新規イベント
    pub events: Vec<TransformedEvent>,
}

// ---------------------------------------------------------------------------
// POST /txdata
// ---------------------------------------------------------------------------

/// /txdata リクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxDataRequest {
    /// トランザクションダイジェスト
    pub tx_id: String,
}

// ---------------------------------------------------------------------------
// POST /get-blocks-in-range
// ---------------------------------------------------------------------------

/// /get-blocks-in-range リクエスト。
///
/// `start` と `end` はチェックポイントのシーケンス番号（両端を含む）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlocksInRangeRequest {
    /// "パッケージID/モジュール名"
    pub smart_contract_path: String,
    /// イベント構造体名
    pub event_identifier: String,
    /// 開始チェックポイント
    pub start: u64,
    /// 終了チェックポイント
    pub end: u64,
    /// フィールド一致条件
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FieldFilter>,
    /// 出力するフィールド名（空なら全フィールド）
    #[serde(default)]
    pub parameters: Vec<String>,
}

// ---------------------------------------------------------------------------
// GET /.well-known/gateway-info
// ---------------------------------------------------------------------------

/// /.well-known/gateway-info レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayInfo {
    /// 署名者のSuiアドレス
    pub signer_address: String,
    /// 接続先ノードのRPC URL
    pub rpc_url: String,
    /// 登録中の購読数
    pub subscriptions: usize,
    /// スキャナが最後に確認したトランザクション総数
    pub last_scanned_tx_count: u64,
}
