//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use movegate_crypto::SuiKeypair;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::rpc::SuiRpc;

/// ローカルネットワークのフルノード
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9000";
/// 待ち受けポート
pub const DEFAULT_PORT: u16 = 3000;
/// Move関数呼び出しのガス予算（MIST）
pub const DEFAULT_GAS_BUDGET: u64 = 10_000_000;
/// イベント照会の1ページあたり件数
pub const DEFAULT_EVENT_PAGE_LIMIT: usize = 50;
/// 1リクエストで辿るページ数の上限
pub const DEFAULT_MAX_EVENT_PAGES: usize = 20;

/// 起動時に環境変数から読み込む設定。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base64エンコードされたEd25519秘密鍵（PRIVATE_KEY）
    pub private_key: String,
    /// 待ち受けポート（PORT）
    pub port: u16,
    /// ノードのJSON-RPC URL（SUI_RPC_URL）
    pub rpc_url: String,
    /// ガス予算（GAS_BUDGET）
    pub gas_budget: u64,
    /// イベント照会の1ページあたり件数（EVENT_PAGE_LIMIT）
    pub event_page_limit: usize,
    /// 1リクエストで辿るページ数の上限（MAX_EVENT_PAGES）
    pub max_event_pages: usize,
    /// 購読スキャナの実行間隔（SCAN_INTERVAL_SECS）。未設定ならスキャナは起動しない
    pub scan_interval: Option<Duration>,
}

impl GatewayConfig {
    /// プロセス環境変数から読み込む。
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から読み込む。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let private_key = lookup("PRIVATE_KEY")
            .filter(|v| !v.trim().is_empty())
            .context("PRIVATE_KEYが設定されていません")?;

        let scan_interval = parse_var::<u64>(&lookup, "SCAN_INTERVAL_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let config = Self {
            private_key,
            port: parse_var(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT),
            rpc_url: lookup("SUI_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            gas_budget: parse_var(&lookup, "GAS_BUDGET")?.unwrap_or(DEFAULT_GAS_BUDGET),
            event_page_limit: parse_var(&lookup, "EVENT_PAGE_LIMIT")?
                .unwrap_or(DEFAULT_EVENT_PAGE_LIMIT),
            max_event_pages: parse_var(&lookup, "MAX_EVENT_PAGES")?
                .unwrap_or(DEFAULT_MAX_EVENT_PAGES),
            scan_interval,
        };

        if config.event_page_limit == 0 || config.max_event_pages == 0 {
            anyhow::bail!("EVENT_PAGE_LIMITとMAX_EVENT_PAGESは1以上である必要があります");
        }
        Ok(config)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{key}の値が不正です ({raw:?}): {e}")),
        None => Ok(None),
    }
}

/// 購読の登録内容。
#[derive(Debug, Clone)]
pub struct Subscription {
    /// 購読ID
    pub id: String,
    /// 購読対象のイベント型
    pub event_type: String,
    /// 配送先URL
    pub callback_url: Option<String>,
    /// 配送済みの最後のイベントID（次回はこれより後を取得する）
    pub cursor: Option<Value>,
}

/// Gatewayの共有状態。
pub struct GatewayState {
    /// ノード呼び出し
    pub rpc: Arc<dyn SuiRpc>,
    /// ノードのJSON-RPC URL
    pub rpc_url: String,
    /// 署名用キーペア
    pub keypair: SuiKeypair,
    /// 署名者のSuiアドレス
    pub signer_address: String,
    /// ガス予算
    pub gas_budget: u64,
    /// イベント照会の1ページあたり件数
    pub event_page_limit: usize,
    /// 1リクエストで辿るページ数の上限
    pub max_event_pages: usize,
    /// 購読先への配送用HTTPクライアント
    pub http_client: reqwest::Client,
    /// 登録中の購読
    pub subscriptions: RwLock<Vec<Subscription>>,
    /// スキャナが最後に確認したトランザクション総数
    pub last_scanned_tx_count: AtomicU64,
}

impl GatewayState {
    /// 設定・キーペア・ノード呼び出し実装から共有状態を構築する。
    /// `http_client` は購読先への配送に使う。
    pub fn new(
        config: &GatewayConfig,
        keypair: SuiKeypair,
        rpc: Arc<dyn SuiRpc>,
        http_client: reqwest::Client,
    ) -> Self {
        let signer_address = keypair.address();
        Self {
            rpc,
            rpc_url: config.rpc_url.clone(),
            keypair,
            signer_address,
            gas_budget: config.gas_budget,
            event_page_limit: config.event_page_limit,
            max_event_pages: config.max_event_pages,
            http_client,
            subscriptions: RwLock::new(Vec::new()),
            last_scanned_tx_count: AtomicU64::new(0),
        }
    }
}
