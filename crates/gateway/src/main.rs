//! # Movegate Gateway
//!
//! SuiフルノードのJSON-RPCと署名鍵の前段に立つHTTP Gateway。
//!
//! ## 役割
//! - Move関数呼び出しの構築・署名・実行の代行
//! - イベント・呼び出し履歴の照会と整形
//! - イベント購読の管理と配送
//!
//! ## API エンドポイント
//! - `POST /invoke`: Move関数呼び出し
//! - `POST /query`: イベント / 呼び出し履歴の照会
//! - `POST /subscribe`: イベント購読の登録
//! - `POST /unsubscribe`: 購読の解除
//! - `POST /txdata`: トランザクションeffectsの取得
//! - `POST /get-blocks-in-range`: チェックポイント範囲でのイベント照会
//! - `GET /.well-known/gateway-info`: Gateway情報公開

mod config;
mod endpoints;
mod error;
mod events;
mod extract;
mod rpc;
mod scanner;

use std::sync::Arc;

use movegate_crypto::SuiKeypair;

use config::{GatewayConfig, GatewayState};
use rpc::JsonRpcClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .envは任意
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = GatewayConfig::from_env()?;

    let keypair = SuiKeypair::from_base64(&config.private_key)
        .map_err(|e| anyhow::anyhow!("PRIVATE_KEYを読み込めません: {e}"))?;
    tracing::info!(signer = %keypair.address(), "署名者アドレス");

    let http_client = reqwest::Client::new();
    let rpc = Arc::new(JsonRpcClient::new(config.rpc_url.clone(), http_client.clone()));
    tracing::info!(rpc_url = %config.rpc_url, "Suiノードに接続します");

    let state = Arc::new(GatewayState::new(&config, keypair, rpc, http_client));

    if let Some(interval) = config.scan_interval {
        tokio::spawn(scanner::run_scanner(state.clone(), interval));
    }

    let app = endpoints::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Gatewayを {} で起動します", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
