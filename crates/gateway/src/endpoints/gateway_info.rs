//! # GET /.well-known/gateway-info
//!
//! Gatewayの署名者アドレス・接続先ノード・購読状況を返す。

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use movegate_types::GatewayInfo;

use crate::config::GatewayState;

pub async fn handle_gateway_info(State(state): State<Arc<GatewayState>>) -> Json<GatewayInfo> {
    Json(GatewayInfo {
        signer_address: state.signer_address.clone(),
        rpc_url: state.rpc_url.clone(),
        subscriptions: state.subscriptions.read().await.len(),
        last_scanned_tx_count: state.last_scanned_tx_count.load(Ordering::SeqCst),
    })
}
