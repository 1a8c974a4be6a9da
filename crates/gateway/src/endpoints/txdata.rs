//! # POST /txdata
//!
//! トランザクションの実行結果（effects）の取得。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use movegate_types::TxDataRequest;
use serde_json::Value;

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::extract::ApiJson;

/// POST /txdata: ダイジェストからトランザクションのeffectsを返す。
pub async fn handle_txdata(
    State(state): State<Arc<GatewayState>>,
    ApiJson(body): ApiJson<TxDataRequest>,
) -> Result<Json<Value>, GatewayError> {
    let digest = body.tx_id.trim();
    if digest.is_empty() {
        return Err(GatewayError::BadRequest("txIdが空です".to_string()));
    }

    let mut response = state.rpc.get_transaction(digest).await?;
    match response.get_mut("effects").map(Value::take) {
        Some(effects) if !effects.is_null() => Ok(Json(effects)),
        _ => Err(GatewayError::Rpc(format!(
            "トランザクション {digest} にeffectsがありません"
        ))),
    }
}
