//! # POST /invoke
//!
//! Move関数呼び出しの構築・署名・実行。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use base64::Engine;
use movegate_core::path::validate_identifier;
use movegate_core::ContractPath;
use movegate_types::{InvokeRequest, InvokeResponse};
use serde_json::Value;

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::extract::ApiJson;
use crate::rpc::MoveCallParams;

/// POST /invoke: Move関数呼び出し。
///
/// 1. ノードの `unsafe_moveCall` でトランザクションバイト列を構築させる
/// 2. Gatewayのキーペアで署名する
/// 3. `sui_executeTransactionBlock` で実行し、ダイジェストを返す
pub async fn handle_invoke(
    State(state): State<Arc<GatewayState>>,
    ApiJson(body): ApiJson<InvokeRequest>,
) -> Result<Json<InvokeResponse>, GatewayError> {
    let path = ContractPath::parse(&body.smart_contract_path)?;
    validate_identifier(&body.function_identifier)?;

    let call = MoveCallParams {
        signer: state.signer_address.clone(),
        package_object_id: path.package.clone(),
        module: path.module.clone(),
        function: body.function_identifier.clone(),
        type_arguments: body.type_arguments,
        arguments: body.inputs.into_iter().map(|input| input.value).collect(),
        gas_budget: state.gas_budget,
    };
    tracing::info!(
        target_fn = %format!("{path}::{}", call.function),
        args = call.arguments.len(),
        "Move関数を呼び出します"
    );

    let tx_bytes_b64 = state.rpc.move_call(&call).await?;
    let tx_bytes = base64::engine::general_purpose::STANDARD
        .decode(&tx_bytes_b64)
        .map_err(|e| GatewayError::Rpc(format!("txBytesのBase64デコードに失敗: {e}")))?;

    let signature = state.keypair.sign_transaction(&tx_bytes);
    movegate_crypto::verify_transaction_signature(&signature, &tx_bytes)
        .map_err(|e| GatewayError::Signing(e.to_string()))?;
    let response = state.rpc.execute_transaction(&tx_bytes_b64, &signature).await?;

    let digest = response
        .get("digest")
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::Rpc("実行結果にdigestがありません".to_string()))?
        .to_string();

    let status = response
        .pointer("/effects/status/status")
        .and_then(Value::as_str);
    if status == Some("failure") {
        let error = response
            .pointer("/effects/status/error")
            .and_then(Value::as_str)
            .unwrap_or_default();
        tracing::warn!(%digest, %error, "トランザクションの実行が失敗しました");
    } else {
        tracing::info!(%digest, "トランザクションを実行しました");
    }

    Ok(Json(InvokeResponse {
        transaction_hash: digest,
    }))
}
