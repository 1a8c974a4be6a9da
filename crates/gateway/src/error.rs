//! # Gateway エラー型
//!
//! 全エンドポイントで共通のエラー型。レスポンスは `ErrorResponse` のJSON。

use axum::http::StatusCode;
use axum::Json;
use movegate_core::CoreError;
use movegate_types::ErrorResponse;

use crate::rpc::RpcError;

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 不正なリクエスト（形式不正、識別子不正、タイムスタンプ不正）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),
    /// 対象が存在しない（購読ID、トランザクション、チェックポイント）
    #[error("見つかりません: {0}")]
    NotFound(String),
    /// ノードとの通信失敗、またはノードがエラーを返した
    #[error("Sui RPC エラー: {0}")]
    Rpc(String),
    /// トランザクション署名に失敗
    #[error("署名に失敗: {0}")]
    Signing(String),
    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl GatewayError {
    fn kind(&self) -> &'static str {
        match self {
            GatewayError::BadRequest(_) => "bad_request",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::Rpc(_) => "rpc",
            GatewayError::Signing(_) => "signing",
            GatewayError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Rpc(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Signing(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "リクエスト処理に失敗しました");
        }
        let body = ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for GatewayError {
    fn from(e: CoreError) -> Self {
        GatewayError::BadRequest(e.to_string())
    }
}

impl From<RpcError> for GatewayError {
    fn from(e: RpcError) -> Self {
        if e.is_not_found() {
            GatewayError::NotFound(e.to_string())
        } else if e.is_invalid_params() {
            GatewayError::BadRequest(e.to_string())
        } else {
            GatewayError::Rpc(e.to_string())
        }
    }
}
