//! # リクエストボディ抽出
//!
//! `axum::Json` の拒否（JSON不正、必須フィールド欠落、Content-Type不一致）を
//! [`GatewayError::BadRequest`] に変換し、他のエラーと同じ `ErrorResponse` で返す。

use axum::extract::{FromRequest, Request};
use axum::Json;

use crate::error::GatewayError;

/// エラー応答を統一したJSONボディ抽出器。
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| GatewayError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}
