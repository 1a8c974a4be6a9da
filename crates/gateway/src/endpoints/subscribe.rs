//! # POST /subscribe, POST /unsubscribe
//!
//! イベント購読の登録と解除。配送は [`crate::scanner`] が行う。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use movegate_core::ContractPath;
use movegate_types::{
    SubscribeRequest, SubscribeResponse, UnsubscribeRequest, UnsubscribeResponse,
    RESULT_SUCCESSFUL,
};

use crate::config::{GatewayState, Subscription};
use crate::error::GatewayError;
use crate::events::latest_event_cursor;
use crate::extract::ApiJson;

/// POST /subscribe: イベント購読の登録。
///
/// 登録時点の最新イベントを起点とし、それ以降のイベントのみを配送する。
pub async fn handle_subscribe(
    State(state): State<Arc<GatewayState>>,
    ApiJson(body): ApiJson<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>, GatewayError> {
    let path = ContractPath::parse(&body.smart_contract_path)?;
    let event_type = path.event_type(&body.event_identifier)?;

    let callback_url = match body.callback_url {
        Some(url) => {
            let parsed = reqwest::Url::parse(&url)
                .map_err(|e| GatewayError::BadRequest(format!("callbackUrlが不正です: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(GatewayError::BadRequest(format!(
                    "callbackUrlはhttpまたはhttpsである必要があります: {url}"
                )));
            }
            Some(url)
        }
        None => None,
    };

    let cursor = latest_event_cursor(&state, &event_type).await?;
    let subscription = Subscription {
        id: uuid::Uuid::new_v4().to_string(),
        event_type,
        callback_url,
        cursor,
    };
    tracing::info!(
        subscription_id = %subscription.id,
        event_type = %subscription.event_type,
        callback = subscription.callback_url.as_deref().unwrap_or("-"),
        "購読を登録しました"
    );

    let subscription_id = subscription.id.clone();
    state.subscriptions.write().await.push(subscription);

    Ok(Json(SubscribeResponse {
        result: RESULT_SUCCESSFUL.to_string(),
        subscription_id,
    }))
}

/// POST /unsubscribe: 購読の解除。
pub async fn handle_unsubscribe(
    State(state): State<Arc<GatewayState>>,
    ApiJson(body): ApiJson<UnsubscribeRequest>,
) -> Result<Json<UnsubscribeResponse>, GatewayError> {
    let mut subscriptions = state.subscriptions.write().await;
    let before = subscriptions.len();
    subscriptions.retain(|s| s.id != body.subscription_id);

    if subscriptions.len() == before {
        return Err(GatewayError::NotFound(format!(
            "購読 {} は登録されていません",
            body.subscription_id
        )));
    }
    tracing::info!(subscription_id = %body.subscription_id, "購読を解除しました");

    Ok(Json(UnsubscribeResponse {
        result: RESULT_SUCCESSFUL.to_string(),
    }))
}
