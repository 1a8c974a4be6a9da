//! # 購読スキャナ
//!
//! 一定間隔でノードのトランザクション総数を確認し、増えていれば
//! 各購読について前回の位置以降のイベントを取得して配送先へPOSTする。
//!
//! 配送に失敗した購読は位置を進めず、次回のスキャンで再送する。

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use movegate_core::{normalize_event, transform_event};
use movegate_types::SubscriptionDelivery;
use serde_json::{json, Value};

use crate::config::{GatewayState, Subscription};
use crate::error::GatewayError;

/// スキャナを起動する。プロセス終了まで戻らない。
pub async fn run_scanner(state: Arc<GatewayState>, interval: Duration) {
    tracing::info!(interval_secs = interval.as_secs(), "購読スキャナを起動しました");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        match scan_once(&state).await {
            Ok(0) => {}
            Ok(delivered) => tracing::info!(delivered, "購読イベントを配送しました"),
            Err(e) => tracing::warn!(error = %e, "購読スキャンに失敗しました"),
        }
    }
}

/// 1回分のスキャン。配送したイベント数を返す。
pub(crate) async fn scan_once(state: &GatewayState) -> Result<usize, GatewayError> {
    let total = state.rpc.total_transactions().await?;
    let previous = state.last_scanned_tx_count.load(Ordering::SeqCst);
    if total == previous {
        return Ok(0);
    }

    let subscriptions = state.subscriptions.read().await.clone();
    let mut delivered = 0;
    // 未配送のイベントが残っていれば総数を記録せず、次回も再スキャンする
    let mut pending = false;

    for subscription in &subscriptions {
        match scan_subscription(state, subscription).await {
            Ok(Some(outcome)) => {
                delivered += outcome.delivered;
                pending |= outcome.has_more;
                // スキャン中に解除された購読は更新しない
                let mut registered = state.subscriptions.write().await;
                if let Some(s) = registered.iter_mut().find(|s| s.id == subscription.id) {
                    s.cursor = Some(outcome.cursor);
                }
            }
            Ok(None) => {}
            Err(e) => {
                pending = true;
                tracing::warn!(
                    subscription_id = %subscription.id,
                    error = %e,
                    "購読イベントの配送に失敗しました"
                );
            }
        }
    }

    if !pending {
        state.last_scanned_tx_count.store(total, Ordering::SeqCst);
    }
    Ok(delivered)
}

/// 購読1件分のスキャン結果。
struct ScanOutcome {
    /// 配送したイベント数
    delivered: usize,
    /// 次回の開始位置
    cursor: Value,
    /// ページ数の上限で打ち切ったか
    has_more: bool,
}

/// 購読1件分の新着イベントを取得・配送する。新着が無ければ `None`。
///
/// 変換できないイベントは警告を出して読み飛ばし、位置はその先へ進める。
async fn scan_subscription(
    state: &GatewayState,
    subscription: &Subscription,
) -> Result<Option<ScanOutcome>, GatewayError> {
    let filter = json!({ "MoveEventType": subscription.event_type });
    let mut cursor = subscription.cursor.clone();
    let mut raw_events = Vec::new();
    let mut has_more = false;

    for page_index in 0..state.max_event_pages {
        let page = state
            .rpc
            .query_events(filter.clone(), cursor.clone(), state.event_page_limit, false)
            .await?;
        raw_events.extend(page.data);
        if !page.has_next_page || page.next_cursor.is_none() {
            break;
        }
        cursor = page.next_cursor;
        has_more = page_index + 1 == state.max_event_pages;
    }

    let Some(last_id) = raw_events.last().and_then(|e| e.get("id")).cloned() else {
        return Ok(None);
    };

    let mut events = Vec::with_capacity(raw_events.len());
    for raw in &raw_events {
        match normalize_event(raw).and_then(|record| record.as_ref().map(transform_event).transpose()) {
            Ok(Some(event)) => events.push(event),
            Ok(None) => {}
            Err(e) => tracing::warn!(
                subscription_id = %subscription.id,
                event_id = %raw.get("id").cloned().unwrap_or_default(),
                error = %e,
                "変換できないイベントを読み飛ばしました"
            ),
        }
    }
    let count = events.len();

    match &subscription.callback_url {
        Some(url) if count > 0 => {
            let delivery = SubscriptionDelivery {
                subscription_id: subscription.id.clone(),
                event_type: subscription.event_type.clone(),
                events,
            };
            state
                .http_client
                .post(url)
                .json(&delivery)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| GatewayError::Internal(format!("配送先 {url} へのPOSTに失敗: {e}")))?;
            tracing::debug!(subscription_id = %subscription.id, count, %url, "配送しました");
        }
        Some(_) => {}
        None => tracing::info!(
            subscription_id = %subscription.id,
            count,
            "配送先が無いため新着イベントを記録のみしました"
        ),
    }

    Ok(Some(ScanOutcome {
        delivered: count,
        cursor: last_id,
        has_more,
    }))
}
