//! # ノードからのイベント・呼び出し履歴の取得
//!
//! `/query`, `/get-blocks-in-range`, `/subscribe` で共有するページング処理。

use movegate_core::filter::within_time_frame;
use movegate_core::{normalize_events, parse_timestamp_ms, ContractPath, EventQuery};
use movegate_types::{EventRecord, InvocationRecord, TimeFrame};
use serde_json::{json, Value};

use crate::config::GatewayState;
use crate::error::GatewayError;

/// 指定したイベント型のイベントを取得し、条件で絞り込む。結果は昇順。
///
/// `time_frame.from` があれば新しい側から降順に辿り、`from` より前のイベントが
/// 現れた時点で打ち切る。無ければ古い側から辿り、`to` を過ぎた時点で打ち切る。
/// 範囲の端に届く前に `max_event_pages` に達した場合はエラー。
pub(crate) async fn fetch_move_events(
    state: &GatewayState,
    event_type: &str,
    query: &EventQuery,
) -> Result<Vec<EventRecord>, GatewayError> {
    let filter = json!({ "MoveEventType": event_type });
    let descending = query.time_frame.from.is_some();
    let mut cursor: Option<Value> = None;
    let mut selected = Vec::new();

    for _ in 0..state.max_event_pages {
        let page = state
            .rpc
            .query_events(filter.clone(), cursor.take(), state.event_page_limit, descending)
            .await?;

        let records = normalize_events(&page.data)?;
        let beyond_frame = match records.last() {
            Some(last) => {
                let ts = parse_timestamp_ms(&last.timestamp)?;
                if descending {
                    query.is_before_start(ts)
                } else {
                    query.is_past_end(ts)
                }
            }
            None => false,
        };
        selected.extend(query.apply(records)?);

        if beyond_frame || !page.has_next_page || page.next_cursor.is_none() {
            if descending {
                selected.reverse();
            }
            return Ok(selected);
        }
        cursor = page.next_cursor;
    }

    tracing::warn!(
        event_type,
        max_pages = state.max_event_pages,
        "ページ数の上限に達したため照会を中止しました"
    );
    Err(page_cap_exceeded(state))
}

fn page_cap_exceeded(state: &GatewayState) -> GatewayError {
    GatewayError::BadRequest(format!(
        "照会範囲が {} ページ ({} 件/ページ) を超えています。timeFrameを狭めてください",
        state.max_event_pages, state.event_page_limit
    ))
}

/// 指定したMove関数を呼び出したトランザクションと、そこで発行されたイベントを取得する。
pub(crate) async fn fetch_invocations(
    state: &GatewayState,
    path: &ContractPath,
    function: &str,
    time_frame: &TimeFrame,
) -> Result<Vec<InvocationRecord>, GatewayError> {
    let filter = json!({
        "MoveFunction": {
            "package": path.package,
            "module": path.module,
            "function": function,
        }
    });
    let mut cursor: Option<Value> = None;
    let mut records = Vec::new();

    for _ in 0..state.max_event_pages {
        let page = state
            .rpc
            .query_transactions(filter.clone(), cursor.take(), state.event_page_limit)
            .await?;

        let mut past_end = false;
        for tx in page.data {
            let record = invocation_record(tx)?;
            if let Some(ts) = record.timestamp_ms {
                if time_frame.to.is_some_and(|to| ts > to) {
                    past_end = true;
                    break;
                }
                if !within_time_frame(time_frame, ts) {
                    continue;
                }
            }
            records.push(record);
        }

        if past_end || !page.has_next_page || page.next_cursor.is_none() {
            return Ok(records);
        }
        cursor = page.next_cursor;
    }

    tracing::warn!(
        %path,
        function,
        max_pages = state.max_event_pages,
        "ページ数の上限に達したため照会を中止しました"
    );
    Err(page_cap_exceeded(state))
}

fn invocation_record(mut tx: Value) -> Result<InvocationRecord, GatewayError> {
    let digest = tx
        .get("digest")
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::Rpc("トランザクションにdigestがありません".to_string()))?
        .to_string();

    let timestamp_ms = match tx.get("timestampMs") {
        None | Some(Value::Null) => None,
        Some(v) => Some(parse_timestamp_ms(v)?),
    };

    let events = match tx.get_mut("events").map(Value::take) {
        Some(Value::Array(events)) => events,
        _ => Vec::new(),
    };

    Ok(InvocationRecord {
        transaction_hash: digest,
        timestamp_ms,
        events,
    })
}

/// チェックポイントの確定時刻（エポックミリ秒）を取得する。
pub(crate) async fn checkpoint_timestamp(
    state: &GatewayState,
    sequence_number: u64,
) -> Result<i64, GatewayError> {
    let checkpoint = state.rpc.get_checkpoint(sequence_number).await?;
    let timestamp = checkpoint.get("timestampMs").ok_or_else(|| {
        GatewayError::Rpc(format!(
            "チェックポイント {sequence_number} にtimestampMsがありません"
        ))
    })?;
    Ok(parse_timestamp_ms(timestamp)?)
}

/// 指定したイベント型の最新イベントのIDを取得する（購読開始位置）。
pub(crate) async fn latest_event_cursor(
    state: &GatewayState,
    event_type: &str,
) -> Result<Option<Value>, GatewayError> {
    let page = state
        .rpc
        .query_events(json!({ "MoveEventType": event_type }), None, 1, true)
        .await?;
    Ok(page.data.first().and_then(|event| event.get("id")).cloned())
}
