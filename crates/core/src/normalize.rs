//! # イベント正規化
//!
//! ノードが返すイベントJSONを [`EventRecord`] に正規化する。
//!
//! 受け付ける形式:
//! - 旧形式: `{ timestamp, txDigest, event: { moveEvent: { type, fields, .. } } }`
//! - 現行形式: `{ id: { txDigest }, packageId, transactionModule, sender, type, parsedJson, timestampMs }`

use movegate_types::{ChainEvent, EventRecord, MoveEvent};
use serde_json::Value;

use crate::CoreError;

/// イベント1件を正規化する。Moveイベントでなければ `None`。
pub fn normalize_event(raw: &Value) -> Result<Option<EventRecord>, CoreError> {
    if raw.get("event").is_some() {
        let record: EventRecord = serde_json::from_value(raw.clone())
            .map_err(|e| CoreError::MalformedEvent(format!("旧形式イベントのパースに失敗: {e}")))?;
        return Ok(record.event.move_event.is_some().then_some(record));
    }

    let event_type = raw
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| CoreError::MalformedEvent("typeがありません".to_string()))?;

    let fields = match raw.get("parsedJson") {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::Null) | None => serde_json::Map::new(),
        Some(other) => {
            return Err(CoreError::MalformedEvent(format!(
                "parsedJsonがオブジェクトではありません: {other}"
            )))
        }
    };

    let string_field = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);

    Ok(Some(EventRecord {
        timestamp: raw.get("timestampMs").cloned().unwrap_or(Value::Null),
        tx_digest: raw
            .get("id")
            .and_then(|id| id.get("txDigest"))
            .and_then(Value::as_str)
            .map(str::to_string),
        event: ChainEvent {
            move_event: Some(MoveEvent {
                package_id: string_field("packageId"),
                transaction_module: string_field("transactionModule"),
                sender: string_field("sender"),
                event_type: event_type.to_string(),
                fields,
            }),
        },
    }))
}

/// イベント列を正規化する。Moveイベント以外は除外し、順序は保持する。
pub fn normalize_events(raw: &[Value]) -> Result<Vec<EventRecord>, CoreError> {
    let mut records = Vec::with_capacity(raw.len());
    for value in raw {
        if let Some(record) = normalize_event(value)? {
            records.push(record);
        }
    }
    Ok(records)
}
