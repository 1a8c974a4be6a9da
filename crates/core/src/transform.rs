//! # Event Transformer
//!
//! 絞り込み済みのイベント列を `{isoTimestamp, parameters}` 形式に射影する。
//! 入力と出力は形が異なる一方向の変換で、出力を再度入力することはできない。

use chrono::{DateTime, SecondsFormat, Utc};
use movegate_types::{EventParameter, EventRecord, TransformedEvent};
use serde_json::Value;

use crate::CoreError;

/// タイムスタンプ値をエポックミリ秒として解釈する。
///
/// ノードはu64を文字列で返すため、整数値と10進数文字列の両方を受け付ける。
pub fn parse_timestamp_ms(value: &Value) -> Result<i64, CoreError> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| {
            CoreError::InvalidTimestamp(format!("整数のエポックミリ秒ではありません: {n}"))
        }),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
            CoreError::InvalidTimestamp(format!("数値として解釈できません: {s:?}"))
        }),
        other => Err(CoreError::InvalidTimestamp(format!(
            "数値ではありません: {other}"
        ))),
    }
}

/// エポックミリ秒をISO-8601文字列に変換する (例: "2022-11-21T14:06:44.014Z")。
pub fn iso_timestamp(ms: i64) -> Result<String, CoreError> {
    let datetime = DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| CoreError::InvalidTimestamp(format!("表現可能な範囲外です: {ms}")))?;
    Ok(datetime.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// JSON値の種類名。
pub fn value_type(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Object(_) => "object",
        Value::Array(_) => "array",
        Value::Null => "null",
    }
}

/// イベント1件を変換する。
pub fn transform_event(record: &EventRecord) -> Result<TransformedEvent, CoreError> {
    let move_event = record.event.move_event.as_ref().ok_or_else(|| {
        CoreError::MissingMoveEvent(record.tx_digest.clone().unwrap_or_default())
    })?;

    let iso_timestamp = iso_timestamp(parse_timestamp_ms(&record.timestamp)?)?;

    let parameters = move_event
        .fields
        .iter()
        .map(|(name, value)| EventParameter {
            name: name.clone(),
            value: value.clone(),
            value_type: value_type(value).to_string(),
        })
        .collect();

    Ok(TransformedEvent {
        iso_timestamp,
        parameters,
    })
}

/// イベント列を変換する。入力の順序を保持し、1件でも不正なら全体をエラーとする。
pub fn transform_events(records: &[EventRecord]) -> Result<Vec<TransformedEvent>, CoreError> {
    records.iter().map(transform_event).collect()
}
