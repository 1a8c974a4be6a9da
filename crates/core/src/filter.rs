//! # イベント絞り込み
//!
//! 変換前のイベント列に対して、時間範囲・フィールド一致条件による絞り込みと
//! 出力フィールドの選択を行う。

use movegate_types::{EventRecord, FieldFilter, TimeFrame};
use serde_json::Value;

use crate::transform::parse_timestamp_ms;
use crate::CoreError;

/// 時間範囲を検証する。
pub fn validate_time_frame(frame: &TimeFrame) -> Result<(), CoreError> {
    if let (Some(from), Some(to)) = (frame.from, frame.to) {
        if from > to {
            return Err(CoreError::InvalidTimeFrame { from, to });
        }
    }
    Ok(())
}

/// `timestamp_ms` が時間範囲内（両端を含む）かどうか。
pub fn within_time_frame(frame: &TimeFrame, timestamp_ms: i64) -> bool {
    frame.from.map_or(true, |from| timestamp_ms >= from)
        && frame.to.map_or(true, |to| timestamp_ms <= to)
}

/// 全ての条件フィールドが存在し、期待値と一致するかどうか。
pub fn matches_filter(fields: &serde_json::Map<String, Value>, filter: &FieldFilter) -> bool {
    filter.iter().all(|(name, expected)| {
        fields
            .get(name)
            .is_some_and(|actual| values_equal(actual, expected))
    })
}

/// ノードはu64を文字列で返すため、スカラー同士は文字列表現でも比較する。
fn values_equal(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (scalar_to_string(actual), scalar_to_string(expected)) {
        (Some(a), Some(e)) => a == e,
        _ => false,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// イベントクエリの絞り込み条件。
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// 時間範囲
    pub time_frame: TimeFrame,
    /// フィールド一致条件
    pub filter: FieldFilter,
    /// 出力するフィールド名（空なら全フィールド）
    pub parameters: Vec<String>,
}

impl EventQuery {
    /// 条件を構築し、時間範囲を検証する。
    pub fn new(
        time_frame: Option<TimeFrame>,
        filter: Option<FieldFilter>,
        parameters: Vec<String>,
    ) -> Result<Self, CoreError> {
        let time_frame = time_frame.unwrap_or_default();
        validate_time_frame(&time_frame)?;
        Ok(Self {
            time_frame,
            filter: filter.unwrap_or_default(),
            parameters,
        })
    }

    /// レコードが条件に一致するかどうか。タイムスタンプが不正ならエラー。
    pub fn matches(&self, record: &EventRecord) -> Result<bool, CoreError> {
        let Some(move_event) = record.event.move_event.as_ref() else {
            return Ok(false);
        };
        let timestamp = parse_timestamp_ms(&record.timestamp)?;
        Ok(within_time_frame(&self.time_frame, timestamp)
            && matches_filter(&move_event.fields, &self.filter))
    }

    /// `parameters` で指定されたフィールドだけを、指定順に残す。
    pub fn project(&self, mut record: EventRecord) -> EventRecord {
        if self.parameters.is_empty() {
            return record;
        }
        if let Some(move_event) = record.event.move_event.as_mut() {
            let mut projected = serde_json::Map::new();
            for name in &self.parameters {
                if let Some(value) = move_event.fields.get(name) {
                    projected.insert(name.clone(), value.clone());
                }
            }
            move_event.fields = projected;
        }
        record
    }

    /// 絞り込みと射影を行う。入力の順序を保持する。
    pub fn apply(&self, records: Vec<EventRecord>) -> Result<Vec<EventRecord>, CoreError> {
        let mut selected = Vec::with_capacity(records.len());
        for record in records {
            if self.matches(&record)? {
                selected.push(self.project(record));
            }
        }
        Ok(selected)
    }

    /// 昇順に並んだイベント列で、これ以降に一致するイベントが無いかどうか。
    pub fn is_past_end(&self, timestamp_ms: i64) -> bool {
        self.time_frame.to.is_some_and(|to| timestamp_ms > to)
    }

    /// 降順に並んだイベント列で、これ以降に一致するイベントが無いかどうか。
    pub fn is_before_start(&self, timestamp_ms: i64) -> bool {
        self.time_frame.from.is_some_and(|from| timestamp_ms < from)
    }
}
