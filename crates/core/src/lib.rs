//! # Movegate Core
//!
//! ノードから取得したチェーンイベントを、Gatewayのレスポンス形式に変換する。
//!
//! ## 処理フロー
//! 1. ノードが返した生イベントを `EventRecord` に正規化する（[`normalize`]）
//! 2. 時間範囲・フィールド条件で絞り込み、出力フィールドを選択する（[`filter`]）
//! 3. `{isoTimestamp, parameters}` 形式に射影する（[`transform`]）
//!
//! いずれの段階も副作用を持たない純粋関数として実装する。

pub mod filter;
pub mod normalize;
pub mod path;
pub mod transform;

pub use filter::EventQuery;
pub use normalize::{normalize_event, normalize_events};
pub use path::ContractPath;
pub use transform::{iso_timestamp, parse_timestamp_ms, transform_event, transform_events};

/// Coreモジュールのエラー型
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// タイムスタンプが数値のエポックミリ秒として解釈できない
    #[error("タイムスタンプが不正です: {0}")]
    InvalidTimestamp(String),
    /// 時間範囲の開始が終了より後
    #[error("時間範囲が不正です: from={from} > to={to}")]
    InvalidTimeFrame {
        /// 開始時刻
        from: i64,
        /// 終了時刻
        to: i64,
    },
    /// コントラクトパス・識別子の形式が不正
    #[error("コントラクトパスが不正です: {0}")]
    InvalidContractPath(String),
    /// Moveイベントを含まないレコード
    #[error("Moveイベントが含まれていません (txDigest={0})")]
    MissingMoveEvent(String),
    /// ノードが返したイベントの形式が想定外
    #[error("イベントの形式が不正です: {0}")]
    MalformedEvent(String),
}
