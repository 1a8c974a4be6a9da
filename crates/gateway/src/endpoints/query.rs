//! # POST /query
//!
//! イベント照会（イベント識別子指定）と呼び出し履歴照会（関数識別子指定）。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use movegate_core::filter::validate_time_frame;
use movegate_core::path::validate_identifier;
use movegate_core::{transform_events, ContractPath, EventQuery};
use movegate_types::{QueryRequest, QueryResponse};

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::events::{fetch_invocations, fetch_move_events};
use crate::extract::ApiJson;

/// POST /query: イベントまたは呼び出し履歴の照会。
///
/// `eventIdentifier` と `functionIdentifier` はどちらか一方のみ指定する。
/// 関数指定の場合、`filter` と `parameters` は無視される。
pub async fn handle_query(
    State(state): State<Arc<GatewayState>>,
    ApiJson(body): ApiJson<QueryRequest>,
) -> Result<Json<QueryResponse>, GatewayError> {
    let path = ContractPath::parse(&body.smart_contract_path)?;

    match (body.event_identifier, body.function_identifier) {
        (Some(event_identifier), None) => {
            let event_type = path.event_type(&event_identifier)?;
            let query = EventQuery::new(body.time_frame, body.filter, body.parameters)?;

            let records = fetch_move_events(&state, &event_type, &query).await?;
            let events = transform_events(&records)?;
            tracing::info!(%event_type, count = events.len(), "イベントを照会しました");
            Ok(Json(QueryResponse::Events(events)))
        }
        (None, Some(function_identifier)) => {
            validate_identifier(&function_identifier)?;
            let time_frame = body.time_frame.unwrap_or_default();
            validate_time_frame(&time_frame)?;

            let records = fetch_invocations(&state, &path, &function_identifier, &time_frame).await?;
            tracing::info!(
                %path,
                function = %function_identifier,
                count = records.len(),
                "呼び出し履歴を照会しました"
            );
            Ok(Json(QueryResponse::Invocations(records)))
        }
        (Some(_), Some(_)) => Err(GatewayError::BadRequest(
            "eventIdentifierとfunctionIdentifierは同時に指定できません".to_string(),
        )),
        (None, None) => Err(GatewayError::BadRequest(
            "eventIdentifierまたはfunctionIdentifierが必要です".to_string(),
        )),
    }
}
