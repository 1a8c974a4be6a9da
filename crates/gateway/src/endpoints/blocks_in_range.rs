//! # POST /get-blocks-in-range
//!
//! チェックポイント番号の範囲でイベントを照会する。
//! 両端のチェックポイントの確定時刻を時間範囲（両端を含む）として扱う。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use movegate_core::{transform_events, ContractPath, EventQuery};
use movegate_types::{BlocksInRangeRequest, TimeFrame, TransformedEvent};

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::events::{checkpoint_timestamp, fetch_move_events};
use crate::extract::ApiJson;

pub async fn handle_get_blocks_in_range(
    State(state): State<Arc<GatewayState>>,
    ApiJson(body): ApiJson<BlocksInRangeRequest>,
) -> Result<Json<Vec<TransformedEvent>>, GatewayError> {
    let path = ContractPath::parse(&body.smart_contract_path)?;
    let event_type = path.event_type(&body.event_identifier)?;
    if body.start > body.end {
        return Err(GatewayError::BadRequest(format!(
            "startがendより大きいです: {} > {}",
            body.start, body.end
        )));
    }

    let from = checkpoint_timestamp(&state, body.start).await?;
    let to = checkpoint_timestamp(&state, body.end).await?;
    tracing::debug!(start = body.start, end = body.end, from, to, "チェックポイント範囲を解決しました");

    let query = EventQuery::new(
        Some(TimeFrame {
            from: Some(from),
            to: Some(to),
        }),
        body.filter,
        body.parameters,
    )?;
    let records = fetch_move_events(&state, &event_type, &query).await?;
    Ok(Json(transform_events(&records)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::test_helpers::{mock_event, test_state, MockRpc};
    use serde_json::json;

    fn request(start: u64, end: u64) -> BlocksInRangeRequest {
        BlocksInRangeRequest {
            smart_contract_path: "0x2/devnet_nft".to_string(),
            event_identifier: "MintNFTEvent".to_string(),
            start,
            end,
            filter: None,
            parameters: vec![],
        }
    }

    fn mock_with_checkpoints() -> Arc<MockRpc> {
        let events = (0..6)
            .map(|i| {
                mock_event(
                    "0x2::devnet_nft::MintNFTEvent",
                    i,
                    1000 * i as i64,
                    json!({"seq": i}),
                )
            })
            .collect();
        let mock = Arc::new(MockRpc::with_events(events));
        {
            let mut checkpoints = mock.checkpoints.lock().unwrap();
            checkpoints.insert(7, json!({"sequenceNumber": "7", "timestampMs": "1000"}));
            checkpoints.insert(9, json!({"sequenceNumber": "9", "timestampMs": "3000"}));
        }
        mock
    }

    #[tokio::test]
    async fn test_blocks_in_range_uses_checkpoint_times() {
        let state = test_state(mock_with_checkpoints(), 2, 10);

        let Json(events) = handle_get_blocks_in_range(State(state), ApiJson(request(7, 9)))
            .await
            .unwrap();
        let seqs: Vec<&serde_json::Value> =
            events.iter().map(|e| &e.parameters[0].value).collect();
        assert_eq!(seqs, vec![&json!(1), &json!(2), &json!(3)]);
    }

    #[tokio::test]
    async fn test_blocks_in_range_rejects_inverted_range() {
        let state = test_state(mock_with_checkpoints(), 2, 10);
        let result = handle_get_blocks_in_range(State(state), ApiJson(request(9, 7))).await;
        assert!(matches!(result, Err(GatewayError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_blocks_in_range_unknown_checkpoint() {
        let state = test_state(mock_with_checkpoints(), 2, 10);
        let result = handle_get_blocks_in_range(State(state), ApiJson(request(7, 100))).await;
        assert!(matches!(result, Err(GatewayError::NotFound(_))));
    }
}
