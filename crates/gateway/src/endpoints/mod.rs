//! # Gatewayエンドポイント

pub mod blocks_in_range;
pub mod gateway_info;
pub mod invoke;
pub mod query;
pub mod subscribe;
pub mod txdata;

#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;

use axum::routing::{get, post};

use crate::config::GatewayState;

pub use blocks_in_range::handle_get_blocks_in_range;
pub use gateway_info::handle_gateway_info;
pub use invoke::handle_invoke;
pub use query::handle_query;
pub use subscribe::{handle_subscribe, handle_unsubscribe};
pub use txdata::handle_txdata;

/// 全エンドポイントを登録したルーターを構築する。
pub fn router(state: Arc<GatewayState>) -> axum::Router {
    axum::Router::new()
        .route("/invoke", post(handle_invoke))
        .route("/query", post(handle_query))
        .route("/subscribe", post(handle_subscribe))
        .route("/unsubscribe", post(handle_unsubscribe))
        .route("/txdata", post(handle_txdata))
        .route("/get-blocks-in-range", post(handle_get_blocks_in_range))
        .route("/.well-known/gateway-info", get(handle_gateway_info))
        .with_state(state)
}
