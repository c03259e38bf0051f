use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use tracing::{Span, debug, instrument};

use super::dto::{
    ForwardResponse, HealthResponse, LldResponse, StaticVlansQuery, TrunkFormat, TrunkPortsQuery,
};
use super::errors::ApiError;
use super::state::AppState;
use crate::forward::vlan_items;

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cache_entries: state.cache.len(),
    })
}

#[instrument(skip_all, name = "api_get_trunk_ports", fields(host = tracing::field::Empty))]
pub async fn get_trunk_ports(
    State(state): State<AppState>,
    params: Result<Query<TrunkPortsQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let host = params.host.ok_or(ApiError::MissingParameter("host"))?;
    Span::current().record("host", host.as_str());
    let trunks = state
        .discovery(&host, &params.community)
        .await?
        .trunk_interfaces()
        .await?;
    debug!(trunks = trunks.len(), "trunk ports retrieved");

    Ok(match params.format {
        TrunkFormat::Json => Json(trunks).into_response(),
        TrunkFormat::Lld => Json(LldResponse::from(trunks)).into_response(),
    })
}

#[instrument(skip_all, name = "api_get_static_vlans", fields(host = tracing::field::Empty))]
pub async fn get_static_vlans(
    State(state): State<AppState>,
    params: Result<Query<StaticVlansQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let host = params.host.ok_or(ApiError::MissingParameter("host"))?;
    Span::current().record("host", host.as_str());
    let view = state
        .discovery(&host, &params.community)
        .await?
        .static_vlans()
        .await?;
    debug!(vlans = view.len(), "static vlans retrieved");

    match params.zbxhost {
        Some(zbxhost) => {
            let output = state
                .settings
                .sender
                .send(&zbxhost, &vlan_items(&view))
                .await?;
            Ok(Json(ForwardResponse { zbxsender: output }).into_response())
        }
        None => Ok(Json(view).into_response()),
    }
}
