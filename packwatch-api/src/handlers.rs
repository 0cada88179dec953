//! Request handlers.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Query, State};
use axum::http::header;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{body::Bytes, Json};
use chrono::NaiveDate;
use packwatch_core::{Envelope, Order};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

/// Hard ceiling on a single `/api/data` page.
const MAX_PAGE: usize = 1000;

#[derive(Debug, Serialize)]
pub struct UpdateAck {
    pub status: &'static str,
    /// 1-based arrival position of the stored envelope.
    pub position: u64,
}

/// `POST /update` and `/api/update`: one device push in, one envelope
/// stored, or a classified `400`.
pub async fn update(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UpdateAck>, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let position = state.pipeline.ingest_http(&body, content_type, peer)?;
    Ok(Json(UpdateAck {
        status: "ack",
        position,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct DataQuery {
    #[serde(default)]
    pub order: Order,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DataResponse {
    /// Envelopes currently retained (not the page size).
    pub count: usize,
    pub data: Vec<Envelope>,
}

/// `GET /api/data`: snapshot of the retained history, paginated.
pub async fn data(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
) -> Json<DataResponse> {
    let store = state.pipeline.store();
    let snapshot = store.snapshot(query.order);
    let count = snapshot.len();

    let offset = query.offset.unwrap_or(0).min(count);
    let limit = query.limit.unwrap_or(MAX_PAGE).min(MAX_PAGE);
    let data = snapshot[offset..]
        .iter()
        .take(limit)
        .map(|e| (**e).clone())
        .collect();

    Json(DataResponse { count, data })
}

#[derive(Debug, Serialize)]
pub struct LatestResponse {
    /// `null` until the store has been written at least once.
    pub data: Option<Envelope>,
}

/// `GET /api/data/latest`: most recent envelope, explicit null when empty.
pub async fn latest(State(state): State<AppState>) -> Json<LatestResponse> {
    let data = state.pipeline.store().current().map(|e| (*e).clone());
    Json(LatestResponse { data })
}

/// `GET /api/config`: mirror the device's current configuration.
pub async fn config_get(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let relay = state.relay.as_ref().ok_or(ApiError::RelayDisabled)?;
    Ok(Json(relay.fetch_config().await?))
}

/// `POST /api/config`: forward operator configuration to the device.
pub async fn config_set(
    State(state): State<AppState>,
    Json(config): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let relay = state.relay.as_ref().ok_or(ApiError::RelayDisabled)?;
    Ok(Json(relay.push_config(&config).await?))
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// `GET /api/logs?date=YYYY-MM-DD&type=sensor`: one day's sink records.
pub async fn logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let sink = state.sink.as_ref().ok_or_else(|| {
        ApiError::Sink(packwatch_core::sink::SinkError::NotFound {
            kind: query.kind.clone().unwrap_or_else(|| state.log_kind.clone()),
            date: query.date.unwrap_or_else(packwatch_core::sink::today),
        })
    })?;
    let kind = query.kind.as_deref().unwrap_or(&state.log_kind);
    let date = query.date.unwrap_or_else(packwatch_core::sink::today);
    Ok(Json(sink.read_day(kind, date)?))
}

/// `GET /metrics`: Prometheus text exposition.
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let text = state.pipeline.metrics().gather_metrics()?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use packwatch_core::sink::JsonlSink;
    use packwatch_core::{EnvelopeStore, StoreMode};
    use packwatch_ingest::{IngestPipeline, Normalizer};
    use packwatch_telemetry::MetricsRecorder;
    use serde_json::json;
    use std::sync::Arc;

    fn peer() -> SocketAddr {
        "10.0.0.9:50000".parse().unwrap()
    }

    fn state_with(mode: StoreMode, capacity: usize) -> AppState {
        let store = Arc::new(EnvelopeStore::with_mode(mode, capacity));
        let pipeline = Arc::new(IngestPipeline::new(
            Normalizer::new("data"),
            store,
            Arc::new(MetricsRecorder::new()),
        ));
        AppState::new(pipeline)
    }

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn update_stores_and_acks() {
        let state = state_with(StoreMode::History, 16);
        let ack = update(
            State(state.clone()),
            ConnectInfo(peer()),
            json_headers(),
            Bytes::from_static(br#"{"soc":90}"#),
        )
        .await
        .unwrap();
        assert_eq!(ack.0.status, "ack");
        assert_eq!(ack.0.position, 1);
        assert_eq!(state.pipeline.store().len(), 1);
    }

    #[tokio::test]
    async fn update_rejects_empty_body() {
        let state = state_with(StoreMode::History, 16);
        let err = update(
            State(state.clone()),
            ConnectInfo(peer()),
            HeaderMap::new(),
            Bytes::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Ingest(packwatch_ingest::IngestError::EmptyPayload)
        ));
        assert!(state.pipeline.store().is_empty());
    }

    #[tokio::test]
    async fn update_rejects_bad_declared_json() {
        let state = state_with(StoreMode::History, 16);
        let err = update(
            State(state),
            ConnectInfo(peer()),
            json_headers(),
            Bytes::from_static(b"{bad json"),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Ingest(packwatch_ingest::IngestError::BadPayload(_))
        ));
    }

    #[tokio::test]
    async fn data_supports_both_orderings() {
        let state = state_with(StoreMode::History, 16);
        for i in 0..3 {
            let body = format!("{{\"seq\":{i}}}");
            update(
                State(state.clone()),
                ConnectInfo(peer()),
                json_headers(),
                Bytes::from(body),
            )
            .await
            .unwrap();
        }

        let forward = data(State(state.clone()), Query(DataQuery::default())).await;
        let seqs: Vec<i64> = forward
            .0
            .data
            .iter()
            .map(|e| e.payload.as_value().unwrap()["seq"].as_i64().unwrap())
            .collect();
        assert_eq!(seqs, vec![0, 1, 2]);

        let newest = data(
            State(state),
            Query(DataQuery {
                order: Order::NewestFirst,
                ..Default::default()
            }),
        )
        .await;
        let seqs: Vec<i64> = newest
            .0
            .data
            .iter()
            .map(|e| e.payload.as_value().unwrap()["seq"].as_i64().unwrap())
            .collect();
        assert_eq!(seqs, vec![2, 1, 0]);
    }

    #[tokio::test]
    async fn data_pagination_is_bounded() {
        let state = state_with(StoreMode::History, 16);
        for i in 0..5 {
            let body = format!("{{\"seq\":{i}}}");
            update(
                State(state.clone()),
                ConnectInfo(peer()),
                json_headers(),
                Bytes::from(body),
            )
            .await
            .unwrap();
        }

        let page = data(
            State(state),
            Query(DataQuery {
                order: Order::Insertion,
                limit: Some(2),
                offset: Some(1),
            }),
        )
        .await;
        assert_eq!(page.0.count, 5);
        assert_eq!(page.0.data.len(), 2);
        assert_eq!(page.0.data[0].payload.as_value().unwrap()["seq"], 1);
    }

    #[tokio::test]
    async fn latest_is_null_when_empty_and_replaced_in_latest_mode() {
        let state = state_with(StoreMode::Latest, 1);
        let empty = latest(State(state.clone())).await;
        assert!(empty.0.data.is_none());

        for i in 0..2 {
            let body = format!("{{\"seq\":{i}}}");
            update(
                State(state.clone()),
                ConnectInfo(peer()),
                json_headers(),
                Bytes::from(body),
            )
            .await
            .unwrap();
        }
        let current = latest(State(state.clone())).await;
        assert_eq!(current.0.data.unwrap().payload.as_value().unwrap()["seq"], 1);
        assert_eq!(state.pipeline.store().len(), 1);
    }

    #[tokio::test]
    async fn config_endpoints_require_relay() {
        let state = state_with(StoreMode::History, 16);
        let err = config_get(State(state.clone())).await.unwrap_err();
        assert!(matches!(err, ApiError::RelayDisabled));

        let err = config_set(State(state), Json(json!({"localIP": "10.0.0.2"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::RelayDisabled));
    }

    #[tokio::test]
    async fn logs_read_back_the_sink_partition() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(JsonlSink::open(dir.path()).unwrap());
        let store = Arc::new(EnvelopeStore::history(16));
        let pipeline = Arc::new(
            IngestPipeline::new(
                Normalizer::new("data"),
                store,
                Arc::new(MetricsRecorder::new()),
            )
            .with_sink(sink.clone(), "sensor"),
        );
        let state = AppState::new(pipeline).with_sink(sink, "sensor");

        update(
            State(state.clone()),
            ConnectInfo(peer()),
            json_headers(),
            Bytes::from_static(br#"{"soc":88}"#),
        )
        .await
        .unwrap();

        let entries = logs(
            State(state.clone()),
            Query(LogsQuery {
                date: None,
                kind: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(entries.0.len(), 1);
        assert_eq!(entries.0[0]["data"]["soc"], 88);

        let err = logs(
            State(state),
            Query(LogsQuery {
                date: Some("2000-01-01".parse().unwrap()),
                kind: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Sink(packwatch_core::sink::SinkError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn metrics_exposition_counts_ingest() {
        let state = state_with(StoreMode::History, 16);
        update(
            State(state.clone()),
            ConnectInfo(peer()),
            json_headers(),
            Bytes::from_static(br#"{"soc":90}"#),
        )
        .await
        .unwrap();

        let text = state.pipeline.metrics().gather_metrics().unwrap();
        assert!(text.contains("packwatch_envelopes_total"));
    }
}
