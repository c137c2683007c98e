use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use bike_lanes::{
    advise, lane_style, select_active, simulated_position, summarize_steps, Bearing, LaneStyle,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tracing_subscriber::EnvFilter;

mod config;
mod loader;
mod model;
mod state;

use model::{AdvisoryOut, HealthOut, PositionUpdate, StepsOut, StepsRequest};
use state::{now_ms, AppState};

// ---------- Selection + advisory ----------

fn advise_at(state: &AppState, position: [f64; 2], heading_deg: Option<f64>) -> AdvisoryOut {
    let bearing = heading_deg.map(Bearing::from_heading);
    let snapshot = state.store.current();

    let (advisory, basis, distance_m, random_pick) = match &snapshot {
        Some(s) => {
            let sel = {
                let mut rng = state.rng.lock();
                select_active(position, &s.lanes, &state.selection, &mut *rng)
            };
            (advise(sel.lane, bearing), sel.basis, sel.distance_m, sel.is_random())
        }
        // Not loaded yet: same as an empty collection.
        None => (advise(None, bearing), bike_lanes::SelectionBasis::Empty, None, false),
    };

    if random_pick {
        tracing::debug!("random lane {:?} for {:?} ({:?})", advisory.lane_id, position, basis);
    }

    let summary = advisory.summary();
    AdvisoryOut {
        t: now_ms(),
        position,
        basis,
        distance_m,
        random_pick,
        advisory,
        summary,
    }
}

// ---------- Handlers ----------

type ApiError = (StatusCode, Json<serde_json::Value>);

fn not_ready() -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": "lane data unavailable, try again" })),
    )
}

async fn get_lanes(State(state): State<AppState>) -> Result<Json<geojson::FeatureCollection>, ApiError> {
    let snapshot = state.store.ready().await.ok_or_else(not_ready)?;
    Ok(Json(snapshot.lanes.to_geojson()))
}

async fn get_lane_styles(State(state): State<AppState>) -> Result<Json<Vec<LaneStyle>>, ApiError> {
    let snapshot = state.store.ready().await.ok_or_else(not_ready)?;
    Ok(Json(snapshot.lanes.iter().map(lane_style).collect()))
}

async fn post_position(
    State(state): State<AppState>,
    Json(update): Json<PositionUpdate>,
) -> Json<AdvisoryOut> {
    Json(advise_at(&state, update.position, update.heading_deg))
}

async fn post_simulated_position(State(state): State<AppState>) -> Json<AdvisoryOut> {
    let position = match state.store.current() {
        Some(s) => simulated_position(&s.lanes),
        None => bike_lanes::select::DEFAULT_POSITION,
    };
    // Simulated riders face south.
    Json(advise_at(&state, position, Some(180.0)))
}

async fn post_route_steps(
    State(state): State<AppState>,
    Json(req): Json<StepsRequest>,
) -> Json<StepsOut> {
    let lines = summarize_steps(&req.steps, req.expanded);
    let safety = req
        .steps
        .iter()
        .take(if req.expanded { req.steps.len() } else { bike_lanes::route::COLLAPSED_STEP_COUNT })
        .map(|s| advise_at(&state, s.location, None).summary)
        .collect();
    Json(StepsOut { lines, safety })
}

async fn get_health(State(state): State<AppState>) -> Json<HealthOut> {
    let snapshot = state.store.current();
    Json(HealthOut {
        ready: snapshot.is_some(),
        source: snapshot.as_ref().map(|s| s.source),
        lanes: snapshot.as_ref().map_or(0, |s| s.lanes.len()),
        loaded_at_ms: snapshot.as_ref().map(|s| s.loaded_at_ms),
    })
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One advisory per position update, in order.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut tx, mut rx) = socket.split();

    while let Some(msg) = rx.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!("ws receive error: {}", e);
                break;
            }
        };
        let reply = match msg {
            Message::Text(text) => match serde_json::from_str::<PositionUpdate>(&text) {
                Ok(update) => serde_json::to_string(&advise_at(&state, update.position, update.heading_deg)),
                Err(e) => {
                    tracing::warn!("bad position update: {}", e);
                    serde_json::to_string(&json!({ "error": "invalid position update" }))
                }
            },
            Message::Close(_) => break,
            _ => continue,
        };
        match reply {
            Ok(body) => {
                if tx.send(Message::Text(body)).await.is_err() {
                    break;
                }
            }
            Err(e) => tracing::warn!("failed to encode advisory: {}", e),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/lanes", get(get_lanes))
        .route("/lanes/styles", get(get_lane_styles))
        .route("/position", post(post_position))
        .route("/position/simulate", post(post_simulated_position))
        .route("/route/steps", post(post_route_steps))
        .route("/health", get(get_health))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = config::AdvisorConfig::from_env()?;
    tracing::info!(
        "dataset={} on_invalid_feature={:?} street_side={:?} selection={:?}",
        cfg.dataset,
        cfg.enhance.on_invalid_feature,
        cfg.enhance.street_side,
        cfg.selection
    );
    if cfg.selection.random_fallback {
        tracing::warn!("test mode: out-of-range positions get a random lane");
    }

    let state = AppState::new(cfg.selection, cfg.random_seed);

    // Serve right away; /lanes waits on the store until the load publishes.
    {
        let store = state.store.clone();
        let cfg = cfg.clone();
        tokio::spawn(async move {
            let snapshot = loader::load_lanes(&cfg).await;
            store.publish(snapshot);
        });
    }

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bike_lanes::{sample_lanes, SelectionBasis, SelectionOptions};
    use crate::state::{DataSource, LaneSnapshot};
    use tokio_tungstenite::tungstenite;

    fn loaded_state(selection: SelectionOptions) -> AppState {
        let state = AppState::new(selection, Some(11));
        state.store.publish(LaneSnapshot::new(sample_lanes(), DataSource::Sample));
        state
    }

    #[tokio::test]
    async fn test_position_before_load_is_no_selection() {
        let state = AppState::new(SelectionOptions::default(), Some(0));
        let Json(out) = post_position(
            State(state),
            Json(PositionUpdate { position: [-73.5650, 45.5085], heading_deg: None }),
        )
        .await;
        assert_eq!(out.basis, SelectionBasis::Empty);
        assert!(out.advisory.lane_id.is_none());
        assert!(!out.summary.is_empty());
    }

    #[tokio::test]
    async fn test_heading_drives_position_hint() {
        let state = loaded_state(SelectionOptions::default());
        let Json(out) = post_position(
            State(state),
            Json(PositionUpdate { position: [-73.5675, 45.5086], heading_deg: Some(95.0) }),
        )
        .await;
        assert_eq!(out.advisory.lane_id.as_deref(), Some("path-sample-1"));
        assert_eq!(out.basis, SelectionBasis::Nearest);
        assert_eq!(out.advisory.position_hint.as_deref(), Some("Stay on SOUTH side of lane"));
        assert!(!out.random_pick);
    }

    #[tokio::test]
    async fn test_simulated_position_lands_on_a_lane() {
        let state = loaded_state(SelectionOptions::default());
        let Json(out) = post_simulated_position(State(state)).await;
        assert_eq!(out.position, [-73.5650, 45.5085]);
        assert_eq!(out.basis, SelectionBasis::Nearest);
        assert_eq!(out.distance_m.map(|d| d < 1e-6), Some(true));
    }

    #[tokio::test]
    async fn test_route_steps_with_safety() {
        let state = loaded_state(SelectionOptions::default());
        let req: StepsRequest = serde_json::from_value(json!({
            "steps": [
                { "instruction": "Head east on Boulevard De Maisonneuve Ouest toward Rue Bordeaux", "location": [-73.5685, 45.5085] },
                { "instruction": "Turn right onto Rue de Bordeaux", "location": [-73.5650, 45.5070] }
            ]
        }))
        .unwrap();
        let Json(out) = post_route_steps(State(state), Json(req)).await;
        assert_eq!(out.lines.len(), 2);
        assert!(out.lines[0].ends_with("..."));
        assert_eq!(out.safety.len(), 2);
        assert!(out.safety[1].starts_with("On Rue de Bordeaux"));
    }

    #[tokio::test]
    async fn test_health_reports_source() {
        let state = loaded_state(SelectionOptions::default());
        let Json(h) = get_health(State(state)).await;
        assert!(h.ready);
        assert_eq!(h.source, Some(DataSource::Sample));
        assert_eq!(h.lanes, 2);
    }

    #[tokio::test]
    async fn test_lanes_endpoint_serves_enriched_collection() {
        let state = loaded_state(SelectionOptions::default());
        let Json(fc) = get_lanes(State(state.clone())).await.unwrap();
        assert_eq!(fc.features.len(), 2);
        let Json(styles) = get_lane_styles(State(state)).await.unwrap();
        assert_eq!(styles[0].id, "path-sample-1");
    }

    #[tokio::test]
    async fn test_ws_streams_advisories() {
        let state = loaded_state(SelectionOptions::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
            .await
            .unwrap();

        ws.send(tungstenite::Message::Text(r#"{"position":[-73.5652,45.5060]}"#.to_string()))
            .await
            .unwrap();
        let reply = ws.next().await.unwrap().unwrap();
        let v: serde_json::Value = serde_json::from_str(reply.to_text().unwrap()).unwrap();
        assert_eq!(v["lane_id"], "path-sample-2");
        assert_eq!(v["basis"], "nearest");
        assert_eq!(v["direction_label"], "Direction: ONE-WAY with traffic");

        ws.send(tungstenite::Message::Text("not json".to_string())).await.unwrap();
        let reply = ws.next().await.unwrap().unwrap();
        let v: serde_json::Value = serde_json::from_str(reply.to_text().unwrap()).unwrap();
        assert_eq!(v["error"], "invalid position update");

        ws.send(tungstenite::Message::Text(r#"{"position":[-73.60,45.52]}"#.to_string()))
            .await
            .unwrap();
        let reply = ws.next().await.unwrap().unwrap();
        let v: serde_json::Value = serde_json::from_str(reply.to_text().unwrap()).unwrap();
        assert_eq!(v["basis"], "out_of_range");
        assert_eq!(v["side_label"], "Bike lane: Not on a bike path");
    }
}
