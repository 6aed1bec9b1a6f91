use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use cf_app::{
    AppError, AppResult, EditorSession, PreparedRequest, Settlement, SimulationClient,
    SimulationDuration, load_graph,
};
use cf_graph::{GraphModel, NodeKind};
use cf_results::{NodeSeries, PlaybackState, Reading, SimulationRun};

/// Echoes every requested node back with a constant flow; can be told to fail.
struct ConstantFlowClient {
    flow: f64,
    readings: usize,
    fail: AtomicBool,
}

impl ConstantFlowClient {
    fn new(flow: f64, readings: usize) -> Arc<Self> {
        Arc::new(Self {
            flow,
            readings,
            fail: AtomicBool::new(false),
        })
    }
}

impl SimulationClient for ConstantFlowClient {
    fn simulate(&self, request: &PreparedRequest) -> AppResult<SimulationRun> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::HttpStatus {
                code: 503,
                detail: None,
            });
        }
        let nodes = request
            .body
            .nodes
            .iter()
            .map(|node| NodeSeries {
                id: node.id.clone(),
                kind: node.kind.as_str().to_string(),
                name: node.name.clone(),
                timeseries: (0..self.readings)
                    .map(|_| Reading {
                        flow_kg_min: Some(self.flow),
                        ..Reading::default()
                    })
                    .collect(),
                ..NodeSeries::default()
            })
            .collect();
        Ok(SimulationRun {
            jurisdiction_used: request.body.jurisdiction.id().to_string(),
            timestep_seconds: 5.0,
            nodes,
            ..SimulationRun::default()
        })
    }
}

fn session_with(client: Arc<ConstantFlowClient>, graph: GraphModel) -> EditorSession {
    EditorSession::new(graph, Ok(client as Arc<dyn SimulationClient>))
}

#[test]
fn capture_to_storage_end_to_end() {
    let client = ConstantFlowClient::new(180.0, 3);
    let mut session = session_with(client, GraphModel::new());

    let capture = session.add_node(NodeKind::Capture);
    session.select_node(&capture);
    session.set_selected_param("base_flow", "180").unwrap();
    let storage = session.add_node(NodeKind::Storage);
    let edge = session.connect(&capture, &storage).unwrap();
    assert_eq!(session.graph().edge(&edge).unwrap().weight(), Some(100.0));

    let ticket = session.simulate().unwrap();
    assert_eq!(
        session.wait_for_result(Duration::from_secs(5)),
        Some(Settlement::Loaded {
            ticket,
            readings: 3
        })
    );

    session.player_mut().finish();
    let metrics = session.metrics().unwrap();
    let captured: Vec<f64> = metrics.flow.iter().map(|p| p.captured).collect();
    let stored: Vec<f64> = metrics.flow.iter().map(|p| p.stored).collect();
    assert_eq!(captured, vec![180.0, 180.0, 180.0]);
    assert_eq!(stored, vec![180.0, 180.0, 180.0]);
    assert!((metrics.cumulative[2].stored_kg - 45.0).abs() < 1e-9);
    assert_eq!(metrics.retention_pct, 100.0);
}

#[test]
fn playback_advances_on_pump() {
    let client = ConstantFlowClient::new(50.0, 144);
    let mut session = session_with(client, load_graph(None).unwrap());
    session.set_duration(SimulationDuration::Twelve);
    assert_eq!(session.prepared_request().readings, 144);

    session.simulate().unwrap();
    session.wait_for_result(Duration::from_secs(5)).unwrap();
    assert_eq!(session.player().playback().step(), 2);

    let start = Instant::now();
    let mut now = start;
    let mut last = session.player().playback().cursor();
    while session.player().playback().state() == PlaybackState::Playing {
        now += Duration::from_millis(90);
        assert!(session.pump(now).advanced);
        let cursor = session.player().playback().cursor();
        assert!(cursor > last);
        last = cursor;
    }
    assert_eq!(last, 144);
    assert_eq!(session.metrics().unwrap().progress_pct, 100.0);
}

#[test]
fn failure_keeps_previous_run() {
    let client = ConstantFlowClient::new(10.0, 4);
    let mut session = session_with(Arc::clone(&client), load_graph(None).unwrap());

    session.simulate().unwrap();
    session.wait_for_result(Duration::from_secs(5)).unwrap();
    session.player_mut().finish();
    let before = session.metrics().unwrap();

    client.fail.store(true, Ordering::SeqCst);
    session.simulate().unwrap();
    let settled = session.wait_for_result(Duration::from_secs(5)).unwrap();
    assert!(matches!(settled, Settlement::Failed { ref message, .. } if message == "Simulation failed to run."));
    assert_eq!(session.status(), Some("Simulation failed to run."));
    assert_eq!(session.metrics().unwrap(), before);
    assert_eq!(session.graph().nodes().len(), 8);
}
