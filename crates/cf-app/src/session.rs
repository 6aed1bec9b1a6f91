//! Editing session: the graph, what is selected, and the simulate/playback
//! loop around it.
//!
//! The graph is the single source of truth. Selection holds an id only;
//! displayed fields are looked up from the graph on every read.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cf_core::{EdgeId, NodeId};
use cf_graph::{Edge, GraphModel, Node, NodeKind, ParamSlot, WeightEdit};
use cf_results::RunMetrics;
use tracing::{debug, warn};

use crate::client::{HttpSimulationClient, SimulationClient};
use crate::config::{ConfigError, DEFAULT_TICK_INTERVAL, ServiceConfig};
use crate::dispatch::{Settled, SimulationDispatcher, Ticket};
use crate::error::{AppError, AppResult};
use crate::jurisdiction::{Jurisdiction, SimulationDuration};
use crate::player::Player;
use crate::request::{PreparedRequest, prepare};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Node(NodeId),
    Edge(EdgeId),
}

/// What happened to the outstanding request during a [`EditorSession::pump`].
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// A run arrived and playback restarted on it.
    Loaded { ticket: Ticket, readings: usize },
    /// The request failed; the message is what the operator sees.
    Failed { ticket: Ticket, message: String },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PumpOutcome {
    pub settled: Option<Settlement>,
    pub advanced: bool,
}

pub struct EditorSession {
    graph: GraphModel,
    selection: Selection,
    jurisdiction: Jurisdiction,
    duration: SimulationDuration,
    backend: Result<SimulationDispatcher, ConfigError>,
    player: Player,
    status: Option<String>,
}

impl EditorSession {
    pub fn new(graph: GraphModel, client: Result<Arc<dyn SimulationClient>, ConfigError>) -> Self {
        Self {
            graph,
            selection: Selection::None,
            jurisdiction: Jurisdiction::default(),
            duration: SimulationDuration::default(),
            backend: client.map(SimulationDispatcher::new),
            player: Player::new(DEFAULT_TICK_INTERVAL),
            status: None,
        }
    }

    /// Session talking to the HTTP service. A configuration problem leaves
    /// editing usable and only fails `simulate`.
    pub fn with_config(graph: GraphModel, config: Result<ServiceConfig, ConfigError>) -> Self {
        let client = config
            .and_then(|c| HttpSimulationClient::from_config(&c))
            .map(|c| Arc::new(c) as Arc<dyn SimulationClient>);
        if let Err(err) = &client {
            warn!(error = %err, "simulation service unavailable; editing only");
        }
        Self::new(graph, client)
    }

    /// Replaces the player, so any current playback is dropped.
    pub fn set_tick_interval(&mut self, interval: Duration) {
        self.player = Player::new(interval);
    }

    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    pub fn jurisdiction(&self) -> Jurisdiction {
        self.jurisdiction
    }

    pub fn set_jurisdiction(&mut self, jurisdiction: Jurisdiction) {
        self.jurisdiction = jurisdiction;
    }

    pub fn duration(&self) -> SimulationDuration {
        self.duration
    }

    pub fn set_duration(&mut self, duration: SimulationDuration) {
        self.duration = duration;
    }

    /// Last operator-facing message, if any.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    // ---- editing ----

    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        self.graph.add_node(kind)
    }

    /// Connect two nodes. An illegal connection is refused quietly.
    pub fn connect(&mut self, source: &str, target: &str) -> Option<EdgeId> {
        match self.graph.connect(source, target) {
            Ok(id) => Some(id),
            Err(err) => {
                debug!(source, target, reason = %err, "connection refused");
                None
            }
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn select_node(&mut self, id: &str) -> bool {
        if self.graph.node(id).is_none() {
            return false;
        }
        self.selection = Selection::Node(NodeId::from(id));
        true
    }

    pub fn select_edge(&mut self, id: &str) -> bool {
        if self.graph.edge(id).is_none() {
            return false;
        }
        self.selection = Selection::Edge(EdgeId::from(id));
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    pub fn selected_node(&self) -> Option<&Node> {
        match &self.selection {
            Selection::Node(id) => self.graph.node(id),
            _ => None,
        }
    }

    pub fn selected_edge(&self) -> Option<&Edge> {
        match &self.selection {
            Selection::Edge(id) => self.graph.edge(id),
            _ => None,
        }
    }

    fn selected_node_id(&self) -> AppResult<NodeId> {
        self.selected_node()
            .map(|n| n.id().clone())
            .ok_or_else(|| AppError::InvalidInput("No node selected".to_string()))
    }

    fn selected_edge_id(&self) -> AppResult<EdgeId> {
        self.selected_edge()
            .map(|e| e.id().clone())
            .ok_or_else(|| AppError::InvalidInput("No edge selected".to_string()))
    }

    pub fn rename_selected(&mut self, name: &str) -> AppResult<()> {
        let id = self.selected_node_id()?;
        self.graph.rename_node(&id, name)?;
        Ok(())
    }

    /// Set a parameter on the selected node from operator text.
    pub fn set_selected_param(&mut self, key: &str, raw: &str) -> AppResult<ParamSlot> {
        let id = self.selected_node_id()?;
        Ok(self.graph.update_node_param_text(&id, key, raw)?)
    }

    /// Set the selected edge's weight from operator text.
    pub fn set_selected_weight(&mut self, raw: &str) -> AppResult<WeightEdit> {
        let id = self.selected_edge_id()?;
        Ok(self.graph.set_edge_weight_text(&id, raw)?)
    }

    /// Delete whatever is selected and clear the selection.
    pub fn delete_selected(&mut self) -> bool {
        match std::mem::take(&mut self.selection) {
            Selection::Node(id) => self.graph.remove_node(&id).is_ok(),
            Selection::Edge(id) => self.graph.remove_edge(&id).is_ok(),
            Selection::None => false,
        }
    }

    // ---- simulate / playback ----

    pub fn prepared_request(&self) -> PreparedRequest {
        prepare(&self.graph, self.jurisdiction, self.duration)
    }

    /// The trigger is live when a service is configured and nothing is in flight.
    pub fn can_simulate(&self) -> bool {
        matches!(&self.backend, Ok(dispatcher) if !dispatcher.is_busy())
    }

    pub fn is_simulating(&self) -> bool {
        matches!(&self.backend, Ok(dispatcher) if dispatcher.is_busy())
    }

    pub fn simulate(&mut self) -> AppResult<Ticket> {
        let request = self.prepared_request();
        let outcome = match &mut self.backend {
            Ok(dispatcher) => dispatcher.submit(request),
            Err(err) => Err(AppError::Config(err.clone())),
        };
        match &outcome {
            Ok(_) => self.status = None,
            Err(err) => self.status = Some(err.operator_message()),
        }
        outcome
    }

    pub fn cancel(&mut self) -> Option<Ticket> {
        self.backend.as_mut().ok().and_then(|d| d.cancel())
    }

    pub fn discarded_responses(&self) -> usize {
        self.backend
            .as_ref()
            .map(|d| d.discarded_count())
            .unwrap_or(0)
    }

    /// Collect a settled response (if any) and advance playback.
    pub fn pump(&mut self, now: Instant) -> PumpOutcome {
        let settled = match &mut self.backend {
            Ok(dispatcher) => dispatcher.poll(),
            Err(_) => None,
        };
        let settled = settled.map(|s| self.settle(s, now));
        let advanced = self.player.advance(now);
        PumpOutcome { settled, advanced }
    }

    /// Block up to `timeout` for the in-flight request, then settle it.
    pub fn wait_for_result(&mut self, timeout: Duration) -> Option<Settlement> {
        let settled = match &mut self.backend {
            Ok(dispatcher) => dispatcher.wait(timeout),
            Err(_) => None,
        }?;
        Some(self.settle(settled, Instant::now()))
    }

    fn settle(&mut self, settled: Settled, now: Instant) -> Settlement {
        match settled.result {
            Ok(run) => {
                let readings = run.total_readings();
                self.player.load(run, now);
                self.status = None;
                Settlement::Loaded {
                    ticket: settled.ticket,
                    readings,
                }
            }
            Err(err) => {
                // Prior run and playback stay as they were.
                let message = err.operator_message();
                self.status = Some(message.clone());
                Settlement::Failed {
                    ticket: settled.ticket,
                    message,
                }
            }
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn metrics(&self) -> Option<RunMetrics> {
        self.player.metrics()
    }
}
