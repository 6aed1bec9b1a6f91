//! Single-flight simulation dispatch.
//!
//! At most one request is outstanding. Each submission gets a ticket; only
//! the response carrying the ticket currently in flight is delivered.
//! Anything else (a request that was cancelled, then answered late) is
//! dropped on arrival.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::thread;
use std::time::{Duration, Instant};

use cf_results::SimulationRun;
use tracing::{info, warn};

use crate::client::SimulationClient;
use crate::error::{AppError, AppResult};
use crate::request::PreparedRequest;

pub type Ticket = u64;

/// A request that settled while it was still the current one.
#[derive(Debug)]
pub struct Settled {
    pub ticket: Ticket,
    pub result: AppResult<SimulationRun>,
}

struct WorkerMessage {
    ticket: Ticket,
    result: AppResult<SimulationRun>,
}

pub struct SimulationDispatcher {
    client: Arc<dyn SimulationClient>,
    tx: Sender<WorkerMessage>,
    rx: Receiver<WorkerMessage>,
    next_ticket: Ticket,
    in_flight: Option<Ticket>,
    discarded: usize,
}

impl SimulationDispatcher {
    pub fn new(client: Arc<dyn SimulationClient>) -> Self {
        let (tx, rx) = channel();
        Self {
            client,
            tx,
            rx,
            next_ticket: 1,
            in_flight: None,
            discarded: 0,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<Ticket> {
        self.in_flight
    }

    /// Responses dropped because their request was no longer current.
    pub fn discarded_count(&self) -> usize {
        self.discarded
    }

    /// Start a request on a worker thread. Refused while another is in flight.
    pub fn submit(&mut self, request: PreparedRequest) -> AppResult<Ticket> {
        if let Some(current) = self.in_flight {
            warn!(ticket = current, "simulate refused: request already in flight");
            return Err(AppError::SimulationInFlight);
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        info!(
            ticket,
            nodes = request.body.nodes.len(),
            edges = request.body.edges.len(),
            readings = request.readings,
            jurisdiction = %request.body.jurisdiction,
            "dispatching simulation"
        );

        // Detached: a cancelled worker runs to completion and its message
        // is dropped as stale.
        thread::spawn(move || {
            let result = client.simulate(&request);
            // The dispatcher may be gone by now; nothing to report to.
            let _ = tx.send(WorkerMessage { ticket, result });
        });

        self.in_flight = Some(ticket);
        Ok(ticket)
    }

    /// Give up on the outstanding request. Its response, if it ever
    /// arrives, is discarded.
    pub fn cancel(&mut self) -> Option<Ticket> {
        let cancelled = self.in_flight.take();
        if let Some(ticket) = cancelled {
            info!(ticket, "simulation cancelled");
        }
        cancelled
    }

    /// Non-blocking check for the current request's outcome.
    pub fn poll(&mut self) -> Option<Settled> {
        while let Ok(message) = self.rx.try_recv() {
            if let Some(settled) = self.accept(message) {
                return Some(settled);
            }
        }
        None
    }

    /// Block up to `timeout` for the current request's outcome.
    pub fn wait(&mut self, timeout: Duration) -> Option<Settled> {
        if self.in_flight.is_none() {
            return self.poll();
        }
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(message) => {
                    if let Some(settled) = self.accept(message) {
                        return Some(settled);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return None;
                }
            }
        }
    }

    fn accept(&mut self, message: WorkerMessage) -> Option<Settled> {
        if self.in_flight != Some(message.ticket) {
            self.discarded += 1;
            warn!(
                ticket = message.ticket,
                current = ?self.in_flight,
                "discarding stale simulation response"
            );
            return None;
        }

        self.in_flight = None;
        match &message.result {
            Ok(run) => info!(
                ticket = message.ticket,
                nodes = run.nodes.len(),
                readings = run.total_readings(),
                "simulation completed"
            ),
            Err(err) => warn!(ticket = message.ticket, error = %err, "simulation failed"),
        }
        Some(Settled {
            ticket: message.ticket,
            result: message.result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jurisdiction::{Jurisdiction, SimulationDuration};
    use crate::request::prepare;
    use cf_graph::GraphModel;

    struct EchoClient;

    impl SimulationClient for EchoClient {
        fn simulate(&self, request: &PreparedRequest) -> AppResult<SimulationRun> {
            Ok(SimulationRun {
                jurisdiction_used: request.body.jurisdiction.id().to_string(),
                readings: Some(request.readings),
                ..SimulationRun::default()
            })
        }
    }

    struct FailingClient;

    impl SimulationClient for FailingClient {
        fn simulate(&self, _request: &PreparedRequest) -> AppResult<SimulationRun> {
            Err(AppError::HttpStatus {
                code: 400,
                detail: Some("graph has no capture nodes".to_string()),
            })
        }
    }

    fn request(jurisdiction: Jurisdiction) -> PreparedRequest {
        prepare(&GraphModel::new(), jurisdiction, SimulationDuration::Five)
    }

    #[test]
    fn delivers_current_response() {
        let mut dispatcher = SimulationDispatcher::new(Arc::new(EchoClient));
        let ticket = dispatcher.submit(request(Jurisdiction::Lcfs)).unwrap();
        assert!(dispatcher.is_busy());

        let settled = dispatcher.wait(Duration::from_secs(5)).unwrap();
        assert_eq!(settled.ticket, ticket);
        let run = settled.result.unwrap();
        assert_eq!(run.jurisdiction_used, "lcfs");
        assert_eq!(run.readings, Some(60));
        assert!(!dispatcher.is_busy());
    }

    #[test]
    fn second_submit_is_refused_while_busy() {
        let mut dispatcher = SimulationDispatcher::new(Arc::new(EchoClient));
        dispatcher.submit(request(Jurisdiction::Epa)).unwrap();
        assert!(matches!(
            dispatcher.submit(request(Jurisdiction::Puro)),
            Err(AppError::SimulationInFlight)
        ));
        assert!(dispatcher.wait(Duration::from_secs(5)).is_some());
        assert!(dispatcher.submit(request(Jurisdiction::Puro)).is_ok());
    }

    #[test]
    fn failure_settles_the_request() {
        let mut dispatcher = SimulationDispatcher::new(Arc::new(FailingClient));
        dispatcher.submit(request(Jurisdiction::Epa)).unwrap();
        let settled = dispatcher.wait(Duration::from_secs(5)).unwrap();
        let err = settled.result.unwrap_err();
        assert_eq!(err.operator_message(), "graph has no capture nodes");
        assert!(!dispatcher.is_busy());
    }

    #[test]
    fn cancelled_response_is_discarded() {
        let mut dispatcher = SimulationDispatcher::new(Arc::new(EchoClient));
        let ticket = dispatcher.submit(request(Jurisdiction::Epa)).unwrap();
        assert_eq!(dispatcher.cancel(), Some(ticket));

        let deadline = Instant::now() + Duration::from_secs(5);
        while dispatcher.discarded_count() == 0 && Instant::now() < deadline {
            assert!(dispatcher.poll().is_none());
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(dispatcher.discarded_count(), 1);
        assert_eq!(dispatcher.cancel(), None);
    }

    #[test]
    fn resubmit_after_cancel_delivers_only_the_new_request() {
        let mut dispatcher = SimulationDispatcher::new(Arc::new(EchoClient));
        let first = dispatcher.submit(request(Jurisdiction::Epa)).unwrap();
        dispatcher.cancel();
        let second = dispatcher.submit(request(Jurisdiction::Alberta)).unwrap();

        let settled = dispatcher.wait(Duration::from_secs(5)).unwrap();
        assert_eq!(settled.ticket, second);
        assert_ne!(settled.ticket, first);
        assert_eq!(settled.result.unwrap().jurisdiction_used, "alberta");

        let deadline = Instant::now() + Duration::from_secs(5);
        while dispatcher.discarded_count() == 0 && Instant::now() < deadline {
            assert!(dispatcher.poll().is_none());
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(dispatcher.discarded_count(), 1);
        assert!(!dispatcher.is_busy());
    }
}
