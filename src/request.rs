//! Issuing backend requests and reconciling their completions.
//!
//! Requests run on worker threads and report back through the app's event
//! channel. Every request carries a generation number; only the most
//! recently issued request may update the charts or clear the loading flag.

use crate::backend::{Backend, BackendRequest, BackendResponse, Payload};
use crate::AppEvent;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::sync::mpsc::Sender;
use std::sync::Arc;

pub const SAMPLES_PER_UNIT: f64 = 10.0;
pub const MAX_SCAN_STEPS: u64 = 100_000;

/// Sample count for a continuous scan of [start, end]: 10 per unit of t,
/// capped at 100000. Reversed or empty ranges give 0.
pub fn scan_steps(start: f64, end: f64) -> u64 {
    let steps = ((end - start) * SAMPLES_PER_UNIT).min(MAX_SCAN_STEPS as f64);
    // float to int casts saturate, so negatives and NaN land on 0
    steps as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// What a worker reports when its request finishes.
pub struct Completion {
    pub ticket: RequestTicket,
    pub request: BackendRequest,
    pub outcome: Result<BackendResponse>,
}

/// Result of reconciling a completion with the orchestrator state.
#[derive(Debug, PartialEq)]
pub enum Resolution {
    /// Latest request, with data to render.
    Render(Payload),
    /// Latest request, but the backend reported an error or the request
    /// failed. Charts stay as they are.
    Failed(String),
    /// An older request finished after a newer one was issued.
    Stale,
}

#[derive(Debug, Default)]
pub struct RequestOrchestrator {
    next_generation: u64,
    in_flight: Option<RequestTicket>,
    issued: u64,
    stale_dropped: u64,
    failures: u64,
}

impl RequestOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request and raise the loading flag.
    pub fn issue(&mut self, request: &BackendRequest) -> RequestTicket {
        self.next_generation += 1;
        self.issued += 1;
        let ticket = RequestTicket(self.next_generation);
        self.in_flight = Some(ticket);
        log::debug!("request #{} {}", ticket.0, request.describe());
        ticket
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn latest(&self) -> Option<RequestTicket> {
        (self.next_generation > 0).then_some(RequestTicket(self.next_generation))
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn stale_dropped(&self) -> u64 {
        self.stale_dropped
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Reconcile a finished request.
    ///
    /// For the latest request the loading flag is released first, whatever
    /// the outcome. Stale completions change nothing but a counter.
    pub fn complete(&mut self, completion: Completion) -> Resolution {
        let Completion {
            ticket,
            request,
            outcome,
        } = completion;

        if ticket.0 != self.next_generation {
            self.stale_dropped += 1;
            log::debug!(
                "dropping stale response #{} (latest #{}) for {}",
                ticket.0,
                self.next_generation,
                request.path()
            );
            return Resolution::Stale;
        }

        self.in_flight.take();

        match outcome {
            Ok(BackendResponse::Data(payload)) => Resolution::Render(payload),
            Ok(BackendResponse::Error(message)) => {
                self.failures += 1;
                log::error!("backend error for {}: {}", request.describe(), message);
                Resolution::Failed(message)
            }
            Err(e) => {
                self.failures += 1;
                log::error!("request {} failed: {:#}", request.describe(), e);
                Resolution::Failed(e.to_string())
            }
        }
    }
}

/// Sends a completion when dropped, unless one was already sent.
///
/// A worker that panics still reports back so the loading flag clears.
struct CompletionGuard {
    tx: Sender<AppEvent>,
    ticket: RequestTicket,
    request: Option<BackendRequest>,
}

impl CompletionGuard {
    fn finish(mut self, outcome: Result<BackendResponse>) {
        if let Some(request) = self.request.take() {
            let _ = self.tx.send(AppEvent::Fetched(Completion {
                ticket: self.ticket,
                request,
                outcome,
            }));
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(request) = self.request.take() {
            let _ = self.tx.send(AppEvent::Fetched(Completion {
                ticket: self.ticket,
                request,
                outcome: Err(eyre!("worker exited without a response")),
            }));
        }
    }
}

/// Run `request` on a worker thread and post the completion to `tx`.
pub fn spawn(
    backend: Arc<dyn Backend>,
    ticket: RequestTicket,
    request: BackendRequest,
    tx: Sender<AppEvent>,
) {
    std::thread::spawn(move || {
        let guard = CompletionGuard {
            tx,
            ticket,
            request: Some(request.clone()),
        };
        let outcome = backend.fetch(&request);
        guard.finish(outcome);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;
    use std::time::Duration;

    fn scan_all() -> BackendRequest {
        BackendRequest::ScanAll {
            start: 0.0,
            end: 100.0,
            modulus: 3,
        }
    }

    fn completion(ticket: RequestTicket, outcome: Result<BackendResponse>) -> Completion {
        Completion {
            ticket,
            request: scan_all(),
            outcome,
        }
    }

    #[test]
    fn test_scan_steps() {
        assert_eq!(scan_steps(0.0, 100.0), 1000);
        assert_eq!(scan_steps(0.0, 20000.0), 100_000);
        assert_eq!(scan_steps(37.5, 62.5), 250);
        assert_eq!(scan_steps(50.0, 10.0), 0);
        assert_eq!(scan_steps(5.0, 5.0), 0);
    }

    #[test]
    fn test_latest_completion_renders_and_clears_loading() {
        let mut orch = RequestOrchestrator::new();
        let ticket = orch.issue(&scan_all());
        assert!(orch.is_loading());
        let res = orch.complete(completion(
            ticket,
            Ok(BackendResponse::Data(Payload::Clt(vec![0.1]))),
        ));
        assert_eq!(res, Resolution::Render(Payload::Clt(vec![0.1])));
        assert!(!orch.is_loading());
    }

    #[test]
    fn test_failures_clear_loading() {
        let mut orch = RequestOrchestrator::new();
        let ticket = orch.issue(&scan_all());
        let res = orch.complete(completion(
            ticket,
            Ok(BackendResponse::Error("bad q".into())),
        ));
        assert_eq!(res, Resolution::Failed("bad q".into()));
        assert!(!orch.is_loading());

        let ticket = orch.issue(&scan_all());
        let res = orch.complete(completion(ticket, Err(eyre!("connection refused"))));
        assert!(matches!(res, Resolution::Failed(_)));
        assert!(!orch.is_loading());
        assert_eq!(orch.failures(), 2);
    }

    #[test]
    fn test_stale_completion_ignored() {
        let mut orch = RequestOrchestrator::new();
        let first = orch.issue(&scan_all());
        let second = orch.issue(&scan_all());
        assert!(first < second);

        let res = orch.complete(completion(
            first,
            Ok(BackendResponse::Data(Payload::Clt(vec![]))),
        ));
        assert_eq!(res, Resolution::Stale);
        assert!(orch.is_loading());
        assert_eq!(orch.stale_dropped(), 1);

        let res = orch.complete(completion(
            second,
            Ok(BackendResponse::Data(Payload::Clt(vec![]))),
        ));
        assert!(matches!(res, Resolution::Render(_)));
        assert!(!orch.is_loading());
    }

    struct PanickingBackend;

    impl Backend for PanickingBackend {
        fn fetch(&self, _request: &BackendRequest) -> Result<BackendResponse> {
            panic!("backend exploded");
        }
    }

    struct FixedBackend;

    impl Backend for FixedBackend {
        fn fetch(&self, _request: &BackendRequest) -> Result<BackendResponse> {
            Ok(BackendResponse::Data(Payload::Clt(vec![1.0, 2.0])))
        }
    }

    #[test]
    fn test_spawn_delivers_completion() {
        let (tx, rx) = channel();
        let mut orch = RequestOrchestrator::new();
        let ticket = orch.issue(&scan_all());
        spawn(Arc::new(FixedBackend), ticket, scan_all(), tx);
        let Ok(AppEvent::Fetched(done)) = rx.recv_timeout(Duration::from_secs(5)) else {
            panic!("expected a completion");
        };
        assert_eq!(done.ticket, ticket);
        assert!(matches!(orch.complete(done), Resolution::Render(_)));
    }

    #[test]
    fn test_panicking_worker_still_reports() {
        let (tx, rx) = channel();
        let mut orch = RequestOrchestrator::new();
        let ticket = orch.issue(&scan_all());
        spawn(Arc::new(PanickingBackend), ticket, scan_all(), tx);
        let Ok(AppEvent::Fetched(done)) = rx.recv_timeout(Duration::from_secs(5)) else {
            panic!("expected a completion");
        };
        assert!(done.outcome.is_err());
        assert!(matches!(orch.complete(done), Resolution::Failed(_)));
        assert!(!orch.is_loading());
    }
}
