use crossbeam_channel::{Receiver, Sender, TrySendError, unbounded};
use tracing::{trace, warn};

use crate::{HighlightError, HighlightRequest, HighlightResult};

/// Whether a worker pool is present and accepting work. Mirrors the
/// renderer's "present and in working mode" check before it takes the
/// worker-backed highlight path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerMode {
    Working,
    Unavailable,
}

/// One unit of work handed to the worker side of the channel.
pub struct Job {
    pub id: u64,
    pub request: HighlightRequest,
}

/// The worker side's reply, matched back to its `Job` by `id`.
pub struct JobResult {
    pub id: u64,
    pub result: Result<HighlightResult, HighlightError>,
}

/// A request/response channel standing in for an out-of-process
/// highlighter worker. The core never spawns or manages the worker thread
/// itself — a host wires `run_worker_loop` to whatever off-thread executor
/// it has (a real OS thread, a web worker bridge, …); this type only owns
/// the channel pair and in-flight bookkeeping.
pub struct HighlightWorkerPool {
    mode: WorkerMode,
    job_tx: Sender<Job>,
    job_rx: Option<Receiver<Job>>,
    result_tx: Sender<JobResult>,
    result_rx: Receiver<JobResult>,
    next_id: u64,
    in_flight: Vec<u64>,
}

impl HighlightWorkerPool {
    pub fn new() -> Self {
        let (job_tx, job_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();
        Self {
            mode: WorkerMode::Unavailable,
            job_tx,
            job_rx: Some(job_rx),
            result_tx,
            result_rx,
            next_id: 0,
            in_flight: Vec::new(),
        }
    }

    /// Claim the job receiver for a worker loop. Returns `None` if already
    /// claimed — there is exactly one worker side per pool.
    pub fn take_job_receiver(&mut self) -> Option<Receiver<Job>> {
        self.job_rx.take()
    }

    pub fn result_sender(&self) -> Sender<JobResult> {
        self.result_tx.clone()
    }

    pub fn mark_working(&mut self) {
        self.mode = WorkerMode::Working;
    }

    pub fn mark_unavailable(&mut self) {
        self.mode = WorkerMode::Unavailable;
    }

    pub fn mode(&self) -> WorkerMode {
        self.mode
    }

    /// Enqueue an asynchronous highlight request, returning the job id the
    /// caller should match against `poll_results`.
    pub fn request(&mut self, request: HighlightRequest) -> Option<u64> {
        if self.mode != WorkerMode::Working {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        match self.job_tx.try_send(Job { id, request }) {
            Ok(()) => {
                trace!(job_id = id, "queued async highlight request");
                self.in_flight.push(id);
                Some(id)
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("highlight worker channel disconnected; falling back to unavailable");
                self.mode = WorkerMode::Unavailable;
                None
            }
            Err(TrySendError::Full(_)) => unreachable!("unbounded channel never reports full"),
        }
    }

    /// Drain any completed jobs without blocking. The caller checks each
    /// `id` against the request it cares about and discards the rest (a
    /// response for a file that was since replaced, per `spec.md` §5
    /// cancellation semantics).
    pub fn poll_results(&mut self) -> Vec<(u64, Result<HighlightResult, HighlightError>)> {
        let mut out = Vec::new();
        while let Ok(job_result) = self.result_rx.try_recv() {
            self.in_flight.retain(|id| *id != job_result.id);
            out.push((job_result.id, job_result.result));
        }
        out
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }
}

impl Default for HighlightWorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ThemeSet;

    #[test]
    fn request_requires_working_mode() {
        let mut pool = HighlightWorkerPool::new();
        let request = HighlightRequest {
            source: "a".into(),
            lang: None,
            themes: ThemeSet::Single("dark".into()),
            tokenize_max_line_length: None,
        };
        assert!(pool.request(request).is_none());
    }

    #[test]
    fn round_trip_through_channel() {
        let mut pool = HighlightWorkerPool::new();
        pool.mark_working();
        let job_rx = pool.take_job_receiver().unwrap();
        let result_tx = pool.result_sender();

        let request = HighlightRequest {
            source: "a\nb\n".into(),
            lang: None,
            themes: ThemeSet::Single("dark".into()),
            tokenize_max_line_length: None,
        };
        let id = pool.request(request).unwrap();
        assert_eq!(pool.in_flight_count(), 1);

        let job = job_rx.try_recv().unwrap();
        assert_eq!(job.id, id);
        result_tx
            .send(JobResult {
                id: job.id,
                result: Ok(HighlightResult::default()),
            })
            .unwrap();

        let results = pool.poll_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, id);
        assert_eq!(pool.in_flight_count(), 0);
    }
}
