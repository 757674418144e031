//! Best-effort shipment of audit records to the logging sink.
//!
//! Delivery is supplementary telemetry, not a source of truth: one attempt,
//! no retry queue, no durability guarantee, and a failure must never fail or
//! delay the staking operation it documents. Dispatch therefore happens on a
//! detached thread and every transport error ends in a log line. Short-lived
//! callers drain in-flight dispatches with a bounded [`flush`] before exit,
//! after the operation result has already been reported.
//!
//! [`flush`]: DeliveryPipeline::flush

use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::audit::{
    format_duration, format_percentage, format_time, format_token_amount, AuditRecord, Operation,
};

const NOT_APPLICABLE: &str = "N/A";

// Field names of the sink's fixed form schema. Deployment detail, but every
// record must use the same mapping.
const FIELD_OPERATION: &str = "entry.789225441";
const FIELD_USER_ADDRESS: &str = "entry.1422429793";
const FIELD_AMOUNT_STAKED: &str = "entry.1258731213";
const FIELD_STAKE_TIER: &str = "entry.241253245";
const FIELD_STAKE_DURATION: &str = "entry.932689884";
const FIELD_REWARD_PERCENTAGE: &str = "entry.49812710";
const FIELD_STAKE_START_TIME: &str = "entry.35443853";
const FIELD_UNLOCK_TIME: &str = "entry.1389448011";
const FIELD_STAKE_END_TIME: &str = "entry.1543706863";
const FIELD_LOCKED_REWARD: &str = "entry.710024409";
const FIELD_RECEIVED_REWARD: &str = "entry.1984049138";
const FIELD_COMPLETION_CHECK: &str = "entry.744966987";

/// Internal to the pipeline: logged, never propagated to callers.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// For transports that can observe a sink-side rejection.
    #[error("audit sink rejected the request: {0}")]
    Rejected(String),
}

/// One way of getting a form body to the sink. Selected once at startup,
/// not re-detected per call.
pub trait AuditTransport: Send + Sync {
    fn submit(&self, url: &str, form: &[(&'static str, String)]) -> Result<(), DeliveryError>;
}

/// Primary transport: a shared client whose response is treated as opaque.
/// Success means the request was dispatched without a transport-level error;
/// status and body are never consulted.
pub struct OpaquePostTransport {
    client: reqwest::blocking::Client,
}

impl OpaquePostTransport {
    pub fn new() -> Result<Self, DeliveryError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(OpaquePostTransport { client })
    }
}

impl AuditTransport for OpaquePostTransport {
    fn submit(&self, url: &str, form: &[(&'static str, String)]) -> Result<(), DeliveryError> {
        self.client.post(url).form(form).send()?;
        Ok(())
    }
}

/// Fallback transport: builds a fresh client per call with an explicit
/// overall timeout, so a hanging sink cannot pin the detached thread.
/// Headers and body are identical to the primary's.
pub struct TimedPostTransport {
    timeout: Duration,
}

impl TimedPostTransport {
    pub fn new(timeout: Duration) -> Self {
        TimedPostTransport { timeout }
    }
}

impl AuditTransport for TimedPostTransport {
    fn submit(&self, url: &str, form: &[(&'static str, String)]) -> Result<(), DeliveryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        client.post(url).form(form).send()?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct DeliveryPipeline {
    sink_url: Arc<str>,
    transport: Arc<dyn AuditTransport>,
    // completion signals of dispatch threads; shared across clones so a
    // flush sees deliveries started through any of them
    in_flight: Arc<Mutex<Vec<mpsc::Receiver<()>>>>,
}

impl DeliveryPipeline {
    pub fn new(sink_url: impl Into<Arc<str>>, transport: Arc<dyn AuditTransport>) -> Self {
        DeliveryPipeline {
            sink_url: sink_url.into(),
            transport,
            in_flight: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Capability detection at startup: use the shared opaque client when it
    /// can be constructed in this environment, otherwise fall back to the
    /// timeout-bounded per-call transport.
    pub fn from_environment(sink_url: impl Into<Arc<str>>, fallback_timeout: Duration) -> Self {
        match OpaquePostTransport::new() {
            Ok(primary) => DeliveryPipeline::new(sink_url, Arc::new(primary)),
            Err(err) => {
                warn!(error = %err, "primary audit transport unavailable, using timed fallback");
                DeliveryPipeline::new(sink_url, Arc::new(TimedPostTransport::new(fallback_timeout)))
            }
        }
    }

    /// Flattens a record into the sink's form schema. Not-applicable fields
    /// are sent as the literal "N/A" so the sink never sees an empty column.
    pub fn serialize(record: &AuditRecord) -> Vec<(&'static str, String)> {
        let opt_amount = |v: Option<u64>| {
            v.map(format_token_amount)
                .unwrap_or_else(|| NOT_APPLICABLE.to_string())
        };
        let opt_time = |v: Option<i64>| {
            v.map(format_time)
                .unwrap_or_else(|| NOT_APPLICABLE.to_string())
        };

        vec![
            (FIELD_OPERATION, record.operation.to_string()),
            (FIELD_USER_ADDRESS, record.user_address.to_string()),
            (
                FIELD_AMOUNT_STAKED,
                format_token_amount(record.amount_staked),
            ),
            (FIELD_STAKE_TIER, record.tier.to_string()),
            (
                FIELD_STAKE_DURATION,
                record
                    .stake_duration
                    .map(format_duration)
                    .unwrap_or_else(|| NOT_APPLICABLE.to_string()),
            ),
            (
                FIELD_REWARD_PERCENTAGE,
                format_percentage(record.reward_percentage),
            ),
            (FIELD_STAKE_START_TIME, format_time(record.stake_start_time)),
            (FIELD_UNLOCK_TIME, opt_time(record.unlock_time)),
            (FIELD_STAKE_END_TIME, opt_time(record.stake_end_time)),
            (FIELD_LOCKED_REWARD, opt_amount(record.locked_reward)),
            (FIELD_RECEIVED_REWARD, opt_amount(record.released_reward)),
            (FIELD_COMPLETION_CHECK, record.completion.to_string()),
        ]
    }

    /// Fire-and-forget: serializes the record and hands it to the transport
    /// on a detached thread. Returns immediately; a slow or failing sink
    /// never affects the caller. A short-lived process must call [`flush`]
    /// before exiting or the attempt dies with it.
    ///
    /// [`flush`]: DeliveryPipeline::flush
    pub fn deliver(&self, record: &AuditRecord) {
        let form = Self::serialize(record);
        let pipeline = self.clone();
        let operation = record.operation;
        let (done_tx, done_rx) = mpsc::channel();
        self.pending().push(done_rx);
        thread::spawn(move || {
            pipeline.dispatch(operation, form);
            let _ = done_tx.send(());
        });
    }

    /// Waits up to `timeout` for in-flight deliveries to finish. The bound
    /// covers all of them together; anything still running afterwards is
    /// abandoned with a warning.
    pub fn flush(&self, timeout: Duration) {
        let receivers: Vec<_> = self.pending().drain(..).collect();
        let deadline = Instant::now() + timeout;
        for done_rx in receivers {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if let Err(mpsc::RecvTimeoutError::Timeout) = done_rx.recv_timeout(remaining) {
                warn!("audit delivery still in flight after {timeout:?}, abandoning it");
            }
        }
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::Receiver<()>>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn dispatch(&self, operation: Operation, form: Vec<(&'static str, String)>) {
        match self.transport.submit(&self.sink_url, &form) {
            Ok(()) => debug!(%operation, "audit record delivered"),
            Err(err) => warn!(%operation, error = %err, "audit delivery failed, record dropped"),
        }
    }
}
