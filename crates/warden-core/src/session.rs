//! Per-session runtime: claim verification, the claim log, elevation and
//! metrics for one admitted agent.
//!
//! A session owns its `SessionLease`, so dropping or closing it frees the
//! agent id in the gateway. Claims within one message are verified
//! concurrently; a `TeardownHandle` cancels anything still in flight.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use warden_contracts::{
    claim::{AgentMessage, ClaimRecord, VerificationResult},
    error::{VerificationError, WardenError, WardenResult},
    manifest::{MemoryState, ValidatedManifest},
    metrics::MetricsSnapshot,
    sandbox::{ElevationRequest, SandboxPolicy},
    session::{SessionHistory, SessionId},
    trust::TrustScore,
};

use crate::gateway::{Admission, SessionLease};
use crate::traits::{ClaimLogWriter, ClaimVerifier, MetricsAggregator, PolicyDeriver};

/// The outcome of verifying one claim: a terminal label or a transient error.
pub type ClaimOutcome = Result<VerificationResult, VerificationError>;

/// Read-only services shared by every session of a gateway.
#[derive(Clone)]
pub struct SessionServices {
    pub verifier: Arc<dyn ClaimVerifier>,
    pub deriver: Arc<dyn PolicyDeriver>,
    pub aggregator: Arc<dyn MetricsAggregator>,
}

/// Tears a session down from outside, e.g. when the transport disconnects.
///
/// Teardown only stops the session from doing work. The agent id stays
/// reserved in the gateway until the owner drops or closes the `Session`,
/// which releases its lease.
#[derive(Debug, Clone)]
pub struct TeardownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl TeardownHandle {
    /// Idempotent. In-flight verifications resolve as `Cancelled`.
    pub fn teardown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_torn_down(&self) -> bool {
        *self.tx.borrow()
    }
}

/// One running agent session.
pub struct Session {
    session_id: SessionId,
    manifest: ValidatedManifest,
    prior_memory: Option<MemoryState>,
    trust_score: TrustScore,
    policy: SandboxPolicy,
    /// Earlier policy snapshots, oldest first.
    superseded: Vec<SandboxPolicy>,
    messages: Vec<AgentMessage>,
    log: Box<dyn ClaimLogWriter>,
    services: SessionServices,
    teardown_tx: Arc<watch::Sender<bool>>,
    teardown_rx: watch::Receiver<bool>,
    _lease: SessionLease,
}

impl Session {
    pub fn open(admission: Admission, services: SessionServices, log: Box<dyn ClaimLogWriter>) -> Self {
        let Admission {
            assignment,
            manifest,
            prior_memory,
            lease,
        } = admission;
        let (tx, rx) = watch::channel(false);

        info!(
            session_id = %assignment.session_id,
            agent_id = %assignment.agent_id,
            revision = assignment.policy.revision,
            "session opened"
        );

        Self {
            session_id: assignment.session_id,
            manifest,
            prior_memory,
            trust_score: assignment.trust_score,
            policy: assignment.policy,
            superseded: Vec::new(),
            messages: Vec::new(),
            log,
            services,
            teardown_tx: Arc::new(tx),
            teardown_rx: rx,
            _lease: lease,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn manifest(&self) -> &ValidatedManifest {
        &self.manifest
    }

    pub fn trust_score(&self) -> TrustScore {
        self.trust_score
    }

    /// The current policy snapshot.
    pub fn policy(&self) -> &SandboxPolicy {
        &self.policy
    }

    /// Every policy snapshot this session has held, oldest first.
    pub fn policy_history(&self) -> impl Iterator<Item = &SandboxPolicy> {
        self.superseded.iter().chain(std::iter::once(&self.policy))
    }

    pub fn claim_log(&self) -> &dyn ClaimLogWriter {
        self.log.as_ref()
    }

    pub fn teardown_handle(&self) -> TeardownHandle {
        TeardownHandle {
            tx: Arc::clone(&self.teardown_tx),
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.teardown_rx.borrow()
    }

    /// Verify every claim in `message`, log the labeled ones, and return one
    /// outcome per claim in the order the claims appear in the message.
    ///
    /// Transient failures are returned to the caller and never logged, so the
    /// same claim can be resubmitted later.
    ///
    /// # Errors
    ///
    /// `SessionClosed` if the session was torn down before or during
    /// verification; nothing from this message is logged in that case.
    pub async fn submit(&mut self, message: AgentMessage) -> WardenResult<Vec<ClaimOutcome>> {
        self.ensure_open()?;
        debug!(
            session_id = %self.session_id,
            sender_id = %message.sender_id,
            claims = message.claims.len(),
            "message submitted"
        );

        let verifications = message.claims.iter().map(|claim| {
            let verifier = Arc::clone(&self.services.verifier);
            let mut teardown = self.teardown_rx.clone();
            async move {
                tokio::select! {
                    biased;
                    _ = wait_for_teardown(&mut teardown) => Err(VerificationError::Cancelled {
                        claim_id: claim.claim_id.clone(),
                    }),
                    outcome = verifier.verify(claim) => outcome,
                }
            }
        });
        let outcomes: Vec<ClaimOutcome> = join_all(verifications).await;

        if self.is_closed() {
            warn!(
                session_id = %self.session_id,
                discarded = outcomes.len(),
                "session torn down during verification"
            );
            return Err(self.closed_error());
        }

        for (claim, outcome) in message.claims.iter().zip(&outcomes) {
            match outcome {
                Ok(result) => {
                    let record = ClaimRecord {
                        claim: claim.clone(),
                        result: result.clone(),
                        recorded_at: Utc::now(),
                    };
                    let sequence = self.log.append(&record)?;
                    debug!(
                        session_id = %self.session_id,
                        claim_id = %claim.claim_id,
                        label = %result.label,
                        sequence,
                        "claim labeled"
                    );
                }
                Err(e) => {
                    warn!(
                        session_id = %self.session_id,
                        claim_id = %claim.claim_id,
                        retryable = e.is_retryable(),
                        error = %e,
                        "claim verification failed"
                    );
                }
            }
        }

        self.messages.push(message);
        Ok(outcomes)
    }

    /// Ask for more resources. On success the new snapshot becomes current
    /// and the previous one is kept in `policy_history`.
    ///
    /// # Errors
    ///
    /// `ElevationRejected` when the request exceeds the remaining budget;
    /// the current policy is unchanged. `SessionClosed` after teardown.
    pub fn request_elevation(&mut self, request: ElevationRequest) -> WardenResult<&SandboxPolicy> {
        self.ensure_open()?;

        let elevated = match self.services.deriver.elevate(&self.policy, &request) {
            Ok(policy) => policy,
            Err(e) => {
                warn!(
                    session_id = %self.session_id,
                    additional_cpu = request.additional_cpu,
                    additional_memory_gb = request.additional_memory_gb,
                    error = %e,
                    "elevation rejected"
                );
                return Err(e);
            }
        };

        let previous = std::mem::replace(&mut self.policy, elevated);
        self.superseded.push(previous);
        info!(
            session_id = %self.session_id,
            revision = self.policy.revision,
            cpu_limit = self.policy.cpu_limit,
            memory_limit_gb = self.policy.memory_limit_gb,
            "elevation granted"
        );
        Ok(&self.policy)
    }

    /// Metrics over everything the session has seen so far.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let records = self.log.records();
        let history = SessionHistory {
            messages: &self.messages,
            claims: &records,
            memory: &self.manifest.manifest().memory_state,
            prior_memory: self.prior_memory.as_ref(),
        };
        self.services.aggregator.snapshot(&history)
    }

    /// Tear down, seal the claim log and return the final metrics.
    pub fn close(self) -> WardenResult<MetricsSnapshot> {
        self.teardown_tx.send_replace(true);
        let snapshot = self.snapshot();
        self.log.seal(&self.session_id.to_string())?;
        info!(
            session_id = %self.session_id,
            messages = snapshot.message_count,
            claims = snapshot.claim_count,
            composite = snapshot.composite,
            "session closed"
        );
        Ok(snapshot)
    }

    fn ensure_open(&self) -> WardenResult<()> {
        if self.is_closed() {
            return Err(self.closed_error());
        }
        Ok(())
    }

    fn closed_error(&self) -> WardenError {
        WardenError::SessionClosed {
            session_id: self.session_id.to_string(),
        }
    }
}

/// Resolves once the teardown flag is set. Never resolves if every sender is gone.
async fn wait_for_teardown(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
