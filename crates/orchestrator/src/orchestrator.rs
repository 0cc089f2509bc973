use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio::sync::Mutex;

use crate::error::OrchestratorError;
use crate::failure::FailureInfo;
use crate::state::{Phase, SessionSnapshot};
use diligence::{ClaimVerifier, CompetitorResearcher, RedFlagDetector};
use extract::{AnalysisResult, Analyzer};
use ingest::{DeckError, PitchDeck};
use model::GenerativeModel;
use synthesis::{ChatSession, ChatTurn, MemoSynthesizer};

/// How one `analyze_deck` call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Ready,
    Failed(FailureInfo),
    /// A newer upload started before this attempt finished; its results were dropped
    Superseded,
}

struct SessionState {
    view: SessionSnapshot,
    chat: Option<Arc<Mutex<ChatSession>>>,
}

struct Inner {
    model: Arc<dyn GenerativeModel>,
    analyzer: Analyzer,
    researcher: CompetitorResearcher,
    detector: RedFlagDetector,
    synthesizer: MemoSynthesizer,
    epoch: AtomicU64,
    state: Mutex<SessionState>,
}

/// Drives one analysis session: primary analysis, concurrent enrichment,
/// then on-demand memo and chat.
///
/// Every upload bumps the epoch. State writes carry the epoch they were
/// issued under and are dropped when it is no longer current.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn GenerativeModel>, verifier: Arc<dyn ClaimVerifier>) -> Self {
        Self::with_detector(model.clone(), RedFlagDetector::new(model, verifier))
    }

    pub fn with_detector(model: Arc<dyn GenerativeModel>, detector: RedFlagDetector) -> Self {
        Self {
            inner: Arc::new(Inner {
                analyzer: Analyzer::new(model.clone()),
                researcher: CompetitorResearcher::new(model.clone()),
                synthesizer: MemoSynthesizer::new(model.clone()),
                detector,
                model,
                epoch: AtomicU64::new(0),
                state: Mutex::new(SessionState {
                    view: SessionSnapshot::default(),
                    chat: None,
                }),
            }),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.lock().await.view.clone()
    }

    /// Start a new attempt: bump the epoch and discard every earlier result.
    pub async fn begin_upload(&self, file_name: Option<String>) -> u64 {
        let mut state = self.inner.state.lock().await;
        // Bumped under the state lock so no commit can interleave with the reset
        let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        state.view = SessionSnapshot::for_attempt(epoch, file_name);
        state.chat = None;
        tracing::info!(epoch, "Analysis attempt started");
        epoch
    }

    /// Record an upload that never produced a usable deck.
    pub async fn reject_upload(&self, epoch: u64, err: &DeckError) -> AttemptOutcome {
        let failure = FailureInfo::from(err);
        let committed = self
            .commit(epoch, |view| {
                view.phase = Phase::PrimaryAnalysisFailed;
                view.failure = Some(failure.clone());
            })
            .await;
        tracing::warn!(epoch, error = %err, "Upload rejected");
        if committed {
            AttemptOutcome::Failed(failure)
        } else {
            AttemptOutcome::Superseded
        }
    }

    /// Run a full attempt for an already validated deck.
    pub async fn analyze_deck(&self, deck: PitchDeck) -> AttemptOutcome {
        let epoch = self.begin_upload(Some(deck.file_name.clone())).await;
        self.run_attempt(epoch, deck).await
    }

    /// Analysis and enrichment for an attempt opened by [`Self::begin_upload`].
    pub async fn run_attempt(&self, epoch: u64, deck: PitchDeck) -> AttemptOutcome {
        let started = Instant::now();
        let doc_id = deck.doc_id.clone();
        let file_name = deck.file_name.clone();

        if !self
            .commit(epoch, |view| {
                view.phase = Phase::PrimaryAnalysisInFlight;
                view.file_name = Some(file_name);
                view.doc_id = Some(doc_id);
            })
            .await
        {
            return AttemptOutcome::Superseded;
        }

        let analysis = match self.inner.analyzer.analyze(&deck).await {
            Ok(analysis) => analysis,
            Err(e) => {
                let failure = FailureInfo::from(&e);
                tracing::warn!(epoch, error = %e, "Primary analysis failed");
                let committed = self
                    .commit(epoch, |view| {
                        view.phase = Phase::PrimaryAnalysisFailed;
                        view.failure = Some(failure.clone());
                    })
                    .await;
                return if committed {
                    AttemptOutcome::Failed(failure)
                } else {
                    AttemptOutcome::Superseded
                };
            }
        };

        let committed = self
            .commit(epoch, |view| {
                view.phase = Phase::EnrichmentInFlight;
                view.analysis = Some(analysis.clone());
                view.competitors_loading = true;
                view.red_flags_loading = true;
            })
            .await;
        if !committed {
            tracing::info!(epoch, "Discarding analysis from superseded attempt");
            return AttemptOutcome::Superseded;
        }

        tokio::join!(
            self.enrich_competitors(epoch, &analysis),
            self.enrich_red_flags(epoch, &analysis)
        );

        if !self.commit(epoch, |view| view.phase = Phase::Ready).await {
            return AttemptOutcome::Superseded;
        }

        tracing::info!(
            epoch,
            company = %analysis.company_name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis session ready"
        );
        AttemptOutcome::Ready
    }

    async fn enrich_competitors(&self, epoch: u64, analysis: &AnalysisResult) {
        let result = self
            .inner
            .researcher
            .research(&analysis.company_name, &analysis.sector)
            .await;
        if let Err(e) = &result {
            tracing::warn!(epoch, error = %e, "Competitor research failed");
        }
        self.commit(epoch, |view| {
            view.competitors_loading = false;
            match result {
                Ok(intel) => view.competitor_intel = Some(intel),
                Err(e) => view.competitor_error = Some(e.to_string()),
            }
        })
        .await;
    }

    async fn enrich_red_flags(&self, epoch: u64, analysis: &AnalysisResult) {
        let result = self.inner.detector.detect(analysis).await;
        if let Err(e) = &result {
            tracing::warn!(epoch, error = %e, "Red-flag detection failed");
        }
        self.commit(epoch, |view| {
            view.red_flags_loading = false;
            match result {
                Ok(report) => view.red_flags = Some(report),
                Err(e) => view.red_flags_error = Some(e.to_string()),
            }
        })
        .await;
    }

    /// Generate (or regenerate) the memo from the current results.
    ///
    /// The work runs as its own task, so the in-flight flag is cleared even
    /// when the caller's future is dropped before the model answers.
    pub async fn generate_memo(&self) -> Result<String, OrchestratorError> {
        let this = self.clone();
        tokio::spawn(async move { this.run_memo().await })
            .await
            .map_err(|e| OrchestratorError::Interrupted(e.to_string()))?
    }

    async fn run_memo(&self) -> Result<String, OrchestratorError> {
        let (epoch, analysis, competitors, red_flags) = {
            let mut state = self.inner.state.lock().await;
            let view = &mut state.view;
            let analysis = match (&view.analysis, view.phase) {
                (Some(analysis), Phase::Ready) => analysis.clone(),
                _ => return Err(OrchestratorError::NotReady(view.phase)),
            };
            if view.memo_in_flight {
                return Err(OrchestratorError::MemoInFlight);
            }
            view.memo_in_flight = true;
            view.memo_error = None;
            (
                view.epoch,
                analysis,
                view.competitor_intel.clone(),
                view.red_flags.clone(),
            )
        };

        let result = self
            .inner
            .synthesizer
            .generate(&analysis, competitors.as_deref(), red_flags.as_ref())
            .await;

        match result {
            Ok(memo) => {
                let committed = self
                    .commit(epoch, |view| {
                        view.memo_in_flight = false;
                        view.memo = Some(memo.clone());
                    })
                    .await;
                if committed {
                    Ok(memo)
                } else {
                    Err(OrchestratorError::Superseded)
                }
            }
            Err(e) => {
                let failure = FailureInfo::from(&e);
                tracing::warn!(epoch, error = %e, "Memo generation failed");
                let committed = self
                    .commit(epoch, |view| {
                        view.memo_in_flight = false;
                        view.memo_error = Some(failure.clone());
                    })
                    .await;
                if committed {
                    Err(OrchestratorError::Memo(failure))
                } else {
                    Err(OrchestratorError::Superseded)
                }
            }
        }
    }

    /// One chat turn. Turns are serialized on the session; a failed turn is
    /// answered with an apology rather than an error.
    ///
    /// A started turn always runs to completion, so the transcript never holds
    /// a question without its answer.
    pub async fn send_chat(&self, text: &str) -> Result<ChatTurn, OrchestratorError> {
        if text.trim().is_empty() {
            return Err(OrchestratorError::EmptyMessage);
        }

        let this = self.clone();
        let text = text.to_string();
        tokio::spawn(async move { this.run_chat_turn(&text).await })
            .await
            .map_err(|e| OrchestratorError::Interrupted(e.to_string()))?
    }

    async fn run_chat_turn(&self, text: &str) -> Result<ChatTurn, OrchestratorError> {

        let (epoch, session) = {
            let mut state = self.inner.state.lock().await;
            let analysis = match (&state.view.analysis, state.view.phase) {
                (Some(analysis), Phase::Ready) => analysis.clone(),
                _ => return Err(OrchestratorError::NotReady(state.view.phase)),
            };
            let model = self.inner.model.clone();
            let session = state
                .chat
                .get_or_insert_with(|| Arc::new(Mutex::new(ChatSession::new(model, &analysis))))
                .clone();
            state.view.chat_turns_in_flight += 1;
            (state.view.epoch, session)
        };

        let mut session = session.lock().await;
        let turn = session.ask(text).await;
        let transcript = session.transcript().to_vec();
        drop(session);

        let committed = self
            .commit(epoch, |view| {
                view.chat_turns_in_flight = view.chat_turns_in_flight.saturating_sub(1);
                view.chat = transcript;
            })
            .await;
        if committed {
            Ok(turn)
        } else {
            Err(OrchestratorError::Superseded)
        }
    }

    /// Apply `update` only if `epoch` is still the current attempt.
    async fn commit(&self, epoch: u64, update: impl FnOnce(&mut SessionSnapshot)) -> bool {
        let mut state = self.inner.state.lock().await;
        if self.inner.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!(
                epoch,
                current = self.inner.epoch.load(Ordering::SeqCst),
                "Dropping write from superseded attempt"
            );
            return false;
        }
        update(&mut state.view);
        true
    }
}
