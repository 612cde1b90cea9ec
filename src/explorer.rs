//! The exploration loop
//!
//! A three-phase state machine driving Observe → Evaluate → Act transitions
//! over one [`BrowseSession`]. Observe reads the page, Evaluate lets the
//! curiosity engine pick the next action, Act executes it; a routing decision
//! after Evaluate either continues or terminates the run. The loop is the
//! only component that mutates [`CrawlState`], one committed [`StateUpdate`]
//! per step, with a checkpoint written at every step boundary.

use crate::checkpoint::CheckpointStore;
use crate::curiosity;
use crate::error::Result;
use crate::policy::UrlPolicy;
use crate::session::{ActionKind, BrowseSession};
use crate::state::{Action, CrawlState, Element, ElementKind, ErrorRecord, ScoredElement, StateUpdate};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Placeholder value filled into text-entry elements
pub const FILL_VALUE: &str = "test content";

/// Default cap on distinct visited URLs
pub const DEFAULT_MAX_VISITED_URLS: usize = 20;

/// Default cap on total loop steps
pub const DEFAULT_MAX_STEPS: usize = 50;

/// Loop phase. `Terminated` is the only terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Read errors and visible elements from the session
    Observe,
    /// Rank candidates and choose the next action
    Evaluate,
    /// Execute the chosen action
    Act,
    /// Run finished
    Terminated,
}

/// Recognized run options
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// URL the run starts from
    pub start_url: String,
    /// Stop once more than this many distinct URLs have been visited
    pub max_visited_urls: usize,
    /// Hard cap on loop iterations, a safety net against oscillation
    /// between already-visited pages
    pub max_steps: usize,
    /// Identifies this run's checkpoint slot
    pub run_id: String,
}

impl ExplorerConfig {
    /// Config with default budgets
    pub fn new<S: Into<String>, R: Into<String>>(start_url: S, run_id: R) -> Self {
        Self {
            start_url: start_url.into(),
            max_visited_urls: DEFAULT_MAX_VISITED_URLS,
            max_steps: DEFAULT_MAX_STEPS,
            run_id: run_id.into(),
        }
    }
}

/// The exploration state machine.
///
/// Owns the session and the live [`CrawlState`]; single logical thread of
/// control, one step at a time, suspending only on session calls.
pub struct Explorer<S: BrowseSession> {
    session: S,
    config: ExplorerConfig,
    checkpoints: Arc<CheckpointStore>,
    state: CrawlState,
    phase: Phase,
    steps: usize,
}

impl<S: BrowseSession> Explorer<S> {
    /// Create an explorer positioned at `config.start_url`.
    ///
    /// The session must already be initialized there; pass its reported
    /// current URL as the start URL so redirects are accounted for.
    pub fn new(session: S, config: ExplorerConfig, checkpoints: Arc<CheckpointStore>) -> Self {
        let state = CrawlState::new(&config.start_url);
        checkpoints.commit(&config.run_id, &state);
        Self {
            session,
            config,
            checkpoints,
            state,
            phase: Phase::Observe,
            steps: 0,
        }
    }

    /// The live state. Useful as a fallback when no checkpoint exists.
    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Steps executed so far
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Release the underlying session. Call on every exit path.
    pub async fn shutdown(self) -> Result<()> {
        self.session.shutdown().await
    }

    /// Drive the loop until termination and return the final state.
    ///
    /// Budget exhaustion is a controlled termination, not a failure; the run
    /// completes with partial coverage. Errors from Observe are the only
    /// fatal path, and the last checkpoint covers recovery for those.
    #[instrument(skip(self), fields(run_id = %self.config.run_id))]
    pub async fn run(&mut self) -> Result<CrawlState> {
        loop {
            if self.phase != Phase::Terminated && self.steps >= self.config.max_steps {
                warn!(steps = self.steps, "step budget exhausted, stopping");
                self.phase = Phase::Terminated;
            }

            match self.phase {
                Phase::Terminated => break,
                Phase::Observe => {
                    let update = self.observe().await?;
                    self.commit(update);
                    self.phase = Phase::Evaluate;
                }
                Phase::Evaluate => {
                    let update = self.evaluate();
                    self.commit(update);
                    self.phase = self.route();
                }
                Phase::Act => {
                    let update = self.act().await;
                    self.commit(update);
                    self.phase = Phase::Observe;
                }
            }
            self.steps += 1;
        }

        info!(
            visited = self.state.visited_urls.len(),
            actions = self.state.total_actions(),
            errors = self.state.errors.len(),
            steps = self.steps,
            "exploration finished"
        );
        Ok(self.state.clone())
    }

    /// Apply one step's update and checkpoint the result
    fn commit(&mut self, update: StateUpdate) {
        self.state.apply(update);
        self.checkpoints.commit(&self.config.run_id, &self.state);
    }

    /// Observe: drain buffered anomalies and replace the candidate queue.
    async fn observe(&mut self) -> Result<StateUpdate> {
        debug!(url = %self.state.current_url, "observing page");
        let errors = self.session.observe_errors().await;
        let elements = self.session.observe_elements().await?;
        debug!(
            errors = errors.len(),
            elements = elements.len(),
            "observation complete"
        );

        // Raw candidates; Evaluate assigns the scores
        let queue = elements
            .into_iter()
            .map(|element| ScoredElement { element, score: 0 })
            .collect();

        Ok(StateUpdate {
            errors,
            element_queue: Some(queue),
            ..Default::default()
        })
    }

    /// Evaluate: rank the queue and scan it for the first eligible action.
    ///
    /// An explicit `None` next action is the primary stopping signal, not an
    /// error.
    fn evaluate(&mut self) -> StateUpdate {
        let current = self.state.current_url.clone();
        let acted = self.state.acted_selectors(&current);
        let candidates: Vec<Element> = self
            .state
            .element_queue
            .iter()
            .map(|s| s.element.clone())
            .collect();
        debug!(candidates = candidates.len(), "scoring candidates");

        let ranked = curiosity::prioritize(candidates, &acted);

        let mut next_action = None;
        for scored in &ranked {
            let el = &scored.element;
            match (el.kind, &el.href) {
                (ElementKind::Link, Some(href)) => {
                    // Unnormalizable targets are skipped, never fatal
                    let Some(target) = UrlPolicy::resolve(&current, href) else {
                        continue;
                    };
                    if self.state.visited_urls.contains(&target) {
                        continue;
                    }
                    if !UrlPolicy::is_same_origin(&target, &current) {
                        continue;
                    }
                    next_action = Some(Action::Navigate {
                        url: target,
                        element: el.clone(),
                    });
                    break;
                }
                _ => {
                    if self.state.has_interacted(&current, &el.selector) {
                        continue;
                    }
                    let value = el.kind.is_text_entry().then(|| FILL_VALUE.to_string());
                    next_action = Some(Action::Interact {
                        element: el.clone(),
                        value,
                    });
                    break;
                }
            }
        }

        if next_action.is_none() {
            info!(url = %current, "no unvisited actions found");
        }

        StateUpdate {
            element_queue: Some(ranked),
            next_action: Some(next_action),
            ..Default::default()
        }
    }

    /// Route after Evaluate: stop on no action or blown visited budget.
    fn route(&self) -> Phase {
        if self.state.next_action.is_none() {
            info!("nothing left to explore, terminating");
            return Phase::Terminated;
        }
        if self.state.visited_urls.len() > self.config.max_visited_urls {
            info!(
                visited = self.state.visited_urls.len(),
                limit = self.config.max_visited_urls,
                "visited-URL budget reached, terminating"
            );
            return Phase::Terminated;
        }
        Phase::Act
    }

    /// Act: execute the chosen action.
    ///
    /// A failed action is recorded and leaves location state untouched for
    /// this step; the loop continues to the next Observe either way.
    async fn act(&mut self) -> StateUpdate {
        let Some(action) = self.state.next_action.clone() else {
            // Routing never enters Act without a chosen action
            warn!("act phase entered without an action");
            return StateUpdate::default();
        };

        let url_before = self.state.current_url.clone();
        let result = match &action {
            Action::Navigate { url, element } => {
                info!(target = %url, selector = %element.selector, "navigating via click");
                self.session
                    .act(&element.selector, ActionKind::Click, None)
                    .await
            }
            Action::Interact { element, value } => {
                info!(selector = %element.selector, kind = ?element.kind, "interacting");
                match value {
                    Some(v) => {
                        self.session
                            .act(&element.selector, ActionKind::Fill, Some(v))
                            .await
                    }
                    None => {
                        self.session
                            .act(&element.selector, ActionKind::Click, None)
                            .await
                    }
                }
            }
        };

        if let Err(err) = result {
            warn!(error = %err, "action failed, recording and moving on");
            return StateUpdate {
                errors: vec![ErrorRecord::action_error(err.to_string(), url_before)],
                ..Default::default()
            };
        }

        let new_url = self.session.current_url().await;
        let normalized = UrlPolicy::normalize(&new_url).unwrap_or_else(|| new_url.clone());

        StateUpdate {
            current_url: Some(new_url),
            visited_urls: BTreeSet::from([normalized]),
            crawl_map: BTreeMap::from([(url_before, vec![action])]),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Session over a permanently empty page
    struct DeadEndSession {
        url: String,
    }

    #[async_trait]
    impl BrowseSession for DeadEndSession {
        async fn observe_errors(&mut self) -> Vec<ErrorRecord> {
            Vec::new()
        }

        async fn observe_elements(&mut self) -> Result<Vec<Element>> {
            Ok(Vec::new())
        }

        async fn act(&mut self, _: &str, _: ActionKind, _: Option<&str>) -> Result<()> {
            Ok(())
        }

        async fn current_url(&mut self) -> String {
            self.url.clone()
        }

        async fn shutdown(self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = ExplorerConfig::new("https://example.test/", "run-1");
        assert_eq!(config.max_visited_urls, 20);
        assert_eq!(config.max_steps, 50);
    }

    #[tokio::test]
    async fn test_dead_end_page_terminates_immediately() {
        let session = DeadEndSession {
            url: "https://example.test/".to_string(),
        };
        let checkpoints = Arc::new(CheckpointStore::new());
        let mut explorer = Explorer::new(
            session,
            ExplorerConfig::new("https://example.test/", "run-1"),
            checkpoints.clone(),
        );

        let final_state = explorer.run().await.unwrap();

        // One Observe, one Evaluate, then Terminated
        assert_eq!(explorer.steps(), 2);
        assert!(final_state.next_action.is_none());
        assert!(final_state.crawl_map.is_empty());
        assert_eq!(final_state.visited_urls.len(), 1);
        assert_eq!(
            checkpoints.latest_snapshot("run-1"),
            Some(final_state)
        );
    }
}
