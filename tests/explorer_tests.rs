//! Exploration loop tests
//!
//! These tests drive the full Observe → Evaluate → Act loop against a
//! scripted in-memory session, covering action selection, budgets, error
//! recovery, and checkpoint-based recovery after a hard failure.

use async_trait::async_trait;
use curiocrawl::error::{ActionError, Error, Result};
use curiocrawl::session::{ActionKind, BrowseSession};
use curiocrawl::state::{Action, Element, ElementKind, ErrorKind, ErrorRecord};
use curiocrawl::{CheckpointStore, Explorer, ExplorerConfig};
use pretty_assertions::assert_eq;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// One primitive action the fake session performed
#[derive(Debug, Clone, PartialEq, Eq)]
enum Performed {
    Click(String),
    Fill(String, String),
}

/// Scripted stand-in for a browser session.
///
/// Pages are keyed by URL; clicking a selector with a registered navigation
/// target moves the session there. Failures are injected per selector.
struct FakeSession {
    current: String,
    pages: HashMap<String, Vec<Element>>,
    nav_targets: HashMap<String, String>,
    fail_once: HashSet<String>,
    always_fail: HashSet<String>,
    pending_errors: Vec<ErrorRecord>,
    fail_observe_at: Option<usize>,
    observe_count: usize,
    performed: Arc<Mutex<Vec<Performed>>>,
}

impl FakeSession {
    fn new(start: &str) -> Self {
        Self {
            current: start.to_string(),
            pages: HashMap::new(),
            nav_targets: HashMap::new(),
            fail_once: HashSet::new(),
            always_fail: HashSet::new(),
            pending_errors: Vec::new(),
            fail_observe_at: None,
            observe_count: 0,
            performed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn page(mut self, url: &str, elements: Vec<Element>) -> Self {
        self.pages.insert(url.to_string(), elements);
        self
    }

    fn nav(mut self, selector: &str, target: &str) -> Self {
        self.nav_targets
            .insert(selector.to_string(), target.to_string());
        self
    }

    fn fail_once(mut self, selector: &str) -> Self {
        self.fail_once.insert(selector.to_string());
        self
    }

    fn always_fail(mut self, selector: &str) -> Self {
        self.always_fail.insert(selector.to_string());
        self
    }

    fn pending_error(mut self, record: ErrorRecord) -> Self {
        self.pending_errors.push(record);
        self
    }

    fn fail_observe_at(mut self, nth: usize) -> Self {
        self.fail_observe_at = Some(nth);
        self
    }

    fn performed_log(&self) -> Arc<Mutex<Vec<Performed>>> {
        self.performed.clone()
    }
}

#[async_trait]
impl BrowseSession for FakeSession {
    async fn observe_errors(&mut self) -> Vec<ErrorRecord> {
        std::mem::take(&mut self.pending_errors)
    }

    async fn observe_elements(&mut self) -> Result<Vec<Element>> {
        self.observe_count += 1;
        if self.fail_observe_at == Some(self.observe_count) {
            return Err(Error::cdp("page crashed"));
        }
        Ok(self.pages.get(&self.current).cloned().unwrap_or_default())
    }

    async fn act(&mut self, selector: &str, kind: ActionKind, value: Option<&str>) -> Result<()> {
        if self.always_fail.contains(selector) || self.fail_once.remove(selector) {
            return Err(ActionError::new(selector, "element not interactable").into());
        }
        self.performed.lock().unwrap().push(match kind {
            ActionKind::Click => Performed::Click(selector.to_string()),
            ActionKind::Fill => Performed::Fill(
                selector.to_string(),
                value.unwrap_or_default().to_string(),
            ),
        });
        if let Some(target) = self.nav_targets.get(selector) {
            self.current = target.clone();
        }
        Ok(())
    }

    async fn current_url(&mut self) -> String {
        self.current.clone()
    }

    async fn shutdown(self) -> Result<()> {
        Ok(())
    }
}

fn link(selector: &str, href: &str, text: &str) -> Element {
    Element {
        id: format!("el_{selector}"),
        kind: ElementKind::Link,
        input_type: None,
        text: text.to_string(),
        href: Some(href.to_string()),
        selector: selector.to_string(),
        visible: true,
    }
}

fn button(selector: &str, text: &str) -> Element {
    Element {
        id: format!("el_{selector}"),
        kind: ElementKind::Button,
        input_type: None,
        text: text.to_string(),
        href: None,
        selector: selector.to_string(),
        visible: true,
    }
}

fn text_input(selector: &str, text: &str) -> Element {
    Element {
        id: format!("el_{selector}"),
        kind: ElementKind::Input,
        input_type: Some("text".to_string()),
        text: text.to_string(),
        href: None,
        selector: selector.to_string(),
        visible: true,
    }
}

const START: &str = "https://example.test/";

#[tokio::test]
async fn risky_button_is_chosen_before_plain_link() {
    let session = FakeSession::new(START)
        .page(
            START,
            vec![
                link("a.about", "/about", "About us"),
                button("#delete-account", "Delete account"),
            ],
        )
        .page("https://example.test/about", vec![])
        .nav("a.about", "https://example.test/about")
        .pending_error(ErrorRecord::console_error("boot warning", START));
    let performed = session.performed_log();

    let checkpoints = Arc::new(CheckpointStore::new());
    let mut explorer = Explorer::new(
        session,
        ExplorerConfig::new(START, "run-e2e"),
        checkpoints.clone(),
    );

    let final_state = explorer.run().await.unwrap();
    explorer.shutdown().await.unwrap();

    // The delete button outranks the navigate; the link is taken once the
    // button's selector is de-prioritized and deduplicated
    assert_eq!(
        *performed.lock().unwrap(),
        vec![
            Performed::Click("#delete-account".to_string()),
            Performed::Click("a.about".to_string()),
        ]
    );

    assert_eq!(
        final_state.visited_urls,
        BTreeSet::from([
            START.to_string(),
            "https://example.test/about".to_string(),
        ])
    );

    let actions = &final_state.crawl_map[START];
    assert_eq!(actions.len(), 2);
    assert!(actions[0].is_interact());
    assert!(
        matches!(&actions[1], Action::Navigate { url, .. } if url == "https://example.test/about")
    );

    // The buffered console error was drained into the run's error list
    assert_eq!(final_state.errors.len(), 1);
    assert_eq!(final_state.errors[0].kind, ErrorKind::ConsoleError);
}

#[tokio::test]
async fn dead_end_page_terminates_without_actions() {
    let session = FakeSession::new(START).page(START, vec![]);
    let performed = session.performed_log();

    let checkpoints = Arc::new(CheckpointStore::new());
    let mut explorer =
        Explorer::new(session, ExplorerConfig::new(START, "run-dead-end"), checkpoints);

    let final_state = explorer.run().await.unwrap();

    assert!(performed.lock().unwrap().is_empty());
    assert!(final_state.crawl_map.is_empty());
    assert!(final_state.next_action.is_none());
    assert_eq!(final_state.visited_urls.len(), 1);
}

#[tokio::test]
async fn external_and_visited_links_are_skipped() {
    let session = FakeSession::new(START).page(
        START,
        vec![
            link("a.partner", "https://evil.test/offer", "partner site"),
            link("a.home", "/", "Home"),
        ],
    );
    let performed = session.performed_log();

    let checkpoints = Arc::new(CheckpointStore::new());
    let mut explorer =
        Explorer::new(session, ExplorerConfig::new(START, "run-gate"), checkpoints);

    let final_state = explorer.run().await.unwrap();

    // The external link fails the same-origin gate, the home link is already
    // visited; neither yields an action
    assert!(performed.lock().unwrap().is_empty());
    assert!(final_state.crawl_map.is_empty());
    assert_eq!(final_state.visited_urls.len(), 1);
}

#[tokio::test]
async fn text_inputs_are_filled_with_placeholder() {
    let session = FakeSession::new(START).page(
        START,
        vec![
            text_input("input.q", "Search"),
            link("a.home", "/", "Home"),
        ],
    );
    let performed = session.performed_log();

    let checkpoints = Arc::new(CheckpointStore::new());
    let mut explorer =
        Explorer::new(session, ExplorerConfig::new(START, "run-fill"), checkpoints);

    let final_state = explorer.run().await.unwrap();

    assert_eq!(
        *performed.lock().unwrap(),
        vec![Performed::Fill(
            "input.q".to_string(),
            "test content".to_string()
        )]
    );
    assert_eq!(final_state.crawl_map[START].len(), 1);
}

#[tokio::test]
async fn visited_budget_halts_exploration() {
    let session = FakeSession::new(START)
        .page(START, vec![link("a.p1", "/p1", "page one")])
        .page("https://example.test/p1", vec![link("a.p2", "/p2", "page two")])
        .page("https://example.test/p2", vec![link("a.p3", "/p3", "page three")])
        .nav("a.p1", "https://example.test/p1")
        .nav("a.p2", "https://example.test/p2");
    let performed = session.performed_log();

    let mut config = ExplorerConfig::new(START, "run-budget");
    config.max_visited_urls = 1;

    let checkpoints = Arc::new(CheckpointStore::new());
    let mut explorer = Explorer::new(session, config, checkpoints);

    let final_state = explorer.run().await.unwrap();

    // One navigation happens; the run stops once the visited count exceeds
    // the cap, before a third URL can be recorded
    assert_eq!(
        *performed.lock().unwrap(),
        vec![Performed::Click("a.p1".to_string())]
    );
    assert_eq!(
        final_state.visited_urls,
        BTreeSet::from([START.to_string(), "https://example.test/p1".to_string()])
    );
}

#[tokio::test]
async fn action_failure_is_recorded_and_run_continues() {
    let session = FakeSession::new(START)
        .page(START, vec![button("#flaky-delete", "Delete draft")])
        .fail_once("#flaky-delete");
    let performed = session.performed_log();

    let checkpoints = Arc::new(CheckpointStore::new());
    let mut explorer =
        Explorer::new(session, ExplorerConfig::new(START, "run-recover"), checkpoints);

    let final_state = explorer.run().await.unwrap();

    // Exactly one action_error; the retry succeeds and the run finishes
    // normally with the interaction recorded
    let action_errors: Vec<_> = final_state
        .errors
        .iter()
        .filter(|e| e.kind == ErrorKind::ActionError)
        .collect();
    assert_eq!(action_errors.len(), 1);
    assert_eq!(action_errors[0].url, START);

    assert_eq!(
        *performed.lock().unwrap(),
        vec![Performed::Click("#flaky-delete".to_string())]
    );
    assert_eq!(final_state.crawl_map[START].len(), 1);
}

#[tokio::test]
async fn step_budget_stops_pathological_retry() {
    // A permanently failing action never enters the crawl map, so Evaluate
    // keeps re-choosing it; only the step budget stops the run
    let session = FakeSession::new(START)
        .page(START, vec![button("#broken-save", "Save")])
        .always_fail("#broken-save");

    let mut config = ExplorerConfig::new(START, "run-steps");
    config.max_steps = 10;

    let checkpoints = Arc::new(CheckpointStore::new());
    let mut explorer = Explorer::new(session, config, checkpoints);

    let final_state = explorer.run().await.unwrap();

    assert_eq!(explorer.steps(), 10);
    // Act runs on every third step: 3 attempts in 10 steps
    assert_eq!(final_state.errors.len(), 3);
    assert!(final_state
        .errors
        .iter()
        .all(|e| e.kind == ErrorKind::ActionError));
    assert!(final_state.crawl_map.is_empty());
}

#[tokio::test]
async fn checkpoint_recovers_partial_progress_after_fatal_failure() {
    let session = FakeSession::new(START)
        .page(START, vec![button("#save-note", "Save note")])
        .fail_observe_at(2);

    let checkpoints = Arc::new(CheckpointStore::new());
    let mut explorer = Explorer::new(
        session,
        ExplorerConfig::new(START, "run-crash"),
        checkpoints.clone(),
    );

    let result = explorer.run().await;
    assert!(result.is_err());

    // The snapshot from the last committed step still carries the action
    // performed before the crash
    let snapshot = checkpoints.latest_snapshot("run-crash").unwrap();
    assert_eq!(snapshot.crawl_map[START].len(), 1);
    assert!(snapshot.visited_urls.contains(START));
}

#[tokio::test]
async fn final_state_matches_latest_checkpoint() {
    let session = FakeSession::new(START)
        .page(START, vec![button("#go", "Go")]);

    let checkpoints = Arc::new(CheckpointStore::new());
    let mut explorer = Explorer::new(
        session,
        ExplorerConfig::new(START, "run-snapshot"),
        checkpoints.clone(),
    );

    let final_state = explorer.run().await.unwrap();
    assert_eq!(checkpoints.latest_snapshot("run-snapshot"), Some(final_state));
}
