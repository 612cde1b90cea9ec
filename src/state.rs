//! Crawl state
//!
//! The data model for an exploration run: element snapshots, chosen actions,
//! observed anomalies, and the aggregate [`CrawlState`] with its per-field
//! merge rules. State is mutated exclusively through [`CrawlState::apply`],
//! which commits one [`StateUpdate`] in full at each step boundary.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Tag category of an interactive element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Anchor (`<a>`)
    Link,
    /// `<button>`
    Button,
    /// `<input>`
    Input,
    /// `<textarea>`
    TextArea,
    /// `<select>`
    Select,
    /// Generic element with `role="button"`
    RoleButton,
}

impl ElementKind {
    /// Inputs, textareas, and selects take the form-control curiosity bonus
    pub fn is_form_control(self) -> bool {
        matches!(self, Self::Input | Self::TextArea | Self::Select)
    }

    /// Elements that receive typed text rather than a click
    pub fn is_text_entry(self) -> bool {
        matches!(self, Self::Input | Self::TextArea)
    }
}

/// A snapshot of one interactive control on the current page.
///
/// An `Element` is a value captured at observation time, not a live handle.
/// It must not be reused across page navigations; the selector is only
/// meaningful on the page it was observed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Identifier stable within one observation of one page (`el_0`, `el_1`, ...)
    pub id: String,
    /// Tag category
    pub kind: ElementKind,
    /// `type` attribute for inputs (e.g. `submit`, `text`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    /// Visible text, or the value/placeholder/name fallback chain
    pub text: String,
    /// Link target, links only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Selector usable to re-target the element for an action
    pub selector: String,
    /// Whether the element was visible at observation time
    pub visible: bool,
}

/// An [`Element`] plus its curiosity score.
///
/// Ordering is by descending score with ties broken by original observation
/// order (stable sort).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredElement {
    /// The scored element
    pub element: Element,
    /// Final desirability score, de-prioritization included
    pub score: i32,
}

/// An intent to change page state, immutable once chosen for a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    /// Follow a link by clicking its source element
    Navigate {
        /// Resolved, normalized target URL
        url: String,
        /// The link element the navigation originates from
        element: Element,
    },
    /// Click or fill a non-link control
    Interact {
        /// The target element
        element: Element,
        /// Fill value for text-entry elements, `None` for plain clicks
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
}

impl Action {
    /// Selector of the element this action targets
    pub fn selector(&self) -> &str {
        match self {
            Action::Navigate { element, .. } | Action::Interact { element, .. } => {
                &element.selector
            }
        }
    }

    /// Whether this is an `interact` action
    pub fn is_interact(&self) -> bool {
        matches!(self, Action::Interact { .. })
    }
}

/// Kind of observed anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Unhandled exception thrown by the page
    #[serde(rename = "pageerror")]
    PageError,
    /// `console.error` output
    #[serde(rename = "console_error")]
    ConsoleError,
    /// HTTP response with a 4xx/5xx status
    #[serde(rename = "network_error")]
    NetworkError,
    /// A click/fill that failed during Act
    #[serde(rename = "action_error")]
    ActionError,
}

/// One observed anomaly.
///
/// Records accumulate in arrival order across the whole run and are never
/// deduplicated; the report surfaces every one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Anomaly kind
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    /// Message, when the anomaly carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// HTTP status code, network errors only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// URL the anomaly occurred on (the failing resource for network errors)
    pub url: String,
    /// Page URL at the time, when it differs from `url`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
}

impl ErrorRecord {
    /// Record an unhandled page exception
    pub fn page_error<M: Into<String>, U: Into<String>>(message: M, url: U) -> Self {
        Self {
            kind: ErrorKind::PageError,
            message: Some(message.into()),
            status: None,
            url: url.into(),
            page_url: None,
        }
    }

    /// Record a console error
    pub fn console_error<M: Into<String>, U: Into<String>>(message: M, url: U) -> Self {
        Self {
            kind: ErrorKind::ConsoleError,
            message: Some(message.into()),
            status: None,
            url: url.into(),
            page_url: None,
        }
    }

    /// Record a failed HTTP response
    pub fn network_error<U: Into<String>, P: Into<String>>(
        status: u16,
        url: U,
        page_url: P,
    ) -> Self {
        Self {
            kind: ErrorKind::NetworkError,
            message: None,
            status: Some(status),
            url: url.into(),
            page_url: Some(page_url.into()),
        }
    }

    /// Record a failed click/fill
    pub fn action_error<M: Into<String>, U: Into<String>>(message: M, url: U) -> Self {
        Self {
            kind: ErrorKind::ActionError,
            message: Some(message.into()),
            status: None,
            url: url.into(),
            page_url: None,
        }
    }
}

/// The aggregate state of one exploration run.
///
/// Exclusively owned by the running loop; the checkpoint store holds
/// immutable snapshot copies, never a live reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlState {
    /// The URL the session is currently on (raw, as reported by the browser)
    pub current_url: String,
    /// Normalized URLs reached so far; grows monotonically
    pub visited_urls: BTreeSet<String>,
    /// Per-URL history of actions already performed; append-only per key
    pub crawl_map: BTreeMap<String, Vec<Action>>,
    /// Every anomaly observed, in arrival order
    pub errors: Vec<ErrorRecord>,
    /// Candidate queue for the current page, ranked after Evaluate
    pub element_queue: Vec<ScoredElement>,
    /// The action chosen for the next Act phase, if any
    pub next_action: Option<Action>,
}

impl CrawlState {
    /// Initial state for a run: positioned at the start URL with a singleton
    /// visited set holding its normalized form.
    pub fn new(start_url: &str) -> Self {
        let normalized = crate::policy::UrlPolicy::normalize(start_url)
            .unwrap_or_else(|| start_url.to_string());
        Self {
            current_url: start_url.to_string(),
            visited_urls: BTreeSet::from([normalized]),
            crawl_map: BTreeMap::new(),
            errors: Vec::new(),
            element_queue: Vec::new(),
            next_action: None,
        }
    }

    /// Commit one step's partial update in full.
    ///
    /// Per-field merge policy: `current_url` replace, `visited_urls` union,
    /// `crawl_map` append-by-key, `errors` append, `element_queue` replace,
    /// `next_action` set-or-clear. Applied atomically from the loop's point
    /// of view; no partial update is ever observable.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(url) = update.current_url {
            self.current_url = url;
        }
        self.visited_urls.extend(update.visited_urls);
        for (url, actions) in update.crawl_map {
            self.crawl_map.entry(url).or_default().extend(actions);
        }
        self.errors.extend(update.errors);
        if let Some(queue) = update.element_queue {
            self.element_queue = queue;
        }
        if let Some(next) = update.next_action {
            self.next_action = next;
        }
    }

    /// Selectors of every action already recorded for a URL.
    ///
    /// Feeds the curiosity engine's de-prioritization set.
    pub fn acted_selectors(&self, url: &str) -> HashSet<String> {
        self.crawl_map
            .get(url)
            .map(|actions| {
                actions
                    .iter()
                    .map(|a| a.selector().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether an `interact` action was already performed against this
    /// selector on this URL. Navigate actions are deliberately not checked;
    /// their targets are covered by the visited set instead.
    pub fn has_interacted(&self, url: &str, selector: &str) -> bool {
        self.crawl_map
            .get(url)
            .map(|actions| {
                actions
                    .iter()
                    .any(|a| a.is_interact() && a.selector() == selector)
            })
            .unwrap_or(false)
    }

    /// Total number of actions performed across all URLs
    pub fn total_actions(&self) -> usize {
        self.crawl_map.values().map(Vec::len).sum()
    }
}

/// A partial update produced by one phase of the loop.
///
/// Fields left at their defaults leave the corresponding state untouched;
/// `next_action` distinguishes "leave as is" (`None`) from "explicitly clear"
/// (`Some(None)`), the latter being the loop's primary stopping signal.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    /// Replacement current URL
    pub current_url: Option<String>,
    /// Normalized URLs to union into the visited set
    pub visited_urls: BTreeSet<String>,
    /// Actions to append, keyed by the URL they were performed on
    pub crawl_map: BTreeMap<String, Vec<Action>>,
    /// Anomalies to append
    pub errors: Vec<ErrorRecord>,
    /// Replacement candidate queue
    pub element_queue: Option<Vec<ScoredElement>>,
    /// New chosen action (`Some(None)` explicitly clears it)
    pub next_action: Option<Option<Action>>,
}
