//! Browse session port
//!
//! The capability the exploration loop depends on: observe the page, perform
//! one primitive action, report the current URL. The CDP implementation lives
//! in [`crate::browser`]; tests drive the loop with scripted doubles.

use crate::error::Result;
use crate::state::{Element, ErrorRecord};
use async_trait::async_trait;

/// Primitive action kinds a session can execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Click the element
    Click,
    /// Fill a text value into the element
    Fill,
}

/// An established browser session positioned on some page.
///
/// All methods are suspension points; the loop awaits each call and applies
/// the result before the next step begins. `observe_errors` drains the
/// session's internal buffer, so each anomaly is consumed exactly once.
#[async_trait]
pub trait BrowseSession: Send {
    /// Return and clear anomalies buffered since the last call
    async fn observe_errors(&mut self) -> Vec<ErrorRecord>;

    /// Currently visible interactive elements.
    ///
    /// An empty list is valid and signals a dead-end page.
    async fn observe_elements(&mut self) -> Result<Vec<Element>>;

    /// Execute one primitive action against a selector, then wait for the
    /// page to settle. Fails with [`crate::error::ActionError`]; callers must
    /// not treat that as fatal.
    async fn act(&mut self, selector: &str, kind: ActionKind, value: Option<&str>) -> Result<()>;

    /// The URL the session is currently on
    async fn current_url(&mut self) -> String;

    /// Release the session. Invoked on every run exit path.
    async fn shutdown(self) -> Result<()>
    where
        Self: Sized;
}
