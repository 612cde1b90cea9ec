//! Browser-backed browse session
//!
//! The chromiumoxide (CDP) implementation of [`crate::session::BrowseSession`]:
//! browser launch and lifecycle, page-level error listeners, interactive
//! element extraction, and primitive click/fill execution.

pub mod config;
pub mod elements;
pub mod session;

pub use config::{BrowserConfig, BrowserConfigBuilder};
pub use session::CdpSession;
