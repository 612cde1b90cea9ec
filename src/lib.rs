//! CurioCrawl - Autonomous Exploratory QA Crawler
//!
//! This crate explores a web application on its own: it repeatedly observes
//! the interactive elements on the current page, decides which one is most
//! worth poking at, performs that interaction, and records the outcome, until
//! nothing new remains or a step budget runs out. The goal is exploratory QA:
//! surface runtime errors, broken links, and unexpected states without a
//! human-authored test script.
//!
//! # Architecture
//!
//! ```text
//!        ┌───────────────────────────────┐
//!        │   Exploration loop (FSM)      │
//!        │  Observe ─▶ Evaluate ─▶ Act   │
//!        │      ▲          │        │    │
//!        │      └──────────┼────────┘    │
//!        └─────────┬───────┼─────────────┘
//!                  │       ▼
//!          CrawlState   Curiosity engine + URL policy
//!                  │
//!         ┌────────┴────────┐
//!         ▼                 ▼
//!   Checkpoint store    Report (JSON + HTML)
//! ```
//!
//! The loop drives a [`session::BrowseSession`] (chromiumoxide/CDP in
//! production, scripted doubles in tests), merges each step's partial update
//! into [`state::CrawlState`], and checkpoints the result so an aborted run
//! still yields a best-effort report.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use curiocrawl::browser::{BrowserConfig, CdpSession};
//! use curiocrawl::{CheckpointStore, Explorer, ExplorerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session =
//!         CdpSession::initialize("https://example.com", BrowserConfig::default()).await?;
//!     let checkpoints = Arc::new(CheckpointStore::new());
//!
//!     let config = ExplorerConfig::new("https://example.com", "run-1");
//!     let mut explorer = Explorer::new(session, config, checkpoints);
//!
//!     let final_state = explorer.run().await?;
//!     println!("visited {} urls", final_state.visited_urls.len());
//!
//!     explorer.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod browser;
pub mod checkpoint;
pub mod curiosity;
pub mod error;
pub mod explorer;
pub mod policy;
pub mod report;
pub mod session;
pub mod state;

// Re-exports for convenience
pub use browser::CdpSession;
pub use checkpoint::CheckpointStore;
pub use error::{Error, Result};
pub use explorer::{Explorer, ExplorerConfig, Phase};
pub use policy::UrlPolicy;
pub use report::Reporter;
pub use session::{ActionKind, BrowseSession};
pub use state::{Action, CrawlState, Element, ElementKind, ErrorRecord, ScoredElement};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
