//! # news-pager
//!
//! Incremental loading pipeline for a summarized-news reader.
//!
//! The crate covers everything between the article API and the card grid:
//! - [`client`] - HTTP fetch client with a short-lived response cache
//! - [`articles`] - query building and DTO → display record mapping
//! - [`pagination`] - paging state, cancellation of superseded fetches, page merging
//! - [`scroll`] - infinite-scroll trigger with once-per-transition semantics
//!
//! Rendering is left to the caller: it reads [`ControllerState`] snapshots, listens
//! for [`Notification`]s and reports sentinel geometry to the [`ScrollTrigger`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use news_pager::{Config, FilterUpdate, PaginationController, ScrollTrigger};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let controller = PaginationController::from_config(&config)?;
//!
//!     // Surface errors and refresh confirmations
//!     let mut notifications = controller.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(notification) = notifications.recv().await {
//!             println!("{}", notification.detail());
//!         }
//!     });
//!
//!     controller.initialize().await;
//!     controller.update_filters(FilterUpdate::category("science")).await;
//!
//!     // The presentation layer feeds sentinel geometry into the trigger
//!     let mut trigger = ScrollTrigger::new(config.scroll.clone(), Some(Arc::new(controller.clone())));
//!     trigger.sync(&controller.snapshot());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Article query service
pub mod articles;
/// HTTP fetch client and response cache
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Pagination controller
pub mod pagination;
/// Infinite-scroll trigger
pub mod scroll;
/// Core types
pub mod types;

// Re-export commonly used types
pub use articles::{ArticleService, ArticleSource};
pub use client::{FetchClient, RequestOptions};
pub use config::Config;
pub use error::{Error, Result};
pub use pagination::{ControllerState, FetchOutcome, LoadPhase, PaginationController};
pub use scroll::{Rect, ScrollTrigger, SentinelKey};
pub use types::{
    ArticleRecord, FilterParams, FilterUpdate, HealthStatus, LoadMoreHandler, Notification,
    PageResult,
};
