//! Core library for `sectree`.
//!
//! `sectree` runs behaviour-style tests written as nested sections. A
//! scenario body is replayed from the top once per leaf path through its
//! sections, so every `Then` sees freshly built `Given`/`When` state:
//!
//! ```
//! use sectree::{given, require, then, when, Scenario};
//!
//! let report = Scenario::new("vectors can be sized and resized", file!(), line!()).run(|ctx| {
//!     given!(ctx, "a vector with some items", {
//!         let mut v = vec![0_u8; 5];
//!         when!(ctx, "the size is increased", {
//!             v.resize(10, 0);
//!             then!(ctx, "the size changes", {
//!                 require!(ctx, v.len() == 10);
//!             });
//!         });
//!         when!(ctx, "the size is reduced", {
//!             v.truncate(0);
//!             then!(ctx, "the size changes", {
//!                 require!(ctx, v.is_empty());
//!             });
//!         });
//!     });
//! })?;
//! assert_eq!(report.runs().len(), 2);
//! # Ok::<(), sectree::ScenarioError>(())
//! ```
//!
//! The [`tracker`] module holds the section tree executor; [`Scenario`]
//! drives it, [`harness`] wraps each replay and [`reporting`] collects the
//! outcome.

pub use inventory::{iter, submit};

pub mod assertion;
pub mod config;
mod context;
pub mod harness;
mod macros;
mod panic_support;
pub mod registry;
pub mod reporting;
pub mod scenario;
mod section;
pub mod tags;
pub mod tracker;

pub use context::{ScenarioContext, SectionGuard};
pub use harness::{RunHarness, ScenarioMetadata, StdHarness};
pub use panic_support::panic_message;
pub use scenario::{Scenario, ScenarioError, ScenarioReport};
pub use section::SectionKind;
pub use tracker::{SectionKey, SectionLocation, SectionPath, SectionTracker, TrackerError};
