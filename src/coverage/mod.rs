// src/coverage/mod.rs

//! Code coverage tracking across evaluation cycles.
//!
//! - `accumulator` holds per-line covering test ids and the driver seam.
//! - `filter` decides which source files count.
//! - `options` is the `phpguard.coverage` config section.
//! - `cache` persists a session between processes.
//! - `session` is the state machine plus its pipeline subscriber.
//! - `report` renders text, HTML and Clover output.

pub mod accumulator;
pub mod cache;
pub mod filter;
pub mod options;
pub mod report;
pub mod session;

pub use accumulator::{Accumulator, CoverageDriver, LineSet, LineTotals, NullDriver, RawCoverage};
pub use cache::SessionRecord;
pub use filter::CoverageFilter;
pub use options::CoverageOptions;
pub use session::{CoverageListener, CoverageSession, SessionState};
