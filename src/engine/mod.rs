//! The incremental checking core: dirty regions in, tags and change
//! notifications out.

pub mod registry;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod tracker;

pub use registry::SessionRegistry;
pub use scheduler::{AnalysisScheduler, PassHost, SchedulerState, DEFAULT_DEBOUNCE};
pub use session::{SessionBuilder, SpellingEvent, SpellingSession};
pub use store::{MisspellingStore, MisspellingTag};
pub use tracker::DirtyRegionTracker;
