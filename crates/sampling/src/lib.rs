//! Weighted sampling structures for stochastic simulation.
//!
//! - [`IndexedSet`]: O(1) membership set with uniform random pops
//! - [`choose_weighted`]: one-shot weighted selection
//! - [`EventScheduler`]: rate-grouped Gillespie scheduler
//! - [`SampleTree`]: O(log n) weighted population for many distinct weights
//!
//! # Choosing a sampler
//!
//! ```text
//! ┌───────────────────┬──────────────────────┬──────────────────────┐
//! │                   │ EventScheduler       │ SampleTree           │
//! ├───────────────────┼──────────────────────┼──────────────────────┤
//! │ insert / remove   │ O(1) amortized       │ O(depth)             │
//! │ sample            │ O(distinct rates)    │ O(depth)             │
//! │ best when         │ few distinct rates   │ many distinct rates  │
//! └───────────────────┴──────────────────────┴──────────────────────┘
//! ```

mod error;
mod indexed_set;
mod sample_tree;
mod scheduler;
mod selector;

pub use error::{IndexedSetError, SampleTreeError, SchedulerError, SelectError};
pub use indexed_set::IndexedSet;
pub use sample_tree::SampleTree;
pub use scheduler::EventScheduler;
pub use selector::choose_weighted;
