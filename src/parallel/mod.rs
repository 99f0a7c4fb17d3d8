//! Concurrency primitives for bounded fan-out
//!
//! This module provides the two synchronization pieces the pipeline is built on.
//! It knows nothing about images or files; it only bounds and tracks work.
//!
//! # Architecture Responsibilities
//!
//! ## What This Module Does:
//! - **Resource Discovery**: Detects available CPU cores using `num_cpus::get()`
//! - **Admission Control**: [`AdmissionGate`] caps how many work units run at once
//! - **Completion Tracking**: [`CompletionTracker`] blocks until every spawned unit finishes
//!
//! ## What This Module Does NOT Do:
//! - **Domain Logic**: Does not decode, resize or write anything
//! - **Thread Spawning**: Callers own their threads (the dispatcher uses crossbeam scopes)
//!
//! # Flow
//!
//! ```text
//! ┌─────────────┐  acquire()   ┌───────────────┐  spawn   ┌──────────────┐
//! │   Walker    │─────────────▶│ AdmissionGate │─────────▶│   Worker     │
//! │ (producer)  │  register()  │  N tokens     │          │ Permit+Ticket│
//! └─────────────┘─────────────▶└───────────────┘          └──────┬───────┘
//!        │                                                        │ drop
//!        └──────────── CompletionTracker::wait() ◀────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use downsize::parallel::{AdmissionGate, CompletionTracker};
//!
//! let gate = AdmissionGate::new(2);
//! let tracker = CompletionTracker::new();
//!
//! crossbeam::thread::scope(|s| {
//!     for item in 0..8 {
//!         let permit = gate.acquire();
//!         let ticket = tracker.register();
//!         s.spawn(move |_| {
//!             let _permit = permit;
//!             let _ticket = ticket;
//!             item * 2
//!         });
//!     }
//! })
//! .unwrap();
//!
//! tracker.wait();
//! assert!(gate.peak() <= 2);
//! ```

pub mod gate;
pub mod tracker;

// Re-export main types for easier access
pub use gate::{AdmissionGate, Permit};
pub use tracker::{CompletionTracker, Ticket};

/// Default worker count: one per logical CPU, never less than one.
pub fn default_workers() -> usize {
    num_cpus::get().max(1)
}
