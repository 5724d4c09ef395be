//! Admission policies.
//!
//! ## Contents
//! - [`Admission`] how a submission is handled when its key is busy
//! - [`Admitted`]  what an admission operation actually did
//!
//! ## Quick wiring
//! ```text
//! Scheduler::submit(key, Admission, work)
//!      └─► core::registry::Registry::admit decides start / queue / preempt / discard
//! ```

mod admission;

pub use admission::{Admission, Admitted};
