//! # Work abstraction and task identity.
//!
//! - [`Work`] - trait for one-shot async cancelable work (blanket impl for closures)
//! - [`BoxWork`], [`BoxWorkFuture`] - type-erased forms used by the registry
//! - [`TaskId`] - identity assigned to each admitted task

mod id;
mod work;

pub use id::TaskId;
pub use work::{BoxWork, BoxWorkFuture, Work};
