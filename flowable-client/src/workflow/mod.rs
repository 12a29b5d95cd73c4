//! Stateful helpers built on the resource wrappers.
//!
//! [`Case`] and [`Process`] hold one instance each, [`Task`] wraps a user
//! task and [`Stage`] a stage plan item. All of them keep the last JSON
//! snapshot the server returned and own a clone of the [`Client`](crate::Client).

mod case;
mod instance;
mod poll;
mod process;
mod stage;
mod task;

pub use case::Case;
pub use process::Process;
pub use stage::Stage;
pub use task::{SnapshotPolicy, Task};
