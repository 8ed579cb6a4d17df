pub mod file;
pub mod hub;
pub mod memory;
pub mod traits;

pub use file::FileTaskStore;
pub use hub::{SnapshotHub, Subscription};
pub use memory::MemoryTaskStore;
pub use traits::{sort_tasks, SortKey, TaskStore};
