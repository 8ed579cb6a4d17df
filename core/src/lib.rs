pub mod config;
pub mod edit;
pub mod error;
pub mod gesture;
pub mod input;
pub mod logging;
pub mod model;
pub mod reorder;
pub mod service;
pub mod store;

pub use config::{Config, Theme};
pub use edit::{EditDialog, EditDraft};
pub use error::{BoardError, Result};
pub use gesture::{DragEnd, KeyboardSensor, Point, PointerConstraint, PointerEvent, PointerSensor};
pub use input::{expand_key, parse_category, resolve_id};
pub use logging::init_logging;
pub use model::task::{Category, NewTask, Task, TaskPatch};
pub use reorder::{move_task, OrderWrite, Reorder, WritePolicy};
pub use service::board::{Board, Column, FailurePolicy, WriteOp, WriteOutcome};
pub use store::{FileTaskStore, MemoryTaskStore, SortKey, Subscription, TaskStore};
