pub mod task_group;

pub use task_group::{TaskGroup, TaskResults};
