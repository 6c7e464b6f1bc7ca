//! Progress reporting for long-running pipeline operations (directory scans,
//! package cooks). Cancellation is cooperative: operations poll
//! `should_cancel` at per-asset boundaries and roll back cleanly.

pub trait ProgressNotifier {
    /// Begins a new named task. `task_index` orders tasks within one
    /// operation.
    fn set_task(&mut self, task_index: u32, description: &str);

    /// Reports progress within the current task. `current`/`max` of -1 means
    /// the step count is unknown.
    fn report(&mut self, current: i64, max: i64, description: &str);

    fn should_cancel(&self) -> bool;
}

/// Discards all progress and never cancels.
pub struct NullProgressNotifier;

impl ProgressNotifier for NullProgressNotifier {
    fn set_task(&mut self, _task_index: u32, _description: &str) {}

    fn report(&mut self, _current: i64, _max: i64, _description: &str) {}

    fn should_cancel(&self) -> bool {
        false
    }
}
