//! Groups a step's resolved dispatch items per the tie-break rule: sequential
//! by default, preserving order, with maximal runs of `parallel_safe` tools
//! dispatched concurrently.

use crate::planner::DispatchItem;

/// One unit of dispatch within a step.
#[derive(Debug, Clone)]
pub enum Batch {
    /// A single tool call that must complete before the next batch starts.
    Sequential(DispatchItem),
    /// A maximal run of consecutive `parallel_safe` calls, dispatched together.
    Concurrent(Vec<DispatchItem>),
}

/// Partition a step's items into batches. Non-`parallel_safe` items each get
/// their own sequential batch; consecutive `parallel_safe` items are grouped
/// into one concurrent batch. This never reorders items — a caller that
/// executes batches in order and, within a concurrent batch, reassembles
/// results by `call_id`, gets results back in submission order.
pub fn plan_batches(items: Vec<DispatchItem>) -> Vec<Batch> {
    let mut batches = Vec::new();
    let mut run = Vec::new();

    for item in items {
        if item.parallel_safe {
            run.push(item);
        } else {
            if !run.is_empty() {
                batches.push(Batch::Concurrent(std::mem::take(&mut run)));
            }
            batches.push(Batch::Sequential(item));
        }
    }
    if !run.is_empty() {
        batches.push(Batch::Concurrent(run));
    }

    batches
}
