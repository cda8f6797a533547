// Read side of the agent pipeline: career plans, resume analyses, job
// matches and execution status.

pub mod handlers;
