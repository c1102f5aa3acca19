pub mod candidate;
pub mod interview;
pub mod requisition;
pub mod screening;
pub mod threshold;
pub mod workflow;
