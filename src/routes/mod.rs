pub mod candidate_routes;
pub mod health;
pub mod requisition_routes;
pub mod threshold_routes;
pub mod workflow_routes;
