pub mod candidate_dto;
pub mod requisition_dto;
pub mod threshold_dto;
pub mod workflow_dto;
