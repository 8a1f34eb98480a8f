pub mod batch;
pub mod group_uploads;
pub mod groups;
pub mod login;
pub mod marking_jobs;
pub mod not_found;
pub mod register;
pub mod results;
pub mod schemes;
pub mod upload_detail;
