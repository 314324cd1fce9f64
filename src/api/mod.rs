pub mod absence;
pub mod leave_request;
