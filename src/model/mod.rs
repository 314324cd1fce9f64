pub mod absence;
pub mod category;
pub mod department;
pub mod holiday;
pub mod leave_request;
pub mod period;
pub mod person;
pub mod role;
pub mod sick_note;
pub mod supplemental;
