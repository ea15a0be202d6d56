pub mod employee;
pub mod handover;
pub mod leave_request;
pub mod role;
