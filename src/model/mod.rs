pub mod expense;
pub mod payroll;
pub mod role;
pub mod session;
pub mod user;
