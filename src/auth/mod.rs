pub mod handlers;
pub mod password;
pub mod service;
pub mod session;
