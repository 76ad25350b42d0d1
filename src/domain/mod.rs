pub mod account;
pub mod actor;
pub mod ports;
pub mod transaction;
