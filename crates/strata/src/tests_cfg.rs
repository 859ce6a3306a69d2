//! Fixtures shared by tests across the workspace.

pub mod bank_account;
pub mod keys;
pub mod records;
