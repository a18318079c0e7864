//! sea-orm entities for the `account` and `todo` tables.

pub mod account;
pub mod todo;
