//! Athena DDL/DML and query execution.
//!
//! [`ddl`] renders the statements as plain text; [`QueryRunner`] submits them
//! and polls until each one reaches a terminal state.

pub mod ddl;
pub mod runner;

pub use ddl::TableDef;
pub use runner::{CompletedQuery, PollConfig, QueryRunner};
