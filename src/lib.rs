//! Payroll computation engine.
//!
//! This crate computes semi-monthly payslips from compensation profiles,
//! schedules and attendance, applies statutory and manual deductions, and
//! moves payroll runs through their `draft -> finalized -> paid -> archived`
//! lifecycle.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod payroll;
pub mod reporting;
