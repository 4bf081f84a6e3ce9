//! Core bookkeeping rules for Ledgerbook.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence applies these rules inside database transactions; nothing here
//! performs I/O.
//!
//! # Modules
//!
//! - `ledger` - Sign resolution, leg validation, carry-forward
//! - `authz` - Book capability sets

pub mod authz;
pub mod ledger;
