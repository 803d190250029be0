//! Core business logic for Moneylog.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Domain types, validation rules and balance arithmetic live here; storage and
//! ownership checks are reached through traits implemented by `moneylog-db`.

pub mod ledger;
