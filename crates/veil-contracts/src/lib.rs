//! # veil-contracts
//!
//! Shared types and error contracts for the VEIL governance client.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions, their wire shape, and error types.

pub mod account;
pub mod action;
pub mod agent;
pub mod audit;
pub mod error;
pub mod evaluation;
pub mod policy;
