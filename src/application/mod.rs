//! Engines orchestrating the domain: earnings ingestion, hold clearing,
//! settlement, tier evaluation, and the manual tier-application workflow.
//! Each engine owns shared store handles and stays stateless between calls.

pub mod applications;
pub mod ledger;
pub mod retention;
pub mod settlement;
pub mod tiers;
