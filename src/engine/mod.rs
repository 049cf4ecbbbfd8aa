//! Core engine: the observe → settle → predict loop.

pub mod history;
pub mod ledger;
pub mod poller;
pub mod session;
pub mod settlement;
