//! The Table Store: the observation ledger and the scenario metadata table.

pub mod ledger;
pub mod meta;
pub mod types;

pub use ledger::Ledger;
pub use meta::{MetaTable, IP_COLUMN, SSP_COLUMN};
pub use types::{scenario_name, MetaValue, Observation, OneOrMany};
