//! ar6_core
//!
//! An in-memory algebra over multi-model climate-scenario time series on the
//! fixed 5-year grid 2010..=2100. The crate provides:
//!
//! - the observation [`store`]: the flat ledger of per-scenario series plus
//!   the scenario metadata table and its computed summary columns,
//! - the [`interp`] primitives: clamped linear interpolation, gap-filling and
//!   the net-zero crossing year,
//! - the value [`algebra`]: the unit-aware, broadcasting [`Var`] view built
//!   from a [`Dataset`],
//! - the [`select`] engine: metadata, value-range and reference-pathway
//!   filters shaping a Var into a long or wide output [`Table`],
//! - the [`derive`] builder: year-wise combination of ledger variables into
//!   new appended rows.
//!
//! Incompatible requests (conflicting arguments, mismatched dimensions,
//! unknown columns or codes) fail with [`AlgebraError`]; per-scenario numeric
//! gaps travel through every operation as NaN instead of aborting it.

pub mod algebra;
pub mod constants;
pub mod derive;
pub mod error;
pub mod interp;
pub mod select;
pub mod store;

pub use algebra::{BinOp, Dataset, Operand, RowKey, ValueFrame, Var, VarDims, VarQuery, YearSelector};
pub use derive::{create_variable, sum_variables, DeriveOp};
pub use error::{AlgebraError, Result};
pub use select::{Cell, MetaFilter, PathwayFilter, Predicate, SelectOptions, Table};
pub use store::{Ledger, MetaTable, MetaValue, Observation, OneOrMany};
