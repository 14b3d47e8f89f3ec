//! The Value Algebra: the `Var` view over the ledger and its arithmetic.

pub mod combine;
pub mod frame;
pub mod var;

pub use combine::{BinOp, Operand};
pub use frame::{RowKey, ValueFrame, YearSelector};
pub use var::{Dataset, Var, VarDims, VarQuery};
