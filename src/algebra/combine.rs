//! combine.rs
//! Arithmetic between Vars and scalars: selector harmonization, index
//! broadcasting, element-wise combination with NaN-filling and unit-string
//! synthesis. Dispatch is explicit on the operand tag, never inferred from
//! the operand's shape.

use std::collections::BTreeSet;

use crate::algebra::frame::{RowKey, ValueFrame};
use crate::algebra::var::{Var, VarDims};
use crate::error::{AlgebraError, Result};

/// The right-hand side of a combine call.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Scalar(f64),
    Var(&'a Var),
}

/// Binary operators. `RSub`/`RDiv` are the flipped orientations, so that
/// `scalar - var` and `scalar / var` are expressible with the Var on the left
/// of the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    RSub,
    Mul,
    Div,
    RDiv,
    Pow,
}

impl BinOp {
    /// Applies the operator with `l` taken from the Var the method was called
    /// on and `r` from the operand.
    fn apply(self, l: f64, r: f64) -> f64 {
        match self {
            BinOp::Add => l + r,
            BinOp::Sub => l - r,
            BinOp::RSub => r - l,
            BinOp::Mul => l * r,
            BinOp::Div => l / r,
            BinOp::RDiv => r / l,
            BinOp::Pow => l.powf(r),
        }
    }
}

impl Var {
    /// Combines this Var with a scalar or another Var.
    ///
    /// Selector sets must match exactly or reduce to one-vs-many; index
    /// dimensions must match or nest (the narrower side broadcasts across the
    /// wider side's secondary dimension). Violations abort with a descriptive
    /// error naming the mismatched sets.
    pub fn combine(&self, op: BinOp, other: Operand<'_>) -> Result<Var> {
        match other {
            Operand::Scalar(s) => Ok(self.combine_scalar(op, s)),
            Operand::Var(rhs) => self.combine_var(op, rhs),
        }
    }

    // --- Convenience wrappers ---

    pub fn add(&self, other: &Var) -> Result<Var> {
        self.combine(BinOp::Add, Operand::Var(other))
    }

    pub fn sub(&self, other: &Var) -> Result<Var> {
        self.combine(BinOp::Sub, Operand::Var(other))
    }

    pub fn mul(&self, other: &Var) -> Result<Var> {
        self.combine(BinOp::Mul, Operand::Var(other))
    }

    pub fn div(&self, other: &Var) -> Result<Var> {
        self.combine(BinOp::Div, Operand::Var(other))
    }

    pub fn add_scalar(&self, s: f64) -> Var {
        self.combine_scalar(BinOp::Add, s)
    }

    pub fn sub_scalar(&self, s: f64) -> Var {
        self.combine_scalar(BinOp::Sub, s)
    }

    pub fn mul_scalar(&self, s: f64) -> Var {
        self.combine_scalar(BinOp::Mul, s)
    }

    pub fn div_scalar(&self, s: f64) -> Var {
        self.combine_scalar(BinOp::Div, s)
    }

    pub fn pow_scalar(&self, s: f64) -> Var {
        self.combine_scalar(BinOp::Pow, s)
    }

    /// Negation, expressed as `0 - self`.
    pub fn neg(&self) -> Var {
        self.combine_scalar(BinOp::RSub, 0.0)
    }

    fn combine_scalar(&self, op: BinOp, s: f64) -> Var {
        let unit = match op {
            // Raising to a scalar power does change the unit's meaning.
            BinOp::Pow => format!("({} ** {})", self.unit, s),
            _ => self.unit.clone(),
        };
        Var {
            dims: self.dims,
            frame: self.frame.clone().map_values(|v| op.apply(v, s)),
            unit,
            default: self.default,
        }
    }

    fn combine_var(&self, op: BinOp, rhs: &Var) -> Result<Var> {
        let (lhs_frame, rhs_frame) = harmonise_selectors(&self.frame, &rhs.frame)?;
        let (dims, keys) = harmonise_dims(self, rhs)?;

        // Pow never fills; the other operators fill a one-sided gap from the
        // operand's default, mirroring the fill-value convention.
        let fill = match op {
            BinOp::Pow => None,
            _ => rhs.default,
        };

        let width = lhs_frame.columns().len();
        let mut frame = ValueFrame::new(lhs_frame.columns().to_vec());
        for key in keys {
            let l_row = lookup(&lhs_frame, &key, self.dims);
            let r_row = lookup(&rhs_frame, &key, rhs.dims);
            let values = (0..width)
                .map(|i| {
                    let mut l = l_row.map_or(f64::NAN, |r| r[i]);
                    let mut r = r_row.map_or(f64::NAN, |r| r[i]);
                    if let Some(f) = fill {
                        if l.is_nan() && !r.is_nan() {
                            l = f;
                        } else if r.is_nan() && !l.is_nan() {
                            r = f;
                        }
                    }
                    op.apply(l, r)
                })
                .collect();
            frame.insert(key, values);
        }

        Ok(Var {
            dims,
            frame,
            unit: synthesize_unit(op, &self.unit, &rhs.unit),
            default: self.default,
        })
    }
}

/// Reads a row for `key`, projecting the key down to the scenario name when
/// the frame belongs to the narrower operand.
fn lookup<'a>(frame: &'a ValueFrame, key: &RowKey, dims: VarDims) -> Option<&'a [f64]> {
    if dims.secondary().is_none() && key.secondary.is_some() {
        frame.get(&RowKey::scenario(&key.name))
    } else {
        frame.get(key)
    }
}

/// Aligns the two frames' selector columns.
///
/// Equal label sets align by label (rhs reordered to lhs order); a
/// single-column side replicates across the other side's columns; anything
/// else is an incompatibility.
fn harmonise_selectors(lhs: &ValueFrame, rhs: &ValueFrame) -> Result<(ValueFrame, ValueFrame)> {
    let l_labels: BTreeSet<String> = lhs.column_labels().into_iter().collect();
    let r_labels: BTreeSet<String> = rhs.column_labels().into_iter().collect();

    if l_labels == r_labels {
        return Ok((lhs.clone(), rhs.reorder_columns(lhs.columns())));
    }
    if rhs.columns().len() == 1 {
        return Ok((lhs.clone(), rhs.replicate_single(lhs.columns())));
    }
    if lhs.columns().len() == 1 {
        return Ok((lhs.replicate_single(rhs.columns()), rhs.clone()));
    }
    Err(AlgebraError::SelectorIncompatible {
        left: l_labels.into_iter().collect(),
        right: r_labels.into_iter().collect(),
    })
}

/// Decides the result dimensions and the row keys to combine over.
///
/// Equal dimensions combine over the key union. When one side carries a
/// secondary dimension the other lacks, the narrower side is replicated
/// across every secondary value present in the wider side (zero-extend
/// semantics, not a value join), and the result keeps the wider side's keys.
fn harmonise_dims(lhs: &Var, rhs: &Var) -> Result<(VarDims, Vec<RowKey>)> {
    let union = |a: &Var, b: &Var| -> Vec<RowKey> {
        let mut keys: BTreeSet<RowKey> = a.frame.keys().cloned().collect();
        keys.extend(b.frame.keys().cloned());
        keys.into_iter().collect()
    };

    match (lhs.dims.secondary(), rhs.dims.secondary()) {
        (None, None) => Ok((lhs.dims, union(lhs, rhs))),
        (Some(a), Some(b)) if a == b => Ok((lhs.dims, union(lhs, rhs))),
        (None, Some(_)) => Ok((rhs.dims, rhs.frame.keys().cloned().collect())),
        (Some(_), None) => Ok((lhs.dims, lhs.frame.keys().cloned().collect())),
        (Some(_), Some(_)) => Err(AlgebraError::DimensionIncompatible {
            left: lhs.index_columns(),
            right: rhs.index_columns(),
        }),
    }
}

/// Unit bookkeeping for Var-Var arithmetic.
fn synthesize_unit(op: BinOp, lhs: &str, rhs: &str) -> String {
    match op {
        BinOp::Add if lhs == rhs => lhs.to_string(),
        BinOp::Add => format!("({} + {})", lhs, rhs),
        BinOp::Sub if lhs == rhs => lhs.to_string(),
        BinOp::Sub => format!("({} - {})", lhs, rhs),
        BinOp::RSub if lhs == rhs => lhs.to_string(),
        BinOp::RSub => format!("({} - {})", rhs, lhs),
        BinOp::Mul => format!("({} * {})", lhs, rhs),
        BinOp::Div if lhs == rhs => "[dimensionless]".to_string(),
        BinOp::Div => format!("({} / {})", lhs, rhs),
        BinOp::RDiv if lhs == rhs => "[dimensionless]".to_string(),
        BinOp::RDiv => format!("({}) / ({})", rhs, lhs),
        BinOp::Pow => format!("({} ** {})", lhs, rhs),
    }
}
