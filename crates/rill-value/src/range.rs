//! Range values: ordered bounds over integers, decimals, strings, dates.
//!
//! Bounds may be given in either direction; a range with reversed bounds
//! is still valid and iterates in reverse.

use crate::error::{ErrorKind, Failure, ValueResult};
use crate::ty::Type;
use crate::value::Value;
use chrono::Duration;
use std::cmp::Ordering;

/// An inclusive range between two bound values.
#[derive(Debug, Clone)]
pub struct RangeValue {
    pub lower: Value,
    pub upper: Value,
}

impl RangeValue {
    /// Build a range. Both bounds must be Integer, Decimal, String, or Date.
    pub fn new(lower: Value, upper: Value) -> ValueResult<RangeValue> {
        for bound in [&lower, &upper] {
            match bound.type_of() {
                Type::Integer | Type::Decimal | Type::String | Type::Date => {}
                other => {
                    return Err(Failure::new(
                        ErrorKind::UnsupportedOperation,
                        format!("{other} cannot bound a range"),
                    ));
                }
            }
        }
        Ok(RangeValue { lower, upper })
    }

    /// True when the lower bound sorts after the upper bound.
    pub fn is_descending(&self) -> bool {
        self.lower.compare(&self.upper) == Ordering::Greater
    }

    /// Inclusive membership test against the (normalized) bounds.
    pub fn contains(&self, value: &Value) -> bool {
        let (lo, hi) = if self.is_descending() {
            (&self.upper, &self.lower)
        } else {
            (&self.lower, &self.upper)
        };
        value.compare(lo) != Ordering::Less && value.compare(hi) != Ordering::Greater
    }

    /// Number of elements this range expands to.
    pub fn size(&self) -> ValueResult<usize> {
        Ok(self.expand()?.len())
    }

    /// Expand to the ordered element list, descending when the bounds
    /// are reversed.
    pub fn expand(&self) -> ValueResult<Vec<Value>> {
        match (&self.lower, &self.upper) {
            (Value::Integer(a), Value::Integer(b)) => Ok(int_steps(*a, *b)),
            (a, b) if a.type_of().is_numeric() && b.type_of().is_numeric() => {
                Ok(decimal_steps(a.to_decimal()?, b.to_decimal()?))
            }
            (Value::Str(a), Value::Str(b)) => char_steps(a, b),
            (Value::Date(a), Value::Date(b)) => {
                let mut out = Vec::new();
                let step = if a <= b {
                    Duration::days(1)
                } else {
                    Duration::days(-1)
                };
                let mut cur = *a;
                loop {
                    out.push(Value::Date(cur));
                    if cur == *b {
                        break;
                    }
                    let next = cur + step;
                    // Inclusive up to the bound; stop rather than overshoot.
                    if (step > Duration::zero() && next > *b)
                        || (step < Duration::zero() && next < *b)
                    {
                        break;
                    }
                    cur = next;
                }
                Ok(out)
            }
            (a, b) => Err(Failure::new(
                ErrorKind::UnsupportedOperation,
                format!("cannot iterate a range of {} to {}", a.type_of(), b.type_of()),
            )),
        }
    }
}

fn int_steps(a: i64, b: i64) -> Vec<Value> {
    if a <= b {
        (a..=b).map(Value::Integer).collect()
    } else {
        (b..=a).rev().map(Value::Integer).collect()
    }
}

fn decimal_steps(a: f64, b: f64) -> Vec<Value> {
    let mut out = Vec::new();
    if a <= b {
        let mut cur = a;
        while cur <= b {
            out.push(Value::Decimal(cur));
            cur += 1.0;
        }
    } else {
        let mut cur = a;
        while cur >= b {
            out.push(Value::Decimal(cur));
            cur -= 1.0;
        }
    }
    out
}

fn char_steps(a: &str, b: &str) -> ValueResult<Vec<Value>> {
    let (ca, cb) = match (char_bound(a), char_bound(b)) {
        (Some(ca), Some(cb)) => (ca, cb),
        _ => {
            return Err(Failure::new(
                ErrorKind::UnsupportedOperation,
                "string ranges iterate over single-character bounds",
            ));
        }
    };
    let (lo, hi) = (ca.min(cb) as u32, ca.max(cb) as u32);
    let mut out: Vec<Value> = (lo..=hi)
        .filter_map(char::from_u32)
        .map(|c| Value::Str(c.to_string()))
        .collect();
    if ca > cb {
        out.reverse();
    }
    Ok(out)
}

fn char_bound(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
