//! Arithmetic operators.
//!
//! Defined for Integer, Decimal, and String (`+` concatenates); mixed
//! numeric operands promote to Decimal. Every other variant — objects in
//! particular — rejects arithmetic with an `UnsupportedOperation`
//! failure. All operators return new values.

use crate::error::{Failure, ValueResult};
use crate::value::Value;

impl Value {
    pub fn add(&self, other: &Value) -> ValueResult<Value> {
        match (self, other) {
            // String concatenation wins over numeric coercion.
            (Value::Str(a), b) => Ok(Value::Str(format!("{a}{}", b.to_text()))),
            (a, Value::Str(b)) => Ok(Value::Str(format!("{}{b}", a.to_text()))),
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_add(*b))),
            (a, b) => numeric_op(a, b, "+", |x, y| x + y),
        }
    }

    pub fn subtract(&self, other: &Value) -> ValueResult<Value> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_sub(*b))),
            (a, b) => numeric_op(a, b, "-", |x, y| x - y),
        }
    }

    pub fn multiply(&self, other: &Value) -> ValueResult<Value> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a.wrapping_mul(*b))),
            (a, b) => numeric_op(a, b, "*", |x, y| x * y),
        }
    }

    /// Division. Integer operands stay integral; division by zero is a
    /// script failure.
    pub fn divide(&self, other: &Value) -> ValueResult<Value> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => {
                if *b == 0 {
                    Err(Failure::script("division by zero"))
                } else {
                    Ok(Value::Integer(a / b))
                }
            }
            (a, b) => {
                let y = coerce_numeric(b, "/")?;
                if y == 0.0 {
                    return Err(Failure::script("division by zero"));
                }
                numeric_op(a, b, "/", |x, y| x / y)
            }
        }
    }

    /// Modulus, with the same zero handling as division.
    pub fn modulus(&self, other: &Value) -> ValueResult<Value> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => {
                if *b == 0 {
                    Err(Failure::script("modulo by zero"))
                } else {
                    Ok(Value::Integer(a % b))
                }
            }
            (a, b) => {
                let y = coerce_numeric(b, "%")?;
                if y == 0.0 {
                    return Err(Failure::script("modulo by zero"));
                }
                numeric_op(a, b, "%", |x, y| x % y)
            }
        }
    }

    /// Arithmetic negation.
    pub fn negate(&self) -> ValueResult<Value> {
        match self {
            Value::Integer(n) => Ok(Value::Integer(-n)),
            Value::Decimal(n) => Ok(Value::Decimal(-n)),
            Value::Dynamic(d) => d.read()?.negate(),
            other => Err(Failure::unsupported("-", other.type_of())),
        }
    }
}

/// Both operands must be numeric (or dynamics producing numerics);
/// the result is a Decimal.
fn numeric_op(
    a: &Value,
    b: &Value,
    op: &str,
    f: impl Fn(f64, f64) -> f64,
) -> ValueResult<Value> {
    let x = coerce_numeric(a, op)?;
    let y = coerce_numeric(b, op)?;
    Ok(Value::Decimal(f(x, y)))
}

fn coerce_numeric(v: &Value, op: &str) -> ValueResult<f64> {
    match v {
        Value::Integer(n) => Ok(*n as f64),
        Value::Decimal(n) => Ok(*n),
        Value::Dynamic(d) => coerce_numeric(&d.read()?, op),
        other => Err(Failure::unsupported(op, other.type_of())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::object::ObjectValue;

    #[test]
    fn integer_arithmetic_stays_integral() {
        assert_eq!(
            Value::from(7).divide(&Value::from(2)).unwrap(),
            Value::from(3)
        );
        assert_eq!(
            Value::from(7).modulus(&Value::from(4)).unwrap(),
            Value::from(3)
        );
    }

    #[test]
    fn mixed_operands_promote_to_decimal() {
        let v = Value::from(1).add(&Value::from(0.5)).unwrap();
        assert_eq!(v, Value::from(1.5));
        assert!(matches!(v, Value::Decimal(_)));
    }

    #[test]
    fn string_plus_concatenates() {
        assert_eq!(
            Value::from("count: ").add(&Value::from(3)).unwrap(),
            Value::from("count: 3")
        );
        assert_eq!(
            Value::from(3).add(&Value::from(" items")).unwrap(),
            Value::from("3 items")
        );
    }

    #[test]
    fn division_by_zero_fails() {
        assert_eq!(
            Value::from(1).divide(&Value::from(0)).unwrap_err().kind,
            ErrorKind::Script
        );
        assert!(Value::from(1.0).divide(&Value::from(0)).is_err());
    }

    #[test]
    fn objects_reject_arithmetic() {
        let o = Value::from(ObjectValue::new("Point", false));
        let err = o.add(&Value::from(1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedOperation);
    }
}
