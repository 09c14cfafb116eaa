//! Runtime values for the Kindle virtual machine

use std::fmt;

use super::object::ObjRef;

/// A runtime value
///
/// Every consumer matches on this enum exhaustively, so adding a variant is
/// a compile-time checked change.
#[derive(Debug, Clone)]
pub enum Value {
    /// Boolean value
    Bool(bool),

    /// Nil
    Nil,

    /// Double-precision number
    Number(f64),

    /// Reference to a heap object
    Obj(ObjRef),
}

impl Value {
    /// Returns true if this value is falsey (`nil` and `false`)
    #[must_use]
    pub const fn is_falsey(&self) -> bool {
        match self {
            Value::Nil => true,
            Value::Bool(b) => !*b,
            Value::Number(_) | Value::Obj(_) => false,
        }
    }

    /// Returns the number if this is a number
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(_) | Value::Nil | Value::Obj(_) => None,
        }
    }

    /// Returns the string contents if this is a string object
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Obj(obj) => obj.as_str(),
            Value::Bool(_) | Value::Nil | Value::Number(_) => None,
        }
    }

    /// Returns the type name of this value (for error messages)
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Nil => "nil",
            Value::Number(_) => "number",
            Value::Obj(obj) => obj.object().type_name(),
        }
    }

    /// Check if two values may share a constant pool slot
    ///
    /// Stricter than `==`: numbers compare by bit pattern so `0.0` and `-0.0`
    /// stay distinct and `NaN` can be reused.
    #[must_use]
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(_) | Value::Nil | Value::Number(_) | Value::Obj(_), _) => self == other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Obj(a), Value::Obj(b)) => a == b,
            (Value::Bool(_) | Value::Nil | Value::Number(_) | Value::Obj(_), _) => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<ObjRef> for Value {
    fn from(obj: ObjRef) -> Self {
        Value::Obj(obj)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Nil => write!(f, "nil"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Obj(obj) => write!(f, "{obj}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Heap;

    #[test]
    fn cross_tag_values_are_unequal() {
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_ne!(Value::Number(0.0), Value::Bool(false));
        assert_ne!(Value::Number(1.0), Value::Nil);
    }

    #[test]
    fn numbers_use_ieee_equality() {
        assert_eq!(Value::Number(0.0), Value::Number(-0.0));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert!(!Value::Number(0.0).is_identical(&Value::Number(-0.0)));
        assert!(Value::Number(f64::NAN).is_identical(&Value::Number(f64::NAN)));
    }

    #[test]
    fn strings_compare_through_the_heap() {
        let mut heap = Heap::new();
        let a = Value::Obj(heap.intern("ab"));
        let b = Value::Obj(heap.intern("ab"));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), Some("ab"));
    }

    #[test]
    fn falsiness() {
        assert!(Value::Nil.is_falsey());
        assert!(Value::Bool(false).is_falsey());
        assert!(!Value::Bool(true).is_falsey());
        assert!(!Value::Number(0.0).is_falsey());
    }

    #[test]
    fn display() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }
}
