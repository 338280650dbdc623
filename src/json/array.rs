use std::collections::VecDeque;

use crate::constants::JSON_ARRAY_MAX_CAPACITY;
use crate::error::{Error, ErrorKind, Result};
use crate::json::Value;

/// An ordered, double-ended sequence of [`Value`]s. Backed by a
/// `VecDeque`, which already implements the "movable begin/end ring
/// buffer" the source hand-rolls, so push/pop/unshift/shift are all O(1)
/// amortized without any extra bookkeeping here.
///
/// An array constructed via [`JsonArray::immutable_empty`] rejects every
/// mutating operation with `modifying-immutable-array`; this models the
/// source's well-known zero-capacity empty array singleton.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonArray {
    values: VecDeque<Value>,
    mutable: bool,
}

impl JsonArray {
    pub fn new() -> Self {
        JsonArray {
            values: VecDeque::new(),
            mutable: true,
        }
    }

    pub fn with_capacity(cap: usize) -> Self {
        JsonArray {
            values: VecDeque::with_capacity(cap.min(JSON_ARRAY_MAX_CAPACITY)),
            mutable: true,
        }
    }

    /// The well-known immutable empty array singleton.
    pub fn immutable_empty() -> Self {
        JsonArray {
            values: VecDeque::new(),
            mutable: false,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    fn check_mutable(&self) -> Result<()> {
        if self.mutable {
            Ok(())
        } else {
            Err(Error::new(
                ErrorKind::JsonModifyingImmutableArray,
                "cannot mutate the immutable empty array",
            ))
        }
    }

    fn check_capacity(&self) -> Result<()> {
        if self.values.len() >= JSON_ARRAY_MAX_CAPACITY {
            Err(Error::new(
                ErrorKind::OutOfCapacity,
                "array already holds the maximum of 65535 values",
            ))
        } else {
            Ok(())
        }
    }

    pub fn push(&mut self, value: Value) -> Result<()> {
        self.check_mutable()?;
        self.check_capacity()?;
        self.values.push_back(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Option<Value>> {
        self.check_mutable()?;
        Ok(self.values.pop_back())
    }

    pub fn unshift(&mut self, value: Value) -> Result<()> {
        self.check_mutable()?;
        self.check_capacity()?;
        self.values.push_front(value);
        Ok(())
    }

    pub fn shift(&mut self) -> Result<Option<Value>> {
        self.check_mutable()?;
        Ok(self.values.pop_front())
    }

    /// Replaces the value at `idx`, returning the prior value.
    pub fn replace(&mut self, idx: usize, value: Value) -> Result<Value> {
        self.check_mutable()?;
        let slot = self
            .values
            .get_mut(idx)
            .ok_or_else(|| Error::new(ErrorKind::JsonOutOfIndex, "index out of bounds"))?;
        Ok(std::mem::replace(slot, value))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }
}

impl Default for JsonArray {
    fn default() -> Self {
        JsonArray::new()
    }
}

impl<'a> IntoIterator for &'a JsonArray {
    type Item = &'a Value;
    type IntoIter = std::collections::vec_deque::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immutable_array_rejects_mutation() {
        let mut arr = JsonArray::immutable_empty();
        assert!(arr.push(Value::Null).is_err());
        assert!(arr.unshift(Value::Null).is_err());
        assert!(arr.pop().is_err());
        assert!(arr.shift().is_err());
    }

    #[test]
    fn head_and_tail_operations() {
        let mut arr = JsonArray::new();
        arr.push(Value::Int(1)).unwrap();
        arr.push(Value::Int(2)).unwrap();
        arr.unshift(Value::Int(0)).unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.shift().unwrap(), Some(Value::Int(0)));
        assert_eq!(arr.pop().unwrap(), Some(Value::Int(2)));
        assert_eq!(arr.get(0), Some(&Value::Int(1)));
    }

    #[test]
    fn replace_returns_prior_value() {
        let mut arr = JsonArray::new();
        arr.push(Value::Int(1)).unwrap();
        let prior = arr.replace(0, Value::Int(9)).unwrap();
        assert_eq!(prior, Value::Int(1));
        assert_eq!(arr.get(0), Some(&Value::Int(9)));
    }
}
