//! A cursor-based, read-only walk over an existing [`Value`] tree.
//!
//! Unlike [`parser::Parser`](crate::json::parser::Parser), which builds a
//! tree from bytes, `JsonIter` is a separate, second allocation (a small
//! stack of "which entry am I on in this container" levels) that lets
//! calling code descend into and climb back out of a tree it already
//! holds, without borrowing it mutably and without recursion. There is no
//! separate string interning pool here: a [`ByteString`](crate::bytestr::ByteString)
//! is already `Arc`-backed, so every `get_string` call is a pointer-width
//! clone rather than a copy — the pool the source needs to avoid repeated
//! heap churn has no job left to do.

use crate::bytestr::ByteString;
use crate::error::{Error, ErrorKind, Result};
use crate::json::{JsonArray, JsonObject, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Object,
    Array,
}

fn value_type(v: &Value) -> ValueType {
    match v {
        Value::Null => ValueType::Null,
        Value::Bool(_) => ValueType::Bool,
        Value::Int(_) => ValueType::Int,
        Value::Float(_) => ValueType::Float,
        Value::Str(_) => ValueType::Str,
        Value::Object(_) => ValueType::Object,
        Value::Array(_) => ValueType::Array,
    }
}

enum Level<'v> {
    Object { obj: &'v JsonObject, idx: isize },
    Array { arr: &'v JsonArray, idx: isize },
}

/// A cursor over `root`. Starts positioned on `root` itself; `push_object`
/// / `push_array` descend into the container the cursor currently sits
/// on, `advance` moves to the next sibling entry of the innermost open
/// container, and `pop` climbs back to the parent.
pub struct JsonIter<'v> {
    root: &'v Value,
    levels: Vec<Level<'v>>,
}

impl<'v> JsonIter<'v> {
    pub fn new(root: &'v Value) -> Self {
        JsonIter {
            root,
            levels: Vec::new(),
        }
    }

    fn current_value(&self) -> Option<&'v Value> {
        match self.levels.last() {
            None => Some(self.root),
            Some(Level::Object { obj, idx }) => {
                if *idx >= 0 {
                    obj.entry_at(*idx as usize).map(|(_, v)| v)
                } else {
                    None
                }
            }
            Some(Level::Array { arr, idx }) => {
                if *idx >= 0 {
                    arr.get(*idx as usize)
                } else {
                    None
                }
            }
        }
    }

    /// The key of the entry the cursor is on, if the innermost open
    /// container is an object and the cursor has been advanced onto an
    /// entry.
    pub fn current_key(&self) -> Option<&'v ByteString> {
        match self.levels.last() {
            Some(Level::Object { obj, idx }) if *idx >= 0 => {
                obj.entry_at(*idx as usize).map(|(k, _)| k)
            }
            _ => None,
        }
    }

    /// Whether a subsequent `advance()` would move the cursor onto
    /// another entry, without moving it.
    pub fn has_next_entry(&self) -> bool {
        match self.levels.last() {
            None => false,
            Some(Level::Object { obj, idx }) => (*idx + 1) < obj.len() as isize,
            Some(Level::Array { arr, idx }) => (*idx + 1) < arr.len() as isize,
        }
    }

    /// Moves the cursor to the next entry in the innermost open
    /// container, returning whether it moved. Calling this at the root
    /// level (before any `push_object`/`push_array`) always returns
    /// `false` — the root has no siblings.
    pub fn advance(&mut self) -> bool {
        match self.levels.last_mut() {
            None => false,
            Some(Level::Object { obj, idx }) => {
                if (*idx + 1) < obj.len() as isize {
                    *idx += 1;
                    true
                } else {
                    false
                }
            }
            Some(Level::Array { arr, idx }) => {
                if (*idx + 1) < arr.len() as isize {
                    *idx += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Descends into the object the cursor currently sits on.
    pub fn push_object(&mut self) -> Result<()> {
        let obj = self.current_typed_value()?.as_object().ok_or_else(|| {
            Error::new(ErrorKind::JsonNotThisType, "current value is not an object")
        })?;
        self.levels.push(Level::Object { obj, idx: -1 });
        Ok(())
    }

    /// Descends into the array the cursor currently sits on.
    pub fn push_array(&mut self) -> Result<()> {
        let arr = self.current_typed_value()?.as_array().ok_or_else(|| {
            Error::new(ErrorKind::JsonNotThisType, "current value is not an array")
        })?;
        self.levels.push(Level::Array { arr, idx: -1 });
        Ok(())
    }

    /// Climbs back out to the parent level. Fails if already at the root.
    pub fn pop(&mut self) -> Result<()> {
        if self.levels.pop().is_none() {
            Err(Error::new(
                ErrorKind::NoSuchEntry,
                "already at the root level, nothing to pop",
            ))
        } else {
            Ok(())
        }
    }

    fn current_typed_value(&self) -> Result<&'v Value> {
        self.current_value().ok_or_else(|| {
            Error::new(
                ErrorKind::NoSuchEntry,
                "cursor is not positioned on a value",
            )
        })
    }

    pub fn get_type(&self) -> Option<ValueType> {
        self.current_value().map(value_type)
    }

    pub fn get_object(&self) -> Result<&'v JsonObject> {
        self.current_typed_value()?.as_object().ok_or_else(|| {
            Error::new(ErrorKind::JsonNotThisType, "current value is not an object")
        })
    }

    pub fn get_array(&self) -> Result<&'v JsonArray> {
        self.current_typed_value()?.as_array().ok_or_else(|| {
            Error::new(ErrorKind::JsonNotThisType, "current value is not an array")
        })
    }

    pub fn get_string(&self) -> Result<&'v ByteString> {
        self.current_typed_value()?.as_str().ok_or_else(|| {
            Error::new(ErrorKind::JsonNotThisType, "current value is not a string")
        })
    }

    pub fn get_integer(&self) -> Result<i64> {
        self.current_typed_value()?.as_int().ok_or_else(|| {
            Error::new(ErrorKind::JsonNotThisType, "current value is not an integer")
        })
    }

    pub fn get_number(&self) -> Result<f64> {
        self.current_typed_value()?.as_float().ok_or_else(|| {
            Error::new(ErrorKind::JsonNotThisType, "current value is not a number")
        })
    }

    pub fn get_boolean(&self) -> Result<bool> {
        self.current_typed_value()?.as_bool().ok_or_else(|| {
            Error::new(ErrorKind::JsonNotThisType, "current value is not a boolean")
        })
    }

    pub fn get_null(&self) -> Result<()> {
        let v = self.current_typed_value()?;
        if v.is_null() {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::JsonNotThisType, "current value is not null"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::parser::Parser;

    fn parse(src: &str) -> Value {
        let mut parser = Parser::parse_object();
        let (outcome, _) = parser.feed(src.as_bytes());
        match outcome {
            crate::json::parser::Outcome::Done(v) => v,
            other => panic!("unexpected parse outcome: {:?}", other),
        }
    }

    #[test]
    fn walks_nested_structure() {
        let value = parse(r#"{"name":"crate","tags":["a","b"],"meta":{"n":1}}"#);
        let mut it = JsonIter::new(&value);
        it.push_object().unwrap();

        assert!(it.advance());
        assert_eq!(it.current_key().unwrap().as_str().unwrap(), "meta");
        it.push_object().unwrap();
        assert!(it.advance());
        assert_eq!(it.current_key().unwrap().as_str().unwrap(), "n");
        assert_eq!(it.get_integer().unwrap(), 1);
        assert!(!it.has_next_entry());
        it.pop().unwrap();

        assert!(it.advance());
        assert_eq!(it.current_key().unwrap().as_str().unwrap(), "name");
        assert_eq!(it.get_string().unwrap().as_str().unwrap(), "crate");

        assert!(it.advance());
        assert_eq!(it.current_key().unwrap().as_str().unwrap(), "tags");
        assert_eq!(it.get_type(), Some(ValueType::Array));
        it.push_array().unwrap();
        assert!(it.advance());
        assert_eq!(it.get_string().unwrap().as_str().unwrap(), "a");
        assert!(it.has_next_entry());
        assert!(it.advance());
        assert_eq!(it.get_string().unwrap().as_str().unwrap(), "b");
        assert!(!it.advance());
    }

    #[test]
    fn pop_at_root_is_an_error() {
        let value = parse(r#"{"a":1}"#);
        let mut it = JsonIter::new(&value);
        assert!(it.pop().is_err());
    }

    #[test]
    fn wrong_type_access_is_an_error() {
        let value = parse(r#"{"a":1}"#);
        let mut it = JsonIter::new(&value);
        it.push_object().unwrap();
        it.advance();
        assert!(it.get_string().is_err());
        assert_eq!(it.get_integer().unwrap(), 1);
    }
}
