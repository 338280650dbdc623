use crate::bytestr::ByteString;
use crate::constants::JSON_OBJECT_MAX_CAPACITY;
use crate::error::{Error, ErrorKind, Result};
use crate::json::Value;

/// An ordered mapping from byte-string key to [`Value`], keys held in
/// ascending byte-lexicographic order to enable binary search. Duplicate
/// keys are disallowed; `set` on an existing key replaces the bound value.
///
/// The source's inline small-object storage with ×1.5 geometric growth is
/// a performance optimization, not a correctness one (see `DESIGN.md`) —
/// `Vec`'s own growth strategy is used here instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonObject {
    entries: Vec<(ByteString, Value)>,
}

impl JsonObject {
    pub fn new() -> Self {
        JsonObject {
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(cap: usize) -> Self {
        JsonObject {
            entries: Vec::with_capacity(cap.min(JSON_OBJECT_MAX_CAPACITY)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &[u8]) -> std::result::Result<usize, usize> {
        self.entries
            .binary_search_by(|(k, _)| k.as_bytes().cmp(key))
    }

    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.position(key).ok().map(|i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Value> {
        match self.position(key) {
            Ok(i) => Some(&mut self.entries[i].1),
            Err(_) => None,
        }
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.position(key).is_ok()
    }

    /// Inserts or replaces `key`'s binding, returning the prior value (if
    /// any). Fails with `out-of-capacity` when the object is full and
    /// `key` is new.
    pub fn set(&mut self, key: ByteString, value: Value) -> Result<Option<Value>> {
        match self.position(key.as_bytes()) {
            Ok(i) => {
                let prior = std::mem::replace(&mut self.entries[i].1, value);
                Ok(Some(prior))
            }
            Err(i) => {
                if self.entries.len() >= JSON_OBJECT_MAX_CAPACITY {
                    return Err(Error::new(
                        ErrorKind::OutOfCapacity,
                        "object already holds the maximum of 65535 pairs",
                    ));
                }
                self.entries.insert(i, (key, value));
                Ok(None)
            }
        }
    }

    /// Removes `key`'s binding, returning the removed value if present.
    pub fn unset(&mut self, key: &[u8]) -> Option<Value> {
        match self.position(key) {
            Ok(i) => Some(self.entries.remove(i).1),
            Err(_) => None,
        }
    }

    /// Renames `old` to `new`, keeping the bound value and re-establishing
    /// sort order. A no-op if `old == new` and it exists; fails with
    /// `no-such-entry` if `old` is absent.
    pub fn rename(&mut self, old: &[u8], new: ByteString) -> Result<()> {
        if old == new.as_bytes() {
            return if self.contains_key(old) {
                Ok(())
            } else {
                Err(Error::new(ErrorKind::NoSuchEntry, "no such key to rename"))
            };
        }
        let value = self
            .unset(old)
            .ok_or_else(|| Error::new(ErrorKind::NoSuchEntry, "no such key to rename"))?;
        // `set` can only fail on capacity, and we just freed a slot.
        self.set(new, value).expect("capacity freed by unset");
        Ok(())
    }

    /// Iterates bindings in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ByteString, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Looks up the `idx`-th binding in key order. Used by the cursor-based
    /// iterator, which walks an object by position rather than by key.
    pub fn entry_at(&self, idx: usize) -> Option<(&ByteString, &Value)> {
        self.entries.get(idx).map(|(k, v)| (k, v))
    }
}

impl<'a> IntoIterator for &'a JsonObject {
    type Item = (&'a ByteString, &'a Value);
    type IntoIter = Box<dyn Iterator<Item = (&'a ByteString, &'a Value)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_invariant() {
        let mut obj = JsonObject::new();
        obj.set("b".into(), Value::Int(2)).unwrap();
        obj.set("a".into(), Value::Int(1)).unwrap();
        obj.set("c".into(), Value::Int(3)).unwrap();
        let keys: Vec<_> = obj.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn set_replaces_existing_binding() {
        let mut obj = JsonObject::new();
        obj.set("a".into(), Value::Int(1)).unwrap();
        let prior = obj.set("a".into(), Value::Int(2)).unwrap();
        assert_eq!(prior, Some(Value::Int(1)));
        assert_eq!(obj.get(b"a"), Some(&Value::Int(2)));
    }

    #[test]
    fn rename_idempotent_when_key_exists() {
        let mut obj = JsonObject::new();
        obj.set("a".into(), Value::Int(1)).unwrap();
        assert!(obj.rename(b"a", "a".into()).is_ok());
        assert!(obj.rename(b"missing", "missing".into()).is_err());
    }

    #[test]
    fn rename_moves_value_and_resorts() {
        let mut obj = JsonObject::new();
        obj.set("a".into(), Value::Int(1)).unwrap();
        obj.set("z".into(), Value::Int(2)).unwrap();
        obj.rename(b"a", "m".into()).unwrap();
        let keys: Vec<_> = obj.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["m", "z"]);
    }
}
