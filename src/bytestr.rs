use std::fmt;
use std::sync::Arc;

/// A length-prefixed immutable byte buffer.
///
/// Backed by an `Arc<[u8]>` so clones are cheap and a [`Value`](crate::json::Value)
/// can share string storage with its iterators without a deep copy. The
/// buffer is not required to be valid UTF-8 (JSON string *values* may carry
/// arbitrary escaped bytes after decoding), though in practice it always is.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteString(Arc<[u8]>);

impl ByteString {
    /// The well-known zero-length string singleton.
    pub fn empty() -> Self {
        ByteString(Arc::from(&[][..]))
    }

    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        ByteString(Arc::from(bytes.into().into_boxed_slice()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.0)
    }

    pub fn to_string_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl Default for ByteString {
    fn default() -> Self {
        ByteString::empty()
    }
}

impl From<&str> for ByteString {
    fn from(s: &str) -> Self {
        ByteString::new(s.as_bytes().to_vec())
    }
}

impl From<String> for ByteString {
    fn from(s: String) -> Self {
        ByteString::new(s.into_bytes())
    }
}

impl From<&[u8]> for ByteString {
    fn from(b: &[u8]) -> Self {
        ByteString::new(b.to_vec())
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(b: Vec<u8>) -> Self {
        ByteString::new(b)
    }
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Ok(s) => write!(f, "{:?}", s),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

impl fmt::Display for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_singleton_has_zero_len() {
        let s = ByteString::empty();
        assert_eq!(s.len(), 0);
        assert!(s.is_empty());
    }

    #[test]
    fn ordering_is_byte_lexicographic() {
        let a = ByteString::from("abc");
        let b = ByteString::from("abd");
        assert!(a < b);
    }

    #[test]
    fn clone_shares_storage() {
        let a = ByteString::from("hello");
        let b = a.clone();
        assert_eq!(a.as_bytes().as_ptr(), b.as_bytes().as_ptr());
    }
}
