//! Opaque object handles stored by the index

use std::fmt::Debug;

use slotmap::{DefaultKey, Key, KeyData};

/// Non-owning reference to an object tracked elsewhere.
///
/// The index copies and compares handles but never dereferences them.
/// A handle that reports [`is_null`](Handle::is_null) stays stored but is
/// skipped by every query.
pub trait Handle: Copy + PartialEq + Debug {
    /// Whether this handle no longer refers to anything
    fn is_null(&self) -> bool {
        false
    }
}

impl Handle for u32 {}
impl Handle for u64 {}
impl Handle for usize {}

impl Handle for DefaultKey {
    fn is_null(&self) -> bool {
        Key::is_null(self)
    }
}

impl Handle for KeyData {
    fn is_null(&self) -> bool {
        Key::is_null(&DefaultKey::from(*self))
    }
}
