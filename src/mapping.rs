//! The status-code-to-error-kind table.
//!
//! ## Table Invariant
//! The table is built once at the entry point, before the runtime starts, and
//! then moved into the [`Runtime`](crate::runtime::Runtime) behind an `Arc`.
//! Nothing hands out `&mut ErrorMap` after that, so lookups from any number of
//! attached threads never race with a registration.

use crate::status::{ErrorKind, StatusCode};
use std::collections::BTreeMap;

/// Maps native status codes to the error kind raised for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMap {
    entries: BTreeMap<StatusCode, ErrorKind>,
}

impl ErrorMap {
    /// An empty table: every code resolves to [`ErrorKind::Unknown`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical table covering every documented JNI failure status.
    ///
    /// # Example
    /// ```rust
    /// use jt_jvm::mapping::ErrorMap;
    /// use jt_jvm::status::{ErrorKind, StatusCode};
    /// let map = ErrorMap::standard();
    /// assert_eq!(map.resolve(StatusCode::Detached), ErrorKind::ThreadNotAttached);
    /// ```
    pub fn standard() -> Self {
        let mut map = Self::new();
        map.register(StatusCode::Err, ErrorKind::Unknown)
            .register(StatusCode::Detached, ErrorKind::ThreadNotAttached)
            .register(StatusCode::Version, ErrorKind::VersionNotSupported)
            .register(StatusCode::NoMem, ErrorKind::NotEnoughMemory)
            .register(StatusCode::Exist, ErrorKind::AlreadyExists)
            .register(StatusCode::Inval, ErrorKind::InvalidArgument);
        map
    }

    /// Inserts or replaces the kind for `code`. Registering the same pair
    /// twice leaves the table unchanged.
    pub fn register(&mut self, code: StatusCode, kind: ErrorKind) -> &mut Self {
        if let Some(previous) = self.entries.insert(code, kind) {
            if previous != kind {
                log::debug!("error map: {} remapped from {} to {}", code, previous, kind);
            }
        }
        self
    }

    /// The kind registered for `code`, or [`ErrorKind::Unknown`].
    pub fn resolve(&self, code: StatusCode) -> ErrorKind {
        self.entries
            .get(&code)
            .copied()
            .unwrap_or(ErrorKind::Unknown)
    }

    pub fn contains(&self, code: StatusCode) -> bool {
        self.entries.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatusCode, ErrorKind)> + '_ {
        self.entries.iter().map(|(code, kind)| (*code, *kind))
    }

    /// Documented failure codes with no entry; those fall back to `Unknown`.
    pub fn uncovered(&self) -> Vec<StatusCode> {
        StatusCode::FAILURES
            .into_iter()
            .filter(|code| !self.contains(*code))
            .collect()
    }

    /// Kinds reachable from more than one status code, with those codes.
    pub fn aliases(&self) -> Vec<(ErrorKind, Vec<StatusCode>)> {
        let mut by_kind: BTreeMap<ErrorKind, Vec<StatusCode>> = BTreeMap::new();
        for (code, kind) in self.iter() {
            by_kind.entry(kind).or_default().push(code);
        }
        by_kind
            .into_iter()
            .filter(|(_, codes)| codes.len() > 1)
            .collect()
    }
}

impl FromIterator<(StatusCode, ErrorKind)> for ErrorMap {
    fn from_iter<I: IntoIterator<Item = (StatusCode, ErrorKind)>>(iter: I) -> Self {
        let mut map = ErrorMap::new();
        for (code, kind) in iter {
            map.register(code, kind);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_has_no_gaps() {
        let map = ErrorMap::standard();
        assert!(map.uncovered().is_empty());
        assert_eq!(map.len(), 6);
    }

    #[test]
    fn register_is_an_upsert() {
        let mut map = ErrorMap::new();
        map.register(StatusCode::Inval, ErrorKind::Unknown);
        map.register(StatusCode::Inval, ErrorKind::InvalidArgument);
        map.register(StatusCode::Inval, ErrorKind::InvalidArgument);
        assert_eq!(map.len(), 1);
        assert_eq!(map.resolve(StatusCode::Inval), ErrorKind::InvalidArgument);
    }

    #[test]
    fn intentional_alias_is_reported() {
        let mut map = ErrorMap::standard();
        map.register(StatusCode::Other(-99), ErrorKind::NotEnoughMemory);
        let aliases = map.aliases();
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases[0].0, ErrorKind::NotEnoughMemory);
        assert_eq!(aliases[0].1, vec![StatusCode::NoMem, StatusCode::Other(-99)]);
    }
}
