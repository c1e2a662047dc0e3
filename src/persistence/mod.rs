//! Durable session storage.
//!
//! A session lives in a single CBOR file. Every commit rewrites the file
//! atomically (unique temp file + rename) so a crash never leaves a torn
//! write. Processes sharing the file serialize on an advisory lock held in
//! a sibling `.lock` file.
//! Loading re-checks the fingerprint and every session invariant before the
//! state is trusted.

pub mod file_store;

pub use file_store::{FileStore, SessionLock, StoredSession, SCHEMA_VERSION};
