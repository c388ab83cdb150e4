//! Core data models for the object broker.
//!
//! `Object` is the metadata row persisted by the optional metadata store;
//! `ObjectRef` is the `{url, key}` pair handed back to callers.

pub mod object;
