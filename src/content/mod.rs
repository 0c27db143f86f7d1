//! Resource lookup.
//!
//! A [`ContentStore`] maps keys to byte payloads; the [`Resolver`] turns a
//! request target into a key, consults its fixed replies and then the store.

pub mod resolver;
pub mod store;

pub use resolver::{Resolution, Resolver, Resource};
pub use store::{ContentError, ContentStore, DirectoryStore, MemoryStore};
