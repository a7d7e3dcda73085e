//! Authenticated streaming from the object store

pub mod store;

pub use store::{StorageProxy, StoreObject, DEFAULT_CONTENT_TYPE, PROXY_CACHE_CONTROL};
