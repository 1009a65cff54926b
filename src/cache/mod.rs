pub mod collection;

pub use collection::CollectionCache;
