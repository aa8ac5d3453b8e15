pub mod cache;
pub mod index;

pub use cache::{ExampleCache, ExampleCacheStatus};
pub use index::{build_example_index, ExampleIndex, ExampleIndexStatus, IndexedExample};
