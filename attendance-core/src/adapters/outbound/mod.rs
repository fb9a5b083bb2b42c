mod clock;
mod file_cache;
mod memory_cache;
mod memory_store;

pub use clock::*;
pub use file_cache::FileCache;
pub use memory_cache::MemoryCache;
pub use memory_store::*;
