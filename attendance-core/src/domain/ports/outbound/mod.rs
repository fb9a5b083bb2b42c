mod clock;
mod local_cache;
mod remote_store;

pub use clock::*;
pub use local_cache::*;
pub use remote_store::*;
