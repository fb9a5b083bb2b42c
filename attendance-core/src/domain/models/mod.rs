mod actor;
mod attendance;
mod cache_record;
mod ids;
mod leave;
mod task;

pub use actor::*;
pub use attendance::*;
pub use cache_record::*;
pub use ids::*;
pub use leave::*;
pub use task::*;
