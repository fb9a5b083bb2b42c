mod leave_engine;
mod lifecycle;
mod reconcile;
mod session_manager;
mod task_tracker;
mod ticker;

pub use leave_engine::*;
pub use lifecycle::*;
pub use reconcile::*;
pub use session_manager::SessionManager;
pub use task_tracker::TaskTracker;
pub use ticker::ElapsedTicker;
