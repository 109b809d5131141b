pub mod types;
pub mod event;
pub mod snapshot;
pub mod change;
pub mod diff;
pub mod format;
pub mod policy;

pub use types::*;
pub use event::*;
pub use snapshot::*;
pub use change::*;
pub use diff::*;
pub use format::*;
pub use policy::*;
