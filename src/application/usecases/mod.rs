pub mod deliver_notification;
pub mod run_once;

pub use deliver_notification::*;
pub use run_once::*;
