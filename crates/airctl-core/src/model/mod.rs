// ── Domain model ──

pub mod listener_id;
pub mod status;

pub use listener_id::ListenerId;
pub use status::{FanSpeed, Mode, Status};
