pub mod board;
pub mod reporter;
pub mod sink;

pub use board::StatusBoard;
pub use reporter::spawn_log_reporter;
pub use sink::StatusSink;
