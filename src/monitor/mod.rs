pub mod alert_state;
pub mod camera_monitor;
pub mod settings;

pub use alert_state::{AlertState, AlertStatus};
pub use camera_monitor::CameraMonitor;
pub use settings::MonitorSettings;
