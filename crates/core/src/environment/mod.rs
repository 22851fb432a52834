pub mod control;
pub mod power;

pub use control::{ControlError, PoweroffControl, RecordingControl, SystemControl};
pub use power::{PowerSource, ScriptedPowerSource, SourceError, SysfsPowerSource};
