pub mod client;
pub mod commands;
pub mod constants;
pub mod device;
pub mod discovery;
pub mod error;
pub mod message;
pub mod models;
pub mod packet;
pub mod parameter;
pub mod status;


// Re-export the session types for easy access
pub use client::{ClientConfig, VentoClient};
pub use device::{ChangeCallback, Device, DeviceHandle, NotifyPolicy};
pub use error::{DecodeError, EncodeError, VentoError};
pub use message::Response;
pub use packet::{FunctionCode, Request};
pub use parameter::{Parameter, ParameterCatalog, ValueSize};
pub use status::{Mode, Speed, Status, TimerMode, UnitType};
