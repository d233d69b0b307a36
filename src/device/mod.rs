//! Client for biometric terminals speaking the JSON control protocol.

pub mod client;
pub mod error;
pub mod protocol;

pub use client::DeviceClient;
pub use error::{ProtocolError, ProtocolResult};
pub use protocol::{Command, DeviceReply, DeviceUser, ProtocolResponse};
