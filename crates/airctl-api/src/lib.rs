// airctl-api: Transport seam for push-based air purifier connections.
//
// The `Transport` / `Connection` traits describe what the resilient client
// in `airctl-core` needs from a device protocol library. `bridge` provides
// one concrete implementation: newline-delimited JSON over TCP, as spoken
// by a CoAP-to-TCP bridge sitting next to the device.

pub mod bridge;
pub mod error;
pub mod transport;

pub use bridge::{LineConnection, LineTransport};
pub use error::Error;
pub use transport::{Connection, ControlValues, DEFAULT_PORT, RawStatus, StatusStream, Transport};
