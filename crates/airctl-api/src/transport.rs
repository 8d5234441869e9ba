// Transport seam between the resilient client and a device protocol.
//
// Implementations own the wire encoding. The client only needs to open a
// connection, read the status push stream, write control values, and
// close the connection again.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_core::Stream;

use crate::error::Error;

/// Default CoAP port the purifier listens on.
pub const DEFAULT_PORT: u16 = 5683;

/// A status push exactly as the device sent it (key → value).
pub type RawStatus = serde_json::Map<String, serde_json::Value>;

/// Control parameters handed to [`Connection::set_control_values`].
///
/// Keys and values are meaningful only to the device, e.g. `{"pwr": "1"}`.
pub type ControlValues = serde_json::Map<String, serde_json::Value>;

/// Push stream returned by [`Connection::observe_status`].
///
/// Never ends while the connection is healthy. An `Err` item or the end
/// of the stream means the connection is gone.
pub type StatusStream = Pin<Box<dyn Stream<Item = Result<RawStatus, Error>> + Send>>;

/// Factory for device connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;

    /// Open a connection to `host:port`, giving up after `timeout`.
    fn connect(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = Result<Self::Connection, Error>> + Send;
}

/// One open connection to a device.
///
/// Reading (via the status stream) and writing (via control values) may
/// happen concurrently from different tasks.
pub trait Connection: Send + Sync + 'static {
    /// Start observing status pushes. May only be taken once per
    /// connection; later calls yield a stream with a single
    /// [`Error::StreamTaken`].
    fn observe_status(&self) -> StatusStream;

    /// Send control values and report whether the device accepted them.
    fn set_control_values(
        &self,
        values: ControlValues,
    ) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Close the connection. Safe to call more than once.
    fn shutdown(&self) -> impl Future<Output = ()> + Send;
}
