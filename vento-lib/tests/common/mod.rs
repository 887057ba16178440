//! Common test utilities and shared imports

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use hex;
#[allow(unused_imports)]
pub use vento_lib::error::{DecodeError, EncodeError, VentoError};
#[allow(unused_imports)]
pub use vento_lib::message::Response;
#[allow(unused_imports)]
pub use vento_lib::packet::{FunctionCode, Request, checksum};
#[allow(unused_imports)]
pub use vento_lib::parameter::{Parameter, ParameterCatalog};
#[allow(unused_imports)]
pub use vento_lib::status::{Mode, Speed, UnitType};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

/// Decode hex string to bytes for testing
#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Bytes {
    Bytes::from(hex::decode(hex_data).expect("Failed to decode hex"))
}

/// Device id used by the fixtures
#[allow(dead_code)]
pub const DEVICE_ID: &str = "003A00345842570B";

/// Status reply of a running unit: on, heat recovery, speed 2, manual 128,
/// 1185 rpm, no filter alarm, filter due in 83 days 5 hours 15 minutes,
/// 43 % humidity.
#[allow(dead_code)]
pub const STATUS_RESPONSE: &str =
    "fdfd02103030334130303334353834323537304200060101b70102024480fe024aa1048800fe03640f0553252b7909";

/// Firmware reply: version 0.11 built 1-12-2021, unit type 5 (A30).
#[allow(dead_code)]
pub const FIRMWARE_RESPONSE: &str = "fdfd0210303033413030333435383432353730420006fe0686000b010ce507fe02b90500b007";

/// Build a RESPONSE frame with a valid checksum.
#[allow(dead_code)]
pub fn response_frame(device_id: &str, password: &str, params: &[u8]) -> Vec<u8> {
    let mut frame = vec![0xFD, 0xFD, 0x02, device_id.len() as u8];
    frame.extend_from_slice(device_id.as_bytes());
    frame.push(password.len() as u8);
    frame.extend_from_slice(password.as_bytes());
    frame.push(0x06);
    frame.extend_from_slice(params);
    let sum = checksum(&frame[2..]);
    frame.extend_from_slice(&sum.to_le_bytes());
    frame
}

/// Reply to a search: the device id in the search field.
#[allow(dead_code)]
pub fn search_reply(device_id: &str) -> Vec<u8> {
    let mut params = vec![0x7C];
    params.extend_from_slice(device_id.as_bytes());
    response_frame(device_id, "", &params)
}

/// A scripted controller on loopback.
///
/// Every datagram it receives is forwarded to `received`; each reply in the
/// script is sent back to the sender, in order.
#[allow(dead_code)]
pub struct FakeController {
    pub socket: Arc<UdpSocket>,
    pub addr: SocketAddr,
    pub received: mpsc::UnboundedReceiver<Vec<u8>>,
}

#[allow(dead_code)]
impl FakeController {
    pub async fn spawn(replies: Vec<Vec<u8>>) -> Self {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.expect("Failed to bind controller"));
        let addr = socket.local_addr().unwrap();
        let (tx, received) = mpsc::unbounded_channel();

        let task_socket = socket.clone();
        tokio::spawn(async move {
            let mut buf = [0u8; 1024];
            loop {
                let Ok((len, source)) = task_socket.recv_from(&mut buf).await else {
                    break;
                };
                if tx.send(buf[..len].to_vec()).is_err() {
                    break;
                }
                for reply in &replies {
                    let _ = task_socket.send_to(reply, source).await;
                }
            }
        });

        Self { socket, addr, received }
    }

    /// Next datagram the controller received.
    pub async fn next_request(&mut self) -> Vec<u8> {
        tokio::time::timeout(Duration::from_secs(2), self.received.recv())
            .await
            .expect("Timed out waiting for a request")
            .expect("Controller stopped")
    }
}

/// Route library logs to the test output, filtered by `RUST_LOG`.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Await a value from a channel with a test timeout.
#[allow(dead_code)]
pub async fn recv_within<T>(rx: &mut mpsc::UnboundedReceiver<T>, wait: Duration) -> Option<T> {
    tokio::time::timeout(wait, rx.recv()).await.ok().flatten()
}
