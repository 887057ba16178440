use crate::commands;
use crate::constants::*;
use crate::device::{ChangeCallback, Device, DeviceHandle, NotifyPolicy, Registry, lock_device};
use crate::discovery::{DiscoveryCallback, DiscoveryRound, search_packet};
use crate::error::VentoError;
use crate::message::Response;
use crate::models::Capabilities;
use crate::packet::Request;
use crate::parameter::ParameterCatalog;
use crate::status::{Mode, Speed, TimerMode};
use chrono::NaiveDateTime;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Responses kept for validate calls that are slow to poll.
const RESPONSE_CHANNEL_CAPACITY: usize = 64;

/// Settings for a [`VentoClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Local address of the UDP socket
    pub bind_addr: SocketAddr,
    /// Port the controllers listen on
    pub device_port: u16,
    /// Destination of search broadcasts
    pub broadcast_addr: Ipv4Addr,
    pub validate_timeout: Duration,
    pub notify: NotifyPolicy,
    pub max_packet_size: usize,
    pub catalog: ParameterCatalog,
    /// When set, writes to parameters a model lacks are refused
    pub capabilities: Option<Arc<dyn Capabilities>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            device_port: DEVICE_PORT,
            broadcast_addr: Ipv4Addr::BROADCAST,
            validate_timeout: DEFAULT_VALIDATE_TIMEOUT,
            notify: NotifyPolicy::default(),
            max_packet_size: MAX_PACKET_SIZE,
            catalog: ParameterCatalog::default(),
            capabilities: None,
        }
    }
}

impl ClientConfig {
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_device_port(mut self, port: u16) -> Self {
        self.device_port = port;
        self
    }

    pub fn with_broadcast_addr(mut self, addr: Ipv4Addr) -> Self {
        self.broadcast_addr = addr;
        self
    }

    pub fn with_validate_timeout(mut self, timeout: Duration) -> Self {
        self.validate_timeout = timeout;
        self
    }

    pub fn with_notify(mut self, policy: NotifyPolicy) -> Self {
        self.notify = policy;
        self
    }

    pub fn with_max_packet_size(mut self, size: usize) -> Self {
        self.max_packet_size = size;
        self
    }

    pub fn with_catalog(mut self, catalog: ParameterCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Arc<dyn Capabilities>) -> Self {
        self.capabilities = Some(capabilities);
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("bind_addr", &self.bind_addr)
            .field("device_port", &self.device_port)
            .field("broadcast_addr", &self.broadcast_addr)
            .field("validate_timeout", &self.validate_timeout)
            .field("notify", &self.notify)
            .field("max_packet_size", &self.max_packet_size)
            .field("catalog_len", &self.catalog.len())
            .field("capabilities", &self.capabilities.is_some())
            .finish()
    }
}

/// State shared between the client handle and its receive task.
struct Shared {
    config: ClientConfig,
    registry: Registry,
    discovery: Mutex<Option<DiscoveryRound>>,
    responses: broadcast::Sender<(Response, SocketAddr)>,
}

impl Shared {
    fn discovery(&self) -> MutexGuard<'_, Option<DiscoveryRound>> {
        self.discovery.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn handle_datagram(&self, data: &[u8], source: SocketAddr) {
        trace!(bytes = hex::encode(data), %source, "UDP read");

        let response = match Response::decode(data, &self.config.catalog) {
            Ok(response) => response,
            Err(e) if e.is_benign() => {
                trace!(%source, error = %e, "Ignoring datagram");
                return;
            }
            Err(e) => {
                debug!(%source, error = %e, "Dropping datagram");
                return;
            }
        };

        if !response.unsupported.is_empty() {
            debug!(device_id = %response.device_id, unsupported = ?response.unsupported, "Controller rejected parameters");
        }

        if let Some(search_id) = &response.status.search_id {
            let found = self.discovery().as_mut().and_then(|round| round.observe(search_id, source));
            if let Some(callback) = found {
                callback(search_id, source);
            }
        }

        if self.responses.receiver_count() > 0 {
            let _ = self.responses.send((response.clone(), source));
        }

        if !self.registry.dispatch(&response, source, self.config.notify) {
            trace!(device_id = %response.device_id, %source, "Response for unregistered device");
        }
    }
}

/// UDP session with any number of Vento controllers.
///
/// Owns the socket and a background task that is its only reader. Commands
/// are single datagrams; nothing is retried.
pub struct VentoClient {
    shared: Arc<Shared>,
    /// Taken on close; the receive task holds the only other reference.
    socket: Mutex<Option<Arc<UdpSocket>>>,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl VentoClient {
    /// Bind the socket and start the receive task.
    pub async fn new(config: ClientConfig) -> Result<Self, VentoError> {
        let socket = UdpSocket::bind(config.bind_addr).await?;
        socket.set_broadcast(true)?;
        info!(local = %socket.local_addr()?, "UDP socket bound");
        let socket = Arc::new(socket);

        let (responses, _) = broadcast::channel(RESPONSE_CHANNEL_CAPACITY);
        let shared = Arc::new(Shared {
            config,
            registry: Registry::new(),
            discovery: Mutex::new(None),
            responses,
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(receive_loop(shared.clone(), socket.clone(), shutdown_rx));

        Ok(Self {
            shared,
            socket: Mutex::new(Some(socket)),
            shutdown_tx,
            task: Mutex::new(Some(task)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, VentoError> {
        Ok(self.socket()?.local_addr()?)
    }

    fn socket(&self) -> Result<Arc<UdpSocket>, VentoError> {
        self.socket
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(VentoError::Closed)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    pub fn registry(&self) -> &Registry {
        &self.shared.registry
    }

    pub fn device(&self, device_id: &str) -> Option<DeviceHandle> {
        self.shared.registry.get(device_id)
    }

    pub fn is_closed(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    fn ensure_open(&self) -> Result<(), VentoError> {
        if self.is_closed() { Err(VentoError::Closed) } else { Ok(()) }
    }

    async fn send_packet(&self, packet: &[u8], target: SocketAddr) -> Result<(), VentoError> {
        self.ensure_open()?;
        let socket = self.socket()?;
        debug!(bytes = hex::encode(packet), %target, "UDP write");
        socket.send_to(packet, target).await?;
        Ok(())
    }

    /// Start a search round. Replies arriving after this call are reported
    /// through `callback`, once per device id; a later call starts a fresh
    /// round. The callback runs on the receive task and must not call back
    /// into `discover`.
    pub async fn discover<F>(&self, callback: F) -> Result<(), VentoError>
    where
        F: Fn(&str, SocketAddr) + Send + Sync + 'static,
    {
        self.ensure_open()?;
        let callback: DiscoveryCallback = Arc::new(callback);
        *self.shared.discovery() = Some(DiscoveryRound::new(callback));

        let packet = search_packet(&self.shared.config.catalog)?;
        let target = SocketAddr::new(IpAddr::V4(self.shared.config.broadcast_addr), self.shared.config.device_port);
        info!(%target, "Searching for devices");
        self.send_packet(&packet, target).await
    }

    /// Devices found by the current search round.
    pub fn discovered(&self) -> Vec<(String, SocketAddr)> {
        self.shared.discovery().as_ref().map(DiscoveryRound::found).unwrap_or_default()
    }

    /// End the current search round and return what it found.
    pub fn finish_discovery(&self) -> Vec<(String, SocketAddr)> {
        self.shared.discovery().take().map(|round| round.found()).unwrap_or_default()
    }

    /// Confirm that a controller with `device_id` answers at `ip`.
    ///
    /// Sends a status read and waits up to the configured timeout for a
    /// response carrying the id. `ip` may be a broadcast address; the
    /// returned device uses the address the reply came from.
    pub async fn validate(&self, device_id: &str, password: &str, ip: IpAddr) -> Result<Device, VentoError> {
        self.ensure_open()?;
        let target = SocketAddr::new(ip, self.shared.config.device_port);
        let mut responses = self.shared.responses.subscribe();
        let mut shutdown = self.shutdown_tx.subscribe();

        let packet = commands::status().encode_with_limit(
            device_id,
            password,
            &self.shared.config.catalog,
            self.shared.config.max_packet_size,
        )?;
        self.send_packet(&packet, target).await?;

        let deadline = tokio::time::sleep(self.shared.config.validate_timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    info!(device_id, %target, "Device did not answer");
                    return Err(VentoError::ValidationTimeout {
                        device_id: device_id.to_string(),
                        address: target,
                    });
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return Err(VentoError::Closed);
                    }
                }
                received = responses.recv() => match received {
                    Ok((response, source)) if response.matches_device(device_id) => {
                        info!(device_id, %source, "Device validated");
                        let mut device = Device::new(device_id, password, source);
                        device.apply(&response);
                        return Ok(device);
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Validation lagged behind incoming responses");
                    }
                    Err(broadcast::error::RecvError::Closed) => return Err(VentoError::Closed),
                },
            }
        }
    }

    /// Track a device and request its status and firmware so the cache fills.
    ///
    /// Registering an id again updates the existing record and replaces the
    /// callback.
    pub async fn register(&self, device: Device, on_change: Option<ChangeCallback>) -> Result<DeviceHandle, VentoError> {
        self.ensure_open()?;
        let device_id = device.device_id.clone();
        let handle = self.shared.registry.insert(device, on_change);
        self.request_status(&device_id).await?;
        self.request_firmware(&device_id).await?;
        Ok(handle)
    }

    pub fn unregister(&self, device_id: &str) -> Option<DeviceHandle> {
        self.shared.registry.remove(device_id)
    }

    /// Encode `request` for a registered device and send it.
    pub async fn send_request(&self, device_id: &str, request: &Request) -> Result<(), VentoError> {
        let handle = self
            .shared
            .registry
            .get(device_id)
            .ok_or_else(|| VentoError::UnknownDevice(device_id.to_string()))?;
        let device = lock_device(&handle).clone();

        self.check_supported(&device, request)?;

        let packet = request.encode_with_limit(
            &device.device_id,
            &device.password,
            &self.shared.config.catalog,
            self.shared.config.max_packet_size,
        )?;
        self.send_packet(&packet, device.address).await
    }

    fn check_supported(&self, device: &Device, request: &Request) -> Result<(), VentoError> {
        let (Some(capabilities), Some(unit_type)) = (&self.shared.config.capabilities, device.state.unit_type) else {
            return Ok(());
        };
        for parameter in request.written_parameters() {
            if capabilities.supports(unit_type, parameter) == Some(false) {
                return Err(VentoError::Unsupported {
                    parameter,
                    unit_type: unit_type.into(),
                });
            }
        }
        Ok(())
    }

    pub async fn turn_on(&self, device_id: &str) -> Result<(), VentoError> {
        self.send_request(device_id, &commands::power(true)).await
    }

    pub async fn turn_off(&self, device_id: &str) -> Result<(), VentoError> {
        self.send_request(device_id, &commands::power(false)).await
    }

    pub async fn set_speed(&self, device_id: &str, speed: Speed) -> Result<(), VentoError> {
        self.send_request(device_id, &commands::speed(speed)).await
    }

    pub async fn set_manual_speed(&self, device_id: &str, value: u8) -> Result<(), VentoError> {
        self.send_request(device_id, &commands::manual_speed(value)).await
    }

    pub async fn set_mode(&self, device_id: &str, mode: Mode) -> Result<(), VentoError> {
        self.send_request(device_id, &commands::mode(mode)).await
    }

    pub async fn set_timer_mode(&self, device_id: &str, mode: TimerMode) -> Result<(), VentoError> {
        self.send_request(device_id, &commands::timer_mode(mode)).await
    }

    pub async fn set_humidity_threshold(&self, device_id: &str, percent: u8) -> Result<(), VentoError> {
        self.send_request(device_id, &commands::humidity_threshold(percent)).await
    }

    pub async fn set_clock(&self, device_id: &str, time: NaiveDateTime) -> Result<(), VentoError> {
        self.send_request(device_id, &commands::set_clock(time)).await
    }

    pub async fn reset_filter_alarm(&self, device_id: &str) -> Result<(), VentoError> {
        self.send_request(device_id, &commands::reset_filter_alarm()).await
    }

    pub async fn reset_alarms(&self, device_id: &str) -> Result<(), VentoError> {
        self.send_request(device_id, &commands::reset_alarms()).await
    }

    pub async fn request_status(&self, device_id: &str) -> Result<(), VentoError> {
        self.send_request(device_id, &commands::status()).await
    }

    pub async fn request_firmware(&self, device_id: &str) -> Result<(), VentoError> {
        self.send_request(device_id, &commands::firmware()).await
    }

    /// Stop the receive task and release the socket. Pending validations
    /// fail with [`VentoError::Closed`], and so does every later call.
    pub async fn close(&self) {
        if self.shutdown_tx.send_replace(true) {
            return;
        }
        self.socket.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take();
        let task = self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "Receive task ended abnormally");
            }
        }
        info!("Client closed");
    }
}

impl Drop for VentoClient {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}

async fn receive_loop(shared: Arc<Shared>, socket: Arc<UdpSocket>, mut shutdown: watch::Receiver<bool>) {
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];
    loop {
        tokio::select! {
            result = socket.recv_from(&mut buf) => match result {
                Ok((len, source)) => shared.handle_datagram(&buf[..len], source),
                Err(e) => warn!(error = %e, "UDP receive failed"),
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!("Receive task shutting down");
                    break;
                }
            }
        }
    }
}
