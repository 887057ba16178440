use crate::message::Response;
use crate::status::Status;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Shared handle to one registered device record.
pub type DeviceHandle = Arc<Mutex<Device>>;

/// Per-device change notification, fired on the receive task.
pub type ChangeCallback = Arc<dyn Fn(&Device) + Send + Sync>;

/// When the change callback of a device fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifyPolicy {
    /// After every accepted response for the device
    #[default]
    Always,
    /// Only when a decoded attribute differs from the cached value
    OnChange,
}

/// A known controller: identity plus last-known state.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub device_id: String,
    pub password: String,
    pub address: SocketAddr,
    pub state: Status,
}

impl Device {
    pub fn new(device_id: impl Into<String>, password: impl Into<String>, address: SocketAddr) -> Self {
        Self {
            device_id: device_id.into(),
            password: password.into(),
            address,
            state: Status::default(),
        }
    }

    pub fn ip(&self) -> IpAddr {
        self.address.ip()
    }

    /// Fold a decoded response into the cached state. Returns whether any
    /// attribute changed.
    pub fn apply(&mut self, response: &Response) -> bool {
        self.state.merge(&response.status)
    }
}

struct Entry {
    device: DeviceHandle,
    on_change: Option<ChangeCallback>,
}

/// Devices keyed by id, at most one record each.
#[derive(Default)]
pub struct Registry {
    entries: Mutex<HashMap<String, Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // Poisoning is ignored, entries stay consistent across a panic.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a device, or refresh identity and callback of the record that
    /// already exists for its id. Cached state is kept on refresh.
    pub fn insert(&self, device: Device, on_change: Option<ChangeCallback>) -> DeviceHandle {
        let mut entries = self.lock();
        if let Some(entry) = entries.get_mut(&device.device_id) {
            {
                let mut existing = lock_device(&entry.device);
                existing.password = device.password;
                existing.address = device.address;
            }
            entry.on_change = on_change;
            debug!(device_id = %device.device_id, "Updated registered device");
            return entry.device.clone();
        }

        info!(device_id = %device.device_id, address = %device.address, "Registered device");
        let id = device.device_id.clone();
        let handle = Arc::new(Mutex::new(device));
        entries.insert(
            id,
            Entry {
                device: handle.clone(),
                on_change,
            },
        );
        handle
    }

    pub fn remove(&self, device_id: &str) -> Option<DeviceHandle> {
        let removed = self.lock().remove(device_id).map(|entry| entry.device);
        if removed.is_some() {
            info!(device_id, "Unregistered device");
        }
        removed
    }

    pub fn get(&self, device_id: &str) -> Option<DeviceHandle> {
        self.lock().get(device_id).map(|entry| entry.device.clone())
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.lock().contains_key(device_id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Apply a response that arrived from `source` to the matching record.
    ///
    /// The record must exist under the response's device id and its stored
    /// IP must equal the source IP. Returns `true` when the response was
    /// applied. The callback runs after every lock is released.
    pub fn dispatch(&self, response: &Response, source: SocketAddr, policy: NotifyPolicy) -> bool {
        let (handle, on_change) = {
            let entries = self.lock();
            let Some(entry) = entries.get(&response.device_id) else {
                return false;
            };
            (entry.device.clone(), entry.on_change.clone())
        };

        let (changed, snapshot) = {
            let mut device = lock_device(&handle);
            if device.ip() != source.ip() {
                debug!(
                    device_id = %response.device_id,
                    expected = %device.ip(),
                    source = %source.ip(),
                    "Response from unexpected address"
                );
                return false;
            }
            let changed = device.apply(response);
            (changed, device.clone())
        };

        let notify = match policy {
            NotifyPolicy::Always => true,
            NotifyPolicy::OnChange => changed,
        };
        if let (true, Some(callback)) = (notify, on_change) {
            callback(&snapshot);
        }
        true
    }
}

/// Lock a device record, recovering from a poisoned lock.
pub fn lock_device(handle: &DeviceHandle) -> MutexGuard<'_, Device> {
    handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
