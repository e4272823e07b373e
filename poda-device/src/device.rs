//! Device dispatch.
//!
//! The enclosing runtime selects devices by tag-name and drives them through
//! the host contract: `init` at process load, `execute` at each pass, `push`
//! after results. [`PodaDevice`] is this crate's implementation;
//! [`DeviceTable`] is the registry the runtime resolves names against.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use poda_core::{Item, Result, Tag};

use crate::gate;
use crate::options::DeviceOptions;
use crate::poller::PollerConfig;
use crate::push;
use crate::state::{ExecState, Verdict};

/// A pluggable behavior invoked by the runtime at execution passes.
#[async_trait]
pub trait Device: Send + Sync {
    /// The tag-name the runtime selects this device by.
    fn name(&self) -> &str;

    /// Act on an execution pass.
    async fn execute(&self, outer: &Item, state: ExecState) -> Result<(Verdict, ExecState)>;

    /// Post-process results before they leave the node.
    async fn push(&self, item: &Item, state: ExecState) -> Result<ExecState>;
}

/// The PoDA consensus device, configured for one process.
#[derive(Debug, Clone)]
pub struct PodaDevice {
    options: DeviceOptions,
    poller: PollerConfig,
}

impl PodaDevice {
    /// The tag-name this device registers under.
    pub const NAME: &'static str = "PODA";

    /// Initialize the device from a process's tag sequence.
    ///
    /// Fails with `InvalidOptions` if the tags do not declare a usable
    /// authority set and quorum; this failure propagates to the host, it
    /// never produces an error outbox item.
    pub fn init(state: ExecState, tags: &[Tag]) -> Result<(ExecState, Self)> {
        let options = DeviceOptions::from_tags(tags, &state.wallet)?;
        Ok((
            state,
            Self {
                options,
                poller: PollerConfig::default(),
            },
        ))
    }

    /// Override the peer poller configuration.
    pub fn with_poller(mut self, poller: PollerConfig) -> Self {
        self.poller = poller;
        self
    }

    /// The parsed device options.
    pub fn options(&self) -> &DeviceOptions {
        &self.options
    }
}

#[async_trait]
impl Device for PodaDevice {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, outer: &Item, state: ExecState) -> Result<(Verdict, ExecState)> {
        Ok(gate::execute(outer, state, &self.options))
    }

    async fn push(&self, item: &Item, state: ExecState) -> Result<ExecState> {
        Ok(push::push(item, state, &self.poller).await)
    }
}

/// Registry of devices, keyed by tag-name.
#[derive(Default)]
pub struct DeviceTable {
    devices: HashMap<String, Arc<dyn Device>>,
}

impl DeviceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device under its name. A later registration under the
    /// same name replaces the earlier one.
    pub fn register(&mut self, device: Arc<dyn Device>) {
        self.devices.insert(device.name().to_string(), device);
    }

    /// Resolve a device by tag-name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Device>> {
        self.devices.get(name).cloned()
    }

    /// Number of registered devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
