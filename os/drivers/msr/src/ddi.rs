//! # Device framework interface
//!
//! Types and traits at the seam between a driver and the host device
//! framework. The framework owns module loading, the device tree and the
//! namespace in which minor nodes appear; a driver only sees:
//!
//! - a [`DevInfo`] handle for the device-tree node it was attached to,
//! - a [`MinorNodeRegistry`] through which it publishes its access points,
//! - [`Dev`] numbers naming the node an operation targets.
//!
//! Drivers implement [`DeviceDriver`] for lifecycle operations and
//! [`CharDevice`] for the character-device entry points.

use crate::{Errno, Uio};
use bitfield_struct::bitfield;

/// Opaque device-tree handle handed to a driver on attach.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DevInfo(u64);

impl DevInfo {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Major(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Minor(pub u32);

/// A device number: driver major plus node minor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dev {
    pub major: Major,
    pub minor: Minor,
}

impl Dev {
    #[must_use]
    pub const fn new(major: Major, minor: Minor) -> Self {
        Self { major, minor }
    }

    #[inline]
    #[must_use]
    pub const fn minor(self) -> Minor {
        self.minor
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Char,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeType {
    /// Not backed by hardware enumeration.
    Pseudo,
}

/// Description of an access point a driver asks the framework to publish.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MinorNode {
    /// Name relative to the device-tree node.
    pub name: &'static str,
    /// Path under the device namespace where the node is linked.
    pub link: &'static str,
    pub kind: NodeKind,
    pub node_type: NodeType,
    pub minor: Minor,
    pub flags: u32,
}

/// Host-owned registration of minor nodes.
pub trait MinorNodeRegistry {
    /// Publishes `node` under `dip`.
    ///
    /// # Errors
    /// Whatever prevented publication; the registry must not keep a partial node.
    fn create_minor_node(&mut self, dip: DevInfo, node: &MinorNode) -> Result<(), DdiError>;

    /// Removes every node published under `dip`.
    fn remove_minor_nodes(&mut self, dip: DevInfo);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AttachCmd {
    Attach,
    Resume,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DetachCmd {
    Detach,
    Suspend,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InfoCmd {
    /// Map a device number to its device-tree handle.
    DevtToDevInfo,
    /// Map a device number to its instance number.
    DevtToInstance,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InfoResult {
    DevInfo(DevInfo),
    Instance(u32),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DdiError {
    #[error("unsupported command")]
    UnsupportedCommand,
    #[error("unknown device {0:?}")]
    UnknownDevice(Dev),
    #[error("minor node {0:?} already exists")]
    NodeExists(&'static str),
    #[error("out of resources")]
    NoResources,
}

/// Capability flags a character driver advertises to the framework.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct DriverFlags {
    #[bits(5)]
    _rsv0_4: u8,
    /// Entry points are multi-thread safe.
    pub mp: bool,
    #[bits(3)]
    _rsv6_8: u8,
    /// Offsets are 64 bits wide.
    pub bits64: bool,
    #[bits(22)]
    _rsv10_31: u32,
}

impl DriverFlags {
    /// `D_NEW` carries no bits; it only marks the current entry-point ABI.
    pub const NEW: Self = Self::new();
}

/// Lifecycle operations invoked by the framework.
pub trait DeviceDriver {
    /// Resolves a device number to the handle or instance it belongs to.
    ///
    /// # Errors
    /// [`DdiError::UnknownDevice`] for any device this driver does not serve.
    fn getinfo(&self, cmd: InfoCmd, dev: Dev) -> Result<InfoResult, DdiError>;

    /// # Errors
    /// Unsupported commands and node publication failures.
    fn attach(
        &mut self,
        dip: DevInfo,
        cmd: AttachCmd,
        nodes: &mut dyn MinorNodeRegistry,
    ) -> Result<(), DdiError>;

    /// # Errors
    /// Unsupported commands.
    fn detach(
        &mut self,
        dip: DevInfo,
        cmd: DetachCmd,
        nodes: &mut dyn MinorNodeRegistry,
    ) -> Result<(), DdiError>;
}

/// Character-device entry points. Entry points a driver leaves out behave
/// like an absent device.
pub trait CharDevice {
    const FLAGS: DriverFlags;

    /// # Errors
    /// [`Errno::Nxio`] if `dev` cannot be opened.
    fn open(&self, dev: Dev) -> Result<(), Errno>;

    /// # Errors
    /// Never fails by default.
    fn close(&self, _dev: Dev) -> Result<(), Errno> {
        Ok(())
    }

    /// # Errors
    /// Driver specific.
    fn read(&self, _dev: Dev, _uio: &mut Uio<'_>) -> Result<(), Errno> {
        Err(Errno::Nxio)
    }

    /// # Errors
    /// Driver specific.
    fn write(&self, _dev: Dev, _uio: &mut Uio<'_>) -> Result<(), Errno> {
        Err(Errno::Nxio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_flag_bits() {
        let flags = DriverFlags::NEW.with_mp(true).with_bits64(true);
        assert_eq!(flags.into_bits(), 0x20 | 0x200);
        assert_eq!(DriverFlags::NEW.into_bits(), 0);
    }
}
