//! # Self-addressed MSR device
//!
//! One pseudo node, `cpu/self/msr`, gives the caller read access to the
//! model-specific registers of whichever processor executes the read. The
//! file offset of a read is the register index; every successful read
//! produces exactly one 8-byte register value in native byte order.
//!
//! ## Read validation
//! Each check short-circuits the remaining ones:
//!
//! 1. the driver is attached, else `ENXIO`
//! 2. the processor implements `RDMSR`, else `ENXIO`
//! 3. the requested length is a multiple of 8, else `EINVAL`
//! 4. the requested length is at least 8, else `EINVAL`
//! 5. the offset is a valid 32-bit index, else `EINVAL`
//! 6. the register read succeeds, else its own error
//! 7. the value fits the destination, else `EFAULT`
//!
//! Only one register is transferred per call, even when the requested length
//! would hold more.

use crate::ddi::{
    AttachCmd, CharDevice, DdiError, DetachCmd, Dev, DevInfo, DeviceDriver, DriverFlags, InfoCmd,
    InfoResult, Minor, MinorNode, MinorNodeRegistry, NodeKind, NodeType,
};
use crate::{Errno, Uio};
use kernel_cpuid::CpuFeatures;
use kernel_registers::msr::{Msr, ReadMsr};
use log::{debug, trace, warn};

/// Minor number reserved for "the calling processor". Per-CPU minors, were
/// they ever published, stay below it.
pub const MSR_SELF_MINOR: Minor = Minor(0x3_FFFF);

pub const MSR_DRIVER_NAME: &str = "msr";
pub const MSR_SELF_NODE_NAME: &str = "self";
pub const MSR_SELF_LINK: &str = "cpu/self/msr";

/// Width of one register value on the wire.
pub const MSR_VALUE_SIZE: usize = size_of::<u64>();

/// The single node published on attach.
pub const MSR_SELF_NODE: MinorNode = MinorNode {
    name: MSR_SELF_NODE_NAME,
    link: MSR_SELF_LINK,
    kind: NodeKind::Char,
    node_type: NodeType::Pseudo,
    minor: MSR_SELF_MINOR,
    flags: 0,
};

/// The driver instance.
///
/// Holds the device-tree handle while attached together with the register
/// read primitive `R` and the capability source `C`. Lifecycle changes need
/// `&mut self`; everything a client can trigger works through `&self`.
#[derive(Debug)]
pub struct MsrDriver<R, C> {
    devi: Option<DevInfo>,
    regs: R,
    features: C,
}

impl<R, C> MsrDriver<R, C>
where
    R: ReadMsr,
    C: CpuFeatures,
{
    /// An unattached driver.
    #[must_use]
    pub const fn new(regs: R, features: C) -> Self {
        Self {
            devi: None,
            regs,
            features,
        }
    }

    /// The device-tree handle recorded by [`attach`](DeviceDriver::attach).
    #[inline]
    #[must_use]
    pub const fn devinfo(&self) -> Option<DevInfo> {
        self.devi
    }

    /// The register read primitive this driver dispatches to.
    #[inline]
    #[must_use]
    pub const fn registers(&self) -> &R {
        &self.regs
    }

    #[inline]
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.devi.is_some()
    }

    /// Validates a read request and returns the register index it targets.
    fn check_request(&self, uio: &Uio<'_>) -> Result<Msr, Errno> {
        if self.devi.is_none() {
            return Err(Errno::Nxio);
        }

        if !self.features.has_msr() {
            return Err(Errno::Nxio);
        }

        if uio.resid() % MSR_VALUE_SIZE != 0 {
            return Err(Errno::Inval);
        }

        if uio.resid() < MSR_VALUE_SIZE {
            return Err(Errno::Inval);
        }

        // Negative offsets and anything past 0xFFFF_FFFF are not register indices.
        u32::try_from(uio.offset())
            .map(Msr::new)
            .map_err(|_| Errno::Inval)
    }
}

impl<R, C> DeviceDriver for MsrDriver<R, C>
where
    R: ReadMsr,
    C: CpuFeatures,
{
    fn getinfo(&self, cmd: InfoCmd, dev: Dev) -> Result<InfoResult, DdiError> {
        if dev.minor() != MSR_SELF_MINOR {
            return Err(DdiError::UnknownDevice(dev));
        }

        match cmd {
            InfoCmd::DevtToInstance => Ok(InfoResult::Instance(0)),
            InfoCmd::DevtToDevInfo => self
                .devi
                .map(InfoResult::DevInfo)
                .ok_or(DdiError::UnknownDevice(dev)),
        }
    }

    fn attach(
        &mut self,
        dip: DevInfo,
        cmd: AttachCmd,
        nodes: &mut dyn MinorNodeRegistry,
    ) -> Result<(), DdiError> {
        if cmd != AttachCmd::Attach {
            debug!("msr: ignoring attach command {cmd:?}");
            return Err(DdiError::UnsupportedCommand);
        }

        if self.devi.is_some() {
            return Err(DdiError::NodeExists(MSR_SELF_NODE_NAME));
        }

        if let Err(e) = nodes.create_minor_node(dip, &MSR_SELF_NODE) {
            warn!("msr: failed to publish {MSR_SELF_LINK}: {e}");
            return Err(e);
        }

        self.devi = Some(dip);
        debug!(
            "msr: attached to {dip:?}, published {MSR_SELF_LINK} (minor {:#x})",
            MSR_SELF_MINOR.0
        );
        Ok(())
    }

    fn detach(
        &mut self,
        dip: DevInfo,
        cmd: DetachCmd,
        nodes: &mut dyn MinorNodeRegistry,
    ) -> Result<(), DdiError> {
        if cmd != DetachCmd::Detach {
            return Err(DdiError::UnsupportedCommand);
        }

        nodes.remove_minor_nodes(dip);
        self.devi = None;
        debug!("msr: detached from {dip:?}");
        Ok(())
    }
}

impl<R, C> CharDevice for MsrDriver<R, C>
where
    R: ReadMsr,
    C: CpuFeatures,
{
    const FLAGS: DriverFlags = DriverFlags::NEW.with_mp(true).with_bits64(true);

    fn open(&self, dev: Dev) -> Result<(), Errno> {
        if dev.minor() == MSR_SELF_MINOR && self.devi.is_some() {
            Ok(())
        } else {
            Err(Errno::Nxio)
        }
    }

    fn read(&self, _dev: Dev, uio: &mut Uio<'_>) -> Result<(), Errno> {
        let msr = self.check_request(uio).inspect_err(|e| {
            trace!(
                "msr: rejected read at {:#x}, {} bytes: {e}",
                uio.offset(),
                uio.resid()
            );
        })?;

        let value = self.regs.read_msr(msr).map_err(|e| {
            trace!("msr: {e}");
            Errno::from(e)
        })?;

        uio.move_out(&value.to_ne_bytes())
    }
}
