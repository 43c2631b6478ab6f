//! # `cpu/self/msr` pseudo-device
//!
//! Read-only access to the model-specific registers of the calling processor.
//!
//! The driver is split along the seams of the host device framework:
//!
//! * [`ddi`] — handles, device numbers and the traits a framework drives
//!   ([`DeviceDriver`], [`CharDevice`], [`MinorNodeRegistry`]).
//! * [`MsrDriver`] — the driver instance: attach/detach, `getinfo`, `open`
//!   and `read`.
//! * [`Uio`] — the per-call read descriptor.
//! * [`modlinkage`] — module install/remove/info.
//!
//! ## Example
//! ```
//! use kernel_registers::msr::{Msr, MsrTable};
//! use msr_driver::ddi::{AttachCmd, CharDevice, DdiError, Dev, DevInfo, DeviceDriver, Major, MinorNode, MinorNodeRegistry};
//! use msr_driver::{MSR_SELF_MINOR, MsrDriver, Uio};
//!
//! struct Nodes;
//! impl MinorNodeRegistry for Nodes {
//!     fn create_minor_node(&mut self, _: DevInfo, _: &MinorNode) -> Result<(), DdiError> { Ok(()) }
//!     fn remove_minor_nodes(&mut self, _: DevInfo) {}
//! }
//!
//! let regs = [(Msr::IA32_APIC_BASE, 0xFEE0_0900)];
//! let mut driver = MsrDriver::new(MsrTable::new(&regs), true);
//! driver.attach(DevInfo::new(1), AttachCmd::Attach, &mut Nodes).unwrap();
//!
//! let dev = Dev::new(Major(0), MSR_SELF_MINOR);
//! driver.open(dev).unwrap();
//!
//! let mut buf = [0u8; 8];
//! let mut uio = Uio::new(&mut buf, 0x1B);
//! driver.read(dev, &mut uio).unwrap();
//! assert_eq!(u64::from_ne_bytes(buf), 0xFEE0_0900);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod controller;
pub mod ddi;
mod errno;
pub mod modlinkage;
mod uio;

pub use controller::{
    MSR_DRIVER_NAME, MSR_SELF_LINK, MSR_SELF_MINOR, MSR_SELF_NODE, MSR_SELF_NODE_NAME,
    MSR_VALUE_SIZE, MsrDriver,
};
pub use ddi::{CharDevice, DeviceDriver, MinorNodeRegistry};
pub use errno::Errno;
pub use uio::Uio;
