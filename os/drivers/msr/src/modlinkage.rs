//! Loadable-module entry points.
//!
//! These only hand the driver's linkage record to the host framework.

use crate::Errno;
use crate::controller::MSR_DRIVER_NAME;

pub const MODREV_1: u32 = 1;

/// The record a module presents to the framework when it is loaded.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ModLinkage {
    pub revision: u32,
    pub driver_name: &'static str,
    pub description: &'static str,
}

pub const MSR_MODLINKAGE: ModLinkage = ModLinkage {
    revision: MODREV_1,
    driver_name: MSR_DRIVER_NAME,
    description: "msr driver",
};

/// What the framework reports back about an installed module.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ModStatus {
    pub id: u32,
    pub linkage: ModLinkage,
}

/// Host-side module registration.
pub trait ModuleFramework {
    /// # Errors
    /// The framework's reason for refusing the module.
    fn mod_install(&mut self, linkage: &ModLinkage) -> Result<(), Errno>;

    /// # Errors
    /// The framework's reason for keeping the module loaded.
    fn mod_remove(&mut self, linkage: &ModLinkage) -> Result<(), Errno>;

    /// # Errors
    /// The module is not known to the framework.
    fn mod_info(&self, linkage: &ModLinkage) -> Result<ModStatus, Errno>;
}

/// Registers the driver with `fw`.
///
/// # Errors
/// Propagated from [`ModuleFramework::mod_install`].
pub fn install(fw: &mut dyn ModuleFramework) -> Result<(), Errno> {
    fw.mod_install(&MSR_MODLINKAGE)
}

/// Unregisters the driver from `fw`.
///
/// # Errors
/// Propagated from [`ModuleFramework::mod_remove`].
pub fn remove(fw: &mut dyn ModuleFramework) -> Result<(), Errno> {
    fw.mod_remove(&MSR_MODLINKAGE)
}

/// Reports the driver metadata known to `fw`.
///
/// # Errors
/// Propagated from [`ModuleFramework::mod_info`].
pub fn info(fw: &dyn ModuleFramework) -> Result<ModStatus, Errno> {
    fw.mod_info(&MSR_MODLINKAGE)
}
