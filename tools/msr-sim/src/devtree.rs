//! In-memory stand-in for the host device framework.

use log::{debug, info};
use msr_driver::Errno;
use msr_driver::ddi::{DdiError, Dev, DevInfo, Major, MinorNode, MinorNodeRegistry};
use msr_driver::modlinkage::{ModLinkage, ModStatus, ModuleFramework};
use std::collections::BTreeMap;

const FIRST_MAJOR: u32 = 170;

struct Module {
    id: u32,
    major: Major,
    linkage: ModLinkage,
}

/// Installed modules, device-tree handles and the `/dev` namespace.
#[derive(Default)]
pub struct DevTree {
    modules: Vec<Module>,
    next_module_id: u32,
    /// Device-tree handle id → major of the driver bound to it.
    devinfos: BTreeMap<u64, Major>,
    /// Link path → published node.
    nodes: BTreeMap<&'static str, (DevInfo, MinorNode)>,
}

impl DevTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a device-tree node bound to the installed driver `driver_name`.
    pub fn alloc_devinfo(&mut self, driver_name: &str) -> Option<DevInfo> {
        let major = self
            .modules
            .iter()
            .find(|m| m.linkage.driver_name == driver_name)?
            .major;
        let id = self.devinfos.keys().next_back().map_or(1, |last| last + 1);
        self.devinfos.insert(id, major);
        Some(DevInfo::new(id))
    }

    /// Resolves a path under `/dev` to the device number behind it.
    #[must_use]
    pub fn lookup(&self, link: &str) -> Option<Dev> {
        let (dip, node) = self.nodes.get(link)?;
        let major = self.devinfos.get(&dip.id())?;
        Some(Dev::new(*major, node.minor))
    }
}

impl MinorNodeRegistry for DevTree {
    fn create_minor_node(&mut self, dip: DevInfo, node: &MinorNode) -> Result<(), DdiError> {
        if !self.devinfos.contains_key(&dip.id()) {
            return Err(DdiError::NoResources);
        }
        if self.nodes.contains_key(node.link) {
            return Err(DdiError::NodeExists(node.name));
        }
        self.nodes.insert(node.link, (dip, *node));
        debug!("devtree: /dev/{} -> {:?} minor {:#x}", node.link, dip, node.minor.0);
        Ok(())
    }

    fn remove_minor_nodes(&mut self, dip: DevInfo) {
        self.nodes.retain(|_, (owner, _)| *owner != dip);
    }
}

impl ModuleFramework for DevTree {
    fn mod_install(&mut self, linkage: &ModLinkage) -> Result<(), Errno> {
        if self
            .modules
            .iter()
            .any(|m| m.linkage.driver_name == linkage.driver_name)
        {
            return Err(Errno::Io);
        }

        self.next_module_id += 1;
        let major = Major(FIRST_MAJOR + self.next_module_id - 1);
        self.modules.push(Module {
            id: self.next_module_id,
            major,
            linkage: *linkage,
        });
        info!(
            "devtree: installed {} ({}) as major {}",
            linkage.driver_name, linkage.description, major.0
        );
        Ok(())
    }

    fn mod_remove(&mut self, linkage: &ModLinkage) -> Result<(), Errno> {
        let idx = self
            .modules
            .iter()
            .position(|m| m.linkage.driver_name == linkage.driver_name)
            .ok_or(Errno::Inval)?;
        let major = self.modules[idx].major;

        // A module stays loaded while any of its nodes is still published.
        let busy = self
            .nodes
            .values()
            .any(|(dip, _)| self.devinfos.get(&dip.id()) == Some(&major));
        if busy {
            return Err(Errno::Io);
        }

        self.modules.remove(idx);
        self.devinfos.retain(|_, m| *m != major);
        info!("devtree: removed {}", linkage.driver_name);
        Ok(())
    }

    fn mod_info(&self, linkage: &ModLinkage) -> Result<ModStatus, Errno> {
        self.modules
            .iter()
            .find(|m| m.linkage.driver_name == linkage.driver_name)
            .map(|m| ModStatus {
                id: m.id,
                linkage: m.linkage,
            })
            .ok_or(Errno::Inval)
    }
}
