#![allow(dead_code)]

use kernel_registers::msr::{Msr, MsrReadError, MsrTable, ReadMsr};
use msr_driver::ddi::{AttachCmd, DdiError, Dev, DevInfo, DeviceDriver, Major, Minor, MinorNode};
use msr_driver::{MSR_SELF_MINOR, MinorNodeRegistry, MsrDriver};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const DIP: DevInfo = DevInfo::new(0x42);
pub const SELF_DEV: Dev = Dev::new(Major(170), MSR_SELF_MINOR);

pub const REGISTERS: &[(Msr, u64)] = &[
    (Msr::IA32_TSC, 0x0000_0123_4567_89AB),
    (Msr::IA32_APIC_BASE, 0xFEE0_0900),
    (Msr::IA32_PAT, 0x0007_0406_0007_0406),
    (Msr::IA32_EFER, 0xD01),
];

pub fn dev(minor: u32) -> Dev {
    Dev::new(Major(170), Minor(minor))
}

/// Records published nodes; optionally refuses to publish.
#[derive(Debug, Default)]
pub struct Nodes {
    pub published: Vec<(DevInfo, MinorNode)>,
    pub refuse: Option<DdiError>,
    pub removals: usize,
}

impl Nodes {
    pub fn refusing(err: DdiError) -> Self {
        Self {
            refuse: Some(err),
            ..Self::default()
        }
    }
}

impl MinorNodeRegistry for Nodes {
    fn create_minor_node(&mut self, dip: DevInfo, node: &MinorNode) -> Result<(), DdiError> {
        if let Some(err) = self.refuse {
            return Err(err);
        }
        self.published.push((dip, *node));
        Ok(())
    }

    fn remove_minor_nodes(&mut self, dip: DevInfo) {
        self.published.retain(|(d, _)| *d != dip);
        self.removals += 1;
    }
}

/// Counts primitive invocations on top of a fixed table.
#[derive(Debug)]
pub struct CountingRegs {
    pub table: MsrTable<'static>,
    pub reads: AtomicUsize,
}

impl CountingRegs {
    pub fn new() -> Self {
        Self {
            table: MsrTable::new(REGISTERS),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ReadMsr for CountingRegs {
    fn read_msr(&self, msr: Msr) -> Result<u64, MsrReadError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.table.read_msr(msr)
    }
}

/// A primitive that reports the instruction as unavailable.
#[derive(Debug)]
pub struct NoRdmsr;

impl ReadMsr for NoRdmsr {
    fn read_msr(&self, _msr: Msr) -> Result<u64, MsrReadError> {
        Err(MsrReadError::Unsupported)
    }
}

pub fn attached<R: ReadMsr>(regs: R, has_msr: bool) -> (MsrDriver<R, bool>, Nodes) {
    let mut nodes = Nodes::default();
    let mut driver = MsrDriver::new(regs, has_msr);
    driver
        .attach(DIP, AttachCmd::Attach, &mut nodes)
        .expect("attach");
    (driver, nodes)
}
