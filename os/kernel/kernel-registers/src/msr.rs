//! # Model-Specific Registers (MSR) utilities
//!
//! This module provides read access to CPU **Model-Specific Registers (MSRs)**
//! on the processor executing the caller.
//!
//! ## Background
//! MSRs are control and status registers selected by a 32-bit index placed in
//! `ECX` before executing the privileged `RDMSR` instruction. The 64-bit result
//! is returned split across `EDX:EAX`.
//!
//! Reading an index the processor does not implement (or one that is reserved
//! on this model) raises **#GP(0)**. The [`ReadMsr`] contract therefore reports
//! such a read as a [`MsrReadError`] instead of assuming the caller survives the
//! fault. Containing the #GP of a hardware `rdmsr` is the embedder's job: its
//! implementation must only return once the trap has been turned into
//! [`MsrReadError::GeneralProtection`]. [`MsrTable`] serves a fixed register
//! file and faults on unknown indices without touching the hardware.
//!
//! ## References
//! - Intel SDM Vol. 4, "Model-Specific Registers (MSRs)"
//! - AMD64 Architecture Programmer's Manual Vol. 2, Appendix A "MSR Cross-Reference"

/// Identifies a **Model-Specific Register (MSR)** by its architectural index.
///
/// MSR indices are 32-bit identifiers used by the `rdmsr` and `wrmsr`
/// instructions to select which internal CPU register to access.
/// The index space is architecture-defined; see the Intel/AMD manuals for details.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Msr(pub u32);

impl Msr {
    /// `IA32_TIME_STAMP_COUNTER`.
    pub const IA32_TSC: Self = Self(0x0000_0010);
    /// `IA32_APIC_BASE`: local APIC base address and BSP / enable flags.
    pub const IA32_APIC_BASE: Self = Self(0x0000_001B);
    /// `IA32_MPERF`: maximum-frequency clock count.
    pub const IA32_MPERF: Self = Self(0x0000_00E7);
    /// `IA32_APERF`: actual-frequency clock count.
    pub const IA32_APERF: Self = Self(0x0000_00E8);
    /// `IA32_MISC_ENABLE`.
    pub const IA32_MISC_ENABLE: Self = Self(0x0000_01A0);
    /// `IA32_PAT`: page attribute table.
    pub const IA32_PAT: Self = Self(0x0000_0277);
    /// `IA32_EFER`: extended feature enables (`SCE`, `LME`, `LMA`, `NXE`, ...).
    pub const IA32_EFER: Self = Self(0xC000_0080);
    /// `IA32_STAR`: `syscall`/`sysret` segment selectors.
    pub const IA32_STAR: Self = Self(0xC000_0081);
    /// `IA32_LSTAR`: 64-bit `syscall` target RIP.
    pub const IA32_LSTAR: Self = Self(0xC000_0082);
    /// `IA32_FMASK`: RFLAGS mask applied on `syscall`.
    pub const IA32_FMASK: Self = Self(0xC000_0084);
    /// `IA32_FS_BASE`.
    pub const IA32_FS_BASE: Self = Self(0xC000_0100);
    /// `IA32_GS_BASE`: current GS base used by `gs:` references.
    pub const IA32_GS_BASE: Self = Self(0xC000_0101);
    /// `IA32_KERNEL_GS_BASE`: value exchanged by `swapgs`.
    pub const IA32_KERNEL_GS_BASE: Self = Self(0xC000_0102);

    /// Creates a new `Msr` from a raw index.
    #[inline(always)]
    #[allow(clippy::inline_always)]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the underlying raw MSR index.
    #[inline(always)]
    #[allow(clippy::inline_always)]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for Msr {
    #[inline]
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl core::fmt::LowerHex for Msr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Error returned by [`ReadMsr::read_msr`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MsrReadError {
    /// The read raised #GP: the index is reserved or not implemented on this model.
    #[error("general protection fault reading MSR {0:#x}")]
    GeneralProtection(Msr),
    /// The processor does not implement `RDMSR`.
    #[error("MSR access is not supported on this processor")]
    Unsupported,
}

/// The register read primitive.
///
/// Implementations read the register on the processor executing the call and
/// must not have side effects when they fail.
pub trait ReadMsr {
    /// Reads `msr` on the current processor.
    ///
    /// # Errors
    /// Returns [`MsrReadError::GeneralProtection`] when the index faults and
    /// [`MsrReadError::Unsupported`] when the instruction is unavailable.
    fn read_msr(&self, msr: Msr) -> Result<u64, MsrReadError>;
}

impl<T> ReadMsr for &T
where
    T: ReadMsr + ?Sized,
{
    #[inline]
    fn read_msr(&self, msr: Msr) -> Result<u64, MsrReadError> {
        (**self).read_msr(msr)
    }
}

/// A fixed register file.
///
/// Indices not present in the table behave like unimplemented MSRs and fault.
#[derive(Debug, Clone, Copy)]
pub struct MsrTable<'a> {
    entries: &'a [(Msr, u64)],
}

impl<'a> MsrTable<'a> {
    #[must_use]
    pub const fn new(entries: &'a [(Msr, u64)]) -> Self {
        Self { entries }
    }
}

impl ReadMsr for MsrTable<'_> {
    fn read_msr(&self, msr: Msr) -> Result<u64, MsrReadError> {
        self.entries
            .iter()
            .find(|(index, _)| *index == msr)
            .map(|&(_, value)| value)
            .ok_or(MsrReadError::GeneralProtection(msr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGS: &[(Msr, u64)] = &[
        (Msr::IA32_APIC_BASE, 0xFEE0_0900),
        (Msr::IA32_EFER, 0xD01),
    ];

    #[test]
    fn table_serves_known_registers() {
        let table = MsrTable::new(REGS);
        assert_eq!(table.read_msr(Msr::IA32_APIC_BASE), Ok(0xFEE0_0900));
        assert_eq!(table.read_msr(Msr::IA32_EFER), Ok(0xD01));
    }

    #[test]
    fn table_faults_on_unknown_index() {
        let table = MsrTable::new(REGS);
        assert_eq!(
            table.read_msr(Msr::new(0x1234)),
            Err(MsrReadError::GeneralProtection(Msr(0x1234)))
        );
    }

    #[test]
    fn faulting_read_leaves_table_usable() {
        let table = MsrTable::new(REGS);
        assert!(table.read_msr(Msr::IA32_PAT).is_err());
        assert_eq!(table.read_msr(Msr::IA32_APIC_BASE), Ok(0xFEE0_0900));
        assert!(table.read_msr(Msr::IA32_PAT).is_err());
    }

    #[test]
    fn reads_through_reference() {
        let table = MsrTable::new(REGS);
        let by_ref: &dyn ReadMsr = &table;
        assert_eq!((&by_ref).read_msr(Msr::IA32_EFER), Ok(0xD01));
    }

    #[test]
    fn fault_message_names_the_index() {
        let err = MsrReadError::GeneralProtection(Msr::IA32_PAT);
        assert_eq!(
            std::format!("{err}"),
            "general protection fault reading MSR 0x277"
        );
    }
}
