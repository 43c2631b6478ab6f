//! # CPU capability queries
//!
//! Decodes the CPUID leaves needed to decide whether the processor implements
//! `RDMSR`/`WRMSR`, and exposes that decision through [`CpuFeatures`].

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod leaf01h;
mod ranges;

pub use leaf01h::{LEAF_01H, Leaf01h, Leaf1Edx};
pub use ranges::{CpuVendor, CpuidRanges};

/// Execute CPUID with the given leaf and subleaf.
///
/// # Safety
/// The CPUID instruction must be available.
///
/// # See also
/// [`CpuidRanges`] provides typed access to the `cpuid(0, 0)` result.
#[cfg(all(feature = "asm", target_arch = "x86_64"))]
#[inline(always)]
#[allow(unused_assignments, clippy::inline_always)]
pub unsafe fn cpuid(leaf: u32, subleaf: u32) -> CpuidResult {
    let (mut eax, mut ebx, mut ecx, mut edx) = (leaf, 0u32, subleaf, 0u32);
    unsafe {
        core::arch::asm!(
            "push rbx",
            "cpuid",
            "mov {ebx_out:e}, ebx", // rbx is reserved by LLVM
            "pop rbx",
            ebx_out = lateout(reg) ebx,
            inlateout("eax") eax,
            inlateout("ecx") ecx,
            lateout("edx") edx,
            options(nomem, preserves_flags),
        );
    }
    CpuidResult { eax, ebx, ecx, edx }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct CpuidResult {
    pub eax: u32,
    pub ebx: u32,
    pub ecx: u32,
    pub edx: u32,
}

/// Capability flag consulted before any model-specific register is touched.
pub trait CpuFeatures {
    /// Whether the processor implements the `RDMSR`/`WRMSR` instruction class.
    fn has_msr(&self) -> bool;
}

impl CpuFeatures for bool {
    #[inline]
    fn has_msr(&self) -> bool {
        *self
    }
}

impl<T: CpuFeatures> CpuFeatures for Option<T> {
    #[inline]
    fn has_msr(&self) -> bool {
        self.as_ref().is_some_and(CpuFeatures::has_msr)
    }
}

impl<T: CpuFeatures + ?Sized> CpuFeatures for &T {
    #[inline]
    fn has_msr(&self) -> bool {
        (**self).has_msr()
    }
}

impl CpuFeatures for Leaf01h {
    #[inline]
    fn has_msr(&self) -> bool {
        self.edx.msr()
    }
}

/// Feature snapshot of the processor that ran [`HostCpu::detect`].
#[derive(Debug, Copy, Clone)]
pub struct HostCpu {
    pub ranges: CpuidRanges,
    pub leaf01h: Option<Leaf01h>,
}

impl HostCpu {
    /// Reads the CPUID ranges and, when present, leaf `0x01`.
    ///
    /// # Safety
    /// The CPUID instruction must be available.
    #[cfg(all(feature = "asm", target_arch = "x86_64"))]
    #[must_use]
    pub unsafe fn detect() -> Self {
        unsafe {
            let ranges = CpuidRanges::read();
            let leaf01h = Leaf01h::read(&ranges);
            Self { ranges, leaf01h }
        }
    }
}

impl CpuFeatures for HostCpu {
    #[inline]
    fn has_msr(&self) -> bool {
        self.leaf01h.has_msr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MSR_BIT: u32 = 1 << 5;

    #[test]
    fn leaf01h_reports_msr_bit() {
        let with = Leaf01h::from(CpuidResult {
            edx: MSR_BIT,
            ..CpuidResult::default()
        });
        let without = Leaf01h::from(CpuidResult {
            edx: !MSR_BIT,
            ..CpuidResult::default()
        });
        assert!(with.has_msr());
        assert!(!without.has_msr());
    }

    #[test]
    fn missing_leaf_means_no_capability() {
        let absent: Option<Leaf01h> = None;
        assert!(!absent.has_msr());
        assert!(Some(true).has_msr());
    }

    #[test]
    fn host_snapshot_without_leaf01h() {
        let cpu = HostCpu {
            ranges: CpuidRanges {
                max_basic: 0,
                vendor: CpuVendor::Other,
            },
            leaf01h: None,
        };
        assert!(!cpu.has_msr());
    }
}
