use crate::{CpuidRanges, CpuidResult};
use bitfield_struct::bitfield;

pub const LEAF_01H: u32 = 0x01;

/// CPUID.01H — Feature Information (a.k.a. "leaf 1").
///
/// Only the legacy feature flags in EDX are decoded; the MSR capability lives
/// in bit 5.
///
/// Reference: Intel SDM Vol. 2A, "CPUID—CPU Identification", leaf 01H.
#[derive(Copy, Clone, Debug)]
pub struct Leaf01h {
    pub edx: Leaf1Edx,
}

impl Leaf01h {
    /// Query CPUID.01H if supported; returns `None` if `ranges` says leaf 1 is absent.
    ///
    /// # Safety
    /// The CPUID instruction must be available.
    #[cfg(all(feature = "asm", target_arch = "x86_64"))]
    #[inline]
    #[must_use]
    pub unsafe fn read(ranges: &CpuidRanges) -> Option<Self> {
        if !ranges.has_basic(LEAF_01H) {
            return None;
        }
        let r = unsafe { crate::cpuid(LEAF_01H, 0) };
        Some(Self::from(r))
    }

    /// Returns `None` when `ranges` reports that leaf 1 does not exist.
    #[must_use]
    pub fn from_checked(ranges: &CpuidRanges, r: CpuidResult) -> Option<Self> {
        ranges.has_basic(LEAF_01H).then(|| Self::from(r))
    }
}

impl From<CpuidResult> for Leaf01h {
    fn from(r: CpuidResult) -> Self {
        Self {
            edx: Leaf1Edx::from_bits(r.edx),
        }
    }
}

/// Feature flags returned by `CPUID.(EAX=1):EDX`.
///
/// Reference: Intel SDM Vol. 2A, Table 3-11 "Feature Information Returned in EDX".
#[bitfield(u32)]
pub struct Leaf1Edx {
    #[bits(5)]
    _rsv0_4: u8,
    /// `RDMSR`/`WRMSR` available.
    pub msr: bool,
    #[bits(26)]
    _rsv6_31: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CpuVendor;

    #[test]
    fn msr_flag_is_edx_bit_5() {
        assert_eq!(Leaf1Edx::new().with_msr(true).into_bits(), 1 << 5);
        assert!(!Leaf1Edx::from_bits(!(1 << 5)).msr());
    }

    #[test]
    fn checked_decode_respects_max_leaf() {
        let ranges = CpuidRanges {
            max_basic: 0,
            vendor: CpuVendor::Other,
        };
        assert!(Leaf01h::from_checked(&ranges, CpuidResult::default()).is_none());

        let ranges = CpuidRanges {
            max_basic: 1,
            ..ranges
        };
        let leaf = Leaf01h::from_checked(
            &ranges,
            CpuidResult {
                edx: Leaf1Edx::new().with_msr(true).into_bits(),
                ..CpuidResult::default()
            },
        );
        assert!(leaf.is_some_and(|l| l.edx.msr()));
    }
}
