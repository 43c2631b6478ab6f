use crate::CpuidResult;

const LEAF_00H: u32 = 0x00;

/// Highest supported basic leaf, plus the vendor string.
#[derive(Debug, Copy, Clone)]
pub struct CpuidRanges {
    pub max_basic: u32,
    pub vendor: CpuVendor,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CpuVendor {
    Intel,
    Amd,
    Other,
}

impl CpuidRanges {
    /// # Safety
    /// The CPUID instruction must be available.
    #[cfg(all(feature = "asm", target_arch = "x86_64"))]
    #[must_use]
    pub unsafe fn read() -> Self {
        unsafe {
            Self::from_result(crate::cpuid(LEAF_00H, 0))
        }
    }

    /// Builds the ranges from the raw `cpuid(0, 0)` result.
    #[must_use]
    pub fn from_result(basic: CpuidResult) -> Self {
        Self {
            max_basic: basic.eax,
            vendor: CpuVendor::from_registers(basic.ebx, basic.edx, basic.ecx),
        }
    }

    #[inline]
    #[must_use]
    pub const fn has_basic(&self, leaf: u32) -> bool {
        leaf <= self.max_basic
    }
}

impl CpuVendor {
    /// Decodes the vendor string spread over `EBX`, `EDX`, `ECX` (in that order).
    #[must_use]
    pub fn from_registers(ebx: u32, edx: u32, ecx: u32) -> Self {
        let mut id = [0u8; 12];
        id[0..4].copy_from_slice(&ebx.to_le_bytes());
        id[4..8].copy_from_slice(&edx.to_le_bytes());
        id[8..12].copy_from_slice(&ecx.to_le_bytes());
        match &id {
            b"GenuineIntel" => Self::Intel,
            b"AuthenticAMD" => Self::Amd,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Intel => "Intel",
            Self::Amd => "AMD",
            Self::Other => "Other",
        }
    }
}
