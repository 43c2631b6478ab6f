use kernel_registers::msr::MsrReadError;

/// Error codes surfaced to callers of the character-device entry points.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Errno {
    /// I/O error.
    #[error("I/O error")]
    Io,
    /// No such device or address: wrong node, missing instance or missing capability.
    #[error("no such device or address")]
    Nxio,
    /// Bad address: the destination cannot hold the transfer.
    #[error("bad address")]
    Fault,
    /// Invalid argument: malformed length or offset.
    #[error("invalid argument")]
    Inval,
    /// Operation not supported.
    #[error("operation not supported")]
    NotSup,
}

impl Errno {
    /// The numeric code as reported across the system call boundary.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Io => 5,
            Self::Nxio => 6,
            Self::Fault => 14,
            Self::Inval => 22,
            Self::NotSup => 48,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Io => "EIO",
            Self::Nxio => "ENXIO",
            Self::Fault => "EFAULT",
            Self::Inval => "EINVAL",
            Self::NotSup => "ENOTSUP",
        }
    }
}

impl From<MsrReadError> for Errno {
    fn from(value: MsrReadError) -> Self {
        match value {
            MsrReadError::GeneralProtection(_) => Self::Fault,
            MsrReadError::Unsupported => Self::NotSup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_registers::msr::Msr;

    #[test]
    fn primitive_errors_keep_their_meaning() {
        assert_eq!(
            Errno::from(MsrReadError::GeneralProtection(Msr::new(0x1234))),
            Errno::Fault
        );
        assert_eq!(Errno::from(MsrReadError::Unsupported), Errno::NotSup);
    }

    #[test]
    fn codes() {
        assert_eq!(Errno::Nxio.code(), 6);
        assert_eq!(Errno::Inval.code(), 22);
        assert_eq!(Errno::Inval.name(), "EINVAL");
    }
}
