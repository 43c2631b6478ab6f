//! Drives the `cpu/self/msr` driver through an in-memory device framework.
//!
//! ```text
//! msr-sim [-v] [--no-msr] [--len N] <msr>...
//! ```
//!
//! `<msr>` is a register name (`tsc`, `apic_base`, `efer`, ...) or an offset in
//! hex (`0x1b`) or decimal. Offsets are passed through unchecked so that the
//! driver's validation can be observed. Register values come from a fixed
//! simulated register file; the capability flag comes from the host's CPUID.

mod devtree;

use crate::devtree::DevTree;
use kernel_cpuid::CpuFeatures;
use kernel_registers::msr::{Msr, MsrTable};
use log::{debug, info};
use msr_driver::ddi::{AttachCmd, DdiError, DetachCmd};
use msr_driver::{CharDevice, DeviceDriver, Errno, MSR_DRIVER_NAME, MSR_SELF_LINK, MsrDriver, Uio};
use msr_driver::modlinkage;
use std::env;
use std::process::ExitCode;

const USAGE: &str = "usage: msr-sim [-v] [--no-msr] [--len N] <msr>...";

const SIMULATED_REGISTERS: &[(Msr, u64)] = &[
    (Msr::IA32_TSC, 0x0000_02A4_5E1C_77F0),
    (Msr::IA32_APIC_BASE, 0x0000_0000_FEE0_0900),
    (Msr::IA32_MPERF, 0x0000_0017_B3C2_0D11),
    (Msr::IA32_APERF, 0x0000_0016_09E4_81A2),
    (Msr::IA32_MISC_ENABLE, 0x0000_0000_0085_0089),
    (Msr::IA32_PAT, 0x0007_0406_0007_0406),
    (Msr::IA32_EFER, 0x0000_0000_0000_0D01),
    (Msr::IA32_STAR, 0x0023_0010_0000_0000),
    (Msr::IA32_LSTAR, 0xFFFF_FFFF_8100_0040),
    (Msr::IA32_FMASK, 0x0000_0000_0004_7700),
    (Msr::IA32_FS_BASE, 0x0000_7F3A_1C2D_4740),
    (Msr::IA32_GS_BASE, 0x0000_0000_0000_0000),
    (Msr::IA32_KERNEL_GS_BASE, 0xFFFF_8880_3FC0_0000),
];

const NAMED_REGISTERS: &[(&str, Msr)] = &[
    ("tsc", Msr::IA32_TSC),
    ("apic_base", Msr::IA32_APIC_BASE),
    ("mperf", Msr::IA32_MPERF),
    ("aperf", Msr::IA32_APERF),
    ("misc_enable", Msr::IA32_MISC_ENABLE),
    ("pat", Msr::IA32_PAT),
    ("efer", Msr::IA32_EFER),
    ("star", Msr::IA32_STAR),
    ("lstar", Msr::IA32_LSTAR),
    ("fmask", Msr::IA32_FMASK),
    ("fs_base", Msr::IA32_FS_BASE),
    ("gs_base", Msr::IA32_GS_BASE),
    ("kernel_gs_base", Msr::IA32_KERNEL_GS_BASE),
];

#[derive(Debug, thiserror::Error)]
enum SimError {
    #[error("{0}\n{usage}", usage = USAGE)]
    Usage(String),
    #[error("failed to install logger: {0}")]
    Logger(#[from] log::SetLoggerError),
    #[error("device framework: {0}")]
    Ddi(#[from] DdiError),
    #[error("{name}: {0}", name = .0.name())]
    Errno(#[from] Errno),
    #[error("no device-tree node available for driver {0}")]
    NoDevInfo(&'static str),
    #[error("/dev/{0} was not published")]
    NoNode(&'static str),
}

#[derive(Debug)]
struct Args {
    verbose: bool,
    no_msr: bool,
    len: usize,
    offsets: Vec<i64>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, SimError> {
        let mut parsed = Self {
            verbose: false,
            no_msr: false,
            len: size_of::<u64>(),
            offsets: Vec::new(),
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-v" | "--verbose" => parsed.verbose = true,
                "--no-msr" => parsed.no_msr = true,
                "--len" => {
                    let value = args
                        .next()
                        .ok_or_else(|| SimError::Usage("--len needs a value".into()))?;
                    parsed.len = value
                        .parse()
                        .map_err(|_| SimError::Usage(format!("bad length: {value}")))?;
                }
                _ => parsed.offsets.push(parse_offset(&arg)?),
            }
        }

        if parsed.offsets.is_empty() {
            return Err(SimError::Usage("no registers given".into()));
        }
        Ok(parsed)
    }
}

fn parse_offset(arg: &str) -> Result<i64, SimError> {
    if let Some(&(_, msr)) = NAMED_REGISTERS.iter().find(|(name, _)| *name == arg) {
        return Ok(i64::from(msr.raw()));
    }

    let (negative, digits) = match arg.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, arg),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(&hex.replace('_', ""), 16),
        None => digits.replace('_', "").parse(),
    }
    .map_err(|_| SimError::Usage(format!("unknown register: {arg}")))?;

    Ok(if negative { -magnitude } else { magnitude })
}

/// Environment variable holding an `env_logger` filter, e.g. `msr=trace`.
const LOG_ENV: &str = "MSR_SIM_LOG";

const fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

fn init_logging(verbose: bool) -> Result<(), log::SetLoggerError> {
    let env = env_logger::Env::default().filter_or(LOG_ENV, default_filter(verbose));
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init()
}

#[cfg(target_arch = "x86_64")]
fn host_has_msr() -> bool {
    // SAFETY: CPUID is available on every x86_64 processor.
    let cpu = unsafe { kernel_cpuid::HostCpu::detect() };
    debug!(
        "host cpu: vendor {}, max basic leaf {:#x}",
        cpu.ranges.vendor.as_str(),
        cpu.ranges.max_basic
    );
    cpu.has_msr()
}

#[cfg(not(target_arch = "x86_64"))]
fn host_has_msr() -> bool {
    true
}

fn run() -> Result<bool, SimError> {
    let args = Args::parse(env::args().skip(1))?;
    init_logging(args.verbose)?;

    let has_msr = !args.no_msr && host_has_msr();
    info!("msr capability: {has_msr}");

    let mut tree = DevTree::new();
    modlinkage::install(&mut tree)?;
    let status = modlinkage::info(&tree)?;
    debug!(
        "module {} loaded: {} (rev {})",
        status.id, status.linkage.description, status.linkage.revision
    );

    let dip = tree
        .alloc_devinfo(MSR_DRIVER_NAME)
        .ok_or(SimError::NoDevInfo(MSR_DRIVER_NAME))?;
    let mut driver = MsrDriver::new(MsrTable::new(SIMULATED_REGISTERS), has_msr);
    driver.attach(dip, AttachCmd::Attach, &mut tree)?;

    let dev = tree.lookup(MSR_SELF_LINK).ok_or(SimError::NoNode(MSR_SELF_LINK))?;
    driver.open(dev)?;

    let mut all_ok = true;
    for &offset in &args.offsets {
        let mut buf = vec![0u8; args.len];
        let mut uio = Uio::new(&mut buf, offset);
        match driver.read(dev, &mut uio) {
            Ok(()) => {
                let mut value = [0u8; 8];
                value.copy_from_slice(uio.filled());
                println!("msr {offset:#010x} = {:#018x}", u64::from_ne_bytes(value));
            }
            Err(e) => {
                all_ok = false;
                println!("msr {offset:#010x}: {} ({e})", e.name());
            }
        }
    }

    driver.close(dev)?;
    driver.detach(dip, DetachCmd::Detach, &mut tree)?;
    modlinkage::remove(&mut tree)?;
    Ok(all_ok)
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("msr-sim: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_registers::msr::ReadMsr;

    fn args(list: &[&str]) -> Result<Args, SimError> {
        Args::parse(list.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn parses_names_and_numbers() {
        let parsed = args(&["-v", "apic_base", "0x10", "27", "0x1_0000_0000", "-8"]).unwrap();
        assert!(parsed.verbose);
        assert!(!parsed.no_msr);
        assert_eq!(parsed.len, 8);
        assert_eq!(parsed.offsets, [0x1B, 0x10, 27, 1 << 32, -8]);
    }

    #[test]
    fn parses_length_and_capability_override() {
        let parsed = args(&["--no-msr", "--len", "4", "efer"]).unwrap();
        assert!(parsed.no_msr);
        assert_eq!(parsed.len, 4);
        assert_eq!(parsed.offsets, [0xC000_0080]);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(args(&[]), Err(SimError::Usage(_))));
        assert!(matches!(args(&["--len"]), Err(SimError::Usage(_))));
        assert!(matches!(args(&["bogus"]), Err(SimError::Usage(_))));
    }

    #[test]
    fn every_named_register_is_simulated() {
        let table = MsrTable::new(SIMULATED_REGISTERS);
        for &(name, msr) in NAMED_REGISTERS {
            assert!(table.read_msr(msr).is_ok(), "{name} missing");
        }
    }

    #[test]
    fn verbose_lowers_the_default_filter() {
        assert_eq!(default_filter(false), "warn");
        assert_eq!(default_filter(true), "debug");
    }

    #[test]
    fn logger_installs_once() {
        init_logging(false).unwrap();
        assert!(init_logging(true).is_err());
    }
}
