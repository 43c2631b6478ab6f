//! # Typed `X84_64` Registers
//!
//! Model-specific register access for the MSR pseudo-device. The read path is
//! expressed through the [`ReadMsr`](msr::ReadMsr) contract so that callers
//! never depend on how a faulting `rdmsr` is contained.

#![cfg_attr(not(any(test, doctest)), no_std)]

#[cfg(feature = "msr")]
pub mod msr;
