//! Identity Console Common
//!
//! Cross-cutting helpers shared by the Identity Console binaries.

pub mod logging;
