//! Keeps dependency versions consistent across the package.json manifests of
//! a monorepo.
//!
//! ```text
//! manifest::load ──► instance::collect_instances ──► detect::detect
//!                                                        │
//!                     report ◄── manifest::write ◄── fix::fix
//! ```

pub mod command;
pub mod config;
pub mod detect;
pub mod fix;
pub mod format;
pub mod group;
pub mod instance;
pub mod manifest;
pub mod report;
pub mod specifier;

#[cfg(test)]
mod test_support;
