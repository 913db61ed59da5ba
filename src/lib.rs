//! Security-analyst workstation provisioner.
//!
//! Installs a curated toolset through the host's native package managers,
//! driven by a JSON manifest keyed by platform and backend family.
//!
//! The public API is organised into layers:
//!
//! - **[`platform`]**: detect the OS, Linux distribution, and elevation
//! - **[`config`]**: run settings and the tool manifest (local file or remote fetch)
//! - **[`resources`]**: package manager backends and per-item install outcomes
//! - **[`tasks`]**: the installation pass and the post-install tasks
//! - **[`commands`]**: top-level orchestration of a run
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod platform;
pub mod resources;
pub mod tasks;
