//! nuup - NuGet package update runner library
//!
//! This library applies one resolved package update to every file that
//! declares the package:
//! - packages.config (legacy package lists)
//! - legacy and SDK-style project files
//! - .nuspec package manifests
//! - directory-wide build files (Directory.Build.props and friends)

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod manifest;
pub mod observer;
pub mod orchestrator;
pub mod output;
pub mod package_manager;
pub mod pipeline;
pub mod progress;
pub mod sort;
