//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Write a platformio.ini with the given content into `dir`.
pub fn write_descriptor(dir: &Path, content: &str) {
    fs::write(dir.join("platformio.ini"), content).expect("write platformio.ini");
}

/// Install a fake `pio` executable running the given shell body.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("pio");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write fake tool");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake tool");
    path
}
