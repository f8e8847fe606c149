// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn core_error_displays_through() {
    let err: CliError = ward_core::WardError::NotFound("web".to_owned()).into();
    assert!(err.to_string().contains("web"));
}

#[test]
fn config_error_carries_message() {
    let err = CliError::Config("missing `procs` table".to_owned());
    assert_eq!(err.to_string(), "malformed configuration: missing `procs` table");
}
