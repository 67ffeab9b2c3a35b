// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn write_outputs_recreates_nested_paths() {
    let dir = tempfile::tempdir().unwrap();
    let outputs = vec![
        OutputFile { path: "build.log".to_string(), contents: b"compiling\n".to_vec() },
        OutputFile { path: "dist/app.tar".to_string(), contents: b"tar".to_vec() },
    ];

    write_outputs(dir.path(), &outputs).unwrap();

    assert_eq!(std::fs::read(dir.path().join("build.log")).unwrap(), b"compiling\n");
    assert_eq!(std::fs::read(dir.path().join("dist/app.tar")).unwrap(), b"tar");
}

#[test]
fn bad_property_pairs_fail_before_any_network_io() {
    let result = Entries::from_pairs(["not-a-pair"]);
    assert!(result.is_err());
}
