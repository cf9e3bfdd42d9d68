// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use hashpaste::paths;
use hashpaste::renamer::patch_reference_line;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    segments: Vec<String>,
    line: String,
    original: String,
}

fuzz_target!(|input: Input| {
    let joined = paths::join(&input.segments);
    assert!(!joined.contains("//"));

    let normalized = paths::normalize(&joined);
    assert_eq!(paths::normalize(&normalized), normalized);

    let _ = paths::basename(&joined);
    let _ = paths::extension(&joined);

    if let Some(patched) = patch_reference_line(&input.line, &input.original, "x.png") {
        assert!(patched.contains("x.png"));
    }
});
