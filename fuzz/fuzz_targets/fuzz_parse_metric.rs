// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use libfuzzer_sys::fuzz_target;
use retrorank::table::parse_metric;

fuzz_target!(|data: &str| {
    assert!(parse_metric(data).is_finite());
});
