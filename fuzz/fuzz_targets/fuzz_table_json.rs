// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use libfuzzer_sys::fuzz_target;
use retrorank::loader::{dependency_from_table, onchain_from_table};
use retrorank::table::Table;
use std::path::Path;

fuzz_target!(|data: &str| {
    let Ok(table) = Table::from_json_str(data, Path::new("fuzz.json")) else { return };
    let _ = dependency_from_table(&table);
    let _ = onchain_from_table(&table);
});
