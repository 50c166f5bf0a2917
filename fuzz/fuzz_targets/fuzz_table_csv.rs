// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell
#![no_main]

use libfuzzer_sys::fuzz_target;
use retrorank::loader::{contributors_from_table, dependency_from_table, projects_from_table};
use retrorank::table::{decode, Table};
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    let path = Path::new("fuzz.csv");
    let Ok(text) = decode(data, path) else { return };
    let Ok(table) = Table::from_csv_str(&text, path) else { return };

    if let Ok(projects) = projects_from_table(&table) {
        let _ = contributors_from_table(&table, &projects);
    }
    let _ = dependency_from_table(&table);
});
