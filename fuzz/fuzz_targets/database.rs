#![no_main]

use libfuzzer_sys::fuzz_target;
use winmd::Database;

fuzz_target!(|data: &[u8]| {
    let Ok(db) = Database::from_mem(data.to_vec()) else {
        return;
    };

    // Every row must render without panicking, whatever its columns point at
    for table in db.tables() {
        for row in table.rows() {
            let _ = row.to_string();
        }
    }
    let _ = db.namespaces();
});
