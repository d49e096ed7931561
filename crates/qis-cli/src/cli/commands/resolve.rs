//! `qis resolve <url>` – print the filename a save would use.

use qis_core::filename::resolve_filename;

pub fn run_resolve(url: &str) {
    println!("{}", resolve_filename(url));
}
