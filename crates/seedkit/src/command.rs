//! The `seeddata` command's listing mode.

use crate::discovery::AppSeeds;
use crate::output::{Level, OutputSink};

/// Lists discovered seed files without running them.
pub fn list_seed_files(app_seeds: &[AppSeeds], output: &mut impl OutputSink) {
    if app_seeds.is_empty() {
        output.write(Level::Warning, "No seed files found");
        return;
    }

    output.write(Level::Success, "Available seed files:");
    for app in app_seeds {
        output.write(Level::Info, &format!("  {}:", app.app_name));
        for seed_file in &app.files {
            output.write(Level::Plain, &format!("    - {}", seed_file.file_name()));
        }
    }
}
