//! Command handlers for the Kiln CLI.

mod options;
mod run;

pub use options::{parse_run_options, RunOptions, STACK_SIZE_ENV};
pub use run::{compile_and_run, run_file, PhaseTiming, RunError, RunOutput};

/// Read a source file, exiting with a message if it cannot be read.
fn read_file(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("error: cannot read '{path}': {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests;
