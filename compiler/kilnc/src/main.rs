//! Kiln CLI

use kilnc::commands::{parse_run_options, run_file, STACK_SIZE_ENV};

fn main() {
    kilnc::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];
    match command.as_str() {
        "run" => {
            let env_stack_size = std::env::var(STACK_SIZE_ENV).ok();
            match parse_run_options(&args[2..], env_stack_size.as_deref()) {
                Ok(options) => run_file(&options),
                Err(message) => {
                    eprintln!("error: {message}");
                    eprintln!("Usage: kiln run <file> [options] [args...]");
                    std::process::exit(1);
                }
            }
        }
        "help" | "--help" | "-h" => print_usage(),
        "version" | "--version" | "-v" => {
            println!("Kiln {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Kiln deferred compiler");
    println!();
    println!("Usage: kiln <command> [options]");
    println!();
    println!("Commands:");
    println!("  run <file> [args...]   Compile a function unit and call it");
    println!("  help                   Show this help message");
    println!("  version                Show version information");
    println!();
    println!("Run options:");
    println!("  --background, -b       Parse on a worker thread if the source allows it");
    println!("  --stack-size=<bytes>   Stack budget for parsing and compiling");
    println!("  --trace-phases         Print per-step timings to stderr");
    println!("  --print-bytecode       Print the disassembly before running");
    println!();
    println!("Environment:");
    println!("  {STACK_SIZE_ENV}        Default for --stack-size");
    println!("  RUST_LOG               Enable tracing output (e.g. kiln_dispatch=debug)");
    println!();
    println!("Examples:");
    println!("  kiln run add.kiln 2 3");
    println!("  kiln run loop.kiln --background --trace-phases 100");
}
