use kiln_dispatch::DEFAULT_MAX_STACK_BYTES;

/// Environment variable overriding the default stack budget.
pub const STACK_SIZE_ENV: &str = "KILN_STACK_SIZE";

/// Options of `kiln run`.
#[derive(Clone, Debug, PartialEq)]
pub struct RunOptions {
    pub path: String,
    /// Parse on a worker thread when the source allows it.
    pub background: bool,
    pub max_stack_bytes: usize,
    /// Print per-step timings to stderr.
    pub trace_phases: bool,
    /// Print the disassembly before running.
    pub print_bytecode: bool,
    /// Numeric arguments passed to the function.
    pub args: Vec<f64>,
}

/// Parse the arguments following `run`.
///
/// `env_stack_size` is the value of [`STACK_SIZE_ENV`], if set; an explicit
/// `--stack-size` wins over it.
pub fn parse_run_options(
    args: &[String],
    env_stack_size: Option<&str>,
) -> Result<RunOptions, String> {
    let mut path = None;
    let mut background = false;
    let mut trace_phases = false;
    let mut print_bytecode = false;
    let mut max_stack_bytes = match env_stack_size {
        Some(value) => parse_stack_size(value)?,
        None => DEFAULT_MAX_STACK_BYTES,
    };
    let mut call_args = Vec::new();

    for arg in args {
        if arg == "--background" || arg == "-b" {
            background = true;
        } else if arg == "--trace-phases" {
            trace_phases = true;
        } else if arg == "--print-bytecode" {
            print_bytecode = true;
        } else if let Some(value) = arg.strip_prefix("--stack-size=") {
            max_stack_bytes = parse_stack_size(value)?;
        } else if path.is_none() && !arg.starts_with('-') {
            path = Some(arg.clone());
        } else if path.is_some() {
            let number = arg
                .parse::<f64>()
                .map_err(|_| format!("argument '{arg}' is not a number"))?;
            call_args.push(number);
        } else {
            return Err(format!("unknown option '{arg}'"));
        }
    }

    let Some(path) = path else {
        return Err("missing file path".to_string());
    };
    Ok(RunOptions {
        path,
        background,
        max_stack_bytes,
        trace_phases,
        print_bytecode,
        args: call_args,
    })
}

fn parse_stack_size(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(bytes) if bytes > 0 => Ok(bytes),
        _ => Err(format!("invalid stack size '{value}'")),
    }
}
