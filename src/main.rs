use ersql::{Diagnostics, Diagram, derive_tables, emit_sql, generate_sql, validate};
use std::env;
use std::fs;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiagnosticsFormat {
    Text,
    Json,
}

impl DiagnosticsFormat {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <diagram.json> [options]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -o, --output <file>          Output file (default: stdout)");
    eprintln!("  -c, --check                  Only validate the diagram");
    eprintln!("  -f, --diagnostics <format>   Diagnostics format: text, json (default: text)");
    eprintln!("      --no-validate            Compile without the validation gate");
    process::exit(1);
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_diagnostics(diagnostics: &Diagnostics, format: DiagnosticsFormat) {
    match format {
        DiagnosticsFormat::Json => match serde_json::to_string_pretty(diagnostics) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize diagnostics: {}", e);
                process::exit(1);
            }
        },
        DiagnosticsFormat::Text => {
            if diagnostics.is_valid {
                println!("Diagram is valid");
            }
            for check in diagnostics.failed_checks() {
                println!("{}: {}", check.name(), check.message());
            }
        }
    }
}

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
    }

    let input_path = &args[1];
    let mut output_path: Option<String> = None;
    let mut check_only = false;
    let mut skip_validation = false;
    let mut format = DiagnosticsFormat::Text;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => {
                i += 1;
                if i < args.len() {
                    output_path = Some(args[i].clone());
                }
            }
            "-c" | "--check" => check_only = true,
            "--no-validate" => skip_validation = true,
            "-f" | "--diagnostics" => {
                i += 1;
                if i < args.len() {
                    format = DiagnosticsFormat::from_str(&args[i]).unwrap_or_else(|| {
                        eprintln!("Invalid diagnostics format: {}", args[i]);
                        process::exit(1);
                    });
                }
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                usage(&args[0]);
            }
        }
        i += 1;
    }

    let input = match fs::read_to_string(input_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", input_path, e);
            process::exit(1);
        }
    };

    let diagram = match Diagram::from_json(&input) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to load diagram: {}", e);
            process::exit(1);
        }
    };

    if check_only {
        let diagnostics = validate(&diagram);
        print_diagnostics(&diagnostics, format);
        process::exit(if diagnostics.is_valid { 0 } else { 1 });
    }

    let result = if skip_validation {
        derive_tables(&diagram).map(|tables| emit_sql(&tables))
    } else {
        generate_sql(&diagram)
    };

    let sql = match result {
        Ok(sql) => sql,
        Err(ersql::CompileError::InvalidDiagram(diagnostics)) => {
            eprintln!("Diagram is not valid:");
            print_diagnostics(&diagnostics, format);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Compile error: {}", e);
            process::exit(1);
        }
    };

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(&path, &sql) {
                eprintln!("Failed to write {}: {}", path, e);
                process::exit(1);
            }
        }
        None => println!("{}", sql),
    }
}
