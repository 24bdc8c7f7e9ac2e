use std::{
    env,
    fs::read_to_string,
    io::{self, BufReader, Write},
    process::ExitCode,
};

use pascalcc::{
    analyzer::analyzer::analyze,
    ast::printer::print_tree,
    backend::backend::{run, BackendMode},
    display_error,
    lexer::lexer::tokenize,
    parser::parser::parse,
};
use tracing_subscriber::{
    fmt::{format::FmtSpan, time::FormatTime},
    EnvFilter,
};

/// Span timings without wall-clock timestamps.
struct NoTimestamp;

impl FormatTime for NoTimestamp {
    fn format_time(&self, _w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        Ok(())
    }
}

const USAGE: &str = "usage: pascalcc <-tokens|-parse|-symbols|-execute|-convert|-compile> <file>";

fn main() -> ExitCode {
    if let Ok(filter) = EnvFilter::try_from_env("PASCALCC_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_timer(NoTimestamp)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_writer(io::stderr)
            .init();
        tracing::debug!("tracing initialized");
    }

    let args: Vec<String> = env::args().collect();
    let [_, option, file_path] = &args[..] else {
        eprintln!("{}", USAGE);
        return ExitCode::from(1);
    };

    let source = match read_to_string(file_path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("Cannot read {}: {}", file_path, error);
            return ExitCode::from(1);
        }
    };

    let tokens = match tracing::info_span!("tokenize").in_scope(|| tokenize(source.clone())) {
        Ok(tokens) => tokens,
        Err(error) => {
            display_error(&error, &source, file_path);
            return ExitCode::from(1);
        }
    };
    if option == "-tokens" {
        for token in &tokens {
            println!("{:>4}  {:<16} {}", token.line, format!("{:?}", token.kind), token.value);
        }
        return ExitCode::SUCCESS;
    }

    let tree = match tracing::info_span!("parse").in_scope(|| parse(tokens)) {
        Ok(tree) => tree,
        Err(error) => {
            display_error(&error, &source, file_path);
            return ExitCode::from(1);
        }
    };
    if option == "-parse" {
        print!("{}", print_tree(&tree));
        return ExitCode::SUCCESS;
    }

    let mut analysis = tracing::info_span!("analyze").in_scope(|| analyze(tree));
    if option == "-symbols" {
        print!("{}", analysis.symtab.listing(&analysis.types));
        println!("{} semantic errors", analysis.error_count());
        return ExitCode::SUCCESS;
    }

    if analysis.has_errors() {
        for error in &analysis.errors {
            display_error(error, &source, file_path);
        }
        eprintln!("{} semantic errors", analysis.error_count());
        return ExitCode::from(1);
    }

    let mode = match option.as_str() {
        "-execute" => BackendMode::Interpret,
        "-convert" => BackendMode::Convert,
        "-compile" => BackendMode::Compile,
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::from(1);
        }
    };

    let stdin = io::stdin();
    let mut input = BufReader::new(stdin.lock());
    let stdout = io::stdout();
    let mut output = stdout.lock();

    let result = tracing::info_span!("backend", ?mode)
        .in_scope(|| run(mode, &mut analysis, &mut input, &mut output));
    let _ = output.flush();

    match result {
        Ok(_) => ExitCode::SUCCESS,
        // The interpreter has already printed the diagnostic.
        Err(error) if error.is_runtime() => ExitCode::from(2),
        Err(error) => {
            display_error(&error, &source, file_path);
            ExitCode::from(1)
        }
    }
}
