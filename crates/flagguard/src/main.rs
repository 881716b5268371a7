#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use flagguard::analysis::conflicts::ConflictDetector;
use flagguard::analysis::theory::{ConstraintEncoder, EncodeOptions};
use flagguard::analyzer::{Analyzer, AnalyzerOptions};
use flagguard::cli::{AnalyzeArgs, CheckArgs, Cli, Command, ParseArgs, ReportFormat, ScanArgs};
use flagguard::parsers;
use flagguard::reporters;
use flagguard::scanner::{ScannerOptions, SourceScanner};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Analyze(args) => run_analyze(args),
        Command::Check(args) => run_check(args),
        Command::Scan(args) => run_scan(args),
        Command::Parse(args) => run_parse(args),
    }
}

fn run_analyze(args: AnalyzeArgs) -> Result<ExitCode> {
    let analyzer = Analyzer::new(AnalyzerOptions {
        dialect: args.dialect,
        exclusive_groups: split_groups(&args.exclusive),
        required_flags: args.required,
        extra_excludes: args.excludes,
        max_files: args.max_files,
        conflict_arity: args.conflict_arity,
        ..Default::default()
    });
    let report = analyzer
        .analyze(&args.config, &args.source)
        .context("configuration parse failed")?;

    let rendered = match args.format {
        ReportFormat::Markdown => reporters::markdown::render(&report),
        ReportFormat::Json => {
            reporters::json::render(&report).context("report serialization failed")?
        }
    };
    match &args.output {
        Some(path) => std::fs::write(path, &rendered)
            .with_context(|| format!("failed to write report to {}", path.display()))?,
        None => println!("{rendered}"),
    }

    // Exit-code convention: zero when and only when no conflicts exist.
    if report.has_conflicts() {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn run_check(args: CheckArgs) -> Result<ExitCode> {
    let parsed = parsers::parse_file(&args.config).context("configuration parse failed")?;
    let encoder = ConstraintEncoder::new(EncodeOptions {
        exclusive_groups: split_groups(&args.exclusive),
        required_flags: args.required,
    });
    let theory = encoder.encode(&parsed.flags);

    let mut state = BTreeMap::new();
    for assignment in &args.assignments {
        let (flag, value) = parse_assignment(assignment)?;
        state.insert(flag, value);
    }

    let detector = ConflictDetector::new(&theory);
    match detector.check_state(&state) {
        Some(conflict) => {
            println!("impossible ({}): {}", conflict.severity.as_str(), conflict.reason);
            Ok(ExitCode::from(1))
        }
        None => {
            println!("possible");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_scan(args: ScanArgs) -> Result<ExitCode> {
    let scanner = SourceScanner::new(ScannerOptions {
        extra_excludes: args.excludes,
        ..Default::default()
    });
    let result = scanner.scan(&args.source);

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("scan serialization failed")?
        );
    } else {
        for site in &result.sites {
            let polarity = if site.negated { "off" } else { "on" };
            let function = site.function.as_deref().unwrap_or("<module>");
            println!(
                "{}:{}:{} {} [{} {}] in {}",
                site.file.display(),
                site.start_line,
                site.column,
                site.flag_name,
                site.kind.as_str(),
                polarity,
                function
            );
        }
        eprintln!(
            "{} sites in {} files ({:.2}s)",
            result.sites.len(),
            result.files_scanned,
            result.elapsed_seconds
        );
        for note in &result.notes {
            eprintln!("note: {}: {}", note.file.display(), note.message);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_parse(args: ParseArgs) -> Result<ExitCode> {
    let parsed = match args.dialect {
        Some(dialect) => {
            let content = std::fs::read_to_string(&args.config)
                .with_context(|| format!("failed to read {}", args.config.display()))?;
            parsers::parse_with_dialect(&content, dialect)
        }
        None => parsers::parse_file(&args.config),
    }
    .context("configuration parse failed")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&parsed.flags.to_value())
            .context("flag serialization failed")?
    );
    eprintln!("dialect: {}", parsed.dialect);
    for issue in &parsed.issues {
        match &issue.flag {
            Some(flag) => eprintln!("issue: {flag}: {}", issue.error),
            None => eprintln!("issue: {}", issue.error),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn split_groups(groups: &[String]) -> Vec<Vec<String>> {
    groups
        .iter()
        .map(|group| {
            group
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .collect()
}

fn parse_assignment(raw: &str) -> Result<(String, bool)> {
    let Some((flag, value)) = raw.split_once('=') else {
        bail!("invalid assignment '{raw}', expected name=true or name=false");
    };
    let value: bool = value
        .parse()
        .with_context(|| format!("invalid boolean in assignment '{raw}'"))?;
    Ok((flag.to_string(), value))
}
