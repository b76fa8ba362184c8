//! detour CLI — driving adapter for the redirect engine.
//!
//! Subcommands:
//! - `check <rules>` — validate a rules file compiles without errors
//! - `resolve <rules> <path> [--header name=value...]` — resolve one path
//! - `explain <rules> <path> [--header name=value...]` — resolve and show
//!   which rules were tried

use std::process;

use detour::{Outcome, Request, RuleSet, RuleSetConfig};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "check" => cmd_check(&args[2..]),
        "resolve" => cmd_resolve(&args[2..], false),
        "explain" => cmd_resolve(&args[2..], true),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("error: unknown command \"{other}\"");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_check(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("check requires a rules file path".into());
    }

    let rules = load_rules(&args[0])?;
    println!("Rules valid ({} rules)", rules.len());
    Ok(())
}

fn cmd_resolve(args: &[String], explain: bool) -> Result<(), String> {
    if args.len() < 2 {
        return Err("resolve requires a rules file and a request path".into());
    }

    let rules = load_rules(&args[0])?;
    let request = build_request(&args[1], &parse_headers(&args[2..])?);

    if explain {
        let trace = rules.resolve_with_trace(&request);
        for step in &trace.steps {
            let marker = if step.matched { "match " } else { "      " };
            let name = step.name.as_deref().unwrap_or("-");
            println!("{marker} [{:>3}] {:<24} {}", step.index, name, step.pattern);
        }
        print_outcome(trace.outcome.map_err(|e| e.to_string())?);
    } else {
        let outcome = rules.resolve(&request).map_err(|e| e.to_string())?;
        print_outcome(outcome);
    }

    Ok(())
}

fn print_outcome(outcome: Outcome) {
    match outcome {
        Outcome::NoMatch => println!("(no match)"),
        Outcome::Excluded => println!("(excluded)"),
        Outcome::Redirect(action) => {
            println!("{} {}", action.status, action.location);
            if let Some(cache) = action.cache_control() {
                println!("  Cache-Control: {cache}");
            }
            if let Some(vary) = action.vary_header() {
                println!("  Vary: {vary}");
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Rules loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_rules(path: &str) -> Result<RuleSet, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read \"{path}\": {e}"))?;

    let is_json = std::path::Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config: RuleSetConfig = if is_json {
        serde_json::from_str(&content).map_err(|e| format!("JSON parse error: {e}"))?
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(&content).map_err(|e| format!("YAML parse error: {e}"))?
    };

    config.build().map_err(|e| e.to_string())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Request assembly
// ═══════════════════════════════════════════════════════════════════════════════

fn build_request(target: &str, headers: &[(String, String)]) -> Request {
    let mut request = Request::get(target);
    if !headers.is_empty() {
        let (path, query) = detour::split_target(target);
        let mut builder = Request::builder()
            .path(detour::decode_path(path))
            .query(query);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        request = builder.build();
    }
    request
}

fn parse_headers(args: &[String]) -> Result<Vec<(String, String)>, String> {
    let mut headers = Vec::new();
    let mut i = 0;

    while i < args.len() {
        if args[i] == "--header" {
            i += 1;
            while i < args.len() && !args[i].starts_with("--") {
                let pair = &args[i];
                let (name, value) = pair.split_once('=').ok_or_else(|| {
                    format!("invalid header pair \"{pair}\", expected name=value")
                })?;
                headers.push((name.to_owned(), value.to_owned()));
                i += 1;
            }
        } else {
            return Err(format!("unexpected argument \"{}\"", args[i]));
        }
    }

    Ok(headers)
}

fn print_usage() {
    eprintln!(
        "Usage: detour <command> [options]

Commands:
  check <rules>                                    Validate a rules file
  resolve <rules> <path> [--header name=value...]  Resolve one request path
  explain <rules> <path> [--header name=value...]  Resolve and show the rules tried
  help                                             Show this help"
    );
}
