use std::env;
use std::fs;
use std::process;

use hbml::{LintOptions, tree_builder};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        usage(&args[0]);
    }

    let command = args[1].as_str();
    let filename = &args[2];
    let config = match &args[3..] {
        [] => None,
        [flag, path] if flag == "--config" => Some(path.as_str()),
        _ => usage(&args[0]),
    };

    let source = fs::read_to_string(filename).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", filename, e);
        process::exit(1);
    });

    match command {
        "build" => match hbml::expand_and_serialize(&source, filename) {
            Ok(html) => println!("{}", html),
            Err(e) => fail(&e),
        },
        "lint" => {
            let options = load_lint_options(config);
            match hbml::parse_for_lint(&source, filename) {
                Ok(nodes) => print!("{}", hbml::lint(&nodes, &options)),
                Err(e) => fail(&e),
            }
        }
        "tree" => match hbml::parse(&source, filename) {
            Ok(nodes) => println!("{}", tree_builder::serialize_tree(&nodes, &source)),
            Err(e) => {
                println!("{}", tree_builder::serialize_error(&e, &source));
                process::exit(1);
            }
        },
        other => {
            eprintln!("Unknown command: {}", other);
            usage(&args[0]);
        }
    }
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <build|lint|tree> <file.hbml> [--config <lint.json>]", program);
    process::exit(1);
}

fn load_lint_options(config: Option<&str>) -> LintOptions {
    let Some(path) = config else {
        return LintOptions::default();
    };
    let json = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path, e);
        process::exit(1);
    });
    LintOptions::from_json(&json).unwrap_or_else(|e| {
        eprintln!("Invalid lint config {}: {}", path, e);
        process::exit(1);
    })
}

fn fail(error: &hbml::ParseError) -> ! {
    eprintln!("Error: {}", error);
    process::exit(1);
}
