use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::ast::{Kind, Node};
use crate::error::ImportError;
use crate::macros::{MacroTable, ScopeStack};
use crate::parser::{Mode, ParseOptions, Parser};

/// Parse the file at `path` and return the macros it defines at top level,
/// prefixed with `namespace:` when one is given.
pub fn import_and_harvest_macros(
    path: &str,
    namespace: Option<&str>,
    options: &ParseOptions,
) -> Result<MacroTable, ImportError> {
    harvest(path, namespace, options, &[])
}

/// `chain` holds the canonical paths of the files currently being imported,
/// outermost first.
pub(crate) fn harvest(
    raw_path: &str,
    namespace: Option<&str>,
    options: &ParseOptions,
    chain: &[PathBuf],
) -> Result<MacroTable, ImportError> {
    if raw_path.starts_with("http://") || raw_path.starts_with("https://") {
        return Err(ImportError::Remote(raw_path.to_string()));
    }

    let path = resolve(raw_path, options)?;
    if !path.exists() {
        return Err(ImportError::NotFound(path));
    }
    let canonical = fs::canonicalize(&path).map_err(|e| io_error(&path, e))?;
    if chain.contains(&canonical) {
        let mut cycle = chain.to_vec();
        cycle.push(canonical);
        return Err(ImportError::Cycle(cycle));
    }

    let source = fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
    let mut nested_chain = chain.to_vec();
    nested_chain.push(canonical);

    let display = path.display().to_string();
    let mut parser =
        Parser::new(&source, &display, options, Mode::Build).with_import_chain(nested_chain);
    if let Err(e) = parser.parse() {
        return Err(ImportError::Parse {
            path,
            source: Box::new(e),
        });
    }

    let table = parser.into_scopes().into_user_macros();
    let table = match namespace {
        Some(prefix) => apply_namespace(table, prefix),
        None => table,
    };
    debug!(
        "imported {} macros from {display}: {:?}",
        table.len(),
        table.keys().collect::<Vec<_>>()
    );
    Ok(table)
}

/// Add imported macros to the innermost scope. Imports may not replace a
/// macro that scope already defines.
pub(crate) fn merge_into(scopes: &mut ScopeStack, table: MacroTable) -> Result<(), ImportError> {
    for (name, definition) in table {
        if scopes.innermost_contains(&name) {
            return Err(ImportError::Collision(name));
        }
        scopes.insert(definition);
    }
    Ok(())
}

fn resolve(raw_path: &str, options: &ParseOptions) -> Result<PathBuf, ImportError> {
    let mut path = PathBuf::from(raw_path);
    if path.is_relative() {
        let base = match &options.import_root {
            Some(root) => root.clone(),
            None => env::current_dir().map_err(|e| io_error(Path::new(raw_path), e))?,
        };
        path = base.join(path);
    }

    match path.extension() {
        None => {
            let mut with_extension = path.into_os_string();
            with_extension.push(".hbml");
            Ok(PathBuf::from(with_extension))
        }
        Some(extension) if extension == "hbml" => Ok(path),
        Some(_) => Err(ImportError::NotHbml(path)),
    }
}

/// Prefix every macro name, and every macro call inside the bodies, with
/// `prefix:` so calls between macros of one file keep resolving.
fn apply_namespace(table: MacroTable, prefix: &str) -> MacroTable {
    table
        .into_values()
        .map(|mut definition| {
            definition.name = format!("{prefix}:{}", definition.name);
            prefix_calls(&mut definition.body, prefix);
            (definition.name.clone(), definition)
        })
        .collect()
}

fn prefix_calls(nodes: &mut [Node], prefix: &str) {
    for node in nodes {
        if let Node::Token(token) = node {
            if let Kind::Macro(name) = &mut token.kind {
                *name = format!("{prefix}:{name}");
            }
            prefix_calls(&mut token.children, prefix);
        }
    }
}

fn io_error(path: &Path, error: std::io::Error) -> ImportError {
    ImportError::Io {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}
