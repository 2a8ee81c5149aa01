pub mod ast;
pub mod error;
pub mod html;
pub mod imports;
pub mod macros;
pub mod parser;
pub mod render;
pub mod tokenizer;
pub mod tree_builder;

pub use error::{ErrorKind, ImportError, MacroError, ParseError};
pub use html::{expand_and_serialize, to_html};
pub use imports::import_and_harvest_macros;
pub use parser::{DuplicatePolicy, Mode, ParseOptions, parse, parse_for_lint, parse_with_options};
pub use render::{LintOptions, lint};
pub use tree_builder::serialize_tree;
