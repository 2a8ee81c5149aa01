use std::path::PathBuf;

use crate::macros::Origin;

/// A failure that aborts parsing of the current file, with the position the
/// cursor had reached.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} {path} {line}:{column}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub path: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("Unclosed string")]
    UnclosedString,
    #[error("Expected end of comment! Found EOF")]
    UnclosedComment,
    #[error("Expected '*' or '/' after /")]
    InvalidComment,
    #[error("Unclosed block! Expected closing '}}' found EOF!")]
    UnclosedBlock,
    #[error("Unclosed attribute brackets")]
    UnclosedAttributes,
    #[error("Empty attribute key!")]
    EmptyAttributeKey,
    #[error("Duplicate unique value found ({old} and {new})")]
    DuplicateUnique { old: String, new: String },
    #[error("Macro cannot have an empty name")]
    EmptyMacroName,
    #[error("Unable to parse remaining text")]
    Unparseable,
    #[error(transparent)]
    Macro(#[from] MacroError),
    #[error(transparent)]
    Import(#[from] ImportError),
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::UnclosedString => "unclosed_string",
            ErrorKind::UnclosedComment => "unclosed_comment",
            ErrorKind::InvalidComment => "invalid_comment",
            ErrorKind::UnclosedBlock => "unclosed_block",
            ErrorKind::UnclosedAttributes => "unclosed_attributes",
            ErrorKind::EmptyAttributeKey => "empty_attribute_key",
            ErrorKind::DuplicateUnique { .. } => "duplicate_unique",
            ErrorKind::EmptyMacroName => "empty_macro_name",
            ErrorKind::Unparseable => "unparseable",
            ErrorKind::Macro(_) => "macro",
            ErrorKind::Import(_) => "import",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MacroError {
    #[error("Unknown macro :{0}")]
    Unknown(String),
    #[error("ID cannot be applied to a macro with multiple root elements")]
    IdOnMultipleRoots,
    #[error("Macro redefinitions must preserve voidness")]
    VoidnessMismatch,
    #[error("Macro :{0} expanded more than {max} levels deep", max = crate::macros::MAX_EXPANSION_DEPTH)]
    TooDeep(String),
    /// Breadcrumb added while an expansion unwinds through a macro call.
    #[error("{source}\n\tunder macro call :{name}({origin})")]
    Nested {
        source: Box<MacroError>,
        name: String,
        origin: Origin,
    },
}

impl MacroError {
    pub(crate) fn under(self, name: &str, origin: &Origin) -> Self {
        MacroError::Nested {
            source: Box::new(self),
            name: name.to_string(),
            origin: origin.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    #[error("Remote imports are not supported ({0})")]
    Remote(String),
    #[error("Cannot import non-HBML file {}!", .0.display())]
    NotHbml(PathBuf),
    #[error("Imported file {} does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("Unable to read {} ({message})", .path.display())]
    Io { path: PathBuf, message: String },
    #[error("Error importing file {} ({source})", .path.display())]
    Parse {
        path: PathBuf,
        source: Box<ParseError>,
    },
    #[error("Cannot redefine macros through imports. Try using a namespace instead (:{0})")]
    Collision(String),
    #[error("Import cycle detected: {}", .0.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(" -> "))]
    Cycle(Vec<PathBuf>),
}
