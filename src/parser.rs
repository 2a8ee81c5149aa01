use std::path::PathBuf;

use log::{debug, warn};

use crate::ast::*;
use crate::error::{ErrorKind, MacroError, ParseError};
use crate::imports;
use crate::macros::{Macro, Origin, ScopeStack};
use crate::tokenizer::{Cursor, LITERAL_DELIMITERS, scan_bare_value, scan_comment, scan_literal};

/// Characters that end a tag name.
const TAG_STOP: &str = "#. \t\n\"'`/>{[}";
/// Characters that start a selector with no tag name.
const IMPLICIT_START: &str = ">#.{[}";
const ID_STOP: &str = ">{.[ \t\n}";
const CLASS_STOP: &str = ">{[ \t\n}";
const ATTRIBUTE_KEY_STOP: &str = " \t\n='\"`]";
const NAMESPACE_STOP: &str = ".#[{>]}'\"` \t\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Expand macros while parsing; definitions and imports leave no node.
    Build,
    /// Keep macro calls, definitions and imports as nodes for pretty-printing.
    Lint,
}

/// What happens when a unique attribute (`id`, `lang`) is assigned twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    Overwrite,
    #[default]
    Warn,
    Reject,
}

#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub duplicate_policy: DuplicatePolicy,
    /// Directory relative imports resolve against; the working directory
    /// when unset.
    pub import_root: Option<PathBuf>,
}

pub struct Parser<'a> {
    cursor: Cursor<'a>,
    path: String,
    mode: Mode,
    options: ParseOptions,
    scopes: ScopeStack,
    import_chain: Vec<PathBuf>,
}

type PResult<T> = Result<T, ErrorKind>;

/// Parse and expand `source` into a forest of HTML-ready nodes.
pub fn parse(source: &str, path: &str) -> Result<Vec<Node>, ParseError> {
    parse_with_options(source, path, &ParseOptions::default(), Mode::Build)
}

/// Parse `source` without expanding macros.
pub fn parse_for_lint(source: &str, path: &str) -> Result<Vec<Node>, ParseError> {
    parse_with_options(source, path, &ParseOptions::default(), Mode::Lint)
}

pub fn parse_with_options(
    source: &str,
    path: &str,
    options: &ParseOptions,
    mode: Mode,
) -> Result<Vec<Node>, ParseError> {
    Parser::new(source, path, options, mode).parse()
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, path: &str, options: &ParseOptions, mode: Mode) -> Self {
        Parser {
            cursor: Cursor::new(source),
            path: path.to_string(),
            mode,
            options: options.clone(),
            scopes: ScopeStack::new(),
            import_chain: Vec::new(),
        }
    }

    /// Files this parser is nested in through `@import`, outermost first.
    pub(crate) fn with_import_chain(mut self, chain: Vec<PathBuf>) -> Self {
        self.import_chain = chain;
        self
    }

    pub fn parse(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();

        while !self.cursor.at_end() {
            let before = self.cursor.index();
            let parsed = self
                .parse_inner("div", true, false)
                .map_err(|kind| self.error(kind))?;
            if self.cursor.index() == before {
                return Err(self.error(ErrorKind::Unparseable));
            }
            nodes.extend(parsed);
        }

        Ok(nodes)
    }

    pub fn into_scopes(self) -> ScopeStack {
        self.scopes
    }

    fn error(&self, kind: ErrorKind) -> ParseError {
        ParseError {
            kind,
            path: self.path.clone(),
            line: self.cursor.line(),
            column: self.cursor.column(),
        }
    }

    fn is_build(&self) -> bool {
        self.mode == Mode::Build
    }

    // === Dispatch ===

    /// Parse one child: a string, comment, import, macro definition or element.
    fn parse_inner(
        &mut self,
        default_tag: &str,
        escape: bool,
        under_definition: bool,
    ) -> PResult<Vec<Node>> {
        self.cursor.skip_blank(true);
        let Some(next) = self.cursor.peek() else {
            return Ok(Vec::new());
        };

        if next == '}' {
            return Ok(Vec::new());
        }
        if LITERAL_DELIMITERS.contains(next) {
            let text = scan_literal(&mut self.cursor, escape)?;
            return Ok(vec![Node::Text(text)]);
        }
        if self.cursor.starts_with("--") {
            let origin = self.origin();
            self.cursor.advance_by(2);
            return self.parse_macro_definition(origin);
        }
        if next == '/' {
            let text = scan_comment(&mut self.cursor)?;
            return Ok(vec![Token::comment(text).into()]);
        }
        if self.cursor.starts_with("@import") {
            return self.parse_import();
        }

        let mut token = self.parse_tag(default_tag)?;

        let mut call = None;
        if let Kind::Macro(name) = &token.kind {
            if name.is_empty() {
                return Err(ErrorKind::EmptyMacroName);
            }
            if !under_definition {
                let name = name.clone();
                match self.scopes.lookup(&name) {
                    None if self.is_build() => {
                        return Err(MacroError::Unknown(name).into());
                    }
                    None => {}
                    Some(entry) if entry.is_void() => {
                        if self.is_build() {
                            return Ok(self.scopes.expand_call(&name, token.attributes, Vec::new())?);
                        }
                        token.meta.void = true;
                        return Ok(vec![token.into()]);
                    }
                    Some(_) => call = Some(name),
                }
            }
        }

        if token.meta.void {
            return self.finish_void(token, under_definition);
        }

        let children = self.parse_body(&mut token, under_definition)?;

        if let Some(name) = call.filter(|_| self.is_build()) {
            return Ok(self.scopes.expand_call(&name, token.attributes, children)?);
        }

        token.children = children;
        Ok(vec![token.into()])
    }

    // === Selector ===

    /// Parse `tag#id.class.class[attributes]`, falling back to `default_tag`
    /// when the tag name is omitted.
    fn parse_tag(&mut self, default_tag: &str) -> PResult<Token> {
        let implicit = self.cursor.is_next_any(IMPLICIT_START);
        let tag = if implicit {
            default_tag
        } else {
            self.cursor.take_until(TAG_STOP)
        };

        let mut token = Token::element(tag);
        token.meta.implicit = implicit;

        if self.cursor.peek() == Some('#') {
            self.cursor.advance();
            let id = self.cursor.take_until(ID_STOP);
            token.attributes.set("id", AttrValue::Text(id.to_string()));
        }

        if self.cursor.peek() == Some('.') {
            let classes = self.cursor.take_until(CLASS_STOP);
            let joined = classes[1..].replace('.', " ");
            token.attributes.set("class", AttrValue::Text(joined));
        }

        if self.cursor.peek() == Some('[') {
            self.cursor.advance();
            self.parse_attributes(&mut token.attributes)?;
        }

        Ok(token)
    }

    /// Parse the inside of `[...]`; the opening bracket is already consumed.
    fn parse_attributes(&mut self, attributes: &mut Attributes) -> PResult<()> {
        loop {
            self.cursor.skip_blank(true);
            match self.cursor.peek() {
                None => return Err(ErrorKind::UnclosedAttributes),
                Some(']') => {
                    self.cursor.advance();
                    return Ok(());
                }
                Some(_) => {}
            }

            let key = self.cursor.take_until(ATTRIBUTE_KEY_STOP).to_string();
            match self.cursor.peek() {
                None => return Err(ErrorKind::UnclosedAttributes),
                _ if key.is_empty() => return Err(ErrorKind::EmptyAttributeKey),
                Some('=') => {
                    self.cursor.advance();
                    let value = if self.cursor.is_next_any(LITERAL_DELIMITERS) {
                        scan_literal(&mut self.cursor, false)?
                    } else {
                        scan_bare_value(&mut self.cursor)?
                    };
                    let value = value.replace('"', "&quot;");
                    // Each space-separated piece is its own occurrence of the key.
                    for piece in split_space_runs(&value) {
                        self.insert_attribute(attributes, &key, AttrValue::Text(piece.to_string()))?;
                    }
                }
                Some(_) => self.insert_attribute(attributes, &key, AttrValue::Flag)?,
            }
        }
    }

    fn insert_attribute(&self, attributes: &mut Attributes, key: &str, value: AttrValue) -> PResult<()> {
        let Some(old) = attributes.get(key) else {
            attributes.set(key, value);
            return Ok(());
        };
        if !is_unique(key) {
            attributes.merge(key, value);
            return Ok(());
        }

        match self.options.duplicate_policy {
            DuplicatePolicy::Overwrite => {}
            DuplicatePolicy::Warn => warn!(
                "Duplicate unique value found ({old} and {value}) {} {}:{}",
                self.path,
                self.cursor.line(),
                self.cursor.column()
            ),
            DuplicatePolicy::Reject => {
                return Err(ErrorKind::DuplicateUnique {
                    old: old.to_string(),
                    new: value.to_string(),
                });
            }
        }
        attributes.set(key, value);
        Ok(())
    }

    // === Element bodies ===

    /// Parse an inline (`>`) or block (`{ }`) body, if one follows on this line.
    fn parse_body(&mut self, token: &mut Token, under_definition: bool) -> PResult<Vec<Node>> {
        let tag = token.kind.tag();
        let default_tag = if is_inline(&tag) { "span" } else { "div" };
        let escape = tag != "style";

        self.cursor.skip_blank(false);
        match self.cursor.peek() {
            Some('>') => {
                token.meta.inline = true;
                self.cursor.advance();
                self.scopes.push();
                let children = self.parse_inner(default_tag, escape, under_definition)?;
                self.scopes.pop();
                Ok(children)
            }
            Some('{') => {
                self.cursor.advance();
                self.scopes.push();
                let mut children = Vec::new();
                loop {
                    self.cursor.skip_blank(true);
                    match self.cursor.peek() {
                        None => return Err(ErrorKind::UnclosedBlock),
                        Some('}') => break,
                        Some(_) => {}
                    }
                    let before = self.cursor.index();
                    children.extend(self.parse_inner(default_tag, escape, under_definition)?);
                    if self.cursor.index() == before {
                        return Err(ErrorKind::Unparseable);
                    }
                }
                self.scopes.pop();
                self.cursor.advance();
                Ok(children)
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Void elements take no body. One written anyway is parsed, dropped and
    /// replaced by a warning comment after the element.
    fn finish_void(&mut self, token: Token, under_definition: bool) -> PResult<Vec<Node>> {
        self.cursor.skip_blank(false);
        if !self.cursor.is_next_any(">{") {
            return Ok(vec![token.into()]);
        }

        let tag = token.kind.tag();
        warn!(
            "Void element {tag} may not have child nodes {} {}:{}",
            self.path,
            self.cursor.line(),
            self.cursor.column()
        );
        let mut discarded = token.clone();
        self.parse_body(&mut discarded, under_definition)?;

        Ok(vec![
            token.into(),
            Token::comment(format!("Void element {tag} may not have child nodes")).into(),
        ])
    }

    // === Macros and imports ===

    fn origin(&self) -> Origin {
        Origin {
            file: self.path.clone(),
            line: self.cursor.line(),
            column: self.cursor.column(),
        }
    }

    /// `--name <body>`; the `--` is already consumed.
    fn parse_macro_definition(&mut self, origin: Origin) -> PResult<Vec<Node>> {
        let parsed = self.parse_inner("div", false, true)?;
        let Some(Node::Token(head)) = parsed.into_iter().next() else {
            return Err(ErrorKind::EmptyMacroName);
        };
        let name = head.kind.tag();
        if name.is_empty() || head.meta.implicit {
            return Err(ErrorKind::EmptyMacroName);
        }

        let lint_node = (!self.is_build()).then(|| {
            let mut node = head.clone();
            node.kind = Kind::MacroDef(name.clone());
            node.meta.void = node.children.is_empty();
            node
        });

        let definition = Macro::from_definition(head, name, origin);
        debug!(
            "defining macro :{} (void: {}, scope depth {})",
            definition.name,
            definition.is_void,
            self.scopes.depth()
        );
        self.scopes.define(definition)?;

        Ok(lint_node.map(|node| vec![node.into()]).unwrap_or_default())
    }

    /// `@import <path> [namespace]`
    fn parse_import(&mut self) -> PResult<Vec<Node>> {
        self.cursor.advance_by("@import".len());
        self.cursor.skip_blank(false);
        let path = self.cursor.take_until(" \t\n").to_string();

        let mut namespace = None;
        if !matches!(self.cursor.peek(), None | Some('\n')) {
            self.cursor.skip_blank(false);
            let prefix = self.cursor.take_until(NAMESPACE_STOP);
            if !prefix.is_empty() {
                namespace = Some(prefix.to_string());
            }
        }

        if self.import_chain.is_empty() {
            self.import_chain.extend(std::fs::canonicalize(&self.path));
        }
        let table = imports::harvest(&path, namespace.as_deref(), &self.options, &self.import_chain)?;
        imports::merge_into(&mut self.scopes, table)?;

        if self.is_build() {
            return Ok(Vec::new());
        }
        Ok(vec![Token::new(Kind::Import { path, namespace }).into()])
    }
}

/// Split on runs of spaces the way a `/ +/` split does: leading and trailing
/// runs produce empty pieces.
fn split_space_runs(value: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = value;
    loop {
        match rest.find(' ') {
            None => {
                pieces.push(rest);
                return pieces;
            }
            Some(index) => {
                pieces.push(&rest[..index]);
                rest = rest[index..].trim_start_matches(' ');
            }
        }
    }
}
