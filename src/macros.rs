use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::ast::*;
use crate::error::MacroError;

/// Where a macro was defined, for error breadcrumbs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

const BUILTIN_FILE: &str = "Built-in";

impl Origin {
    pub fn builtin() -> Self {
        Origin {
            file: BUILTIN_FILE.to_string(),
            line: 0,
            column: 0,
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.file == BUILTIN_FILE && self.line == 0 && self.column == 0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.file, self.line, self.column)
    }
}

/// A structural macro defined with `--name`. The body is an unexpanded
/// template; every expansion works on a fresh copy of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    pub name: String,
    pub body: Vec<Node>,
    /// Takes no call-site children at all.
    pub is_void: bool,
    pub origin: Origin,
}

/// Internal macro that rewrites the already expanded call-site children.
pub type FunctionMacro = fn(Vec<Node>) -> Vec<Node>;

#[derive(Debug, Clone)]
pub enum MacroEntry {
    Class(Macro),
    Function(FunctionMacro),
}

impl MacroEntry {
    pub fn is_void(&self) -> bool {
        match self {
            MacroEntry::Class(m) => m.is_void,
            MacroEntry::Function(_) => false,
        }
    }
}

/// Nested expansions allowed before a call chain is treated as runaway recursion.
pub const MAX_EXPANSION_DEPTH: usize = 128;

/// Macros harvested from an imported file, keyed by (possibly namespaced) name.
pub type MacroTable = BTreeMap<String, Macro>;

/// Lexically nested macro scopes, innermost last.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    scopes: Vec<HashMap<String, MacroEntry>>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    /// A stack with one scope holding the built-in macros.
    pub fn new() -> Self {
        let mut builtins = HashMap::new();
        builtins.insert("root".to_string(), MacroEntry::Class(root_macro()));
        builtins.insert("unwrap".to_string(), MacroEntry::Function(unwrap));
        ScopeStack {
            scopes: vec![builtins],
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Resolve a name, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<&MacroEntry> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn innermost_contains(&self, name: &str) -> bool {
        self.scopes
            .last()
            .is_some_and(|scope| scope.contains_key(name))
    }

    /// Define in the innermost scope. A name that is already visible must keep
    /// its voidness.
    pub fn define(&mut self, definition: Macro) -> Result<(), MacroError> {
        if let Some(previous) = self.lookup(&definition.name) {
            if previous.is_void() != definition.is_void {
                return Err(MacroError::VoidnessMismatch);
            }
        }
        self.insert(definition);
        Ok(())
    }

    pub(crate) fn insert(&mut self, definition: Macro) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(definition.name.clone(), MacroEntry::Class(definition));
        }
    }

    /// The class macros of the outermost scope, minus the seeded built-ins.
    pub fn into_user_macros(mut self) -> MacroTable {
        let top = self.scopes.swap_remove(0);
        top.into_iter()
            .filter_map(|(name, entry)| match entry {
                MacroEntry::Class(m) if !m.origin.is_builtin() => Some((name, m)),
                _ => None,
            })
            .collect()
    }

    /// Expand a call to `name` with already expanded call-site children.
    pub fn expand_call(
        &self,
        name: &str,
        attributes: Attributes,
        children: Vec<Node>,
    ) -> Result<Vec<Node>, MacroError> {
        match self.lookup(name) {
            None => Err(MacroError::Unknown(name.to_string())),
            Some(MacroEntry::Function(function)) => Ok(function(children)),
            Some(MacroEntry::Class(m)) => m.expand(self, children, attributes),
        }
    }
}

impl Macro {
    /// Build a macro from the token parsed after `--`. Runs the child-count
    /// analysis over the body first.
    pub fn from_definition(mut head: Token, name: String, origin: Origin) -> Self {
        let is_void = count_children(&mut head);
        Macro {
            name,
            body: head.children,
            is_void,
            origin,
        }
    }

    pub fn expand(
        &self,
        scopes: &ScopeStack,
        children: Vec<Node>,
        attributes: Attributes,
    ) -> Result<Vec<Node>, MacroError> {
        self.expand_at(scopes, children, attributes, 0)
    }

    fn expand_at(
        &self,
        scopes: &ScopeStack,
        mut children: Vec<Node>,
        attributes: Attributes,
        depth: usize,
    ) -> Result<Vec<Node>, MacroError> {
        if depth > MAX_EXPANSION_DEPTH {
            return Err(MacroError::TooDeep(self.name.clone()));
        }
        // Popping from the end yields children in declaration order.
        children.reverse();

        let mut substituted = Vec::new();
        for node in &self.body {
            substitute(node, &mut children, &mut substituted);
        }

        let mut roots = Vec::new();
        for node in substituted {
            match node {
                Node::Text(_) => roots.push(node),
                Node::Token(token) => roots.extend(
                    expand_token(token, scopes, depth + 1)
                        .map_err(|e| e.under(&self.name, &self.origin))?,
                ),
            }
        }

        apply_call_attributes(&mut roots, attributes)?;
        Ok(roots)
    }
}

/// Count the `:child`-like placeholders under `token`, recording the count and
/// whether `:children` appears on every non-placeholder node. Returns `true`
/// when nothing in the subtree consumes call-site children.
pub fn count_children(token: &mut Token) -> bool {
    let mut child_count = 0;
    let mut is_void = true;
    let mut wants_children = false;

    for child in token.children.iter_mut() {
        let Node::Token(child) = child else {
            continue;
        };
        match child.kind {
            Kind::Placeholder(Placeholder::Child) | Kind::Placeholder(Placeholder::UnwrapChild) => {
                child_count += 1;
                is_void = false;
            }
            Kind::Placeholder(Placeholder::Children) => {
                wants_children = true;
                is_void = false;
            }
            _ => {
                is_void &= count_children(child);
                wants_children |= child.meta.wants_children;
                // Consumers check their own requirement at expansion time.
                if !matches!(
                    child.kind,
                    Kind::Placeholder(Placeholder::Consume) | Kind::Placeholder(Placeholder::ConsumeAll)
                ) {
                    child_count += child.meta.child_count;
                }
            }
        }
    }

    token.meta.child_count = child_count;
    token.meta.wants_children = wants_children;
    is_void
}

/// Replace placeholders in a copy of `node`, taking call-site children from
/// the end of `remaining`.
fn substitute(node: &Node, remaining: &mut Vec<Node>, out: &mut Vec<Node>) {
    let token = match node {
        Node::Text(_) => {
            out.push(node.clone());
            return;
        }
        Node::Token(token) => token,
    };

    match token.kind {
        Kind::Placeholder(Placeholder::Child) => {
            out.push(remaining.pop().unwrap_or_else(|| Node::text("")));
        }
        Kind::Placeholder(Placeholder::UnwrapChild) => match remaining.pop() {
            Some(Node::Token(popped)) if !popped.children.is_empty() => {
                out.extend(popped.children);
            }
            _ => out.push(Node::text("")),
        },
        Kind::Placeholder(Placeholder::Children) => {
            while let Some(child) = remaining.pop() {
                out.push(child);
            }
        }
        Kind::Placeholder(Placeholder::Consume) => {
            if remaining.len() >= token.meta.child_count {
                substitute_all(&token.children, remaining, out);
            }
        }
        Kind::Placeholder(Placeholder::ConsumeAll) => {
            let per_pass = token.meta.child_count;
            if per_pass == 0 {
                substitute_all(&token.children, remaining, out);
            } else {
                while remaining.len() >= per_pass {
                    substitute_all(&token.children, remaining, out);
                }
            }
        }
        _ => {
            let mut inner = Vec::new();
            substitute_all(&token.children, remaining, &mut inner);
            out.push(Node::Token(token.clone_with_children(inner)));
        }
    }
}

fn substitute_all(nodes: &[Node], remaining: &mut Vec<Node>, out: &mut Vec<Node>) {
    for node in nodes {
        substitute(node, remaining, out);
    }
}

/// Expand macro calls nested in a substituted body, children first.
fn expand_token(mut token: Token, scopes: &ScopeStack, depth: usize) -> Result<Vec<Node>, MacroError> {
    let mut children = Vec::new();
    for child in std::mem::take(&mut token.children) {
        match child {
            Node::Text(_) => children.push(child),
            Node::Token(inner) => children.extend(expand_token(inner, scopes, depth)?),
        }
    }

    let Kind::Macro(name) = &token.kind else {
        token.children = children;
        return Ok(vec![Node::Token(token)]);
    };

    match scopes.lookup(name) {
        None => Err(MacroError::Unknown(name.clone())),
        Some(MacroEntry::Function(function)) => Ok(function(children)),
        Some(MacroEntry::Class(m)) if m.is_void => {
            let mut out = m.expand_at(scopes, Vec::new(), token.attributes, depth)?;
            out.extend(children);
            Ok(out)
        }
        Some(MacroEntry::Class(m)) => m.expand_at(scopes, children, token.attributes, depth),
    }
}

/// Merge call-site attributes onto the root(s) of an expansion.
fn apply_call_attributes(roots: &mut [Node], mut attributes: Attributes) -> Result<(), MacroError> {
    if let Some(id) = attributes.remove("id") {
        match roots {
            [] => {}
            [Node::Token(root)] => root.attributes.set("id", id),
            [Node::Text(_)] => {}
            _ => return Err(MacroError::IdOnMultipleRoots),
        }
    }

    for root in roots.iter_mut() {
        let Node::Token(root) = root else {
            continue;
        };
        for (key, value) in attributes.iter() {
            if is_unique(key) {
                root.attributes.set(key.clone(), value.clone());
            } else {
                root.attributes.merge(key, value.clone());
            }
        }
    }
    Ok(())
}

/// `:root` → `<!DOCTYPE html><html lang="en">…</html>`
fn root_macro() -> Macro {
    let doctype = Token::element("!DOCTYPE").with_attribute("html", AttrValue::Flag);
    let html = Token::element("html")
        .with_attribute("lang", AttrValue::Text("en".to_string()))
        .with_children(vec![Token::element(":children").into()]);
    let head = Token::new(Kind::Element("root".to_string()))
        .with_children(vec![doctype.into(), html.into()]);
    Macro::from_definition(head, "root".to_string(), Origin::builtin())
}

/// `:unwrap` splices each element's children in place of the element.
fn unwrap(children: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::new();
    for child in children {
        match child {
            Node::Token(token) if !matches!(token.kind, Kind::Comment(_)) => {
                out.extend(token.children);
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tag: &str, children: Vec<Node>) -> Node {
        Token::element(tag).with_children(children).into()
    }

    fn placeholder(tag: &str, children: Vec<Node>) -> Node {
        element(tag, children)
    }

    fn define(body: Vec<Node>) -> Macro {
        let head = Token::element("test").with_children(body);
        Macro::from_definition(head, "test".to_string(), Origin::builtin())
    }

    #[test]
    fn child_count_skips_consumers() {
        let m = define(vec![
            placeholder(":child", vec![]),
            placeholder(":consume", vec![placeholder(":child", vec![])]),
            element("p", vec![placeholder(":unwrap-child", vec![])]),
        ]);
        assert!(!m.is_void);
        let Node::Token(consume) = &m.body[1] else {
            panic!("expected token");
        };
        assert_eq!(1, consume.meta.child_count);
    }

    #[test]
    fn macro_without_placeholders_is_void() {
        let m = define(vec![element("p", vec![Node::text("x")])]);
        assert!(m.is_void);
        let m = define(vec![element("div", vec![placeholder(":children", vec![])])]);
        assert!(!m.is_void);
    }

    #[test]
    fn consume_all_repeats_floor_of_available() {
        let m = define(vec![placeholder(
            ":consume-all",
            vec![element(
                "tr",
                vec![placeholder(":child", vec![]), placeholder(":child", vec![])],
            )],
        )]);
        let scopes = ScopeStack::new();
        let children = (1..=5).map(|i| Node::text(i.to_string())).collect();
        let out = m.expand(&scopes, children, Attributes::new()).unwrap();
        assert_eq!(2, out.len());
        assert_eq!(
            vec![Node::text("3"), Node::text("4")],
            out[1].as_token().unwrap().children
        );
    }

    #[test]
    fn expansions_do_not_share_state() {
        let m = define(vec![element("p", vec![placeholder(":child", vec![])])]);
        let scopes = ScopeStack::new();
        let first = m
            .expand(&scopes, vec![Node::text("a")], Attributes::new())
            .unwrap();
        let second = m
            .expand(&scopes, vec![Node::text("b")], Attributes::new())
            .unwrap();
        assert_eq!(vec![Node::text("a")], first[0].as_token().unwrap().children);
        assert_eq!(vec![Node::text("b")], second[0].as_token().unwrap().children);
        let Node::Token(template) = &m.body[0] else {
            panic!("expected token");
        };
        assert_eq!(1, template.children.len());
    }

    #[test]
    fn id_on_multiple_roots_fails() {
        let m = define(vec![element("p", vec![]), element("h1", vec![])]);
        let scopes = ScopeStack::new();
        let mut attrs = Attributes::new();
        attrs.set("id", AttrValue::Text("x".to_string()));
        assert_eq!(
            Err(MacroError::IdOnMultipleRoots),
            m.expand(&scopes, vec![], attrs)
        );
    }

    #[test]
    fn redefinition_must_keep_voidness() {
        let mut scopes = ScopeStack::new();
        scopes.define(define(vec![Node::text("void")])).unwrap();
        scopes.push();
        assert_eq!(
            Err(MacroError::VoidnessMismatch),
            scopes.define(define(vec![placeholder(":child", vec![])]))
        );
        assert!(scopes.define(define(vec![Node::text("inner")])).is_ok());
    }

    #[test]
    fn user_macros_exclude_builtins() {
        let mut scopes = ScopeStack::new();
        scopes.define(define(vec![Node::text("x")])).unwrap();
        let table = scopes.into_user_macros();
        assert_eq!(vec!["test"], table.keys().collect::<Vec<_>>());
    }

    #[test]
    fn self_recursive_macro_is_cut_off() {
        let mut scopes = ScopeStack::new();
        let head = Token::element("loop").with_children(vec![Token::element(":loop").into()]);
        scopes
            .define(Macro::from_definition(head, "loop".to_string(), Origin::builtin()))
            .unwrap();
        let err = scopes.expand_call("loop", Attributes::new(), vec![]).unwrap_err();
        assert!(err.to_string().starts_with("Macro :loop expanded more than"));
    }

    #[test]
    fn unwrap_keeps_text_and_comments() {
        let out = unwrap(vec![
            Node::text("a"),
            element("div", vec![Node::text("b")]),
            Token::comment("c").into(),
        ]);
        assert_eq!(
            vec![Node::text("a"), Node::text("b"), Token::comment("c").into()],
            out
        );
    }
}
