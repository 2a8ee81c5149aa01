use serde::Deserialize;

use crate::ast::*;

/// Formatting options for [`lint`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LintOptions {
    pub indent: Indent,
    /// Spaces between a selector and its `>` or `{`.
    pub pre_tag_space: usize,
    /// Spaces after `>`, and inside an empty `{ }`.
    pub post_tag_space: usize,
    /// Print the single child of a `>` body on the same line.
    pub inline_same_line: bool,
    /// Leave implicit tags unwritten (`.card` rather than `div.card`).
    pub keep_implicit: bool,
    pub element_preference: ElementPreference,
    /// Print childless elements without any body.
    pub remove_empty: bool,
}

impl Default for LintOptions {
    fn default() -> Self {
        LintOptions {
            indent: Indent::default(),
            pre_tag_space: 1,
            post_tag_space: 1,
            inline_same_line: true,
            keep_implicit: true,
            element_preference: ElementPreference::Preserve,
            remove_empty: false,
        }
    }
}

impl LintOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Indent {
    pub character: String,
    pub count: usize,
}

impl Default for Indent {
    fn default() -> Self {
        Indent {
            character: "\t".to_string(),
            count: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementPreference {
    /// Keep `>` or `{ }` as written.
    #[default]
    Preserve,
    /// Use `>` for every element with exactly one child.
    Arrow,
    /// Always use `{ }`.
    Bracket,
}

#[derive(Clone, Copy)]
struct RenderContext<'a> {
    options: &'a LintOptions,
    depth: usize,
    /// Continuing the parent's line after `>`.
    same_line: bool,
}

/// Pretty-print a forest parsed with `parse_for_lint` back to HBML source.
pub fn lint(nodes: &[Node], options: &LintOptions) -> String {
    let mut output = String::new();
    let ctx = RenderContext {
        options,
        depth: 0,
        same_line: false,
    };
    for node in nodes {
        match node {
            Node::Text(text) => {
                output.push_str(&quote(text));
                output.push('\n');
            }
            Node::Token(token) => render_node(token, &mut output, ctx),
        }
    }
    output
}

fn write_indent(output: &mut String, options: &LintOptions, depth: usize) {
    output.push_str(&options.indent.character.repeat(depth * options.indent.count));
}

fn end_line(output: &mut String, ctx: RenderContext<'_>) {
    if !ctx.same_line {
        output.push('\n');
    }
}

fn render_node(token: &Token, output: &mut String, ctx: RenderContext<'_>) {
    let options = ctx.options;
    if !ctx.same_line {
        write_indent(output, options, ctx.depth);
    }

    match &token.kind {
        Kind::Comment(text) => {
            let text = text.trim();
            if text.contains("*/") && !text.contains('\n') {
                output.push_str("// ");
                output.push_str(text);
            } else {
                output.push_str("/* ");
                output.push_str(text);
                output.push_str(" */");
            }
            end_line(output, ctx);
            return;
        }
        Kind::Import { path, namespace } => {
            output.push_str("@import ");
            output.push_str(path);
            if let Some(namespace) = namespace {
                output.push(' ');
                output.push_str(namespace);
            }
            end_line(output, ctx);
            return;
        }
        _ => {}
    }

    let selector = selector(token, options);
    let children = &token.children;
    let void =
        token.meta.void || (options.remove_empty && children.is_empty() && !selector.is_empty());
    if void {
        output.push_str(&selector);
        end_line(output, ctx);
        return;
    }

    let inline = children.len() == 1
        && match options.element_preference {
            ElementPreference::Preserve => token.meta.inline,
            ElementPreference::Arrow => true,
            ElementPreference::Bracket => false,
        };

    output.push_str(&selector);
    if !selector.is_empty() {
        output.push_str(&" ".repeat(options.pre_tag_space));
    }

    if inline && options.inline_same_line {
        output.push('>');
        output.push_str(&" ".repeat(options.post_tag_space));
        match &children[0] {
            Node::Text(text) => output.push_str(&quote(text)),
            Node::Token(child) => render_node(
                child,
                output,
                RenderContext {
                    same_line: true,
                    ..ctx
                },
            ),
        }
        end_line(output, ctx);
        return;
    }

    output.push(if inline { '>' } else { '{' });
    if !children.is_empty() {
        output.push('\n');
    }
    let child_ctx = RenderContext {
        options,
        depth: ctx.depth + 1,
        same_line: false,
    };
    for child in children {
        match child {
            Node::Text(text) => {
                write_indent(output, options, child_ctx.depth);
                output.push_str(&quote(text));
                output.push('\n');
            }
            Node::Token(child) => render_node(child, output, child_ctx),
        }
    }

    if !inline {
        if children.is_empty() {
            output.push_str(&" ".repeat(options.post_tag_space));
        } else {
            write_indent(output, options, ctx.depth);
        }
        output.push('}');
        end_line(output, ctx);
    }
}

/// `tag#id.class[attributes]`, with ids and classes folded back into
/// selector syntax.
fn selector(token: &Token, options: &LintOptions) -> String {
    let mut out = String::new();
    if !(token.meta.implicit && options.keep_implicit) {
        out.push_str(&token.kind.tag());
    }

    let id = token.attributes.get_text("id").filter(|id| !id.is_empty());
    let class = token.attributes.get_text("class").filter(|class| !class.trim().is_empty());
    if let Some(id) = id {
        out.push('#');
        out.push_str(id);
    }
    if let Some(class) = class {
        out.push('.');
        out.push_str(&class.split_whitespace().collect::<Vec<_>>().join("."));
    }

    let rest: Vec<String> = token
        .attributes
        .iter()
        .filter(|(key, _)| match key.as_str() {
            "id" => id.is_none(),
            "class" => class.is_none(),
            _ => true,
        })
        .map(|(key, value)| match value {
            AttrValue::Flag => key.clone(),
            AttrValue::Text(text) => {
                let mut pair = format!("{key}=\"");
                for c in text.chars() {
                    if c == '\\' || c == '"' {
                        pair.push('\\');
                    }
                    pair.push(c);
                }
                pair.push('"');
                pair
            }
        })
        .collect();
    if !rest.is_empty() {
        out.push('[');
        out.push_str(&rest.join(" "));
        out.push(']');
    }

    out
}

/// Quote a string so it parses back to the same text. Backticks are used when
/// the text spans lines.
fn quote(text: &str) -> String {
    let delimiter = if text.contains('\n') { '`' } else { '"' };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(delimiter);
    for c in text.chars() {
        if c == '\\' || c == delimiter {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(delimiter);
    out
}
