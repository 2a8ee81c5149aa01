use crate::ast::*;
use crate::error::ParseError;

/// Write a JSON-escaped string
fn write_json_string(output: &mut String, s: &str) {
    output.push('"');
    for c in s.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            '\u{00}'..='\u{1f}' => {
                output.push_str(&format!("\\u{:04x}", c as u32));
            }
            _ => output.push(c),
        }
    }
    output.push('"');
}

#[derive(Default)]
pub struct SerializeOptions {
    /// Include the `void`, `implicit` and `inline` flags of each token.
    pub include_meta: bool,
}

/// Serialize a parsed forest as a nested JSON tree
pub fn serialize_tree(nodes: &[Node], source: &str) -> String {
    serialize_tree_with_options(nodes, source, &SerializeOptions::default())
}

pub fn serialize_tree_with_options(nodes: &[Node], source: &str, options: &SerializeOptions) -> String {
    let mut output = String::new();

    output.push_str("{\"type\":\"root\",\"children\":");
    serialize_children(nodes, &mut output, options);
    output.push_str(",\"source\":");
    write_json_string(&mut output, source);
    output.push_str(",\"errors\":[]}");

    output
}

/// Same shape as [`serialize_tree`] for a source that failed to parse.
pub fn serialize_error(error: &ParseError, source: &str) -> String {
    let mut output = String::new();

    output.push_str("{\"type\":\"root\",\"children\":[],\"source\":");
    write_json_string(&mut output, source);
    output.push_str(",\"errors\":[{");
    output.push_str(&format!("\"tag\":\"{}\"", error.kind.name()));
    output.push_str(",\"message\":");
    write_json_string(&mut output, &error.kind.to_string());
    output.push_str(",\"path\":");
    write_json_string(&mut output, &error.path);
    output.push_str(&format!(",\"line\":{},\"column\":{}", error.line, error.column));
    output.push_str("}]}");

    output
}

fn serialize_children(nodes: &[Node], output: &mut String, options: &SerializeOptions) {
    output.push('[');
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            output.push(',');
        }
        serialize_node(node, output, options);
    }
    output.push(']');
}

fn serialize_node(node: &Node, output: &mut String, options: &SerializeOptions) {
    let token = match node {
        Node::Text(text) => {
            output.push_str("{\"type\":\"text\",\"value\":");
            write_json_string(output, text);
            output.push('}');
            return;
        }
        Node::Token(token) => token,
    };

    output.push('{');
    output.push_str(&format!("\"type\":\"{}\"", token.kind.name()));

    match &token.kind {
        Kind::Comment(text) => {
            output.push_str(",\"value\":");
            write_json_string(output, text);
        }
        Kind::Import { path, namespace } => {
            output.push_str(",\"path\":");
            write_json_string(output, path);
            if let Some(namespace) = namespace {
                output.push_str(",\"namespace\":");
                write_json_string(output, namespace);
            }
        }
        Kind::Macro(name) | Kind::MacroDef(name) => {
            output.push_str(",\"name\":");
            write_json_string(output, name);
        }
        Kind::Element(_) | Kind::Doctype | Kind::Placeholder(_) => {
            output.push_str(",\"tag\":");
            write_json_string(output, &token.kind.tag());
        }
    }

    if options.include_meta {
        output.push_str(&format!(
            ",\"void\":{},\"implicit\":{},\"inline\":{}",
            token.meta.void, token.meta.implicit, token.meta.inline
        ));
    }

    if !token.attributes.is_empty() {
        output.push_str(",\"attributes\":{");
        for (i, (key, value)) in token.attributes.iter().enumerate() {
            if i > 0 {
                output.push(',');
            }
            write_json_string(output, key);
            output.push(':');
            match value {
                AttrValue::Flag => output.push_str("true"),
                AttrValue::Text(text) => write_json_string(output, text),
            }
        }
        output.push('}');
    }

    if !token.children.is_empty() {
        output.push_str(",\"children\":");
        serialize_children(&token.children, output, options);
    }

    output.push('}');
}
