use indexmap::IndexMap;

/// Elements that may not have contents.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr", "!DOCTYPE", ":child", ":children",
];

/// Elements whose implicit children become `span` instead of `div`.
pub const INLINE_ELEMENTS: &[&str] = &[
    "abbr", "acronym", "audio", "b", "bdi", "bdo", "big", "br", "button", "canvas", "cite",
    "code", "data", "datalist", "del", "dfn", "em", "embed", "i", "iframe", "img", "input",
    "ins", "kbd", "label", "map", "mark", "meter", "noscript", "object", "output", "picture",
    "progress", "q", "ruby", "s", "samp", "script", "select", "slot", "small", "span", "strong",
    "sub", "sup", "svg", "template", "textarea", "time", "u", "tt", "var", "video", "wbr",
];

/// Attributes that hold a single value.
pub const UNIQUE_ATTRIBUTES: &[&str] = &["lang", "id"];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_inline(tag: &str) -> bool {
    INLINE_ELEMENTS.contains(&tag)
}

pub fn is_unique(attribute: &str) -> bool {
    UNIQUE_ATTRIBUTES.contains(&attribute)
}

/// Built-in macro-body nodes that are filled from call-site children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Child,
    Children,
    Consume,
    ConsumeAll,
    UnwrapChild,
}

impl Placeholder {
    pub fn from_tag(tag: &str) -> Option<Placeholder> {
        match tag {
            ":child" => Some(Placeholder::Child),
            ":children" => Some(Placeholder::Children),
            ":consume" => Some(Placeholder::Consume),
            ":consume-all" => Some(Placeholder::ConsumeAll),
            ":unwrap-child" => Some(Placeholder::UnwrapChild),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Placeholder::Child => ":child",
            Placeholder::Children => ":children",
            Placeholder::Consume => ":consume",
            Placeholder::ConsumeAll => ":consume-all",
            Placeholder::UnwrapChild => ":unwrap-child",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Element(String),
    Comment(String),
    Doctype,
    Placeholder(Placeholder),
    /// Invocation of a user or built-in macro, name without the leading `:`.
    Macro(String),
    /// Only produced in lint mode.
    MacroDef(String),
    /// Only produced in lint mode.
    Import {
        path: String,
        namespace: Option<String>,
    },
}

impl Kind {
    /// Classify a tag as written in the selector.
    pub fn from_tag(tag: &str) -> Kind {
        if tag == "!DOCTYPE" {
            return Kind::Doctype;
        }
        if let Some(placeholder) = Placeholder::from_tag(tag) {
            return Kind::Placeholder(placeholder);
        }
        match tag.strip_prefix(':') {
            Some(name) => Kind::Macro(name.to_string()),
            None => Kind::Element(tag.to_string()),
        }
    }

    /// The tag as it would be written in source.
    pub fn tag(&self) -> String {
        match self {
            Kind::Element(name) => name.clone(),
            Kind::Comment(_) => String::new(),
            Kind::Doctype => "!DOCTYPE".to_string(),
            Kind::Placeholder(placeholder) => placeholder.tag().to_string(),
            Kind::Macro(name) => format!(":{name}"),
            Kind::MacroDef(name) => format!("--{name}"),
            Kind::Import { .. } => "@import".to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Kind::Element(_) => "element",
            Kind::Comment(_) => "comment",
            Kind::Doctype => "doctype",
            Kind::Placeholder(_) => "placeholder",
            Kind::Macro(_) => "macro_call",
            Kind::MacroDef(_) => "macro_def",
            Kind::Import { .. } => "import",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Flag-style attribute such as `checked`.
    Flag,
    Text(String),
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Flag => f.write_str("true"),
            AttrValue::Text(value) => f.write_str(value),
        }
    }
}

/// Attribute map that keeps insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(IndexMap<String, AttrValue>);

impl Attributes {
    pub fn new() -> Self {
        Attributes(IndexMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(AttrValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    /// Replace any existing value, keeping the key's position.
    pub fn set(&mut self, key: impl Into<String>, value: AttrValue) {
        self.0.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.0.shift_remove(key)
    }

    /// Accumulate a non-unique value: strings join with a space (classes
    /// without repeats), a string replaces a flag, a flag never replaces a string.
    pub fn merge(&mut self, key: &str, value: AttrValue) {
        let Some(existing) = self.0.get_mut(key) else {
            self.0.insert(key.to_string(), value);
            return;
        };
        let AttrValue::Text(new) = value else {
            return;
        };
        match existing {
            AttrValue::Text(old) if key == "class" => {
                for class in new.split_whitespace() {
                    if !old.split_whitespace().any(|c| c == class) {
                        if !old.is_empty() {
                            old.push(' ');
                        }
                        old.push_str(class);
                    }
                }
            }
            AttrValue::Text(old) => {
                old.push(' ');
                old.push_str(&new);
            }
            AttrValue::Flag => *existing = AttrValue::Text(new),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Bookkeeping that never reaches the HTML output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub void: bool,
    pub implicit: bool,
    /// Body was written with `>` rather than `{ }`.
    pub inline: bool,
    /// `:child`/`:unwrap-child` placeholders required by this subtree; only
    /// computed for macro definitions.
    pub child_count: usize,
    pub wants_children: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: Kind,
    pub attributes: Attributes,
    pub meta: Metadata,
    pub children: Vec<Node>,
}

impl Token {
    pub fn new(kind: Kind) -> Self {
        Token {
            kind,
            attributes: Attributes::new(),
            meta: Metadata::default(),
            children: Vec::new(),
        }
    }

    pub fn element(tag: &str) -> Self {
        let mut token = Token::new(Kind::from_tag(tag));
        token.meta.void = is_void(tag);
        token
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Token::new(Kind::Comment(text.into()))
    }

    pub fn with_attribute(mut self, key: &str, value: AttrValue) -> Self {
        self.attributes.set(key, value);
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// A copy of this token with a different set of children.
    pub fn clone_with_children(&self, children: Vec<Node>) -> Self {
        Token {
            kind: self.kind.clone(),
            attributes: self.attributes.clone(),
            meta: self.meta.clone(),
            children,
        }
    }
}

/// A child entry: either a token or literal (already escaped) text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Token(Token),
    Text(String),
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Node::Token(token) => Some(token),
            Node::Text(_) => None,
        }
    }
}

impl From<Token> for Node {
    fn from(token: Token) -> Self {
        Node::Token(token)
    }
}
