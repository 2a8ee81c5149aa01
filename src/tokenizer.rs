use crate::error::ErrorKind;

/// Characters that open (and close) a string literal.
pub const LITERAL_DELIMITERS: &str = "\"'`";

/// A position over an immutable source buffer.
///
/// Line and column are 1-based and advance with every consumed character; a
/// newline bumps the line and resets the column.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buffer: &'a str,
    index: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Cursor {
            buffer: source,
            index: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Look `n` characters past the current one.
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    pub fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            if self.advance().is_none() {
                break;
            }
        }
    }

    pub fn at_end(&self) -> bool {
        self.index >= self.buffer.len()
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    pub fn is_next_any(&self, set: &str) -> bool {
        self.peek().is_some_and(|c| set.contains(c))
    }

    /// Skip spaces and tabs, and newlines too when `include_newline` is set.
    pub fn skip_blank(&mut self, include_newline: bool) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' => {}
                '\n' if include_newline => {}
                _ => break,
            }
            self.advance();
        }
    }

    /// Consume characters up to (not including) the first one in `stop`.
    pub fn take_until(&mut self, stop: &str) -> &'a str {
        let start = self.index;
        while let Some(c) = self.peek() {
            if stop.contains(c) {
                break;
            }
            self.advance();
        }
        &self.buffer[start..self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    fn rest(&self) -> &'a str {
        &self.buffer[self.index..]
    }
}

/// Replace the reserved HTML characters `<` and `>`.
///
/// Ampersands are left alone so authored entities such as `&amp;` survive.
pub fn escape_entities(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(c),
        }
    }
    output
}

/// Scan a string literal whose opening delimiter is under the cursor.
///
/// A backslash is dropped and makes the following character literal. Newlines
/// are kept only inside backtick literals.
pub fn scan_literal(cursor: &mut Cursor<'_>, escape: bool) -> Result<String, ErrorKind> {
    let Some(delimiter) = cursor.advance() else {
        return Err(ErrorKind::UnclosedString);
    };
    let mut output = String::new();
    let mut escaped = false;

    loop {
        let Some(c) = cursor.peek() else {
            return Err(ErrorKind::UnclosedString);
        };
        if c == '\\' && !escaped {
            escaped = true;
        } else if c == delimiter && !escaped {
            break;
        } else if c == '\n' {
            if delimiter == '`' {
                output.push('\n');
            }
        } else {
            escaped = false;
            output.push(c);
        }
        cursor.advance();
    }
    cursor.advance();

    Ok(if escape {
        escape_entities(&output)
    } else {
        output
    })
}

/// Scan an unquoted attribute value up to whitespace or `]`, honouring
/// backslash escapes. The terminator is left under the cursor.
pub fn scan_bare_value(cursor: &mut Cursor<'_>) -> Result<String, ErrorKind> {
    let mut output = String::new();
    let mut escaped = false;

    loop {
        let Some(c) = cursor.peek() else {
            return Err(ErrorKind::UnclosedAttributes);
        };
        if c == '\\' && !escaped {
            escaped = true;
        } else if " \t\n]".contains(c) && !escaped {
            break;
        } else if c != '\n' {
            escaped = false;
            output.push(c);
        }
        cursor.advance();
    }

    Ok(output)
}

/// Scan a `//` or `/* */` comment starting at the slash under the cursor.
pub fn scan_comment(cursor: &mut Cursor<'_>) -> Result<String, ErrorKind> {
    let multiline = match cursor.peek_nth(1) {
        Some('*') => true,
        Some('/') => false,
        _ => return Err(ErrorKind::InvalidComment),
    };
    cursor.advance_by(2);

    let mut output = String::new();
    loop {
        let Some(c) = cursor.advance() else {
            if multiline {
                return Err(ErrorKind::UnclosedComment);
            }
            break;
        };
        if multiline && c == '*' && cursor.peek() == Some('/') {
            cursor.advance();
            break;
        } else if c == '\n' {
            if !multiline {
                break;
            }
            output.push(c);
        } else {
            output.push(c);
        }
    }

    Ok(output)
}
