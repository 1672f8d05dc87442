//! Import specifier scanning for script modules.
//!
//! A small lexer splits the source into identifiers, string literals, and
//! punctuation while skipping comments, template literals, and regular
//! expression literals. Import forms are then matched on the token stream:
//!
//! - `import x from "a"`, `import "a"`, `export * from "a"`, `require("a")` → sync
//! - `import("a")` → async
//!
//! Only string-literal specifiers are recognized; computed ones are ignored.

use std::path::Path;

use crate::module::DependencyKind;

/// File extensions that are scanned for imports and emitted as script.
pub const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx"];

/// Returns `true` if `path` has a script extension.
pub fn is_script(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}

/// One import found in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImport {
    /// The specifier between the quotes.
    pub specifier: String,
    /// Sync or async.
    pub kind: DependencyKind,
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Ident(&'a str),
    Str(String),
    Punct(u8),
    /// Numbers, templates, and regex literals: operands we never inspect.
    Opaque,
}

/// Keywords after which a `/` starts a regular expression.
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return", "typeof", "case", "do", "else", "in", "instanceof", "new", "delete", "void",
    "throw", "yield", "await",
];

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn run(mut self) -> Vec<Token<'a>> {
        while let Some(b) = self.peek(0) {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment(),
                b'/' if self.regex_allowed() => {
                    self.skip_regex();
                    self.tokens.push(Token::Opaque);
                }
                b'\'' | b'"' => {
                    if let Some(s) = self.read_string(b) {
                        self.tokens.push(Token::Str(s));
                    }
                }
                b'`' => {
                    self.skip_template();
                    self.tokens.push(Token::Opaque);
                }
                b'0'..=b'9' => {
                    while self.peek(0).is_some_and(|c| c.is_ascii_alphanumeric() || c == b'.') {
                        self.pos += 1;
                    }
                    self.tokens.push(Token::Opaque);
                }
                c if is_ident_byte(c) => {
                    let start = self.pos;
                    while self.peek(0).is_some_and(is_ident_byte) {
                        self.pos += 1;
                    }
                    self.tokens.push(Token::Ident(&self.src[start..self.pos]));
                }
                c => {
                    self.pos += 1;
                    self.tokens.push(Token::Punct(c));
                }
            }
        }
        self.tokens
    }

    fn regex_allowed(&self) -> bool {
        match self.tokens.last() {
            None => true,
            Some(Token::Punct(p)) => !matches!(p, b')' | b']' | b'}'),
            Some(Token::Ident(word)) => REGEX_PRECEDING_KEYWORDS.contains(word),
            Some(Token::Str(_) | Token::Opaque) => false,
        }
    }

    fn skip_line_comment(&mut self) {
        while self.peek(0).is_some_and(|c| c != b'\n') {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while let Some(c) = self.peek(0) {
            if c == b'*' && self.peek(1) == Some(b'/') {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }

    /// Reads a quoted string. Returns `None` for a literal broken by a raw
    /// newline (e.g. an apostrophe in JSX text), which is skipped.
    fn read_string(&mut self, quote: u8) -> Option<String> {
        self.pos += 1;
        let mut out = Vec::new();
        while let Some(c) = self.peek(0) {
            match c {
                b'\\' => {
                    if let Some(next) = self.peek(1) {
                        out.push(next);
                    }
                    self.pos += 2;
                }
                b'\n' => return None,
                c if c == quote => {
                    self.pos += 1;
                    return Some(String::from_utf8_lossy(&out).into_owned());
                }
                c => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
        None
    }

    fn skip_template(&mut self) {
        self.pos += 1;
        while let Some(c) = self.peek(0) {
            match c {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.pos += 1;
                    return;
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    self.skip_template_expression();
                }
                _ => self.pos += 1,
            }
        }
    }

    fn skip_template_expression(&mut self) {
        let mut depth = 1usize;
        while let Some(c) = self.peek(0) {
            match c {
                b'{' => {
                    depth += 1;
                    self.pos += 1;
                }
                b'}' => {
                    self.pos += 1;
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                b'\'' | b'"' => {
                    self.read_string(c);
                }
                b'`' => self.skip_template(),
                _ => self.pos += 1,
            }
        }
    }

    fn skip_regex(&mut self) {
        self.pos += 1;
        let mut in_class = false;
        while let Some(c) = self.peek(0) {
            match c {
                b'\\' => self.pos += 2,
                b'\n' => return,
                b'[' => {
                    in_class = true;
                    self.pos += 1;
                }
                b']' => {
                    in_class = false;
                    self.pos += 1;
                }
                b'/' if !in_class => {
                    self.pos += 1;
                    while self.peek(0).is_some_and(|f| f.is_ascii_alphabetic()) {
                        self.pos += 1;
                    }
                    return;
                }
                _ => self.pos += 1,
            }
        }
    }
}

fn is_ident_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$' || c >= 0x80
}

/// Scans script source for import specifiers, in source order.
pub fn scan_imports(source: &str) -> Vec<RawImport> {
    let tokens = Lexer::new(source).run();
    let mut imports = Vec::new();
    let sync = |specifier: &str| RawImport {
        specifier: specifier.to_string(),
        kind: DependencyKind::Sync,
    };

    for i in 0..tokens.len() {
        let after_dot = i > 0 && tokens[i - 1] == Token::Punct(b'.');
        if after_dot {
            continue;
        }
        match (&tokens[i], tokens.get(i + 1), tokens.get(i + 2)) {
            (Token::Ident("import"), Some(Token::Punct(b'(')), Some(Token::Str(s))) => {
                imports.push(RawImport {
                    specifier: s.clone(),
                    kind: DependencyKind::Async,
                });
            }
            (Token::Ident("import"), Some(Token::Str(s)), _) => imports.push(sync(s)),
            (Token::Ident("import"), Some(Token::Punct(b'.' | b'(')), _) => {}
            (Token::Ident("import"), Some(_), _) => {
                if let Some(s) = find_from_clause(&tokens[i + 1..]) {
                    imports.push(sync(s));
                }
            }
            (Token::Ident("export"), Some(Token::Punct(b'*' | b'{')), _) => {
                if let Some(s) = find_from_clause(&tokens[i + 1..]) {
                    imports.push(sync(s));
                }
            }
            (Token::Ident("require"), Some(Token::Punct(b'(')), Some(Token::Str(s))) => {
                if tokens.get(i + 3) == Some(&Token::Punct(b')')) {
                    imports.push(sync(s));
                }
            }
            _ => {}
        }
    }
    imports
}

/// Finds the `from "x"` clause ending an import/export statement, stopping
/// at `;` or at any string not introduced by `from`.
fn find_from_clause<'t>(tokens: &'t [Token<'_>]) -> Option<&'t str> {
    for (j, token) in tokens.iter().enumerate() {
        match token {
            Token::Punct(b';') => return None,
            Token::Str(s) => {
                return (j > 0 && tokens[j - 1] == Token::Ident("from")).then_some(s.as_str());
            }
            _ => {}
        }
    }
    None
}
