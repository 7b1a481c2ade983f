//! Parser for license metadata records (`.meta_lic` files).
//!
//! The format is a key-value textual protocol: `field: value` scalars,
//! `field { ... }` submessages, repeated fields by repetition. Field order is
//! irrelevant; the order of repeated fields is preserved.

use std::fmt;

/// A parsed license metadata record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseMetadata {
    pub package_name: String,
    pub module_types: Vec<String>,
    pub module_classes: Vec<String>,
    pub projects: Vec<String>,
    pub license_kinds: Vec<String>,
    pub license_conditions: Vec<String>,
    pub license_texts: Vec<String>,
    pub is_container: bool,
    pub is_dependent_module: bool,
    pub built: Vec<String>,
    pub installed: Vec<String>,
    pub install_map: Vec<InstallMap>,
    pub sources: Vec<String>,
    pub deps: Vec<AnnotatedDependency>,
}

/// One `install_map` entry: rewrite outputs under `from_path` to live under
/// `container_path` inside the enclosing container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallMap {
    pub from_path: String,
    pub container_path: String,
}

/// One `deps` entry: the dependency's metadata file plus edge annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotatedDependency {
    pub file: String,
    pub annotations: Vec<String>,
}

/// Parse failure with the 1-based line where it occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataParseError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for MetadataParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for MetadataParseError {}

/// Parses the contents of a license metadata file.
pub fn parse_license_metadata(input: &str) -> Result<LicenseMetadata, MetadataParseError> {
    let mut parser = Parser::new(input);
    let meta = parser.parse_record()?;
    parser.expect_eof()?;
    Ok(meta)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    Colon,
    OpenBrace,
    CloseBrace,
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("identifier {s:?}"),
            Token::Str(_) => "string literal".to_string(),
            Token::Colon => "':'".to_string(),
            Token::OpenBrace => "'{'".to_string(),
            Token::CloseBrace => "'}'".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { chars: input.chars().peekable(), line: 1, peeked: None }
    }

    fn err<T>(&self, message: impl Into<String>) -> Result<T, MetadataParseError> {
        Err(MetadataParseError { line: self.line, message: message.into() })
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                self.line += 1;
                self.chars.next();
            } else if c.is_whitespace() {
                self.chars.next();
            } else if c == '#' {
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.chars.next();
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, MetadataParseError> {
        if let Some(tok) = self.peeked.take() {
            return Ok(tok);
        }
        self.skip_whitespace_and_comments();
        let Some(&c) = self.chars.peek() else {
            return Ok(Token::Eof);
        };
        match c {
            ':' => {
                self.chars.next();
                Ok(Token::Colon)
            }
            '{' => {
                self.chars.next();
                Ok(Token::OpenBrace)
            }
            '}' => {
                self.chars.next();
                Ok(Token::CloseBrace)
            }
            '"' => self.lex_string(),
            c if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' => {
                let mut ident = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                        ident.push(c);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
                Ok(Token::Ident(ident))
            }
            c => self.err(format!("unexpected character {c:?}")),
        }
    }

    fn lex_string(&mut self) -> Result<Token, MetadataParseError> {
        self.chars.next(); // opening quote
        let mut value = String::new();
        loop {
            match self.chars.next() {
                None => return self.err("unterminated string literal"),
                Some('"') => return Ok(Token::Str(value)),
                Some('\n') => return self.err("newline in string literal"),
                Some('\\') => match self.chars.next() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some('\'') => value.push('\''),
                    Some(c) => return self.err(format!("unsupported escape '\\{c}'")),
                    None => return self.err("unterminated string literal"),
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn peek_token(&mut self) -> Result<&Token, MetadataParseError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.next_token()?);
        }
        Ok(self.peeked.as_ref().unwrap())
    }

    fn expect_eof(&mut self) -> Result<(), MetadataParseError> {
        match self.next_token()? {
            Token::Eof => Ok(()),
            tok => self.err(format!("expected end of input, found {}", tok.describe())),
        }
    }

    fn parse_record(&mut self) -> Result<LicenseMetadata, MetadataParseError> {
        let mut meta = LicenseMetadata::default();
        loop {
            let field = match self.next_token()? {
                Token::Eof => return Ok(meta),
                Token::CloseBrace => {
                    // caller handles nesting; a top-level '}' is caught by expect_eof
                    self.peeked = Some(Token::CloseBrace);
                    return Ok(meta);
                }
                Token::Ident(name) => name,
                tok => return self.err(format!("expected field name, found {}", tok.describe())),
            };
            match field.as_str() {
                "package_name" => meta.package_name = self.scalar_string(&field)?,
                "module_types" => meta.module_types.push(self.scalar_string(&field)?),
                "module_classes" => meta.module_classes.push(self.scalar_string(&field)?),
                "projects" => meta.projects.push(self.scalar_string(&field)?),
                "license_kinds" => meta.license_kinds.push(self.scalar_string(&field)?),
                "license_conditions" => meta.license_conditions.push(self.scalar_string(&field)?),
                "license_texts" => meta.license_texts.push(self.scalar_string(&field)?),
                "is_container" => meta.is_container = self.scalar_bool(&field)?,
                "is_dependent_module" => meta.is_dependent_module = self.scalar_bool(&field)?,
                "built" => meta.built.push(self.scalar_string(&field)?),
                "installed" => meta.installed.push(self.scalar_string(&field)?),
                "sources" => meta.sources.push(self.scalar_string(&field)?),
                "install_map" => meta.install_map.push(self.parse_install_map()?),
                "deps" => meta.deps.push(self.parse_dep()?),
                _ => return self.err(format!("unknown field {field:?}")),
            }
        }
    }

    fn scalar_string(&mut self, field: &str) -> Result<String, MetadataParseError> {
        match self.next_token()? {
            Token::Colon => {}
            tok => return self.err(format!("expected ':' after {field}, found {}", tok.describe())),
        }
        match self.next_token()? {
            Token::Str(s) => Ok(s),
            tok => self.err(format!("expected string value for {field}, found {}", tok.describe())),
        }
    }

    fn scalar_bool(&mut self, field: &str) -> Result<bool, MetadataParseError> {
        match self.next_token()? {
            Token::Colon => {}
            tok => return self.err(format!("expected ':' after {field}, found {}", tok.describe())),
        }
        match self.next_token()? {
            Token::Ident(s) if s == "true" => Ok(true),
            Token::Ident(s) if s == "false" => Ok(false),
            tok => self.err(format!("expected true or false for {field}, found {}", tok.describe())),
        }
    }

    /// Consumes an optional ':' then the '{' opening a submessage.
    fn open_block(&mut self, field: &str) -> Result<(), MetadataParseError> {
        let tok = self.next_token()?;
        let tok = if tok == Token::Colon { self.next_token()? } else { tok };
        match tok {
            Token::OpenBrace => Ok(()),
            tok => self.err(format!("expected '{{' after {field}, found {}", tok.describe())),
        }
    }

    fn parse_install_map(&mut self) -> Result<InstallMap, MetadataParseError> {
        self.open_block("install_map")?;
        let mut im = InstallMap::default();
        loop {
            match self.next_token()? {
                Token::CloseBrace => return Ok(im),
                Token::Ident(name) => match name.as_str() {
                    "from_path" => im.from_path = self.scalar_string(&name)?,
                    "container_path" => im.container_path = self.scalar_string(&name)?,
                    _ => return self.err(format!("unknown install_map field {name:?}")),
                },
                tok => return self.err(format!("expected install_map field, found {}", tok.describe())),
            }
        }
    }

    fn parse_dep(&mut self) -> Result<AnnotatedDependency, MetadataParseError> {
        self.open_block("deps")?;
        let mut dep = AnnotatedDependency::default();
        loop {
            match self.next_token()? {
                Token::CloseBrace => return Ok(dep),
                Token::Ident(name) => match name.as_str() {
                    "file" => dep.file = self.scalar_string(&name)?,
                    "annotations" => {
                        let a = self.scalar_string(&name)?;
                        if !a.is_empty() {
                            dep.annotations.push(a);
                        }
                    }
                    _ => return self.err(format!("unknown deps field {name:?}")),
                },
                tok => return self.err(format!("expected deps field, found {}", tok.describe())),
            }
        }
    }
}
