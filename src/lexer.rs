//! Lexer for ECMAScript (3rd edition) source code
//!
//! Converts source text into a stream of tokens. Line terminators are tracked
//! so the parser can apply automatic semicolon insertion.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::string_dict::StringDict;
use crate::value::JsString;

/// Source span information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
    /// Line of the last character covered by the span
    pub end_line: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
            end_line: line,
        }
    }

    /// Span covering `self` through `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end.max(self.start),
            line: self.line,
            column: self.column,
            end_line: other.end_line.max(self.line),
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
            end_line: 1,
        }
    }
}

/// Token types for ECMAScript 3
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    String(JsString),
    True,
    False,
    Null,

    Identifier(JsString),

    // Keywords
    Break,
    Case,
    Catch,
    Continue,
    Default,
    Delete,
    Do,
    Else,
    Finally,
    For,
    Function,
    If,
    In,
    Instanceof,
    New,
    Return,
    Switch,
    This,
    Throw,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
    /// Future reserved word that may not be used as an identifier
    Reserved(JsString),

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    PlusPlus,   // ++
    MinusMinus, // --
    Eq,         // =
    EqEq,       // ==
    EqEqEq,     // ===
    BangEq,     // !=
    BangEqEq,   // !==
    Lt,         // <
    LtEq,       // <=
    Gt,         // >
    GtEq,       // >=
    LtLt,       // <<
    GtGt,       // >>
    GtGtGt,     // >>>
    Amp,        // &
    AmpAmp,     // &&
    Pipe,       // |
    PipePipe,   // ||
    Caret,      // ^
    Tilde,      // ~
    Bang,       // !
    Question,   // ?

    // Assignment Operators
    PlusEq,   // +=
    MinusEq,  // -=
    StarEq,   // *=
    SlashEq,  // /=
    PercentEq, // %=
    AmpEq,    // &=
    PipeEq,   // |=
    CaretEq,  // ^=
    LtLtEq,   // <<=
    GtGtEq,   // >>=
    GtGtGtEq, // >>>=

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Dot,       // .
    Comma,     // ,
    Colon,     // :
    Semicolon, // ;

    // Special
    Eof,
    Invalid(char),
    UnterminatedString,
    UnterminatedComment,
}

impl TokenKind {
    /// Source text for punctuators and keywords, used in error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::String(s) => format!("string \"{}\"", s),
            TokenKind::Identifier(name) => format!("identifier '{}'", name),
            TokenKind::Reserved(name) => format!("reserved word '{}'", name),
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Invalid(c) => format!("invalid character '{}'", c),
            TokenKind::UnterminatedString => "unterminated string literal".to_string(),
            TokenKind::UnterminatedComment => "unterminated comment".to_string(),
            other => format!("'{}'", other.text()),
        }
    }

    pub(crate) fn text(&self) -> &'static str {
        match self {
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Break => "break",
            TokenKind::Case => "case",
            TokenKind::Catch => "catch",
            TokenKind::Continue => "continue",
            TokenKind::Default => "default",
            TokenKind::Delete => "delete",
            TokenKind::Do => "do",
            TokenKind::Else => "else",
            TokenKind::Finally => "finally",
            TokenKind::For => "for",
            TokenKind::Function => "function",
            TokenKind::If => "if",
            TokenKind::In => "in",
            TokenKind::Instanceof => "instanceof",
            TokenKind::New => "new",
            TokenKind::Return => "return",
            TokenKind::Switch => "switch",
            TokenKind::This => "this",
            TokenKind::Throw => "throw",
            TokenKind::Try => "try",
            TokenKind::Typeof => "typeof",
            TokenKind::Var => "var",
            TokenKind::Void => "void",
            TokenKind::While => "while",
            TokenKind::With => "with",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::EqEqEq => "===",
            TokenKind::BangEq => "!=",
            TokenKind::BangEqEq => "!==",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::LtLt => "<<",
            TokenKind::GtGt => ">>",
            TokenKind::GtGtGt => ">>>",
            TokenKind::Amp => "&",
            TokenKind::AmpAmp => "&&",
            TokenKind::Pipe => "|",
            TokenKind::PipePipe => "||",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::Bang => "!",
            TokenKind::Question => "?",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::PercentEq => "%=",
            TokenKind::AmpEq => "&=",
            TokenKind::PipeEq => "|=",
            TokenKind::CaretEq => "^=",
            TokenKind::LtLtEq => "<<=",
            TokenKind::GtGtEq => ">>=",
            TokenKind::GtGtGtEq => ">>>=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            _ => "?",
        }
    }
}

/// A token with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn eof(pos: usize, line: u32, column: u32) -> Self {
        Self {
            kind: TokenKind::Eof,
            span: Span::new(pos, pos, line, column),
        }
    }
}

/// Lexer for tokenizing ECMAScript source code
pub struct Lexer<'a> {
    chars: Peekable<CharIndices<'a>>,
    current_pos: usize,
    line: u32,
    column: u32,
    start_pos: usize,
    start_line: u32,
    start_column: u32,
    /// Tracks if we just saw a line terminator (for ASI)
    saw_newline: bool,
    string_dict: &'a mut StringDict,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, string_dict: &'a mut StringDict) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            current_pos: 0,
            line: 1,
            column: 1,
            start_pos: 0,
            start_line: 1,
            start_column: 1,
            saw_newline: false,
            string_dict,
        }
    }

    /// Get mutable reference to the string dictionary for interning
    pub fn string_dict(&mut self) -> &mut StringDict {
        self.string_dict
    }

    /// Get the next token from the source
    pub fn next_token(&mut self) -> Token {
        if let Err(kind) = self.skip_whitespace_and_comments() {
            return Token::new(kind, self.make_span());
        }

        self.start_pos = self.current_pos;
        self.start_line = self.line;
        self.start_column = self.column;

        let Some((_pos, ch)) = self.advance() else {
            return Token::eof(self.current_pos, self.line, self.column);
        };

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,
            '?' => TokenKind::Question,

            '.' => {
                if matches!(self.peek(), Some('0'..='9')) {
                    self.scan_number('.')
                } else {
                    TokenKind::Dot
                }
            }
            '+' => self.scan_operator(&[("++", TokenKind::PlusPlus), ("+=", TokenKind::PlusEq)], TokenKind::Plus),
            '-' => self.scan_operator(
                &[("--", TokenKind::MinusMinus), ("-=", TokenKind::MinusEq)],
                TokenKind::Minus,
            ),
            '*' => self.scan_operator(&[("*=", TokenKind::StarEq)], TokenKind::Star),
            '/' => self.scan_operator(&[("/=", TokenKind::SlashEq)], TokenKind::Slash),
            '%' => self.scan_operator(&[("%=", TokenKind::PercentEq)], TokenKind::Percent),
            '^' => self.scan_operator(&[("^=", TokenKind::CaretEq)], TokenKind::Caret),
            '=' => self.scan_equals(),
            '!' => self.scan_bang(),
            '<' => self.scan_less_than(),
            '>' => self.scan_greater_than(),
            '&' => self.scan_operator(&[("&&", TokenKind::AmpAmp), ("&=", TokenKind::AmpEq)], TokenKind::Amp),
            '|' => self.scan_operator(
                &[("||", TokenKind::PipePipe), ("|=", TokenKind::PipeEq)],
                TokenKind::Pipe,
            ),

            '"' | '\'' => self.scan_string(ch),

            '0'..='9' => self.scan_number(ch),

            '\\' => self.scan_identifier(None),
            c if is_id_start(c) => self.scan_identifier(Some(c)),

            c => TokenKind::Invalid(c),
        };

        Token::new(kind, self.make_span())
    }

    /// Check if there was a line terminator before the current token
    pub fn had_newline_before(&self) -> bool {
        self.saw_newline
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.current_pos = pos + ch.len_utf8();
            match ch {
                '\n' | '\u{2028}' | '\u{2029}' => {
                    self.line += 1;
                    self.column = 1;
                }
                // CR LF counts once, on the LF
                '\r' if self.peek() != Some('\n') => {
                    self.line += 1;
                    self.column = 1;
                }
                _ => self.column += 1,
            }
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn make_span(&self) -> Span {
        Span {
            start: self.start_pos,
            end: self.current_pos,
            line: self.start_line,
            column: self.start_column,
            end_line: self.line,
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), TokenKind> {
        self.saw_newline = false;

        loop {
            match self.peek() {
                Some(c) if is_whitespace(c) => {
                    self.advance();
                }
                Some(c) if is_line_terminator(c) => {
                    self.saw_newline = true;
                    self.advance();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.peek().map(|(_, c)| *c) {
                        Some('/') => {
                            self.advance();
                            self.advance();
                            while let Some(ch) = self.peek() {
                                if is_line_terminator(ch) {
                                    break;
                                }
                                self.advance();
                            }
                        }
                        Some('*') => {
                            self.start_pos = self.current_pos;
                            self.start_line = self.line;
                            self.start_column = self.column;
                            self.advance();
                            self.advance();
                            loop {
                                match self.advance() {
                                    Some((_, '*')) if self.peek() == Some('/') => {
                                        self.advance();
                                        break;
                                    }
                                    // A multi-line comment containing a line terminator
                                    // counts as a line terminator for ASI
                                    Some((_, c)) if is_line_terminator(c) => {
                                        self.saw_newline = true;
                                    }
                                    Some(_) => {}
                                    None => return Err(TokenKind::UnterminatedComment),
                                }
                            }
                        }
                        _ => break,
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Longest match among the given two-character continuations.
    fn scan_operator(&mut self, options: &[(&str, TokenKind)], single: TokenKind) -> TokenKind {
        let next = self.peek();
        for (text, kind) in options {
            if text.chars().nth(1) == next {
                self.advance();
                return kind.clone();
            }
        }
        single
    }

    fn scan_equals(&mut self) -> TokenKind {
        if self.match_char('=') {
            if self.match_char('=') {
                TokenKind::EqEqEq
            } else {
                TokenKind::EqEq
            }
        } else {
            TokenKind::Eq
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        if self.match_char('=') {
            if self.match_char('=') {
                TokenKind::BangEqEq
            } else {
                TokenKind::BangEq
            }
        } else {
            TokenKind::Bang
        }
    }

    fn scan_less_than(&mut self) -> TokenKind {
        if self.match_char('<') {
            if self.match_char('=') {
                TokenKind::LtLtEq
            } else {
                TokenKind::LtLt
            }
        } else if self.match_char('=') {
            TokenKind::LtEq
        } else {
            TokenKind::Lt
        }
    }

    fn scan_greater_than(&mut self) -> TokenKind {
        if self.match_char('>') {
            if self.match_char('>') {
                if self.match_char('=') {
                    TokenKind::GtGtGtEq
                } else {
                    TokenKind::GtGtGt
                }
            } else if self.match_char('=') {
                TokenKind::GtGtEq
            } else {
                TokenKind::GtGt
            }
        } else if self.match_char('=') {
            TokenKind::GtEq
        } else {
            TokenKind::Gt
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();

        loop {
            match self.advance() {
                Some((_, c)) if c == quote => break,
                Some((_, '\\')) => match self.advance() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'b')) => value.push('\x08'),
                    Some((_, 'f')) => value.push('\x0C'),
                    Some((_, 'v')) => value.push('\x0B'),
                    Some((_, c @ '0'..='7')) => {
                        // Legacy octal escape, at most three digits and at most \377
                        let mut code = c.to_digit(8).unwrap_or(0);
                        let max_digits = if c <= '3' { 3 } else { 2 };
                        let mut digits = 1;
                        while digits < max_digits {
                            match self.peek().and_then(|d| d.to_digit(8)) {
                                Some(d) => {
                                    code = code * 8 + d;
                                    self.advance();
                                    digits += 1;
                                }
                                None => break,
                            }
                        }
                        if let Some(ch) = char::from_u32(code) {
                            value.push(ch);
                        }
                    }
                    Some((_, 'x')) => match self.scan_hex_digits(2) {
                        Some(code) => push_code_unit(&mut value, code),
                        None => value.push('x'),
                    },
                    Some((_, 'u')) => match self.scan_hex_digits(4) {
                        Some(code) => push_code_unit(&mut value, code),
                        None => value.push('u'),
                    },
                    Some((_, '\r')) => {
                        self.match_char('\n');
                    }
                    Some((_, c)) if is_line_terminator(c) => {}
                    Some((_, c)) => value.push(c),
                    None => return TokenKind::UnterminatedString,
                },
                Some((_, c)) if is_line_terminator(c) => return TokenKind::UnterminatedString,
                Some((_, c)) => value.push(c),
                None => return TokenKind::UnterminatedString,
            }
        }

        TokenKind::String(self.string_dict.get_or_insert(&value))
    }

    fn scan_hex_digits(&mut self, count: usize) -> Option<u32> {
        let mut lookahead = self.chars.clone();
        let mut code = 0u32;
        for _ in 0..count {
            let (_, ch) = lookahead.next()?;
            code = code * 16 + ch.to_digit(16)?;
        }
        for _ in 0..count {
            self.advance();
        }
        Some(code)
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        let mut num_str = String::new();

        if first == '0' {
            match self.peek() {
                Some('x' | 'X') => {
                    self.advance();
                    let mut value = 0f64;
                    let mut any = false;
                    while let Some(d) = self.peek().and_then(|c| c.to_digit(16)) {
                        value = value * 16.0 + d as f64;
                        any = true;
                        self.advance();
                    }
                    return if any {
                        TokenKind::Number(value)
                    } else {
                        TokenKind::Invalid('x')
                    };
                }
                Some('0'..='7') => {
                    // Legacy octal literal (0777); falls back to decimal on 8 or 9
                    let mut digits = String::from("0");
                    while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
                        digits.push(ch);
                        self.advance();
                    }
                    if digits.chars().all(|c| c.is_digit(8)) {
                        let value = digits
                            .chars()
                            .filter_map(|c| c.to_digit(8))
                            .fold(0f64, |acc, d| acc * 8.0 + d as f64);
                        return TokenKind::Number(value);
                    }
                    return TokenKind::Number(digits.parse().unwrap_or(f64::NAN));
                }
                _ => num_str.push(first),
            }
        } else if first != '.' {
            num_str.push(first);
        }

        if first == '.' {
            num_str.push_str("0.");
        } else {
            while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
                num_str.push(ch);
                self.advance();
            }
            if self.match_char('.') {
                num_str.push('.');
            }
        }

        if num_str.ends_with('.') {
            while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
                num_str.push(ch);
                self.advance();
            }
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            let mut sign = None;
            if let Some(&(_, c @ ('+' | '-'))) = lookahead.peek() {
                sign = Some(c);
                lookahead.next();
            }
            if lookahead.peek().is_some_and(|(_, c)| c.is_ascii_digit()) {
                self.advance();
                num_str.push('e');
                if let Some(c) = sign {
                    self.advance();
                    num_str.push(c);
                }
                while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
                    num_str.push(ch);
                    self.advance();
                }
            }
        }

        // 3in is not a number followed by an identifier
        if self.peek().is_some_and(|c| is_id_start(c) || c.is_ascii_digit()) {
            return TokenKind::Invalid(self.peek().unwrap_or('0'));
        }

        TokenKind::Number(num_str.parse().unwrap_or(f64::NAN))
    }

    fn scan_identifier(&mut self, first: Option<char>) -> TokenKind {
        let mut name = String::new();
        let mut escaped = false;
        match first {
            Some(c) => name.push(c),
            None => match self.scan_identifier_escape() {
                Some(c) if is_id_start(c) => {
                    name.push(c);
                    escaped = true;
                }
                _ => return TokenKind::Invalid('\\'),
            },
        }

        loop {
            match self.peek() {
                Some(ch) if is_id_continue(ch) => {
                    name.push(ch);
                    self.advance();
                }
                Some('\\') => {
                    self.advance();
                    match self.scan_identifier_escape() {
                        Some(c) if is_id_continue(c) => {
                            name.push(c);
                            escaped = true;
                        }
                        _ => return TokenKind::Invalid('\\'),
                    }
                }
                _ => break,
            }
        }

        // Escaped keywords are plain identifiers
        if escaped {
            return TokenKind::Identifier(self.string_dict.get_or_insert(&name));
        }

        match name.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,

            "break" => TokenKind::Break,
            "case" => TokenKind::Case,
            "catch" => TokenKind::Catch,
            "continue" => TokenKind::Continue,
            "default" => TokenKind::Default,
            "delete" => TokenKind::Delete,
            "do" => TokenKind::Do,
            "else" => TokenKind::Else,
            "finally" => TokenKind::Finally,
            "for" => TokenKind::For,
            "function" => TokenKind::Function,
            "if" => TokenKind::If,
            "in" => TokenKind::In,
            "instanceof" => TokenKind::Instanceof,
            "new" => TokenKind::New,
            "return" => TokenKind::Return,
            "switch" => TokenKind::Switch,
            "this" => TokenKind::This,
            "throw" => TokenKind::Throw,
            "try" => TokenKind::Try,
            "typeof" => TokenKind::Typeof,
            "var" => TokenKind::Var,
            "void" => TokenKind::Void,
            "while" => TokenKind::While,
            "with" => TokenKind::With,

            "class" | "const" | "debugger" | "enum" | "export" | "extends" | "import" | "super" => {
                TokenKind::Reserved(self.string_dict.get_or_insert(&name))
            }

            _ => TokenKind::Identifier(self.string_dict.get_or_insert(&name)),
        }
    }

    /// Read the `uXXXX` part of an identifier escape (the backslash is consumed).
    fn scan_identifier_escape(&mut self) -> Option<char> {
        if !self.match_char('u') {
            return None;
        }
        self.scan_hex_digits(4).and_then(char::from_u32)
    }
}

/// Append a UTF-16 code unit; lone surrogates become U+FFFD.
fn push_code_unit(value: &mut String, code: u32) {
    value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
}

pub(crate) fn is_whitespace(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\t' | '\u{000B}' | '\u{000C}' | '\u{00A0}' | '\u{FEFF}'
    ) || (ch as u32 > 127 && ch.is_whitespace() && !is_line_terminator(ch))
}

pub(crate) fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Check if a character can start an identifier
fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphabetic()
}

/// Check if a character can continue an identifier
fn is_id_continue(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphanumeric()
}
