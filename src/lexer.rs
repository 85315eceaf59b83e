//! Indentation-aware tokenizer with string interpolation.
//!
//! Single-threaded, whole-source scan (the lexer's sequence is "lazy" only
//! in the sense that the parser never looks more than one token ahead; we
//! still produce the full `Vec<Token>` up front, same as the teacher's own
//! `parser::tokenize`, because nothing downstream needs streaming).

use crate::source::SourceLoc;
use crate::token::{lookup_keyword, Token, TokenKind};

struct Lexer<'a> {
    filename: String,
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
    indent_stack: Vec<u32>,
    at_line_start: bool,
    line_has_token: bool,
    tokens: Vec<Token>,
}

/// Tokenize a full source file.
pub fn lex(source: &str, filename: &str) -> Vec<Token> {
    let mut lexer = Lexer {
        filename: filename.to_string(),
        source,
        bytes: source.as_bytes(),
        pos: 0,
        line: 1,
        col: 1,
        indent_stack: vec![0],
        at_line_start: true,
        line_has_token: false,
        tokens: Vec::new(),
    };
    lexer.skip_shebang();
    lexer.run();
    lexer.tokens
}

impl<'a> Lexer<'a> {
    fn loc(&self) -> SourceLoc {
        SourceLoc::new(self.filename.clone(), self.line, self.col)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, byte_offset: usize) -> Option<char> {
        self.source.get(self.pos + byte_offset..)?.chars().next()
    }

    /// Consume and return the current character, advancing line/col.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += c.len_utf8() as u32;
        }
        Some(c)
    }

    fn skip_shebang(&mut self) {
        if self.source.starts_with("#!") {
            while let Some(c) = self.peek() {
                if c == '\n' {
                    break;
                }
                self.advance();
            }
        }
    }

    fn push(&mut self, kind: TokenKind, text: impl Into<String>, loc: SourceLoc) {
        self.line_has_token = true;
        self.tokens.push(Token::new(kind, text, loc));
    }

    fn run(&mut self) {
        loop {
            if self.at_line_start {
                if self.handle_line_start() {
                    continue;
                }
                if self.is_at_end() {
                    break;
                }
            }
            if self.is_at_end() {
                break;
            }
            self.scan_token();
        }
        self.finish();
    }

    /// Finish: close out any remaining indentation, then EOF.
    fn finish(&mut self) {
        if self.line_has_token {
            self.push(TokenKind::Newline, "", self.loc());
            self.line_has_token = false;
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(TokenKind::Dedent, "", self.loc());
        }
        self.push(TokenKind::Eof, "", self.loc());
    }

    /// Measure indentation at the start of a logical line. Returns `true`
    /// if the caller should loop back around (blank/comment-only line, or
    /// an indentation change was the only thing on this pass).
    fn handle_line_start(&mut self) -> bool {
        let line_start_loc = self.loc();
        let mut spaces = 0u32;
        let mut tabs = 0u32;
        let mut count = 0u32;
        loop {
            match self.peek() {
                Some(' ') => {
                    spaces += 1;
                    count += 1;
                    self.advance();
                }
                Some('\t') => {
                    tabs += 1;
                    count += 1;
                    self.advance();
                }
                _ => break,
            }
        }

        // A line that is blank, all-whitespace, or comment-only does not
        // affect the indentation stack at all.
        match self.peek() {
            None => {
                self.at_line_start = false;
                return true;
            }
            Some('\n') => {
                self.advance();
                return true;
            }
            Some('#') => {
                self.skip_line_comment();
                if self.peek() == Some('\n') {
                    self.advance();
                }
                return true;
            }
            Some('/') if self.peek_at(1) == Some('*') => {
                self.skip_block_comment();
                // If nothing but trailing whitespace/newline follows, this
                // was a comment-only line.
                let save = self.pos;
                let save_line = self.line;
                let save_col = self.col;
                let mut only_trailing = true;
                loop {
                    match self.peek() {
                        Some(' ') | Some('\t') => {
                            self.advance();
                        }
                        Some('\n') | None => break,
                        _ => {
                            only_trailing = false;
                            break;
                        }
                    }
                }
                if only_trailing {
                    if self.peek() == Some('\n') {
                        self.advance();
                    }
                    return true;
                }
                self.pos = save;
                self.line = save_line;
                self.col = save_col;
            }
            _ => {}
        }

        if spaces > 0 && tabs > 0 {
            self.push(
                TokenKind::Error,
                "mixed tabs and spaces in indentation",
                line_start_loc,
            );
        }

        self.at_line_start = false;
        let top = *self.indent_stack.last().unwrap();
        if count > top {
            self.indent_stack.push(count);
            self.push(TokenKind::Indent, "", line_start_loc);
        } else if count < top {
            while *self.indent_stack.last().unwrap() > count {
                self.indent_stack.pop();
                self.push(TokenKind::Dedent, "", line_start_loc.clone());
            }
            if *self.indent_stack.last().unwrap() != count {
                self.push(TokenKind::Error, "inconsistent dedent", line_start_loc);
            }
        }
        false
    }

    fn skip_line_comment(&mut self) {
        // Caller has confirmed current char is '#'.
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance(); // '/'
        self.advance(); // '*'
        loop {
            match self.peek() {
                None => break,
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn scan_token(&mut self) {
        match self.peek() {
            Some(' ') | Some('\t') => {
                self.advance();
            }
            Some('\n') => {
                self.advance();
                if self.line_has_token {
                    self.push(TokenKind::Newline, "", self.loc());
                    self.line_has_token = false;
                }
                self.at_line_start = true;
            }
            Some('#') => self.skip_line_comment(),
            Some('/') if self.peek_at(1) == Some('*') => self.skip_block_comment(),
            Some('"') => self.lex_string(),
            Some(c) if c.is_ascii_digit() => self.lex_number(),
            Some(c) if is_ident_start(c) => self.lex_ident(),
            Some(_) => self.lex_operator(),
            None => {}
        }
    }

    fn lex_ident(&mut self) {
        let loc = self.loc();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.source[start..self.pos];
        let kind = lookup_keyword(text).unwrap_or(TokenKind::Ident);
        self.push(kind, text, loc);
    }

    fn lex_number(&mut self) {
        let loc = self.loc();
        let start = self.pos;
        if self.peek() == Some('0') {
            match self.peek_at(1) {
                Some('x') | Some('X') => {
                    self.advance();
                    self.advance();
                    self.consume_while(|c| c.is_ascii_hexdigit() || c == '_');
                    let text = &self.source[start..self.pos];
                    self.push(TokenKind::Int, text, loc);
                    return;
                }
                Some('b') | Some('B') => {
                    self.advance();
                    self.advance();
                    self.consume_while(|c| c == '0' || c == '1' || c == '_');
                    let text = &self.source[start..self.pos];
                    self.push(TokenKind::Int, text, loc);
                    return;
                }
                Some('o') | Some('O') => {
                    self.advance();
                    self.advance();
                    self.consume_while(|c| ('0'..='7').contains(&c) || c == '_');
                    let text = &self.source[start..self.pos];
                    self.push(TokenKind::Int, text, loc);
                    return;
                }
                _ => {}
            }
        }
        self.consume_while(|c| c.is_ascii_digit() || c == '_');
        let mut is_float = false;
        if self.peek() == Some('.') {
            if let Some(next) = self.peek_at(1) {
                if next.is_ascii_digit() {
                    is_float = true;
                    self.advance(); // '.'
                    self.consume_while(|c| c.is_ascii_digit() || c == '_');
                }
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut lookahead = 1;
            if matches!(self.peek_at(lookahead), Some('+') | Some('-')) {
                lookahead += 1;
            }
            if matches!(self.peek_at(lookahead), Some(c) if c.is_ascii_digit()) {
                is_float = true;
                self.advance(); // e/E
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.advance();
                }
                self.consume_while(|c| c.is_ascii_digit());
            }
        }
        let text = &self.source[start..self.pos];
        self.push(
            if is_float { TokenKind::Float } else { TokenKind::Int },
            text,
            loc,
        );
    }

    fn consume_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if pred(c) {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Scan a (possibly triple-quoted) string literal, recursively lexing
    /// any `{expr}` interpolations in place. Emits either a single STRING
    /// token, or a STRING_BEGIN / (tokens)* STRING_MID (tokens)* STRING_END
    /// sequence.
    fn lex_string(&mut self) {
        let start_loc = self.loc();
        let triple = self.source[self.pos..].starts_with("\"\"\"");
        if triple {
            self.advance();
            self.advance();
            self.advance();
        } else {
            self.advance(); // opening quote
        }

        let mut buf = String::new();
        let mut begun = false; // have we emitted a BEGIN yet?

        loop {
            match self.peek() {
                None => {
                    self.push(TokenKind::Error, "unterminated string literal", start_loc.clone());
                    return;
                }
                Some('"') if !triple => {
                    self.advance();
                    break;
                }
                Some('"') if triple && self.source[self.pos..].starts_with("\"\"\"") => {
                    self.advance();
                    self.advance();
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some('n') => {
                            buf.push('\n');
                            self.advance();
                        }
                        Some('t') => {
                            buf.push('\t');
                            self.advance();
                        }
                        Some('"') => {
                            buf.push('"');
                            self.advance();
                        }
                        Some('\\') => {
                            buf.push('\\');
                            self.advance();
                        }
                        Some('{') => {
                            buf.push('{');
                            self.advance();
                        }
                        Some('}') => {
                            buf.push('}');
                            self.advance();
                        }
                        Some(other) => {
                            buf.push(other);
                            self.advance();
                        }
                        None => {
                            self.push(
                                TokenKind::Error,
                                "unterminated escape sequence",
                                start_loc.clone(),
                            );
                            return;
                        }
                    }
                }
                Some('{') => {
                    self.advance();
                    let kind = if begun {
                        TokenKind::StringMid
                    } else {
                        TokenKind::StringBegin
                    };
                    let loc = if begun { self.loc() } else { start_loc.clone() };
                    self.push(kind, buf.clone(), loc);
                    buf.clear();
                    begun = true;
                    self.lex_interpolation_expr();
                }
                Some(c) => {
                    buf.push(c);
                    self.advance();
                }
            }
        }

        if begun {
            self.push(TokenKind::StringEnd, buf, self.loc());
        } else {
            self.push(TokenKind::String, buf, start_loc);
        }
    }

    /// Lex tokens for an embedded `{ ... }` expression until the matching
    /// close brace, tracking nested plain braces locally. Recurses into
    /// `lex_string` for nested string literals, and into `lex_interpolation_expr`
    /// transitively whenever those strings carry their own interpolation.
    fn lex_interpolation_expr(&mut self) {
        let mut depth: u32 = 0;
        loop {
            match self.peek() {
                None => {
                    self.push(
                        TokenKind::Error,
                        "unterminated string interpolation",
                        self.loc(),
                    );
                    return;
                }
                Some('}') if depth == 0 => {
                    self.advance();
                    return;
                }
                Some('}') => {
                    depth -= 1;
                    let loc = self.loc();
                    self.advance();
                    self.push(TokenKind::RBrace, "}", loc);
                }
                Some('{') => {
                    depth += 1;
                    let loc = self.loc();
                    self.advance();
                    self.push(TokenKind::LBrace, "{", loc);
                }
                Some('"') => self.lex_string(),
                Some(' ') | Some('\t') => {
                    self.advance();
                }
                Some('\n') => {
                    self.advance();
                }
                Some(c) if c.is_ascii_digit() => self.lex_number(),
                Some(c) if is_ident_start(c) => self.lex_ident(),
                Some(_) => self.lex_operator(),
            }
        }
    }

    fn lex_operator(&mut self) {
        let loc = self.loc();
        let rest = &self.source[self.pos..];
        // Maximal munch, longest match first.
        const THREE: &[(&str, TokenKind)] = &[
            ("..=", TokenKind::DotDotEq),
            ("...", TokenKind::DotDotDot),
        ];
        const TWO: &[(&str, TokenKind)] = &[
            ("<-", TokenKind::Bind),
            ("<=", TokenKind::Le),
            (">=", TokenKind::Ge),
            ("==", TokenKind::EqEq),
            ("!=", TokenKind::BangEq),
            ("**", TokenKind::StarStar),
            ("=>", TokenKind::FatArrow),
            ("->", TokenKind::Arrow),
            ("|>", TokenKind::Pipe),
            ("..", TokenKind::DotDot),
        ];
        const ONE: &[(char, TokenKind)] = &[
            ('+', TokenKind::Plus),
            ('-', TokenKind::Minus),
            ('*', TokenKind::Star),
            ('/', TokenKind::Slash),
            ('%', TokenKind::Percent),
            ('<', TokenKind::Lt),
            ('>', TokenKind::Gt),
            ('=', TokenKind::Eq),
            ('|', TokenKind::Bar),
            ('.', TokenKind::Dot),
            (',', TokenKind::Comma),
            (':', TokenKind::Colon),
            ('?', TokenKind::Question),
            ('(', TokenKind::LParen),
            (')', TokenKind::RParen),
            ('[', TokenKind::LBracket),
            (']', TokenKind::RBracket),
            ('{', TokenKind::LBrace),
            ('}', TokenKind::RBrace),
        ];

        for (lit, kind) in THREE {
            if rest.starts_with(*lit) {
                for _ in 0..3 {
                    self.advance();
                }
                self.push(kind.clone(), *lit, loc);
                return;
            }
        }
        for (lit, kind) in TWO {
            if rest.starts_with(*lit) {
                for _ in 0..2 {
                    self.advance();
                }
                self.push(kind.clone(), *lit, loc);
                return;
            }
        }
        let c = self.peek().unwrap();
        for (lit, kind) in ONE {
            if c == *lit {
                self.advance();
                self.push(kind.clone(), c.to_string(), loc);
                return;
            }
        }
        self.advance();
        self.push(TokenKind::Error, c.to_string(), loc);
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src, "<test>").into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_let_binding() {
        let ks = kinds("let x = 1");
        assert_eq!(
            ks,
            vec![
                TokenKind::Let,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Int,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn maximal_munch_prefers_longer_operators() {
        assert_eq!(kinds("<-")[0], TokenKind::Bind);
        assert_eq!(kinds("<=")[0], TokenKind::Le);
        assert_eq!(kinds("<")[0], TokenKind::Lt);
        assert_eq!(kinds("..=")[0], TokenKind::DotDotEq);
        assert_eq!(kinds("...")[0], TokenKind::DotDotDot);
        assert_eq!(kinds("..")[0], TokenKind::DotDot);
        assert_eq!(kinds("**")[0], TokenKind::StarStar);
        assert_eq!(kinds("=>")[0], TokenKind::FatArrow);
        assert_eq!(kinds("->")[0], TokenKind::Arrow);
        assert_eq!(kinds("|>")[0], TokenKind::Pipe);
    }

    #[test]
    fn indentation_produces_indent_and_dedent() {
        let src = "fn f:\n  1\nfn g:\n  2\n";
        let ks = kinds(src);
        assert!(ks.contains(&TokenKind::Indent));
        assert!(ks.contains(&TokenKind::Dedent));
    }

    #[test]
    fn hyphen_does_not_continue_an_identifier() {
        // `n-1` must lex as three tokens (Ident, Minus, Int), not a single
        // `Ident("n-1")`, or the common `fib(n-1) + fib(n-2)` idiom breaks.
        let tokens = lex("n-1", "<test>");
        assert_eq!(
            tokens.iter().map(|t| t.kind.clone()).collect::<Vec<_>>(),
            vec![
                TokenKind::Ident,
                TokenKind::Minus,
                TokenKind::Int,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[0].text, "n");
    }

    #[test]
    fn mixed_tabs_and_spaces_is_an_error() {
        let src = " \tx";
        let ks = kinds(src);
        assert!(ks.contains(&TokenKind::Error));
    }

    #[test]
    fn blank_and_comment_lines_do_not_affect_indentation() {
        let src = "fn f:\n  1\n\n  # just a comment\n  2\n";
        let ks = kinds(src);
        // Only one INDENT, no spurious DEDENT/INDENT pairs from the blank
        // or comment-only lines.
        assert_eq!(ks.iter().filter(|k| **k == TokenKind::Indent).count(), 1);
    }

    #[test]
    fn simple_string_is_a_single_token() {
        let ks = kinds("\"hello\"");
        assert_eq!(ks[0], TokenKind::String);
    }

    #[test]
    fn interpolated_string_splits_into_fragments() {
        let ks = kinds("\"a{x}b\"");
        assert_eq!(
            ks,
            vec![
                TokenKind::StringBegin,
                TokenKind::Ident,
                TokenKind::StringEnd,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn nested_braces_inside_interpolation_are_tracked() {
        let ks = kinds("\"{ %{1: 2} }\"");
        assert!(ks.contains(&TokenKind::LBrace));
        assert!(ks.contains(&TokenKind::RBrace));
        assert_eq!(ks.last().cloned().unwrap_or(TokenKind::Error), TokenKind::Eof);
    }

    #[test]
    fn hex_binary_octal_and_float_literals() {
        assert_eq!(kinds("0xFF")[0], TokenKind::Int);
        assert_eq!(kinds("0b101")[0], TokenKind::Int);
        assert_eq!(kinds("0o17")[0], TokenKind::Int);
        assert_eq!(kinds("3.14")[0], TokenKind::Float);
        assert_eq!(kinds("1e10")[0], TokenKind::Float);
        assert_eq!(kinds("1")[0], TokenKind::Int);
    }

    #[test]
    fn unexpected_character_emits_error_and_continues() {
        let ks = kinds("1 ~ 2");
        assert!(ks.contains(&TokenKind::Error));
        assert!(ks.contains(&TokenKind::Int));
    }
}
