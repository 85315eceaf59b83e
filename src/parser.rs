//! Pratt-style expression parser, indentation-driven statement parser.
//!
//! Builds the AST described in `ast.rs`. Single-threaded, one token of
//! lookahead for grammar dispatch; the handful of constructs that are
//! genuinely ambiguous on one token (telling a lambda's `(xs) -> e` apart
//! from a parenthesized tuple) resolve themselves with a bounded, pure
//! token-kind scan rather than a full speculative re-parse (see
//! `looks_like_lambda`).
//!
//! Error policy: on an unexpected token the parser enters panic mode
//! (spec §4.3 / §7): it records a diagnostic, sets `had_error`, and skips
//! tokens until a synchronizing point (statement start keyword, `)`, `]`,
//! `}`, DEDENT, or EOF) before resuming. A single parser run can therefore
//! surface more than one diagnostic.

use crate::ast::{
    BinaryOp, CallArg, ElseArm, Expr, FnBody, FnClause, InterpPart, MatchArm, Pattern, Program,
    ReceiveArm, Stmt, TypeExpr, UnaryOp, WithBinding,
};
use crate::diagnostics::Diagnostic;
use crate::lexer::lex;
use crate::source::SourceLoc;
use crate::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

struct FnHeader {
    name: String,
    clause: FnClause,
    param_types: Vec<Option<TypeExpr>>,
    return_type: Option<TypeExpr>,
    where_clause: Option<Vec<String>>,
    is_typed_single: bool,
}

/// Parse a full source file. Always returns the best-effort `Program`
/// alongside every diagnostic collected; an empty diagnostic list means a
/// clean parse.
pub fn parse(source: &str, filename: &str) -> (Program, Vec<Diagnostic>) {
    let tokens = lex(source, filename);
    let mut parser = Parser {
        tokens,
        pos: 0,
        diagnostics: Vec::new(),
    };
    let program = parser.parse_program();
    (program, parser.diagnostics)
}

const SYNCHRONIZING: &[TokenKind] = &[
    TokenKind::Let,
    TokenKind::Fn,
    TokenKind::Return,
    TokenKind::Import,
    TokenKind::Defer,
    TokenKind::Type,
    TokenKind::Trait,
    TokenKind::Impl,
    TokenKind::Newtype,
    TokenKind::Module,
    TokenKind::Break,
    TokenKind::Continue,
    TokenKind::RParen,
    TokenKind::RBracket,
    TokenKind::RBrace,
    TokenKind::Dedent,
    TokenKind::Eof,
];

impl Parser {
    // -- token stream helpers -------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_at(&self, n: usize) -> &Token {
        let i = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[i]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if !self.is_at_end() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Token {
        if self.check(&kind) {
            self.advance()
        } else {
            self.error(format!(
                "expected {}, found `{}`",
                what,
                self.peek().text
            ));
            self.peek().clone()
        }
    }

    /// Skip stray NEWLINE tokens; blocks and statement lists use this to
    /// ignore blank separation without caring about exact counts.
    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        let loc = self.peek().loc.clone();
        self.diagnostics.push(Diagnostic::error(loc, message));
    }

    fn synchronize(&mut self) {
        while !self.is_at_end() && !SYNCHRONIZING.contains(self.peek_kind()) {
            self.advance();
        }
    }

    // -- top level -------------------------------------------------------------

    fn parse_program(&mut self) -> Program {
        let mut fn_names = std::collections::HashSet::new();
        let statements = self.parse_statement_list(&|k| matches!(k, TokenKind::Eof), &mut fn_names);
        Program { statements }
    }

    /// Parse statements until `stop` matches the current token kind.
    /// Handles `fn` clause coalescing across adjacent statements.
    fn parse_statement_list(
        &mut self,
        stop: &dyn Fn(&TokenKind) -> bool,
        fn_names: &mut std::collections::HashSet<String>,
    ) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !self.is_at_end() && !stop(self.peek_kind()) {
            if self.check(&TokenKind::Fn) {
                stmts.push(self.parse_fn_group(fn_names));
            } else {
                stmts.push(self.parse_stmt());
            }
            self.skip_newlines();
        }
        stmts
    }

    // -- statements --------------------------------------------------------------

    fn parse_stmt(&mut self) -> Stmt {
        let result = match self.peek_kind() {
            TokenKind::Let => self.parse_let(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Import => self.parse_import(),
            TokenKind::Defer => self.parse_defer(),
            TokenKind::Type => self.parse_typedef(false),
            TokenKind::Trait => self.parse_trait(),
            TokenKind::Impl => self.parse_impl(),
            TokenKind::Newtype => self.parse_newtype(false),
            TokenKind::Module => self.parse_module(),
            TokenKind::Break => self.parse_break(),
            TokenKind::Continue => {
                let loc = self.advance().loc;
                Stmt::Continue { loc }
            }
            TokenKind::Pub => self.parse_pub(),
            _ => {
                let loc = self.peek().loc.clone();
                let expr = self.parse_expr();
                Stmt::ExprStmt { expr, loc }
            }
        };
        if !self.check(&TokenKind::Newline) && !self.check(&TokenKind::Dedent) && !self.is_at_end() {
            // Statement ran into something unexpected; recover.
            if !self.check(&TokenKind::Eof) {
                self.error(format!(
                    "expected end of statement, found `{}`",
                    self.peek().text
                ));
                self.synchronize();
            }
        }
        result
    }

    fn parse_pub(&mut self) -> Stmt {
        self.advance(); // pub
        match self.peek_kind() {
            TokenKind::Fn => {
                // handled by caller's clause-coalescing logic normally;
                // here we just parse a single pub fn inline.
                let mut names = std::collections::HashSet::new();
                self.parse_fn_group(&mut names)
            }
            TokenKind::Type => self.parse_typedef(true),
            TokenKind::Newtype => self.parse_newtype(true),
            _ => {
                self.error("expected `fn`, `type`, or `newtype` after `pub`");
                let loc = self.peek().loc.clone();
                self.synchronize();
                Stmt::ExprStmt {
                    expr: Expr::Ident {
                        name: "<error>".into(),
                        loc: loc.clone(),
                    },
                    loc,
                }
            }
        }
    }

    fn parse_let(&mut self) -> Stmt {
        let loc = self.advance().loc; // let
        let pattern = self.parse_pattern();
        let type_ann = if self.matches(&TokenKind::Colon) {
            Some(self.parse_type_expr())
        } else {
            None
        };
        self.expect(TokenKind::Eq, "`=`");
        let value = self.parse_expr();
        let else_branch = if self.check(&TokenKind::Else) {
            self.advance();
            self.expect(TokenKind::Colon, "`:`");
            Some(Box::new(self.parse_colon_body()))
        } else {
            None
        };
        Stmt::Let {
            pattern,
            type_ann,
            value,
            else_branch,
            loc,
        }
    }

    fn parse_return(&mut self) -> Stmt {
        let loc = self.advance().loc;
        let value = if self.check(&TokenKind::Newline) || self.check(&TokenKind::If) {
            None
        } else {
            Some(self.parse_expr())
        };
        let cond = if self.matches(&TokenKind::If) {
            Some(self.parse_expr())
        } else {
            None
        };
        Stmt::Return { value, cond, loc }
    }

    fn parse_import(&mut self) -> Stmt {
        let loc = self.advance().loc;
        let path_tok = self.advance();
        let mut path = path_tok.text.clone();
        let items = if self.matches(&TokenKind::LBrace) {
            let mut names = Vec::new();
            if !self.check(&TokenKind::RBrace) {
                loop {
                    names.push(self.expect(TokenKind::Ident, "import item").text);
                    if !self.matches(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RBrace, "`}`");
            Some(names)
        } else {
            None
        };
        // allow dotted/module paths like `std.io`
        while self.matches(&TokenKind::Dot) {
            path.push('.');
            path.push_str(&self.advance().text);
        }
        let alias = if self.matches(&TokenKind::As) {
            Some(self.expect(TokenKind::Ident, "alias name").text)
        } else {
            None
        };
        Stmt::Import {
            path,
            items,
            alias,
            loc,
        }
    }

    fn parse_defer(&mut self) -> Stmt {
        let loc = self.advance().loc;
        let expr = self.parse_expr();
        Stmt::Defer { expr, loc }
    }

    fn parse_break(&mut self) -> Stmt {
        let loc = self.advance().loc;
        let value = if self.check(&TokenKind::Newline) {
            None
        } else {
            Some(self.parse_expr())
        };
        Stmt::Break { value, loc }
    }

    fn parse_module(&mut self) -> Stmt {
        let loc = self.advance().loc;
        let mut path = self.advance().text;
        while self.matches(&TokenKind::Dot) {
            path.push('.');
            path.push_str(&self.advance().text);
        }
        Stmt::Module { path, loc }
    }

    fn parse_newtype(&mut self, is_pub: bool) -> Stmt {
        let loc = self.advance().loc;
        let name = self.expect(TokenKind::Ident, "type name").text;
        self.expect(TokenKind::Eq, "`=`");
        let ctor = self.expect(TokenKind::Ident, "constructor name").text;
        self.expect(TokenKind::LParen, "`(`");
        let inner = self.parse_type_expr();
        self.expect(TokenKind::RParen, "`)`");
        Stmt::Newtype {
            name,
            is_pub,
            ctor,
            inner,
            loc,
        }
    }

    fn parse_typedef(&mut self, is_pub: bool) -> Stmt {
        let loc = self.advance().loc; // type
        let name = self.expect(TokenKind::Ident, "type name").text;
        let mut type_params = Vec::new();
        if self.matches(&TokenKind::LBracket) {
            loop {
                type_params.push(self.expect(TokenKind::Ident, "type parameter").text);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBracket, "`]`");
        }
        let mut derives = Vec::new();
        if self.matches(&TokenKind::Derive) {
            self.expect(TokenKind::LParen, "`(`");
            loop {
                derives.push(self.expect(TokenKind::Ident, "derive name").text);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "`)`");
        }
        self.expect(TokenKind::Eq, "`=`");
        // Either a record `{ field: Type, ... }` or a union of variants
        // `Name(Type, ...) | Name2 | ...`.
        if self.check(&TokenKind::LBrace) {
            self.advance();
            let mut fields = Vec::new();
            while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
                let fname = self.expect(TokenKind::Ident, "field name").text;
                self.expect(TokenKind::Colon, "`:`");
                let fty = self.parse_type_expr();
                fields.push((fname, fty));
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBrace, "`}`");
            Stmt::TypeDef {
                name,
                is_pub,
                type_params,
                derives,
                variants: None,
                record_fields: Some(fields),
                loc,
            }
        } else {
            let mut variants = Vec::new();
            loop {
                let vname = self.expect(TokenKind::Ident, "variant name").text;
                let mut args = Vec::new();
                if self.matches(&TokenKind::LParen) {
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_type_expr());
                            if !self.matches(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen, "`)`");
                }
                variants.push((vname, args));
                if !self.matches(&TokenKind::Bar) {
                    break;
                }
            }
            Stmt::TypeDef {
                name,
                is_pub,
                type_params,
                derives,
                variants: Some(variants),
                record_fields: None,
                loc,
            }
        }
    }

    fn parse_trait(&mut self) -> Stmt {
        let loc = self.advance().loc;
        let name = self.expect(TokenKind::Ident, "trait name").text;
        let mut type_params = Vec::new();
        if self.matches(&TokenKind::LBracket) {
            loop {
                type_params.push(self.expect(TokenKind::Ident, "type parameter").text);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBracket, "`]`");
        }
        let mut constraints = Vec::new();
        if self.matches(&TokenKind::Where) {
            loop {
                constraints.push(self.advance().text);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::Colon, "`:`");
        self.skip_newlines();
        self.expect(TokenKind::Indent, "indented trait body");
        let mut fn_names = std::collections::HashSet::new();
        let methods =
            self.parse_statement_list(&|k| matches!(k, TokenKind::Dedent), &mut fn_names);
        self.expect(TokenKind::Dedent, "end of trait body");
        Stmt::Trait {
            name,
            type_params,
            constraints,
            methods,
            loc,
        }
    }

    fn parse_impl(&mut self) -> Stmt {
        let loc = self.advance().loc;
        let trait_name = self.expect(TokenKind::Ident, "trait name").text;
        let mut type_args = Vec::new();
        if self.matches(&TokenKind::LBracket) {
            loop {
                type_args.push(self.parse_type_expr());
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBracket, "`]`");
        }
        self.expect(TokenKind::Colon, "`:`");
        self.skip_newlines();
        self.expect(TokenKind::Indent, "indented impl body");
        let mut fn_names = std::collections::HashSet::new();
        let methods =
            self.parse_statement_list(&|k| matches!(k, TokenKind::Dedent), &mut fn_names);
        self.expect(TokenKind::Dedent, "end of impl body");
        Stmt::Impl {
            trait_name,
            type_args,
            methods,
            loc,
        }
    }

    /// Parse one or more contiguous `fn NAME` clauses into a single `Fn`
    /// statement (spec §4.3 "Function clauses").
    fn parse_fn_group(&mut self, fn_names: &mut std::collections::HashSet<String>) -> Stmt {
        let loc = self.peek().loc.clone();
        let header = self.parse_fn_header_and_clause();
        let name = header.name.clone();

        if !fn_names.insert(name.clone()) {
            self.error(format!(
                "clauses of function `{}` must be contiguous",
                name
            ));
        }

        if header.is_typed_single {
            let typed_params = header
                .clause
                .params
                .iter()
                .zip(header.param_types.iter())
                .map(|(p, ty)| {
                    let pname = match p {
                        Pattern::Ident { name, .. } => name.clone(),
                        _ => String::new(),
                    };
                    (pname, ty.clone())
                })
                .collect();
            return Stmt::Fn {
                name,
                is_pub: false,
                body: FnBody::Params {
                    params: typed_params,
                    body: Box::new(header.clause.body),
                },
                return_type: header.return_type,
                where_clause: header.where_clause,
                loc,
            };
        }

        let mut clauses = vec![header.clause];
        self.skip_newlines();
        while self.check(&TokenKind::Fn) && self.peek_at(1).text == name {
            let next = self.parse_fn_header_and_clause();
            clauses.push(next.clause);
            self.skip_newlines();
        }
        Stmt::Fn {
            name,
            is_pub: false,
            body: FnBody::Clauses(clauses),
            return_type: None,
            where_clause: None,
            loc,
        }
    }

    /// Parse `fn name(params) [-> Ret] [where ...] [if guard] : body`.
    fn parse_fn_header_and_clause(&mut self) -> FnHeader {
        self.advance(); // fn
        let name = self.expect(TokenKind::Ident, "function name").text;
        self.expect(TokenKind::LParen, "`(`");
        let mut params = Vec::new();
        let mut param_types = Vec::new();
        let mut all_plain_idents = true;
        if !self.check(&TokenKind::RParen) {
            loop {
                let p = self.parse_pattern();
                let ty = if self.matches(&TokenKind::Colon) {
                    Some(self.parse_type_expr())
                } else {
                    if !matches!(p, Pattern::Ident { .. }) {
                        all_plain_idents = false;
                    }
                    None
                };
                param_types.push(ty);
                params.push(p);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)`");
        let return_type = if self.matches(&TokenKind::Arrow) {
            Some(self.parse_type_expr())
        } else {
            None
        };
        let where_clause = if self.matches(&TokenKind::Where) {
            let mut constraints = Vec::new();
            loop {
                constraints.push(self.advance().text);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
            Some(constraints)
        } else {
            None
        };
        let guard = if self.matches(&TokenKind::If) {
            all_plain_idents = false;
            Some(self.parse_expr())
        } else {
            None
        };
        self.expect(TokenKind::Colon, "`:`");
        let body = self.parse_colon_body();
        FnHeader {
            name,
            clause: FnClause {
                params,
                guard,
                body,
            },
            param_types,
            return_type,
            where_clause,
            is_typed_single: all_plain_idents,
        }
    }

    // -- blocks -------------------------------------------------------------------

    /// Parse the body following a `:` — either a same-line expression, or
    /// an indented block of statements producing the value of its final
    /// expression.
    fn parse_colon_body(&mut self) -> Expr {
        if self.check(&TokenKind::Newline) {
            let loc = self.peek().loc.clone();
            self.advance();
            self.expect(TokenKind::Indent, "indented block");
            let (stmts, final_expr) = self.parse_block_contents();
            self.expect(TokenKind::Dedent, "end of block");
            Expr::Block {
                stmts,
                final_expr: final_expr.map(Box::new),
                loc,
            }
        } else {
            self.parse_expr()
        }
    }

    fn parse_block_contents(&mut self) -> (Vec<Stmt>, Option<Expr>) {
        let mut fn_names = std::collections::HashSet::new();
        let mut stmts =
            self.parse_statement_list(&|k| matches!(k, TokenKind::Dedent), &mut fn_names);
        let final_expr = match stmts.last() {
            Some(Stmt::ExprStmt { .. }) => {
                if let Some(Stmt::ExprStmt { expr, .. }) = stmts.pop() {
                    Some(expr)
                } else {
                    None
                }
            }
            _ => None,
        };
        (stmts, final_expr)
    }

    // -- expressions ----------------------------------------------------------------

    fn parse_expr(&mut self) -> Expr {
        self.parse_pipe()
    }

    fn parse_pipe(&mut self) -> Expr {
        let mut left = self.parse_or();
        while self.check(&TokenKind::Pipe) {
            let loc = self.advance().loc;
            let rhs = self.parse_or();
            left = desugar_pipe(left, rhs, loc);
        }
        left
    }

    fn parse_or(&mut self) -> Expr {
        let mut left = self.parse_and();
        while self.check(&TokenKind::Or) {
            let loc = self.advance().loc;
            let right = self.parse_and();
            left = binary(BinaryOp::Or, left, right, loc);
        }
        left
    }

    fn parse_and(&mut self) -> Expr {
        let mut left = self.parse_equality();
        while self.check(&TokenKind::And) {
            let loc = self.advance().loc;
            let right = self.parse_equality();
            left = binary(BinaryOp::And, left, right, loc);
        }
        left
    }

    fn parse_equality(&mut self) -> Expr {
        let mut left = self.parse_comparison();
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::BangEq => BinaryOp::Ne,
                _ => break,
            };
            let loc = self.advance().loc;
            let right = self.parse_comparison();
            left = binary(op, left, right, loc);
        }
        left
    }

    fn parse_comparison(&mut self) -> Expr {
        let mut left = self.parse_additive();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                _ => break,
            };
            let loc = self.advance().loc;
            let right = self.parse_additive();
            left = binary(op, left, right, loc);
        }
        left
    }

    fn parse_additive(&mut self) -> Expr {
        let mut left = self.parse_range();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let loc = self.advance().loc;
            let right = self.parse_range();
            left = binary(op, left, right, loc);
        }
        left
    }

    /// Ranges bind looser than `*`/`/` but we fold them in here, below
    /// comparisons, since spec.md leaves their exact slot undocumented and
    /// this is the only position that doesn't create ambiguity with unary
    /// `-`.
    fn parse_range(&mut self) -> Expr {
        let left = self.parse_multiplicative();
        if self.check(&TokenKind::DotDot) || self.check(&TokenKind::DotDotEq) {
            let inclusive = self.check(&TokenKind::DotDotEq);
            let loc = self.advance().loc;
            let end = self.parse_multiplicative();
            return Expr::Range {
                start: Box::new(left),
                end: Box::new(end),
                inclusive,
                loc,
            };
        }
        left
    }

    fn parse_multiplicative(&mut self) -> Expr {
        let mut left = self.parse_power();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => break,
            };
            let loc = self.advance().loc;
            let right = self.parse_power();
            left = binary(op, left, right, loc);
        }
        left
    }

    fn parse_power(&mut self) -> Expr {
        let left = self.parse_unary();
        if self.check(&TokenKind::StarStar) {
            let loc = self.advance().loc;
            let right = self.parse_power(); // right-assoc
            return binary(BinaryOp::Pow, left, right, loc);
        }
        left
    }

    fn parse_unary(&mut self) -> Expr {
        match self.peek_kind() {
            TokenKind::Minus => {
                let loc = self.advance().loc;
                let operand = self.parse_unary();
                Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                    loc,
                }
            }
            TokenKind::Not => {
                let loc = self.advance().loc;
                let operand = self.parse_unary();
                Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                    loc,
                }
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    let loc = self.advance().loc;
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            let label = if matches!(self.peek_kind(), TokenKind::Ident)
                                && matches!(self.peek_at(1).kind, TokenKind::Colon)
                            {
                                let l = self.advance().text;
                                self.advance(); // colon
                                Some(l)
                            } else {
                                None
                            };
                            let value = self.parse_expr();
                            args.push(CallArg { label, value });
                            if !self.matches(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen, "`)`");
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        loc,
                    };
                }
                TokenKind::LBracket => {
                    let loc = self.advance().loc;
                    let index = self.parse_expr();
                    self.expect(TokenKind::RBracket, "`]`");
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        loc,
                    };
                }
                TokenKind::Dot => {
                    let loc = self.advance().loc;
                    let field = self.advance().text;
                    expr = Expr::Dot {
                        object: Box::new(expr),
                        field,
                        loc,
                    };
                }
                TokenKind::Question => {
                    let loc = self.advance().loc;
                    expr = Expr::Try {
                        operand: Box::new(expr),
                        loc,
                    };
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_primary(&mut self) -> Expr {
        let loc = self.peek().loc.clone();
        match self.peek_kind().clone() {
            TokenKind::Int => {
                let text = self.advance().text;
                Expr::IntLit {
                    value: parse_int_literal(&text),
                    loc,
                }
            }
            TokenKind::Float => {
                let text = self.advance().text;
                Expr::FloatLit {
                    value: text.replace('_', "").parse().unwrap_or(0.0),
                    loc,
                }
            }
            TokenKind::True => {
                self.advance();
                Expr::BoolLit { value: true, loc }
            }
            TokenKind::False => {
                self.advance();
                Expr::BoolLit { value: false, loc }
            }
            TokenKind::String => {
                let text = self.advance().text;
                Expr::StringLit { value: text, loc }
            }
            TokenKind::StringBegin => self.parse_interp_string(),
            TokenKind::Ident => {
                let text = self.advance().text;
                Expr::Ident { name: text, loc }
            }
            TokenKind::LParen => self.parse_paren_or_lambda(),
            TokenKind::LBracket => self.parse_list_or_comprehension(),
            TokenKind::Percent => self.parse_map_literal(),
            TokenKind::If => self.parse_if(),
            TokenKind::Match => self.parse_match(),
            TokenKind::With => self.parse_with(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Loop => self.parse_loop(),
            TokenKind::Spawn => self.parse_spawn(),
            TokenKind::Send => self.parse_send(),
            TokenKind::Receive => self.parse_receive(),
            _ => {
                self.error(format!("unexpected token `{}`", self.peek().text));
                self.synchronize();
                Expr::Ident {
                    name: "<error>".into(),
                    loc,
                }
            }
        }
    }

    /// The lexer already flattens an interpolated string into the ambient
    /// token stream: `StringBegin(prefix)`, the embedded expression's own
    /// tokens, then `StringMid`/`StringEnd` for the next literal chunk.
    /// Parsing it is just alternating text chunks with `parse_expr`.
    fn parse_interp_string(&mut self) -> Expr {
        let begin = self.advance();
        let loc = begin.loc;
        let mut parts = vec![InterpPart::Text(begin.text)];
        loop {
            let expr = self.parse_expr();
            parts.push(InterpPart::Expr(expr));
            match self.peek_kind() {
                TokenKind::StringMid => {
                    let mid = self.advance();
                    parts.push(InterpPart::Text(mid.text));
                }
                TokenKind::StringEnd => {
                    let end = self.advance();
                    parts.push(InterpPart::Text(end.text));
                    break;
                }
                _ => {
                    self.error("malformed interpolated string");
                    break;
                }
            }
        }
        Expr::InterpString { parts, loc }
    }

    fn parse_paren_or_lambda(&mut self) -> Expr {
        let loc = self.peek().loc.clone();
        if self.looks_like_lambda() {
            self.advance(); // (
            let mut params = Vec::new();
            if !self.check(&TokenKind::RParen) {
                loop {
                    params.push(self.expect(TokenKind::Ident, "parameter name").text);
                    if !self.matches(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen, "`)`");
            self.expect(TokenKind::Arrow, "`->`");
            let body = self.parse_expr();
            return Expr::Lambda {
                params,
                body: Box::new(body),
                loc,
            };
        }

        self.advance(); // (
        if self.check(&TokenKind::RParen) {
            self.advance();
            return Expr::Tuple {
                elements: Vec::new(),
                loc,
            };
        }
        let first = self.parse_expr();
        if self.matches(&TokenKind::Comma) {
            let mut elements = vec![first];
            if !self.check(&TokenKind::RParen) {
                loop {
                    elements.push(self.parse_expr());
                    if !self.matches(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen, "`)`");
            Expr::Tuple { elements, loc }
        } else {
            self.expect(TokenKind::RParen, "`)`");
            first
        }
    }

    /// Pure lookahead: does `(` begin a lambda `(a, b) -> expr`? Scans
    /// token kinds only; never mutates parser position.
    fn looks_like_lambda(&self) -> bool {
        debug_assert!(self.check(&TokenKind::LParen));
        let mut i = self.pos + 1;
        if self.tokens[i].kind == TokenKind::RParen {
            return self.tokens.get(i + 1).map(|t| t.kind == TokenKind::Arrow).unwrap_or(false);
        }
        loop {
            match self.tokens.get(i) {
                Some(t) if t.kind == TokenKind::Ident => i += 1,
                _ => return false,
            }
            match self.tokens.get(i) {
                Some(t) if t.kind == TokenKind::Comma => {
                    i += 1;
                    continue;
                }
                Some(t) if t.kind == TokenKind::RParen => {
                    return self
                        .tokens
                        .get(i + 1)
                        .map(|t| t.kind == TokenKind::Arrow)
                        .unwrap_or(false);
                }
                _ => return false,
            }
        }
    }

    fn parse_list_or_comprehension(&mut self) -> Expr {
        let loc = self.advance().loc; // [
        if self.check(&TokenKind::RBracket) {
            self.advance();
            return Expr::List {
                elements: Vec::new(),
                loc,
            };
        }
        let first = self.parse_expr();
        if self.matches(&TokenKind::For) {
            let var_name = self.expect(TokenKind::Ident, "loop variable").text;
            self.expect(TokenKind::In, "`in`");
            let iterable = self.parse_expr();
            let cond = if self.matches(&TokenKind::If) {
                Some(Box::new(self.parse_expr()))
            } else {
                None
            };
            self.expect(TokenKind::RBracket, "`]`");
            return Expr::ListComp {
                body: Box::new(first),
                var_name,
                iterable: Box::new(iterable),
                cond,
                loc,
            };
        }
        let mut elements = vec![first];
        while self.matches(&TokenKind::Comma) {
            if self.check(&TokenKind::RBracket) {
                break;
            }
            elements.push(self.parse_expr());
        }
        self.expect(TokenKind::RBracket, "`]`");
        Expr::List { elements, loc }
    }

    fn parse_map_literal(&mut self) -> Expr {
        let loc = self.advance().loc; // %
        self.expect(TokenKind::LBrace, "`{`");
        let mut entries = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let key = self.parse_expr();
            self.expect(TokenKind::Colon, "`:`");
            let value = self.parse_expr();
            entries.push((key, value));
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "`}`");
        Expr::Map { entries, loc }
    }

    fn parse_if(&mut self) -> Expr {
        let loc = self.advance().loc;
        let cond = self.parse_expr();
        self.expect(TokenKind::Colon, "`:`");
        let then_branch = self.parse_colon_body();
        self.skip_newlines();
        let else_branch = if self.check(&TokenKind::Else) {
            self.advance();
            self.expect(TokenKind::Colon, "`:`");
            Some(Box::new(self.parse_colon_body()))
        } else {
            None
        };
        Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch,
            loc,
        }
    }

    fn parse_match(&mut self) -> Expr {
        let loc = self.advance().loc;
        let scrutinee = self.parse_expr();
        self.expect(TokenKind::Colon, "`:`");
        let block = self.check(&TokenKind::Newline);
        if block {
            self.advance();
            self.expect(TokenKind::Indent, "indented match arms");
        }
        let mut arms = Vec::new();
        loop {
            self.skip_newlines();
            if block {
                if self.check(&TokenKind::Dedent) {
                    break;
                }
            } else if self.check(&TokenKind::Newline) || self.is_at_end() {
                break;
            }
            let pattern = self.parse_pattern();
            let guard = if self.matches(&TokenKind::If) {
                Some(self.parse_expr())
            } else {
                None
            };
            self.expect(TokenKind::Arrow, "`->`");
            let body = self.parse_expr();
            arms.push(MatchArm {
                pattern,
                guard,
                body,
            });
            if !self.matches(&TokenKind::Comma) {
                if !block {
                    break;
                }
            }
        }
        if block {
            self.expect(TokenKind::Dedent, "end of match arms");
        }
        Expr::Match {
            scrutinee: Box::new(scrutinee),
            arms,
            loc,
        }
    }

    fn parse_with(&mut self) -> Expr {
        let loc = self.advance().loc;
        let mut bindings = Vec::new();
        loop {
            let name = self.expect(TokenKind::Ident, "binding name").text;
            self.expect(TokenKind::Bind, "`<-`");
            let value = self.parse_expr();
            bindings.push(WithBinding { name, value });
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Do, "`do`");
        self.expect(TokenKind::Colon, "`:`");
        let body = self.parse_colon_body();
        self.skip_newlines();
        let else_arms = if self.check(&TokenKind::Else) {
            self.advance();
            self.expect(TokenKind::Colon, "`:`");
            self.expect(TokenKind::Newline, "newline");
            self.expect(TokenKind::Indent, "indented else arms");
            let mut arms = Vec::new();
            while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
                self.skip_newlines();
                if self.check(&TokenKind::Dedent) {
                    break;
                }
                let pattern = self.parse_pattern();
                self.expect(TokenKind::Arrow, "`->`");
                let body = self.parse_expr();
                arms.push(ElseArm { pattern, body });
                self.skip_newlines();
            }
            self.expect(TokenKind::Dedent, "end of else arms");
            Some(arms)
        } else {
            None
        };
        Expr::With {
            bindings,
            body: Box::new(body),
            else_arms,
            loc,
        }
    }

    fn parse_for(&mut self) -> Expr {
        let loc = self.advance().loc;
        let var_name = self.expect(TokenKind::Ident, "loop variable").text;
        self.expect(TokenKind::In, "`in`");
        let iterable = self.parse_expr();
        self.expect(TokenKind::Colon, "`:`");
        let body = self.parse_colon_body();
        Expr::For {
            var_name,
            iterable: Box::new(iterable),
            body: Box::new(body),
            loc,
        }
    }

    fn parse_while(&mut self) -> Expr {
        let loc = self.advance().loc;
        let cond = self.parse_expr();
        self.expect(TokenKind::Colon, "`:`");
        let body = self.parse_colon_body();
        Expr::While {
            cond: Box::new(cond),
            body: Box::new(body),
            loc,
        }
    }

    fn parse_loop(&mut self) -> Expr {
        let loc = self.advance().loc;
        self.expect(TokenKind::Colon, "`:`");
        let body = self.parse_colon_body();
        Expr::Loop {
            body: Box::new(body),
            loc,
        }
    }

    fn parse_spawn(&mut self) -> Expr {
        let loc = self.advance().loc;
        let body = self.parse_postfix();
        Expr::Spawn {
            body: Box::new(body),
            loc,
        }
    }

    fn parse_send(&mut self) -> Expr {
        let loc = self.advance().loc;
        self.expect(TokenKind::LParen, "`(`");
        let pid = self.parse_expr();
        self.expect(TokenKind::Comma, "`,`");
        let message = self.parse_expr();
        self.expect(TokenKind::RParen, "`)`");
        Expr::Send {
            pid: Box::new(pid),
            message: Box::new(message),
            loc,
        }
    }

    fn parse_receive(&mut self) -> Expr {
        let loc = self.advance().loc;
        self.expect(TokenKind::Colon, "`:`");
        self.expect(TokenKind::Newline, "newline");
        self.expect(TokenKind::Indent, "indented receive arms");
        let mut arms = Vec::new();
        let mut after_ms = None;
        let mut after_body = None;
        loop {
            self.skip_newlines();
            if self.check(&TokenKind::Dedent) || self.is_at_end() {
                break;
            }
            if self.check(&TokenKind::After) {
                self.advance();
                let ms = self.parse_expr();
                self.expect(TokenKind::Arrow, "`->`");
                let body = self.parse_expr();
                after_ms = Some(Box::new(ms));
                after_body = Some(Box::new(body));
                continue;
            }
            let pattern = self.parse_pattern();
            self.expect(TokenKind::Arrow, "`->`");
            let body = self.parse_expr();
            arms.push(ReceiveArm { pattern, body });
        }
        self.expect(TokenKind::Dedent, "end of receive arms");
        Expr::Receive {
            arms,
            after_ms,
            after_body,
            loc,
        }
    }

    // -- patterns ---------------------------------------------------------------

    fn parse_pattern(&mut self) -> Pattern {
        let loc = self.peek().loc.clone();
        match self.peek_kind().clone() {
            TokenKind::Ident => {
                let name = self.advance().text;
                if name == "_" {
                    return Pattern::Wildcard { loc };
                }
                if self.check(&TokenKind::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_pattern());
                            if !self.matches(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen, "`)`");
                    return Pattern::Constructor { name, args, loc };
                }
                Pattern::Ident { name, loc }
            }
            TokenKind::DotDot | TokenKind::DotDotDot => {
                self.advance();
                let name = if self.check(&TokenKind::Ident) {
                    Some(self.advance().text)
                } else {
                    None
                };
                Pattern::Rest { name, loc }
            }
            TokenKind::LParen => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RParen) {
                    loop {
                        elements.push(self.parse_pattern());
                        if !self.matches(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen, "`)`");
                Pattern::Tuple { elements, loc }
            }
            TokenKind::LBracket => {
                self.advance();
                let mut args = Vec::new();
                if !self.check(&TokenKind::RBracket) {
                    loop {
                        args.push(self.parse_pattern());
                        if !self.matches(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket, "`]`");
                Pattern::Constructor {
                    name: "List".into(),
                    args,
                    loc,
                }
            }
            TokenKind::Int | TokenKind::Float | TokenKind::String | TokenKind::True
            | TokenKind::False => {
                let value = Box::new(self.parse_primary());
                Pattern::Lit { value, loc }
            }
            TokenKind::Minus => {
                let value = Box::new(self.parse_unary());
                Pattern::Lit { value, loc }
            }
            _ => {
                self.error(format!("expected pattern, found `{}`", self.peek().text));
                self.advance();
                Pattern::Wildcard { loc }
            }
        }
    }

    // -- type expressions ---------------------------------------------------------

    fn parse_type_expr(&mut self) -> TypeExpr {
        let loc = self.peek().loc.clone();
        if self.check(&TokenKind::LParen) {
            self.advance();
            let mut elements = Vec::new();
            if !self.check(&TokenKind::RParen) {
                loop {
                    elements.push(self.parse_type_expr());
                    if !self.matches(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen, "`)`");
            if self.matches(&TokenKind::Arrow) {
                let result = Box::new(self.parse_type_expr());
                return TypeExpr::Function {
                    params: elements,
                    result,
                    loc,
                };
            }
            return TypeExpr::Tuple {
                elements,
                loc,
            };
        }
        let name = self.expect(TokenKind::Ident, "type name").text;
        let mut args = Vec::new();
        if self.matches(&TokenKind::LBracket) {
            loop {
                args.push(self.parse_type_expr());
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBracket, "`]`");
        }
        TypeExpr::Named { name, args, loc }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr, loc: SourceLoc) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        loc,
    }
}

/// `a |> f(args)` desugars to `f(a, args)`; `a |> f` desugars to `f(a)`.
fn desugar_pipe(left: Expr, rhs: Expr, loc: SourceLoc) -> Expr {
    match rhs {
        Expr::Call {
            callee,
            mut args,
            loc: call_loc,
        } => {
            args.insert(
                0,
                CallArg {
                    label: None,
                    value: left,
                },
            );
            Expr::Call {
                callee,
                args,
                loc: call_loc,
            }
        }
        other => Expr::Call {
            callee: Box::new(other),
            args: vec![CallArg {
                label: None,
                value: left,
            }],
            loc,
        },
    }
}

fn parse_int_literal(text: &str) -> i64 {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    if let Some(rest) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        i64::from_str_radix(rest, 16).unwrap_or(0)
    } else if let Some(rest) = cleaned.strip_prefix("0b").or_else(|| cleaned.strip_prefix("0B")) {
        i64::from_str_radix(rest, 2).unwrap_or(0)
    } else if let Some(rest) = cleaned.strip_prefix("0o").or_else(|| cleaned.strip_prefix("0O")) {
        i64::from_str_radix(rest, 8).unwrap_or(0)
    } else {
        cleaned.parse().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Program {
        let (program, diagnostics) = parse(src, "<test>");
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);
        program
    }

    #[test]
    fn parses_let_binding() {
        let program = parse_ok("let x = 1\n");
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Stmt::Let { pattern, value, .. } => {
                assert!(matches!(pattern, Pattern::Ident { name, .. } if name == "x"));
                assert!(matches!(value, Expr::IntLit { value: 1, .. }));
            }
            other => panic!("expected Let, got {:?}", other),
        }
    }

    #[test]
    fn parses_match_with_wildcard() {
        let program = parse_ok("match x:\n  1 -> 2\n  _ -> 3\n");
        match &program.statements[0] {
            Stmt::ExprStmt {
                expr: Expr::Match { arms, .. },
                ..
            } => {
                assert_eq!(arms.len(), 2);
                assert!(matches!(arms[1].pattern, Pattern::Wildcard { .. }));
            }
            other => panic!("expected match expr-stmt, got {:?}", other),
        }
    }

    #[test]
    fn parses_list_comprehension() {
        let program = parse_ok("[x * 2 for x in nums if x > 0]\n");
        match &program.statements[0] {
            Stmt::ExprStmt {
                expr: Expr::ListComp { var_name, .. },
                ..
            } => assert_eq!(var_name, "x"),
            other => panic!("expected list comp, got {:?}", other),
        }
    }

    #[test]
    fn coalesces_adjacent_function_clauses() {
        let program = parse_ok("fn f(0):\n  1\nfn f(n):\n  n\n");
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Stmt::Fn {
                name,
                body: FnBody::Clauses(clauses),
                ..
            } => {
                assert_eq!(name, "f");
                assert_eq!(clauses.len(), 2);
            }
            other => panic!("expected coalesced Fn, got {:?}", other),
        }
    }

    #[test]
    fn typed_single_clause_function() {
        let program = parse_ok("fn add(a: Int, b: Int) -> Int:\n  a + b\n");
        match &program.statements[0] {
            Stmt::Fn {
                name,
                body: FnBody::Params { params, .. },
                ..
            } => {
                assert_eq!(name, "add");
                assert_eq!(params.len(), 2);
            }
            other => panic!("expected typed Fn, got {:?}", other),
        }
    }

    #[test]
    fn non_contiguous_clauses_is_an_error() {
        let (_, diagnostics) = parse("fn f(0):\n  1\nfn g():\n  2\nfn f(n):\n  n\n", "<test>");
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn pipe_desugars_to_call() {
        let program = parse_ok("x |> f\n");
        match &program.statements[0] {
            Stmt::ExprStmt {
                expr: Expr::Call { args, .. },
                ..
            } => assert_eq!(args.len(), 1),
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn lambda_vs_tuple_disambiguation() {
        let program = parse_ok("(a, b) -> a + b\n");
        assert!(matches!(
            &program.statements[0],
            Stmt::ExprStmt { expr: Expr::Lambda { .. }, .. }
        ));
        let program2 = parse_ok("(1, 2)\n");
        assert!(matches!(
            &program2.statements[0],
            Stmt::ExprStmt { expr: Expr::Tuple { .. }, .. }
        ));
    }
}
