//! Abstract syntax tree for Fern.
//!
//! Four tagged-union node families — `Expr`, `Stmt`, `Pattern`, `TypeExpr` —
//! each carrying a `SourceLoc`. The tree is strictly a DAG from `Program`
//! down to leaves (spec §9: "Back-edges in the AST are not required at
//! this stage"), so ordinary `Box`/`Vec` ownership is sufficient; nothing
//! here needs arena indices or shared ownership.

use crate::source::SourceLoc;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallArg {
    pub label: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithBinding {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElseArm {
    pub pattern: Pattern,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiveArm {
    pub pattern: Pattern,
    pub body: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLit {
        value: i64,
        loc: SourceLoc,
    },
    FloatLit {
        value: f64,
        loc: SourceLoc,
    },
    StringLit {
        value: String,
        loc: SourceLoc,
    },
    BoolLit {
        value: bool,
        loc: SourceLoc,
    },
    Ident {
        name: String,
        loc: SourceLoc,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        loc: SourceLoc,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        loc: SourceLoc,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<CallArg>,
        loc: SourceLoc,
    },
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
        loc: SourceLoc,
    },
    Match {
        scrutinee: Box<Expr>,
        arms: Vec<MatchArm>,
        loc: SourceLoc,
    },
    Block {
        stmts: Vec<Stmt>,
        final_expr: Option<Box<Expr>>,
        loc: SourceLoc,
    },
    List {
        elements: Vec<Expr>,
        loc: SourceLoc,
    },
    Bind {
        name: String,
        value: Box<Expr>,
        loc: SourceLoc,
    },
    With {
        bindings: Vec<WithBinding>,
        body: Box<Expr>,
        else_arms: Option<Vec<ElseArm>>,
        loc: SourceLoc,
    },
    Dot {
        object: Box<Expr>,
        field: String,
        loc: SourceLoc,
    },
    Range {
        start: Box<Expr>,
        end: Box<Expr>,
        inclusive: bool,
        loc: SourceLoc,
    },
    For {
        var_name: String,
        iterable: Box<Expr>,
        body: Box<Expr>,
        loc: SourceLoc,
    },
    While {
        cond: Box<Expr>,
        body: Box<Expr>,
        loc: SourceLoc,
    },
    Loop {
        body: Box<Expr>,
        loc: SourceLoc,
    },
    Lambda {
        params: Vec<String>,
        body: Box<Expr>,
        loc: SourceLoc,
    },
    InterpString {
        parts: Vec<InterpPart>,
        loc: SourceLoc,
    },
    Map {
        entries: Vec<(Expr, Expr)>,
        loc: SourceLoc,
    },
    Tuple {
        elements: Vec<Expr>,
        loc: SourceLoc,
    },
    RecordUpdate {
        base: Box<Expr>,
        fields: Vec<RecordField>,
        loc: SourceLoc,
    },
    ListComp {
        body: Box<Expr>,
        var_name: String,
        iterable: Box<Expr>,
        cond: Option<Box<Expr>>,
        loc: SourceLoc,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        loc: SourceLoc,
    },
    Spawn {
        body: Box<Expr>,
        loc: SourceLoc,
    },
    Send {
        pid: Box<Expr>,
        message: Box<Expr>,
        loc: SourceLoc,
    },
    Receive {
        arms: Vec<ReceiveArm>,
        after_ms: Option<Box<Expr>>,
        after_body: Option<Box<Expr>>,
        loc: SourceLoc,
    },
    Try {
        operand: Box<Expr>,
        loc: SourceLoc,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpPart {
    Text(String),
    Expr(Expr),
}

impl Expr {
    pub fn loc(&self) -> &SourceLoc {
        match self {
            Expr::IntLit { loc, .. }
            | Expr::FloatLit { loc, .. }
            | Expr::StringLit { loc, .. }
            | Expr::BoolLit { loc, .. }
            | Expr::Ident { loc, .. }
            | Expr::Binary { loc, .. }
            | Expr::Unary { loc, .. }
            | Expr::Call { loc, .. }
            | Expr::If { loc, .. }
            | Expr::Match { loc, .. }
            | Expr::Block { loc, .. }
            | Expr::List { loc, .. }
            | Expr::Bind { loc, .. }
            | Expr::With { loc, .. }
            | Expr::Dot { loc, .. }
            | Expr::Range { loc, .. }
            | Expr::For { loc, .. }
            | Expr::While { loc, .. }
            | Expr::Loop { loc, .. }
            | Expr::Lambda { loc, .. }
            | Expr::InterpString { loc, .. }
            | Expr::Map { loc, .. }
            | Expr::Tuple { loc, .. }
            | Expr::RecordUpdate { loc, .. }
            | Expr::ListComp { loc, .. }
            | Expr::Index { loc, .. }
            | Expr::Spawn { loc, .. }
            | Expr::Send { loc, .. }
            | Expr::Receive { loc, .. }
            | Expr::Try { loc, .. } => loc,
        }
    }

    /// A human-readable node-kind name, used by the golden pretty-printer.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::IntLit { .. } => "Int",
            Expr::FloatLit { .. } => "Float",
            Expr::StringLit { .. } => "String",
            Expr::BoolLit { .. } => "Bool",
            Expr::Ident { .. } => "Ident",
            Expr::Binary { .. } => "Binary",
            Expr::Unary { .. } => "Unary",
            Expr::Call { .. } => "Call",
            Expr::If { .. } => "If",
            Expr::Match { .. } => "Match",
            Expr::Block { .. } => "Block",
            Expr::List { .. } => "List",
            Expr::Bind { .. } => "Bind",
            Expr::With { .. } => "With",
            Expr::Dot { .. } => "Dot",
            Expr::Range { .. } => "Range",
            Expr::For { .. } => "For",
            Expr::While { .. } => "While",
            Expr::Loop { .. } => "Loop",
            Expr::Lambda { .. } => "Lambda",
            Expr::InterpString { .. } => "InterpString",
            Expr::Map { .. } => "Map",
            Expr::Tuple { .. } => "Tuple",
            Expr::RecordUpdate { .. } => "RecordUpdate",
            Expr::ListComp { .. } => "ListComp",
            Expr::Index { .. } => "Index",
            Expr::Spawn { .. } => "Spawn",
            Expr::Send { .. } => "Send",
            Expr::Receive { .. } => "Receive",
            Expr::Try { .. } => "Try",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FnBody {
    /// A single-clause function with typed parameters.
    Params {
        params: Vec<(String, Option<TypeExpr>)>,
        body: Box<Expr>,
    },
    /// Successive `fn name(...)` definitions coalesced into clauses
    /// (spec §4.3 "Function clauses").
    Clauses(Vec<FnClause>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnClause {
    pub params: Vec<Pattern>,
    pub guard: Option<Expr>,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let {
        pattern: Pattern,
        type_ann: Option<TypeExpr>,
        value: Expr,
        else_branch: Option<Box<Expr>>,
        loc: SourceLoc,
    },
    Return {
        value: Option<Expr>,
        cond: Option<Expr>,
        loc: SourceLoc,
    },
    ExprStmt {
        expr: Expr,
        loc: SourceLoc,
    },
    Fn {
        name: String,
        is_pub: bool,
        body: FnBody,
        return_type: Option<TypeExpr>,
        where_clause: Option<Vec<String>>,
        loc: SourceLoc,
    },
    Import {
        path: String,
        items: Option<Vec<String>>,
        alias: Option<String>,
        loc: SourceLoc,
    },
    Defer {
        expr: Expr,
        loc: SourceLoc,
    },
    TypeDef {
        name: String,
        is_pub: bool,
        type_params: Vec<String>,
        derives: Vec<String>,
        variants: Option<Vec<(String, Vec<TypeExpr>)>>,
        record_fields: Option<Vec<(String, TypeExpr)>>,
        loc: SourceLoc,
    },
    Break {
        value: Option<Expr>,
        loc: SourceLoc,
    },
    Continue {
        loc: SourceLoc,
    },
    Trait {
        name: String,
        type_params: Vec<String>,
        constraints: Vec<String>,
        methods: Vec<Stmt>,
        loc: SourceLoc,
    },
    Impl {
        trait_name: String,
        type_args: Vec<TypeExpr>,
        methods: Vec<Stmt>,
        loc: SourceLoc,
    },
    Newtype {
        name: String,
        is_pub: bool,
        ctor: String,
        inner: TypeExpr,
        loc: SourceLoc,
    },
    Module {
        path: String,
        loc: SourceLoc,
    },
}

impl Stmt {
    pub fn loc(&self) -> &SourceLoc {
        match self {
            Stmt::Let { loc, .. }
            | Stmt::Return { loc, .. }
            | Stmt::ExprStmt { loc, .. }
            | Stmt::Fn { loc, .. }
            | Stmt::Import { loc, .. }
            | Stmt::Defer { loc, .. }
            | Stmt::TypeDef { loc, .. }
            | Stmt::Break { loc, .. }
            | Stmt::Continue { loc }
            | Stmt::Trait { loc, .. }
            | Stmt::Impl { loc, .. }
            | Stmt::Newtype { loc, .. }
            | Stmt::Module { loc, .. } => loc,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::Let { .. } => "Let",
            Stmt::Return { .. } => "Return",
            Stmt::ExprStmt { .. } => "ExprStmt",
            Stmt::Fn { .. } => "Fn",
            Stmt::Import { .. } => "Import",
            Stmt::Defer { .. } => "Defer",
            Stmt::TypeDef { .. } => "TypeDef",
            Stmt::Break { .. } => "Break",
            Stmt::Continue { .. } => "Continue",
            Stmt::Trait { .. } => "Trait",
            Stmt::Impl { .. } => "Impl",
            Stmt::Newtype { .. } => "Newtype",
            Stmt::Module { .. } => "Module",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Ident { name: String, loc: SourceLoc },
    Wildcard { loc: SourceLoc },
    Lit { value: Box<Expr>, loc: SourceLoc },
    Constructor {
        name: String,
        args: Vec<Pattern>,
        loc: SourceLoc,
    },
    Tuple { elements: Vec<Pattern>, loc: SourceLoc },
    Rest { name: Option<String>, loc: SourceLoc },
}

impl Pattern {
    pub fn loc(&self) -> &SourceLoc {
        match self {
            Pattern::Ident { loc, .. }
            | Pattern::Wildcard { loc }
            | Pattern::Lit { loc, .. }
            | Pattern::Constructor { loc, .. }
            | Pattern::Tuple { loc, .. }
            | Pattern::Rest { loc, .. } => loc,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Pattern::Ident { .. } => "PatIdent",
            Pattern::Wildcard { .. } => "PatWildcard",
            Pattern::Lit { .. } => "PatLit",
            Pattern::Constructor { .. } => "PatConstructor",
            Pattern::Tuple { .. } => "PatTuple",
            Pattern::Rest { .. } => "PatRest",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Named {
        name: String,
        args: Vec<TypeExpr>,
        loc: SourceLoc,
    },
    Function {
        params: Vec<TypeExpr>,
        result: Box<TypeExpr>,
        loc: SourceLoc,
    },
    Tuple {
        elements: Vec<TypeExpr>,
        loc: SourceLoc,
    },
}

impl TypeExpr {
    pub fn loc(&self) -> &SourceLoc {
        match self {
            TypeExpr::Named { loc, .. }
            | TypeExpr::Function { loc, .. }
            | TypeExpr::Tuple { loc, .. } => loc,
        }
    }
}
