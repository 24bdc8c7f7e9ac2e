use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

lazy_static! {
    /// Reserved words, keyed by their lowercase spelling.
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("program", TokenKind::Program);
        map.insert("const", TokenKind::Const);
        map.insert("type", TokenKind::Type);
        map.insert("var", TokenKind::Var);
        map.insert("procedure", TokenKind::Procedure);
        map.insert("function", TokenKind::Function);
        map.insert("begin", TokenKind::Begin);
        map.insert("end", TokenKind::End);
        map.insert("if", TokenKind::If);
        map.insert("then", TokenKind::Then);
        map.insert("else", TokenKind::Else);
        map.insert("while", TokenKind::While);
        map.insert("do", TokenKind::Do);
        map.insert("repeat", TokenKind::Repeat);
        map.insert("until", TokenKind::Until);
        map.insert("for", TokenKind::For);
        map.insert("to", TokenKind::To);
        map.insert("downto", TokenKind::Downto);
        map.insert("case", TokenKind::Case);
        map.insert("of", TokenKind::Of);
        map.insert("otherwise", TokenKind::Otherwise);
        map.insert("array", TokenKind::Array);
        map.insert("record", TokenKind::Record);
        map.insert("div", TokenKind::Div);
        map.insert("mod", TokenKind::Mod);
        map.insert("and", TokenKind::And);
        map.insert("or", TokenKind::Or);
        map.insert("not", TokenKind::Not);
        map.insert("write", TokenKind::Write);
        map.insert("writeln", TokenKind::Writeln);
        map.insert("read", TokenKind::Read);
        map.insert("readln", TokenKind::Readln);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Integer,
    Real,
    String,
    Character,
    Identifier,

    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,

    ColonEquals, // :=
    Equals,      // =
    NotEquals,   // <>
    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    Plus,
    Dash,
    Star,
    Slash,

    Dot,
    DotDot,
    Comma,
    Semicolon,
    Colon,

    // Reserved
    Program,
    Const,
    Type,
    Var,
    Procedure,
    Function,
    Begin,
    End,
    If,
    Then,
    Else,
    While,
    Do,
    Repeat,
    Until,
    For,
    To,
    Downto,
    Case,
    Of,
    Otherwise,
    Array,
    Record,
    Div,
    Mod,
    And,
    Or,
    Not,
    Write,
    Writeln,
    Read,
    Readln,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub line: u32,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token {{\nkind: {},\nvalue: {}}}", self.kind, self.value)
    }
}

impl Token {
    fn is_one_of_many(&self, tokens: &[TokenKind]) -> bool {
        tokens.contains(&self.kind)
    }

    /// One line per token, as printed by the driver's `-tokens` mode.
    pub fn debug_line(&self) -> String {
        if self.is_one_of_many(&[
            TokenKind::String,
            TokenKind::Character,
            TokenKind::Identifier,
            TokenKind::Integer,
            TokenKind::Real,
        ]) {
            format!("{:>4}: {} ({})", self.line, self.kind, self.value)
        } else {
            format!("{:>4}: {} ()", self.line, self.kind)
        }
    }
}
