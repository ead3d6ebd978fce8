//! SQL front-end: a lexer and a recursive-descent parser, just large enough
//! to drive the engine.
//!
//! Two statement shapes are understood:
//!
//! - `SELECT COUNT(*) FROM <table>`
//! - `SELECT <col> [, <col>]* FROM <table> [WHERE <col> <op> <value>]`
//!
//! plus `CREATE TABLE`, which the schema layer re-parses from the stored
//! `sql` text to recover column positions. Constraint decorations inside the
//! column list are skipped; only names and positions matter.

use crate::error::{Error, Result};

/// Tokens produced by the lexer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Select,
    From,
    Where,
    Count,
    Create,
    Table,
    Primary,
    Key,
    LParen,
    RParen,
    Comma,
    /// `=`, `<` or `>`
    Operator(char),
    /// Bare word: table names, column names, `*`
    Identifier(String),
    /// Single-quoted string, quotes stripped, no escapes
    String(String),
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Identifier(name) => format!("identifier '{name}'"),
            Token::String(s) => format!("string '{s}'"),
            Token::Operator(op) => format!("operator '{op}'"),
            other => format!("{other:?}"),
        }
    }
}

const KEYWORDS: &[(&str, Token)] = &[
    ("SELECT", Token::Select),
    ("FROM", Token::From),
    ("WHERE", Token::Where),
    ("COUNT", Token::Count),
    ("CREATE", Token::Create),
    ("TABLE", Token::Table),
    ("PRIMARY", Token::Primary),
    ("KEY", Token::Key),
];

/// A simple cursor over the input; errors are raised by the parser.
pub struct Lexer<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            position: 0,
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let Some(&c) = self.input.get(self.position) else {
            return Token::Eof;
        };

        match c {
            b'(' => {
                self.position += 1;
                Token::LParen
            }
            b')' => {
                self.position += 1;
                Token::RParen
            }
            b',' => {
                self.position += 1;
                Token::Comma
            }
            b'\'' => self.read_string(),
            b'=' | b'<' | b'>' => {
                self.position += 1;
                Token::Operator(c as char)
            }
            _ => {
                for (keyword, token) in KEYWORDS {
                    if self.match_keyword(keyword) {
                        return token.clone();
                    }
                }
                self.read_identifier()
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self
            .input
            .get(self.position)
            .is_some_and(|c| c.is_ascii_whitespace())
        {
            self.position += 1;
        }
    }

    /// Case-insensitive keyword match with a word-boundary check: the
    /// keyword must not be followed by another identifier character.
    fn match_keyword(&mut self, keyword: &str) -> bool {
        let keyword = keyword.as_bytes();
        let end = self.position + keyword.len();
        if end > self.input.len() {
            return false;
        }

        let candidate = &self.input[self.position..end];
        if !candidate.eq_ignore_ascii_case(keyword) {
            return false;
        }

        if self.input.get(end).is_some_and(|c| c.is_ascii_alphanumeric()) {
            return false;
        }

        self.position = end;
        true
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.position;
        while self
            .input
            .get(self.position)
            .is_some_and(|&c| c.is_ascii_alphanumeric() || c == b'_' || c == b'*')
        {
            self.position += 1;
        }

        // An unrecognised byte would otherwise stall the cursor; hand it to
        // the parser as a one-character identifier to reject.
        if self.position == start {
            self.position += 1;
        }

        Token::Identifier(String::from_utf8_lossy(&self.input[start..self.position]).into_owned())
    }

    fn read_string(&mut self) -> Token {
        self.position += 1; // opening quote
        let start = self.position;
        while self
            .input
            .get(self.position)
            .is_some_and(|&c| c != b'\'')
        {
            self.position += 1;
        }
        let value = String::from_utf8_lossy(&self.input[start..self.position]).into_owned();
        if self.position < self.input.len() {
            self.position += 1; // closing quote
        }
        Token::String(value)
    }
}

/// `WHERE <column> <operator> <value>`
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub column: String,
    pub operator: char,
    pub value: String,
}

/// A parsed `SELECT` statement.
#[derive(Debug, PartialEq)]
pub struct SelectStatement {
    pub table_name: String,
    pub column_names: Vec<String>,
    pub is_count_star: bool,
    pub where_clause: Option<WhereClause>,
}

/// One `name type` pair from a `CREATE TABLE` column list.
#[derive(Debug, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: String,
}

/// A parsed `CREATE TABLE` statement; only column names and their positions
/// are consumed downstream.
#[derive(Debug, PartialEq)]
pub struct CreateTableStatement {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
}

fn expected(what: &str, got: &Token) -> Error {
    Error::syntax(format!("expected {what}, got {}", got.describe()))
}

impl SelectStatement {
    pub fn parse(sql: &str) -> Result<Self> {
        let mut lexer = Lexer::new(sql);

        if lexer.next_token() != Token::Select {
            return Err(Error::syntax("expected SELECT"));
        }

        let mut stmt = SelectStatement {
            table_name: String::new(),
            column_names: Vec::new(),
            is_count_star: false,
            where_clause: None,
        };

        let mut token = lexer.next_token();
        if token == Token::Count {
            stmt.is_count_star = true;
            Self::parse_count_star(&mut lexer)?;
        } else {
            // Column list, terminated by FROM.
            loop {
                match token {
                    Token::Identifier(name) => stmt.column_names.push(name),
                    other => return Err(expected("column name", &other)),
                }

                token = lexer.next_token();
                match token {
                    Token::From => break,
                    Token::Comma => token = lexer.next_token(),
                    other => return Err(expected("',' or FROM", &other)),
                }
            }
        }

        match lexer.next_token() {
            Token::Identifier(name) => stmt.table_name = name,
            other => return Err(expected("table name", &other)),
        }

        if lexer.next_token() == Token::Where {
            stmt.where_clause = Some(Self::parse_where(&mut lexer)?);
        }

        Ok(stmt)
    }

    /// Consumes `( * ) FROM` after the COUNT keyword.
    fn parse_count_star(lexer: &mut Lexer) -> Result<()> {
        match lexer.next_token() {
            Token::LParen => {}
            other => return Err(expected("'(' after COUNT", &other)),
        }
        match lexer.next_token() {
            Token::Identifier(arg) if arg == "*" => {}
            other => return Err(expected("'*' in COUNT(*)", &other)),
        }
        match lexer.next_token() {
            Token::RParen => {}
            other => return Err(expected("')' after '*'", &other)),
        }
        match lexer.next_token() {
            Token::From => Ok(()),
            other => Err(expected("FROM after COUNT(*)", &other)),
        }
    }

    fn parse_where(lexer: &mut Lexer) -> Result<WhereClause> {
        let column = match lexer.next_token() {
            Token::Identifier(name) => name,
            other => return Err(expected("column name in WHERE clause", &other)),
        };

        let operator = match lexer.next_token() {
            Token::Operator(op) => op,
            other => return Err(expected("operator in WHERE clause", &other)),
        };

        let value = match lexer.next_token() {
            Token::Identifier(value) | Token::String(value) => value,
            other => return Err(expected("value in WHERE clause", &other)),
        };

        Ok(WhereClause {
            column,
            operator,
            value,
        })
    }
}

impl CreateTableStatement {
    pub fn parse(sql: &str) -> Result<Self> {
        let mut lexer = Lexer::new(sql);

        // Anything between CREATE and the table name is skipped, as is
        // anything between the name and the opening parenthesis.
        let table_name = loop {
            match lexer.next_token() {
                Token::Identifier(name) => break name,
                Token::Eof => return Err(Error::syntax("expected table name")),
                _ => continue,
            }
        };

        loop {
            match lexer.next_token() {
                Token::LParen => break,
                Token::Eof => return Err(Error::syntax("expected '(' after table name")),
                _ => continue,
            }
        }

        let mut columns = Vec::new();
        loop {
            let token = lexer.next_token();
            if token == Token::RParen || token == Token::Eof {
                break;
            }

            if let Token::Identifier(name) = token {
                let column_type = match lexer.next_token() {
                    Token::Identifier(ty) => ty,
                    other => return Err(expected("column type", &other)),
                };
                columns.push(ColumnDef { name, column_type });

                // Constraint decorations up to the next ',' or ')' are
                // ignored.
                loop {
                    match lexer.next_token() {
                        Token::Comma => break,
                        Token::RParen | Token::Eof => {
                            return Ok(CreateTableStatement {
                                table_name,
                                columns,
                            })
                        }
                        _ => continue,
                    }
                }
            }
        }

        Ok(CreateTableStatement {
            table_name,
            columns,
        })
    }
}
