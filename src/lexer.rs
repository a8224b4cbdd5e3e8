use crate::error::{MmtError, Span};
use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Comment,

    // Keywords
    Program,
    ExitProcess,
    Declare,
    IntegerType,
    FloatType,
    StringType,
    ArrayType,
    ObjectType,
    Const,
    BooleanType,
    Null,
    Convert,
    Length,
    Pop,
    Push,
    Insert,
    Erase,
    Be,
    Assign,
    As,
    Root,
    True,
    False,
    Ln,
    Not,
    Or,
    And,
    Xor,
    Input,
    Print,
    If,
    From,
    Until,
    Step,
    While,
    For,
    Do,
    Break,
    Continue,
    Elif,
    Else,
    Void,
    Return,
    Import,
    Export,

    // Punctuation and operators
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    Arrow,
    Increment,
    Plus,
    Decrement,
    Minus,
    Power,
    Star,
    SlashSlash,
    Slash,
    Percent,
    ShiftLeft,
    ShiftRight,
    Equal,
    BangEqual,
    GreaterEqual,
    LessEqual,
    Greater,
    Less,
    Bang,
    Ampersand,
    Pipe,
    Dot,
    Comma,
    Colon,
    Semicolon,

    // Literals
    StringLiteral,
    FloatLiteral,
    IntegerLiteral,
    Identifier,

    // Special
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span) -> Self {
        Self {
            token_type,
            lexeme,
            span,
        }
    }
}

/// How a table entry recognises its token at the current position.
#[derive(Debug, Clone, Copy)]
enum Pattern {
    Text(&'static str),
    Comment,
    StringLiteral,
    FloatLiteral,
    IntegerLiteral,
    Identifier,
}

/// Tried in order at every position; the first entry that matches wins.
/// Keywords are plain prefixes, so the order decides how runs of letters
/// split (`ไม่มี` is `ไม่` followed by the identifier `มี`).
const TOKEN_PATTERNS: &[(TokenType, Pattern)] = &[
    (TokenType::Comment, Pattern::Comment),
    (TokenType::Program, Pattern::Text("โปรแกรม")),
    (TokenType::ExitProcess, Pattern::Text("จบการทำงาน")),
    (TokenType::LeftBrace, Pattern::Text("{")),
    (TokenType::RightBrace, Pattern::Text("}")),
    (TokenType::Declare, Pattern::Text("ให้")),
    (TokenType::IntegerType, Pattern::Text("จำนวนเต็ม")),
    (TokenType::FloatType, Pattern::Text("ทศนิยม")),
    (TokenType::StringType, Pattern::Text("ข้อความ")),
    (TokenType::ArrayType, Pattern::Text("ชุดข้อมูล")),
    (TokenType::ObjectType, Pattern::Text("อ็อบเจกต์")),
    (TokenType::Const, Pattern::Text("ค่าคงที่")),
    (TokenType::BooleanType, Pattern::Text("ค่าความจริง")),
    (TokenType::Null, Pattern::Text("ว่าง")),
    (TokenType::Convert, Pattern::Text("เปลี่ยนชนิดข้อมูล")),
    (TokenType::Length, Pattern::Text("ขนาด")),
    (TokenType::Pop, Pattern::Text("ดึงออก")),
    (TokenType::Push, Pattern::Text("เพิ่ม")),
    (TokenType::Insert, Pattern::Text("แทรก")),
    (TokenType::Erase, Pattern::Text("ลบ")),
    (TokenType::Be, Pattern::Text("เป็น")),
    (TokenType::Arrow, Pattern::Text("->")),
    (TokenType::Assign, Pattern::Text("คือ")),
    (TokenType::As, Pattern::Text("แทน")),
    (TokenType::Increment, Pattern::Text("++")),
    (TokenType::Plus, Pattern::Text("+")),
    (TokenType::Decrement, Pattern::Text("--")),
    (TokenType::Minus, Pattern::Text("-")),
    (TokenType::StringLiteral, Pattern::StringLiteral),
    (TokenType::FloatLiteral, Pattern::FloatLiteral),
    (TokenType::IntegerLiteral, Pattern::IntegerLiteral),
    (TokenType::Root, Pattern::Text("ราก")),
    (TokenType::True, Pattern::Text("จริง")),
    (TokenType::False, Pattern::Text("เท็จ")),
    (TokenType::LeftBracket, Pattern::Text("[")),
    (TokenType::RightBracket, Pattern::Text("]")),
    (TokenType::Power, Pattern::Text("**")),
    (TokenType::Star, Pattern::Text("*")),
    (TokenType::SlashSlash, Pattern::Text("//")),
    (TokenType::Slash, Pattern::Text("/")),
    (TokenType::Percent, Pattern::Text("%")),
    (TokenType::ShiftLeft, Pattern::Text("<<")),
    (TokenType::ShiftRight, Pattern::Text(">>")),
    (TokenType::Equal, Pattern::Text("=")),
    (TokenType::BangEqual, Pattern::Text("!=")),
    (TokenType::GreaterEqual, Pattern::Text(">=")),
    (TokenType::LessEqual, Pattern::Text("<=")),
    (TokenType::Ln, Pattern::Text("ln")),
    (TokenType::Greater, Pattern::Text(">")),
    (TokenType::Less, Pattern::Text("<")),
    (TokenType::Bang, Pattern::Text("!")),
    (TokenType::Ampersand, Pattern::Text("&")),
    (TokenType::Pipe, Pattern::Text("|")),
    (TokenType::Not, Pattern::Text("ไม่")),
    (TokenType::Or, Pattern::Text("หรือ")),
    (TokenType::And, Pattern::Text("และ")),
    (TokenType::Xor, Pattern::Text("ซอร์")),
    (TokenType::Dot, Pattern::Text(".")),
    (TokenType::Comma, Pattern::Text(",")),
    (TokenType::Input, Pattern::Text("รับข้อมูล")),
    (TokenType::Print, Pattern::Text("แสดงผล")),
    (TokenType::If, Pattern::Text("ถ้า")),
    (TokenType::LeftParen, Pattern::Text("(")),
    (TokenType::RightParen, Pattern::Text(")")),
    (TokenType::From, Pattern::Text("ตั้งแต่")),
    (TokenType::Until, Pattern::Text("จนถึง")),
    (TokenType::Step, Pattern::Text("โดยแต่ละรอบ")),
    (TokenType::While, Pattern::Text("ขณะ")),
    (TokenType::For, Pattern::Text("ทำซ้ำ")),
    (TokenType::Do, Pattern::Text("ทำ")),
    (TokenType::Break, Pattern::Text("ออกจากการทำซ้ำ")),
    (TokenType::Continue, Pattern::Text("ไปยังรอบถัดไป")),
    (TokenType::Elif, Pattern::Text("มิฉะนั้นถ้า")),
    (TokenType::Else, Pattern::Text("มิฉะนั้น")),
    (TokenType::Void, Pattern::Text("เปล่า")),
    (TokenType::Return, Pattern::Text("คืนค่า")),
    (TokenType::Import, Pattern::Text("นำเข้า")),
    (TokenType::Export, Pattern::Text("ส่งออก")),
    (TokenType::Colon, Pattern::Text(":")),
    (TokenType::Semicolon, Pattern::Text(";")),
    (TokenType::Identifier, Pattern::Identifier),
];

/// Characters that end the excerpt shown for unrecognised input.
const EXCERPT_DELIMITERS: &[char] = &[' ', '\t', '\n', ';', '.', ',', '(', ')', '{', '}', '[', ']'];

fn is_thai(c: char) -> bool {
    ('\u{0E01}'..='\u{0E59}').contains(&c)
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || is_thai(c) || c == '_'
}

fn is_identifier_part(c: char) -> bool {
    is_identifier_start(c) || c.is_ascii_digit() || c == '@' || c == '$'
}

fn digits_len(text: &str) -> usize {
    text.bytes().take_while(u8::is_ascii_digit).count()
}

impl Pattern {
    /// Length in bytes of the match at the start of `rest`, if any.
    fn match_len(self, rest: &str) -> Option<usize> {
        match self {
            Pattern::Text(text) => rest.starts_with(text).then_some(text.len()),
            Pattern::Comment => {
                let body = rest.strip_prefix('#')?;
                body.find('#').map(|end| end + 2)
            }
            Pattern::StringLiteral => {
                let mut chars = rest.char_indices();
                if chars.next()?.1 != '"' {
                    return None;
                }
                while let Some((index, c)) = chars.next() {
                    match c {
                        '"' => return Some(index + 1),
                        '\\' => match chars.next() {
                            Some((_, '\n')) | None => return None,
                            Some(_) => {}
                        },
                        _ => {}
                    }
                }
                None
            }
            Pattern::FloatLiteral => {
                let sign = usize::from(rest.starts_with('-'));
                let whole = digits_len(&rest[sign..]);
                if whole == 0 {
                    return None;
                }
                let after_whole = sign + whole;
                if !rest[after_whole..].starts_with('.') {
                    return None;
                }
                let fraction = digits_len(&rest[after_whole + 1..]);
                (fraction > 0).then_some(after_whole + 1 + fraction)
            }
            Pattern::IntegerLiteral => {
                let sign = usize::from(rest.starts_with('-'));
                let whole = digits_len(&rest[sign..]);
                (whole > 0).then_some(sign + whole)
            }
            Pattern::Identifier => {
                let mut chars = rest.char_indices();
                let (_, first) = chars.next()?;
                if !is_identifier_start(first) {
                    return None;
                }
                let end = chars
                    .find(|(_, c)| !is_identifier_part(*c))
                    .map(|(index, _)| index)
                    .unwrap_or(rest.len());
                Some(end)
            }
        }
    }
}

pub struct Lexer {
    source: String,
    tokens: Vec<Token>,
    current: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: String) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            current: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, MmtError> {
        loop {
            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            String::new(),
            Span::new(self.line, self.column),
        ));

        trace!("Scanned {} tokens", self.tokens.len());
        Ok(std::mem::take(&mut self.tokens))
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.source[self.current..].chars().next() {
            if !c.is_whitespace() {
                break;
            }
            self.advance_over(c.len_utf8());
        }
    }

    fn scan_token(&mut self) -> Result<(), MmtError> {
        let rest = &self.source[self.current..];
        let span = Span::new(self.line, self.column);

        let matched = TOKEN_PATTERNS
            .iter()
            .find_map(|(token_type, pattern)| pattern.match_len(rest).map(|len| (*token_type, *pattern, len)));

        let Some((token_type, pattern, len)) = matched else {
            let excerpt: String = rest.chars().take_while(|c| !EXCERPT_DELIMITERS.contains(c)).collect();
            let excerpt = if excerpt.is_empty() {
                rest.chars().take(1).collect()
            } else {
                excerpt
            };
            return Err(MmtError::lex_error(
                span,
                format!("Unrecognized input '{}'", excerpt),
            ));
        };

        let text = &rest[..len];
        let lexeme = match pattern {
            Pattern::Comment => text[1..text.len() - 1].to_string(),
            _ => text.to_string(),
        };

        self.tokens.push(Token::new(token_type, lexeme, span));
        self.advance_over(len);
        Ok(())
    }

    /// Moves past `len` bytes, keeping the line and column counters in step.
    fn advance_over(&mut self, len: usize) {
        let end = self.current + len;
        for c in self.source[self.current..end].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.current = end;
    }
}

/// Convenience wrapper used by the runner and the module loader.
pub fn tokenize(source: &str) -> Result<Vec<Token>, MmtError> {
    Lexer::new(source.to_string()).scan_tokens()
}
