use mmt::error::{ErrorKind, Span};
use mmt::lexer::{tokenize, TokenType};
use pretty_assertions::assert_eq;

fn kinds(source: &str) -> Vec<TokenType> {
    tokenize(source)
        .unwrap_or_else(|e| panic!("lexing failed: {}", e))
        .into_iter()
        .map(|token| token.token_type)
        .collect()
}

#[test]
fn keywords_split_runs_of_letters() {
    // Keywords are matched as prefixes; the remainder is an identifier.
    assert_eq!(kinds("ไม่มี"), vec![TokenType::Not, TokenType::Identifier, TokenType::Eof]);
    assert_eq!(kinds("lnx"), vec![TokenType::Ln, TokenType::Identifier, TokenType::Eof]);
}

#[test]
fn longer_keywords_win_over_their_prefixes() {
    assert_eq!(kinds("ทำซ้ำ ทำ"), vec![TokenType::For, TokenType::Do, TokenType::Eof]);
    assert_eq!(
        kinds("มิฉะนั้นถ้า มิฉะนั้น"),
        vec![TokenType::Elif, TokenType::Else, TokenType::Eof]
    );
}

#[test]
fn multi_character_operators() {
    assert_eq!(
        kinds("a ** b // c << 1 >= d != e"),
        vec![
            TokenType::Identifier,
            TokenType::Power,
            TokenType::Identifier,
            TokenType::SlashSlash,
            TokenType::Identifier,
            TokenType::ShiftLeft,
            TokenType::IntegerLiteral,
            TokenType::GreaterEqual,
            TokenType::Identifier,
            TokenType::BangEqual,
            TokenType::Identifier,
            TokenType::Eof,
        ]
    );
}

#[test]
fn minus_is_never_part_of_a_number() {
    assert_eq!(
        kinds("x -1 i--"),
        vec![
            TokenType::Identifier,
            TokenType::Minus,
            TokenType::IntegerLiteral,
            TokenType::Identifier,
            TokenType::Decrement,
            TokenType::Eof,
        ]
    );
}

#[test]
fn floats_are_tried_before_integers() {
    let tokens = tokenize("3.14 42 7.").expect("should lex");
    let summary: Vec<(TokenType, &str)> = tokens
        .iter()
        .map(|token| (token.token_type, token.lexeme.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (TokenType::FloatLiteral, "3.14"),
            (TokenType::IntegerLiteral, "42"),
            (TokenType::IntegerLiteral, "7"),
            (TokenType::Dot, "."),
            (TokenType::Eof, ""),
        ]
    );
}

#[test]
fn string_lexeme_keeps_quotes_and_escapes() {
    let tokens = tokenize(r#""a\"b" "สวัสดี""#).expect("should lex");
    assert_eq!(tokens[0].token_type, TokenType::StringLiteral);
    assert_eq!(tokens[0].lexeme, r#""a\"b""#);
    assert_eq!(tokens[1].lexeme, "\"สวัสดี\"");
}

#[test]
fn comment_lexeme_is_the_inner_text() {
    let tokens = tokenize("# first\nsecond #\nx").expect("should lex");
    assert_eq!(tokens[0].token_type, TokenType::Comment);
    assert_eq!(tokens[0].lexeme, " first\nsecond ");
    assert_eq!(tokens[1].token_type, TokenType::Identifier);
    assert_eq!(tokens[1].span, Span::new(3, 1));
}

#[test]
fn identifiers_may_contain_at_and_dollar() {
    let tokens = tokenize("a@b$c _x1").expect("should lex");
    assert_eq!(tokens[0].lexeme, "a@b$c");
    assert_eq!(tokens[1].lexeme, "_x1");
    assert!(tokenize("@a").is_err());
}

#[test]
fn columns_count_characters() {
    let tokens = tokenize("ให้ x คือ 10;\n  แสดงผล(x);").expect("should lex");
    let spans: Vec<Span> = tokens.iter().map(|token| token.span).collect();
    assert_eq!(
        spans,
        vec![
            Span::new(1, 1),
            Span::new(1, 5),
            Span::new(1, 7),
            Span::new(1, 11),
            Span::new(1, 13),
            Span::new(2, 3),
            Span::new(2, 9),
            Span::new(2, 10),
            Span::new(2, 11),
            Span::new(2, 12),
            Span::new(2, 13),
        ]
    );
}

#[test]
fn unrecognized_input_reports_an_excerpt() {
    let error = tokenize("ให้ x คือ ~abc;").expect_err("should fail");
    assert_eq!(error.kind, ErrorKind::LexError);
    assert_eq!(error.message, "Unrecognized input '~abc'");
    assert_eq!(error.span, Span::new(1, 11));
}

#[test]
fn unterminated_comment_is_an_error() {
    let error = tokenize("# never closed").expect_err("should fail");
    assert_eq!(error.message, "Unrecognized input '#'");
}
