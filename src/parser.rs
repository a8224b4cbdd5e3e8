use crate::ast::{
    BinaryOp, ConvertTarget, ElifBranch, Expr, FunctionDecl, Literal, ObjectEntry, Program, Stmt, UnaryOp,
};
use crate::error::{MmtError, Span};
use crate::lexer::{tokenize, Token, TokenType};
use log::debug;

/// Lexes and parses a complete source text.
pub fn parse_source(source: &str) -> Result<Program, MmtError> {
    let tokens = tokenize(source)?;
    let program = Parser::new(tokens).parse()?;
    debug!("Parsed {} top-level statements", program.statements.len());
    Ok(program)
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|token| token.token_type) != Some(TokenType::Eof) {
            let span = tokens.last().map(|token| token.span).unwrap_or(Span::new(1, 1));
            tokens.push(Token::new(TokenType::Eof, String::new(), span));
        }
        Self { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<Program, MmtError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.statement()?);
        }

        Ok(Program { statements })
    }

    fn statement(&mut self) -> Result<Stmt, MmtError> {
        let token = self.peek().clone();
        match token.token_type {
            TokenType::Program => Ok(Stmt::Function(self.function_declaration()?)),
            TokenType::Comment => {
                self.advance();
                Ok(Stmt::Comment {
                    text: token.lexeme,
                    span: token.span,
                })
            }
            TokenType::ExitProcess => {
                self.advance();
                self.consume(TokenType::Semicolon, "Expected ';' after 'จบการทำงาน'")?;
                Ok(Stmt::Exit { span: token.span })
            }
            TokenType::Declare => {
                let declaration = self.var_declaration()?;
                self.consume(TokenType::Semicolon, "Expected ';' after variable declaration")?;
                Ok(declaration)
            }
            TokenType::Input => self.input_statement(),
            TokenType::Print => self.print_statement(),
            TokenType::If => self.if_statement(),
            TokenType::Do => self.do_while_statement(),
            TokenType::While => self.while_statement(),
            TokenType::For => self.for_statement(),
            TokenType::Break => {
                self.advance();
                self.consume(TokenType::Semicolon, "Expected ';' after 'ออกจากการทำซ้ำ'")?;
                Ok(Stmt::Break { span: token.span })
            }
            TokenType::Continue => {
                self.advance();
                self.consume(TokenType::Semicolon, "Expected ';' after 'ไปยังรอบถัดไป'")?;
                Ok(Stmt::Continue { span: token.span })
            }
            TokenType::Return => self.return_statement(),
            TokenType::Import => self.import_statement(),
            TokenType::Export => self.export_statement(),
            TokenType::LeftBrace => Ok(Stmt::Block {
                statements: self.block("Expected '{' to start a block")?,
                span: token.span,
            }),
            TokenType::Elif | TokenType::Else => Err(MmtError::parse_error_with_help(
                token.span,
                format!("'{}' without a matching 'ถ้า'", token.lexeme),
                "'มิฉะนั้นถ้า' and 'มิฉะนั้น' must directly follow the block of an 'ถ้า' statement.".to_string(),
            )),
            _ => self.expression_statement(),
        }
    }

    /// Parses `{ statements }` and returns the statements.
    fn block(&mut self, open_message: &str) -> Result<Vec<Stmt>, MmtError> {
        self.consume(TokenType::LeftBrace, open_message)?;

        let mut statements = Vec::new();
        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.statement()?);
        }

        self.consume_with_help(
            TokenType::RightBrace,
            "Expected '}' after block",
            "Block statements must be closed with '}' after the opening '{'.".to_string(),
        )?;
        Ok(statements)
    }

    fn function_declaration(&mut self) -> Result<FunctionDecl, MmtError> {
        let span = self.consume(TokenType::Program, "Expected 'โปรแกรม'")?.span;
        let name = self.consume(TokenType::Identifier, "Expected function name after 'โปรแกรม'")?.lexeme.clone();

        self.consume_with_help(
            TokenType::LeftParen,
            "Expected '(' after function name",
            "Functions are declared as: โปรแกรม name(ให้ a, ให้ b) { ... }".to_string(),
        )?;

        let mut params: Vec<String> = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                self.consume_with_help(
                    TokenType::Declare,
                    "Expected 'ให้' before parameter name",
                    "Every parameter is introduced with 'ให้', e.g. โปรแกรม f(ให้ a, ให้ b)".to_string(),
                )?;
                let param = self.consume(TokenType::Identifier, "Expected parameter name")?.clone();

                if self.check(TokenType::Be) {
                    return Err(MmtError::parse_error(
                        self.peek().span,
                        "Parameters cannot be declared with 'เป็น'".to_string(),
                    ));
                }
                if self.check(TokenType::Assign) {
                    return Err(MmtError::parse_error(
                        self.peek().span,
                        "Parameters cannot have default values".to_string(),
                    ));
                }
                if params.contains(&param.lexeme) {
                    return Err(MmtError::parse_error(
                        param.span,
                        format!("Duplicate parameter '{}'", param.lexeme),
                    ));
                }
                params.push(param.lexeme);

                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightParen, "Expected ')' after parameters")?;

        let body = self.block("Expected '{' before function body")?;
        Ok(FunctionDecl {
            name,
            params,
            body,
            span,
        })
    }

    /// `ให้ name [เป็น ค่าคงที่] [คือ expr]`, without the terminating `;` so
    /// the `for` initializer can reuse it.
    fn var_declaration(&mut self) -> Result<Stmt, MmtError> {
        let span = self.consume(TokenType::Declare, "Expected 'ให้'")?.span;
        let name = self.consume(TokenType::Identifier, "Expected variable name after 'ให้'")?.lexeme.clone();

        let mut is_const = false;
        if self.match_types(&[TokenType::Be]) {
            if self.match_types(&[TokenType::Const]) {
                is_const = true;
            } else {
                return Err(MmtError::parse_error_with_help(
                    self.peek().span,
                    format!("Unknown modifier after 'เป็น' (found '{}')", self.found()),
                    "The only supported modifier is 'ค่าคงที่': ให้ x เป็น ค่าคงที่ คือ 1;".to_string(),
                ));
            }
        }

        let initializer = if self.match_types(&[TokenType::Assign]) {
            Some(self.expression()?)
        } else {
            None
        };

        if is_const && initializer.is_none() {
            return Err(MmtError::parse_error_with_help(
                self.peek().span,
                format!("Constant '{}' must be initialized", name),
                "Give the constant a value: ให้ x เป็น ค่าคงที่ คือ 1;".to_string(),
            ));
        }

        Ok(Stmt::VarDecl {
            name,
            is_const,
            initializer,
            span,
        })
    }

    fn input_statement(&mut self) -> Result<Stmt, MmtError> {
        let span = self.advance().span;
        let name = self.consume(TokenType::Identifier, "Expected variable name after 'รับข้อมูล'")?.lexeme.clone();
        self.consume(TokenType::Semicolon, "Expected ';' after input statement")?;
        Ok(Stmt::Input { name, span })
    }

    fn print_statement(&mut self) -> Result<Stmt, MmtError> {
        let span = self.advance().span;
        self.consume_with_help(
            TokenType::LeftParen,
            "Expected '(' after 'แสดงผล'",
            "Print takes its arguments in parentheses: แสดงผล(a, b);".to_string(),
        )?;
        let args = self.arguments()?;
        if args.is_empty() {
            return Err(MmtError::parse_error(
                self.previous().span,
                "'แสดงผล' needs at least one expression".to_string(),
            ));
        }
        self.consume(TokenType::Semicolon, "Expected ';' after print statement")?;
        Ok(Stmt::Print { args, span })
    }

    fn condition(&mut self, keyword: &str) -> Result<Expr, MmtError> {
        self.consume_with_help(
            TokenType::LeftParen,
            &format!("Expected '(' after '{}'", keyword),
            format!("Conditions are written in parentheses: {} (condition) {{ ... }}", keyword),
        )?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expected ')' after condition")?;
        Ok(condition)
    }

    fn if_statement(&mut self) -> Result<Stmt, MmtError> {
        let span = self.advance().span;
        let condition = self.condition("ถ้า")?;
        let then_branch = self.block("Expected '{' after condition")?;

        let mut elif_branches = Vec::new();
        while self.check(TokenType::Elif) {
            let elif_span = self.advance().span;
            let condition = self.condition("มิฉะนั้นถ้า")?;
            let body = self.block("Expected '{' after condition")?;
            elif_branches.push(ElifBranch {
                condition,
                body,
                span: elif_span,
            });
        }

        let else_branch = if self.match_types(&[TokenType::Else]) {
            Some(self.block("Expected '{' after 'มิฉะนั้น'")?)
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            elif_branches,
            else_branch,
            span,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, MmtError> {
        let span = self.advance().span;
        let condition = self.condition("ขณะ")?;
        let body = self.block("Expected '{' after loop condition")?;
        Ok(Stmt::While {
            condition,
            body,
            span,
        })
    }

    fn do_while_statement(&mut self) -> Result<Stmt, MmtError> {
        let span = self.advance().span;
        let body = self.block("Expected '{' after 'ทำ'")?;
        self.consume_with_help(
            TokenType::While,
            "Expected 'ขณะ' after the body of 'ทำ'",
            "A do-while loop is written as: ทำ { ... } ขณะ (condition)".to_string(),
        )?;
        let condition = self.condition("ขณะ")?;
        self.match_types(&[TokenType::Semicolon]);
        Ok(Stmt::DoWhile {
            body,
            condition,
            span,
        })
    }

    fn for_statement(&mut self) -> Result<Stmt, MmtError> {
        let span = self.advance().span;
        self.consume_with_help(
            TokenType::LeftParen,
            "Expected '(' after 'ทำซ้ำ'",
            "A for loop is written as: ทำซ้ำ (ตั้งแต่ ให้ i คือ 0 จนถึง i < 10 โดยแต่ละรอบ i++) { ... }".to_string(),
        )?;
        self.consume(TokenType::From, "Expected 'ตั้งแต่' to start the loop initializer")?;

        let initializer = if self.check(TokenType::Declare) {
            Some(Box::new(self.var_declaration()?))
        } else if self.check(TokenType::Until) {
            None
        } else {
            let init_span = self.peek().span;
            let expr = self.expression()?;
            Some(Box::new(Stmt::Expression { expr, span: init_span }))
        };

        self.consume(TokenType::Until, "Expected 'จนถึง' before the loop condition")?;
        let condition = if self.check(TokenType::Step) {
            None
        } else {
            Some(self.expression()?)
        };

        self.consume(TokenType::Step, "Expected 'โดยแต่ละรอบ' before the loop update")?;
        let update = if self.check(TokenType::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };

        self.consume(TokenType::RightParen, "Expected ')' after loop clauses")?;
        let body = self.block("Expected '{' before loop body")?;

        Ok(Stmt::For {
            initializer,
            condition,
            update,
            body,
            span,
        })
    }

    fn return_statement(&mut self) -> Result<Stmt, MmtError> {
        let span = self.advance().span;
        let value = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenType::Semicolon, "Expected ';' after return value")?;
        Ok(Stmt::Return { value, span })
    }

    fn import_statement(&mut self) -> Result<Stmt, MmtError> {
        let span = self.advance().span;
        let path_token = self
            .consume_with_help(
                TokenType::StringLiteral,
                "Expected module path after 'นำเข้า'",
                "Imports are written as: นำเข้า \"file.thl\" แทน name;".to_string(),
            )?
            .clone();
        let path = decode_string(&path_token)?;
        self.consume(TokenType::As, "Expected 'แทน' after module path")?;
        let alias = self.consume(TokenType::Identifier, "Expected module alias after 'แทน'")?.lexeme.clone();
        self.consume(TokenType::Semicolon, "Expected ';' after import")?;
        Ok(Stmt::Import { path, alias, span })
    }

    fn export_statement(&mut self) -> Result<Stmt, MmtError> {
        let span = self.advance().span;
        let mut functions = vec![self.exported_function()?];
        while self.match_types(&[TokenType::Export]) {
            functions.push(self.exported_function()?);
        }
        Ok(Stmt::Export { functions, span })
    }

    fn exported_function(&mut self) -> Result<FunctionDecl, MmtError> {
        if !self.check(TokenType::Program) {
            return Err(MmtError::parse_error_with_help(
                self.peek().span,
                format!("Expected 'โปรแกรม' after 'ส่งออก' (found '{}')", self.found()),
                "Only functions can be exported: ส่งออก โปรแกรม name(...) { ... }".to_string(),
            ));
        }
        self.function_declaration()
    }

    fn expression_statement(&mut self) -> Result<Stmt, MmtError> {
        let span = self.peek().span;
        let expr = self.expression()?;

        if !expr.is_statement_expression() {
            return Err(MmtError::parse_error_with_help(
                expr.span(),
                "Expression result is unused".to_string(),
                "Only calls, assignments, '++'/'--' and container methods can stand alone as statements.".to_string(),
            ));
        }

        self.consume(TokenType::Semicolon, "Expected ';' after expression")?;
        Ok(Stmt::Expression { expr, span })
    }

    fn expression(&mut self) -> Result<Expr, MmtError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, MmtError> {
        let expr = self.logical_or()?;

        if self.match_types(&[TokenType::Assign]) {
            let equals = self.previous().span;
            let value = self.assignment()?;

            if expr.is_lvalue() {
                return Ok(Expr::Assign {
                    target: Box::new(expr),
                    value: Box::new(value),
                    span: equals,
                });
            }

            return Err(MmtError::parse_error_with_help(
                equals,
                "Invalid assignment target".to_string(),
                "Only variables, indexed elements and members can be assigned to. Examples: 'x คือ 1', 'a[0] คือ 1'".to_string(),
            ));
        }

        Ok(expr)
    }

    /// Parses one left-associative precedence level.
    fn binary_level(
        &mut self,
        operators: &[(TokenType, BinaryOp)],
        operand: fn(&mut Self) -> Result<Expr, MmtError>,
    ) -> Result<Expr, MmtError> {
        let mut expr = operand(self)?;

        while let Some(&(_, operator)) = operators.iter().find(|(token_type, _)| self.check(*token_type)) {
            let span = self.advance().span;
            let right = operand(self)?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                span,
            };
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr, MmtError> {
        self.binary_level(&[(TokenType::Or, BinaryOp::Or)], Self::logical_and)
    }

    fn logical_and(&mut self) -> Result<Expr, MmtError> {
        self.binary_level(&[(TokenType::And, BinaryOp::And)], Self::bit_or)
    }

    fn bit_or(&mut self) -> Result<Expr, MmtError> {
        self.binary_level(&[(TokenType::Pipe, BinaryOp::BitOr)], Self::bit_xor)
    }

    fn bit_xor(&mut self) -> Result<Expr, MmtError> {
        self.binary_level(&[(TokenType::Xor, BinaryOp::BitXor)], Self::bit_and)
    }

    fn bit_and(&mut self) -> Result<Expr, MmtError> {
        self.binary_level(&[(TokenType::Ampersand, BinaryOp::BitAnd)], Self::equality)
    }

    fn equality(&mut self) -> Result<Expr, MmtError> {
        self.binary_level(
            &[
                (TokenType::Equal, BinaryOp::Equal),
                (TokenType::BangEqual, BinaryOp::NotEqual),
            ],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr, MmtError> {
        self.binary_level(
            &[
                (TokenType::Greater, BinaryOp::Greater),
                (TokenType::Less, BinaryOp::Less),
                (TokenType::GreaterEqual, BinaryOp::GreaterEqual),
                (TokenType::LessEqual, BinaryOp::LessEqual),
            ],
            Self::shift,
        )
    }

    fn shift(&mut self) -> Result<Expr, MmtError> {
        self.binary_level(
            &[
                (TokenType::ShiftLeft, BinaryOp::ShiftLeft),
                (TokenType::ShiftRight, BinaryOp::ShiftRight),
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr, MmtError> {
        self.binary_level(
            &[
                (TokenType::Plus, BinaryOp::Add),
                (TokenType::Minus, BinaryOp::Subtract),
            ],
            Self::factor,
        )
    }

    fn factor(&mut self) -> Result<Expr, MmtError> {
        let mut expr = self.exponent()?;

        while let Some(operator) = self.factor_operator() {
            let span = self.advance().span;
            let right = self.exponent()?;

            if operator != BinaryOp::Multiply && is_zero_literal(&right) {
                return Err(MmtError::parse_error_with_help(
                    right.span(),
                    "Division by zero".to_string(),
                    format!("The right operand of '{}' must not be zero.", operator.as_symbol()),
                ));
            }

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                span,
            };
        }

        Ok(expr)
    }

    fn factor_operator(&self) -> Option<BinaryOp> {
        match self.peek().token_type {
            TokenType::Star => Some(BinaryOp::Multiply),
            TokenType::SlashSlash => Some(BinaryOp::FloorDivide),
            TokenType::Slash => Some(BinaryOp::Divide),
            TokenType::Percent => Some(BinaryOp::Modulo),
            _ => None,
        }
    }

    fn exponent(&mut self) -> Result<Expr, MmtError> {
        self.binary_level(
            &[
                (TokenType::Power, BinaryOp::Power),
                (TokenType::Root, BinaryOp::Root),
            ],
            Self::natural_log,
        )
    }

    fn natural_log(&mut self) -> Result<Expr, MmtError> {
        if self.check(TokenType::Ln) {
            let span = self.advance().span;
            self.consume_with_help(
                TokenType::LeftParen,
                "Expected '(' after 'ln'",
                "The natural logarithm is written as: ln(x)".to_string(),
            )?;
            let operand = self.expression()?;
            self.consume(TokenType::RightParen, "Expected ')' after 'ln' argument")?;
            return Ok(Expr::Ln {
                operand: Box::new(operand),
                span,
            });
        }
        self.unary()
    }

    fn unary(&mut self) -> Result<Expr, MmtError> {
        let operator = match self.peek().token_type {
            TokenType::Not => Some(UnaryOp::Not),
            TokenType::Bang => Some(UnaryOp::BitNot),
            TokenType::Increment => Some(UnaryOp::PreIncrement),
            TokenType::Decrement => Some(UnaryOp::PreDecrement),
            TokenType::Minus => Some(UnaryOp::Negate),
            _ => None,
        };

        if let Some(operator) = operator {
            let span = self.advance().span;
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                operand: Box::new(operand),
                span,
            });
        }

        let expr = self.primary()?;

        let postfix = match self.peek().token_type {
            TokenType::Increment => Some(UnaryOp::PostIncrement),
            TokenType::Decrement => Some(UnaryOp::PostDecrement),
            _ => None,
        };
        if let Some(operator) = postfix {
            let span = self.advance().span;
            return Ok(Expr::Unary {
                operator,
                operand: Box::new(expr),
                span,
            });
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, MmtError> {
        let token = self.peek().clone();
        let span = token.span;

        match token.token_type {
            TokenType::IntegerLiteral => {
                self.advance();
                let value = token.lexeme.parse::<i64>().map_err(|_| {
                    MmtError::parse_error(span, format!("Integer literal '{}' is out of range", token.lexeme))
                })?;
                Ok(Expr::Literal {
                    value: Literal::Int(value),
                    span,
                })
            }
            TokenType::FloatLiteral => {
                self.advance();
                let value = token.lexeme.parse::<f64>().map_err(|_| {
                    MmtError::parse_error(span, format!("Invalid float literal '{}'", token.lexeme))
                })?;
                Ok(Expr::Literal {
                    value: Literal::Float(value),
                    span,
                })
            }
            TokenType::StringLiteral => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::String(decode_string(&token)?),
                    span,
                })
            }
            TokenType::True | TokenType::False => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Bool(token.token_type == TokenType::True),
                    span,
                })
            }
            TokenType::Null => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Null,
                    span,
                })
            }
            TokenType::LeftBracket => {
                self.advance();
                self.array_literal(span)
            }
            TokenType::LeftBrace => {
                self.advance();
                self.object_literal(span)
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume_with_help(
                    TokenType::RightParen,
                    "Expected ')' after expression",
                    "Every '(' needs a matching ')'.".to_string(),
                )?;
                Ok(expr)
            }
            TokenType::Convert => {
                self.advance();
                self.convert_expression(span)
            }
            TokenType::Identifier => {
                self.advance();
                self.postfix_chain(Expr::Variable {
                    name: token.lexeme,
                    span,
                })
            }
            _ => Err(MmtError::parse_error_with_help(
                span,
                format!("Expected expression (found '{}')", self.found()),
                "Expressions start with a literal, a variable, '(', '[' or '{'.".to_string(),
            )),
        }
    }

    /// Extends a variable with any run of `[i]`, `.name`, `.method(...)` and
    /// `(args)` suffixes.
    fn postfix_chain(&mut self, mut expr: Expr) -> Result<Expr, MmtError> {
        loop {
            if self.check(TokenType::LeftBracket) {
                let span = self.advance().span;
                let index = self.expression()?;
                self.consume(TokenType::RightBracket, "Expected ']' after index")?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                    span,
                };
            } else if self.check(TokenType::Dot) {
                self.advance();
                expr = self.member_or_method(expr)?;
            } else if self.check(TokenType::LeftParen) {
                expr = self.call(expr)?;
            } else {
                return Ok(expr);
            }
        }
    }

    fn member_or_method(&mut self, target: Expr) -> Result<Expr, MmtError> {
        let token = self.advance().clone();
        let span = token.span;
        let target = Box::new(target);

        match token.token_type {
            TokenType::Length => {
                self.consume(TokenType::LeftParen, "Expected '(' after 'ขนาด'")?;
                self.consume(TokenType::RightParen, "'ขนาด' takes no arguments")?;
                Ok(Expr::Length { target, span })
            }
            TokenType::Push => {
                self.consume(TokenType::LeftParen, "Expected '(' after 'เพิ่ม'")?;
                let value = Box::new(self.expression()?);
                self.consume(TokenType::RightParen, "'เพิ่ม' takes exactly one argument")?;
                Ok(Expr::Push { target, value, span })
            }
            TokenType::Pop => {
                self.consume(TokenType::LeftParen, "Expected '(' after 'ดึงออก'")?;
                self.consume(TokenType::RightParen, "'ดึงออก' takes no arguments")?;
                Ok(Expr::Pop { target, span })
            }
            TokenType::Insert => {
                self.consume(TokenType::LeftParen, "Expected '(' after 'แทรก'")?;
                let index = Box::new(self.expression()?);
                self.consume_with_help(
                    TokenType::Comma,
                    "Expected ',' after insert position",
                    "Insert takes a position and a value: a.แทรก(0, x)".to_string(),
                )?;
                let value = Box::new(self.expression()?);
                self.consume(TokenType::RightParen, "'แทรก' takes exactly two arguments")?;
                Ok(Expr::Insert {
                    target,
                    index,
                    value,
                    span,
                })
            }
            TokenType::Erase => {
                self.consume(TokenType::LeftParen, "Expected '(' after 'ลบ'")?;
                let index = Box::new(self.expression()?);
                self.consume(TokenType::RightParen, "'ลบ' takes exactly one argument")?;
                Ok(Expr::Erase { target, index, span })
            }
            TokenType::Identifier => Ok(Expr::Member {
                object: target,
                name: token.lexeme,
                span,
            }),
            _ => Err(MmtError::parse_error_with_help(
                span,
                format!("Expected member name after '.' (found '{}')", describe(&token)),
                "Available methods are ขนาด, เพิ่ม, ดึงออก, แทรก and ลบ.".to_string(),
            )),
        }
    }

    fn call(&mut self, callee: Expr) -> Result<Expr, MmtError> {
        let (namespace, name, span) = match callee {
            Expr::Variable { name, span } => (None, name, span),
            Expr::Member { object, name, span } => match *object {
                Expr::Variable { name: namespace, .. } => (Some(namespace), name, span),
                other => {
                    return Err(MmtError::parse_error(
                        other.span(),
                        "Only a module alias can qualify a function call".to_string(),
                    ))
                }
            },
            other => {
                return Err(MmtError::parse_error_with_help(
                    other.span(),
                    "Invalid function name".to_string(),
                    "Call a function by name, e.g. f(1) or module.f(1).".to_string(),
                ))
            }
        };

        self.consume(TokenType::LeftParen, "Expected '(' before arguments")?;
        let args = self.arguments()?;
        Ok(Expr::Call {
            namespace,
            name,
            args,
            span,
        })
    }

    /// Parses a comma separated list up to and including the closing ')'.
    fn arguments(&mut self) -> Result<Vec<Expr>, MmtError> {
        let mut args = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightParen, "Expected ')' after arguments")?;
        Ok(args)
    }

    fn array_literal(&mut self, span: Span) -> Result<Expr, MmtError> {
        let mut elements = Vec::new();
        if !self.check(TokenType::RightBracket) {
            loop {
                elements.push(self.expression()?);
                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }
        self.consume_with_help(
            TokenType::RightBracket,
            "Expected ']' after array elements",
            "Array elements are separated by ',' and closed with ']'.".to_string(),
        )?;
        Ok(Expr::Array { elements, span })
    }

    fn object_literal(&mut self, span: Span) -> Result<Expr, MmtError> {
        let mut entries = Vec::new();
        if !self.check(TokenType::RightBrace) {
            loop {
                let key_token = self
                    .consume_with_help(
                        TokenType::StringLiteral,
                        "Expected string key in object literal",
                        "Object keys are string literals: {\"name\": value}".to_string(),
                    )?
                    .clone();
                let key = decode_string(&key_token)?;
                self.consume(TokenType::Colon, "Expected ':' after object key")?;
                let value = self.expression()?;
                entries.push(ObjectEntry { key, value });
                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightBrace, "Expected '}' after object entries")?;
        Ok(Expr::Object { entries, span })
    }

    fn convert_expression(&mut self, span: Span) -> Result<Expr, MmtError> {
        self.consume(TokenType::LeftParen, "Expected '(' after 'เปลี่ยนชนิดข้อมูล'")?;
        let expr = self.expression()?;
        self.consume(TokenType::Comma, "Expected ',' before the target type")?;

        let target = match self.peek().token_type {
            TokenType::IntegerType => ConvertTarget::Integer,
            TokenType::FloatType => ConvertTarget::Float,
            TokenType::StringType => ConvertTarget::String,
            TokenType::BooleanType => ConvertTarget::Boolean,
            _ => {
                return Err(MmtError::parse_error_with_help(
                    self.peek().span,
                    format!("Expected a target type (found '{}')", self.found()),
                    "Values can be converted to จำนวนเต็ม, ทศนิยม, ข้อความ or ค่าความจริง.".to_string(),
                ))
            }
        };
        self.advance();

        self.consume(TokenType::RightParen, "Expected ')' after the target type")?;
        Ok(Expr::Convert {
            expr: Box::new(expr),
            target,
            span,
        })
    }

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(*token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, token_type: TokenType) -> bool {
        if self.is_at_end() {
            false
        } else {
            self.peek().token_type == token_type
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn found(&self) -> String {
        describe(self.peek())
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<&Token, MmtError> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(MmtError::parse_error(
                self.peek().span,
                format!("{} (found '{}')", message, self.found()),
            ))
        }
    }

    fn consume_with_help(&mut self, token_type: TokenType, message: &str, help: String) -> Result<&Token, MmtError> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(MmtError::parse_error_with_help(
                self.peek().span,
                format!("{} (found '{}')", message, self.found()),
                help,
            ))
        }
    }
}

fn describe(token: &Token) -> String {
    match token.token_type {
        TokenType::Eof => "end of input".to_string(),
        TokenType::Comment => "comment".to_string(),
        _ => token.lexeme.clone(),
    }
}

fn is_zero_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Literal {
            value: Literal::Int(0),
            ..
        } => true,
        Expr::Literal {
            value: Literal::Float(value),
            ..
        } => *value == 0.0,
        _ => false,
    }
}

/// Decodes the body of a string literal token, handling JSON style escapes.
fn decode_string(token: &Token) -> Result<String, MmtError> {
    let lexeme = &token.lexeme;
    let body = lexeme
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(lexeme);

    let mut decoded = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        let escaped = chars.next().unwrap_or('\\');
        match escaped {
            '"' => decoded.push('"'),
            '\\' => decoded.push('\\'),
            '/' => decoded.push('/'),
            'b' => decoded.push('\u{8}'),
            'f' => decoded.push('\u{c}'),
            'n' => decoded.push('\n'),
            'r' => decoded.push('\r'),
            't' => decoded.push('\t'),
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        MmtError::parse_error(token.span, format!("Invalid unicode escape '\\u{}'", hex))
                    })?;
                decoded.push(code);
            }
            other => {
                return Err(MmtError::parse_error_with_help(
                    token.span,
                    format!("Invalid escape sequence '\\{}'", other),
                    "Supported escapes are \\\" \\\\ \\/ \\b \\f \\n \\r \\t and \\uXXXX.".to_string(),
                ))
            }
        }
    }
    Ok(decoded)
}
