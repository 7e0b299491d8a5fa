use crate::ast::{Expr, Stmt};
use crate::errors::SiltError;
use crate::token::{Token, Type};

pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    errors: Vec<SiltError>,
}

// A wrapper over vector of statements to not leak Stmt to public
#[derive(Debug, PartialEq)]
pub struct StmtStream(pub(crate) Vec<Stmt>);

// Helper alias for shorter return types
type ParserResult = Result<StmtStream, Vec<SiltError>>;
type StmtResult = Result<Stmt, SiltError>;
type ExprResult = Result<Expr, SiltError>;

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Parser {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    pub fn parse(&mut self) -> ParserResult {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        if self.errors.is_empty() {
            Ok(StmtStream(statements))
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }

    // A declaration that fails to parse contributes nothing. The error is recorded, the
    // cursor is resynchronized to the next declaration boundary and parsing continues, so
    // one pass reports every syntax error in the source.
    fn declaration(&mut self) -> Option<Stmt> {
        let res = if self.match_one(Type::Var) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match res {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                self.errors.push(err);
                self.synchronize();
                None
            }
        }
    }

    fn var_declaration(&mut self) -> StmtResult {
        let name = self
            .consume(Type::Identifier, "Expect variable name.")?
            .clone();

        let mut init = None;
        if self.match_one(Type::Equal) {
            init = Some(self.expression()?);
        }

        self.consume(Type::SemiColon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::var(name, init))
    }

    fn statement(&mut self) -> StmtResult {
        if self.match_one(Type::For) {
            self.for_statement()
        } else if self.match_one(Type::If) {
            self.if_statement()
        } else if self.match_one(Type::Print) {
            self.print_statement()
        } else if self.match_one(Type::While) {
            self.while_statement()
        } else if self.match_one(Type::LeftBrace) {
            Ok(Stmt::block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    fn block(&mut self) -> Result<Vec<Stmt>, SiltError> {
        let mut stmts = Vec::new();
        while !self.check(Type::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                stmts.push(stmt);
            }
        }
        self.consume(Type::RightBrace, "Expect '}' after block.")?;
        Ok(stmts)
    }

    fn expression_statement(&mut self) -> StmtResult {
        let expr = self.expression()?;
        self.consume(Type::SemiColon, "Expect ';' after expression.")?;
        Ok(Stmt::expression(expr))
    }

    fn if_statement(&mut self) -> StmtResult {
        self.consume(Type::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expect ')' after if condition.")?;

        let then_branch = self.statement()?;
        let mut else_branch = None;
        if self.match_one(Type::Else) {
            else_branch = Some(self.statement()?);
        }

        Ok(Stmt::if_(condition, then_branch, else_branch))
    }

    fn print_statement(&mut self) -> StmtResult {
        let expr = self.expression()?;
        self.consume(Type::SemiColon, "Expect ';' after value.")?;
        Ok(Stmt::print(expr))
    }

    fn while_statement(&mut self) -> StmtResult {
        self.consume(Type::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expect ')' after while condition.")?;
        let body = self.statement()?;
        Ok(Stmt::while_(condition, body))
    }

    // `for` has no runtime representation of its own. The clauses are rewritten here into
    // an equivalent while loop, wrapping only the pieces that are actually present.
    fn for_statement(&mut self) -> StmtResult {
        self.consume(Type::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_one(Type::SemiColon) {
            None
        } else if self.match_one(Type::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(Type::SemiColon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(Type::SemiColon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(Type::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(Type::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::block(vec![body, Stmt::expression(increment)]);
        }

        body = Stmt::while_(condition.unwrap_or_else(|| Expr::literal(true)), body);

        if let Some(initializer) = initializer {
            body = Stmt::block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn expression(&mut self) -> ExprResult {
        self.assignment()
    }

    fn assignment(&mut self) -> ExprResult {
        let expr = self.or_expression()?;

        if self.match_one(Type::Equal) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            if let Expr::Variable { name } = &expr {
                return Ok(Expr::assign(name.clone(), value));
            }

            // Anything else on the left is reported but not fatal: the left expression is
            // handed back unchanged and parsing carries on from here.
            self.errors
                .push(SiltError::parser_error(&equals, "Invalid assignment target."));
        }

        Ok(expr)
    }

    fn or_expression(&mut self) -> ExprResult {
        let mut expr = self.and_expression()?;
        while self.match_one(Type::Or) {
            let operator = self.previous().clone();
            let right = self.and_expression()?;
            expr = Expr::logical(expr, operator, right);
        }
        Ok(expr)
    }

    fn and_expression(&mut self) -> ExprResult {
        let mut expr = self.equality()?;
        while self.match_one(Type::And) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::logical(expr, operator, right);
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ExprResult {
        let mut expr = self.comparison()?;
        while self.match_either(&[Type::BangEqual, Type::EqualEqual]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> ExprResult {
        let mut expr = self.term()?;
        while self.match_either(&[
            Type::Greater,
            Type::GreaterEqual,
            Type::Less,
            Type::LessEqual,
        ]) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn term(&mut self) -> ExprResult {
        let mut expr = self.factor()?;
        while self.match_either(&[Type::Minus, Type::Plus]) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ExprResult {
        let mut expr = self.unary()?;
        while self.match_either(&[Type::Slash, Type::Star]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ExprResult {
        if self.match_either(&[Type::Bang, Type::Minus]) {
            let operator = self.previous().clone();
            Ok(Expr::unary(operator, self.unary()?))
        } else {
            self.primary()
        }
    }

    fn primary(&mut self) -> ExprResult {
        if self.match_one(Type::True) {
            Ok(Expr::literal(true))
        } else if self.match_one(Type::False) {
            Ok(Expr::literal(false))
        } else if self.match_one(Type::Nil) {
            Ok(Expr::nil())
        } else if self.match_either(&[Type::Number, Type::String]) {
            Ok(Expr::literal(self.previous().value.clone()))
        } else if self.match_one(Type::Identifier) {
            Ok(Expr::variable(self.previous().clone()))
        } else if self.match_one(Type::LeftParen) {
            let expr = self.expression()?;
            self.consume(Type::RightParen, "Expect ')' after expression.")?;
            Ok(Expr::grouping(expr))
        } else {
            Err(SiltError::parser_error(self.peek(), "Expect expression."))
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek().ty == Type::Eof
    }

    fn check(&self, ty: Type) -> bool {
        if self.is_at_end() {
            false
        } else {
            self.peek().ty == ty
        }
    }

    fn consume(&mut self, ty: Type, msg: &str) -> Result<&Token, SiltError> {
        if self.check(ty) {
            Ok(self.advance())
        } else {
            Err(SiltError::parser_error(self.peek(), msg))
        }
    }

    // Discard tokens until just past a ';' or in front of a token that can start a new
    // declaration, then let the declaration loop pick up from there.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().ty == Type::SemiColon {
                return;
            }

            match self.peek().ty {
                Type::Class
                | Type::Fun
                | Type::Var
                | Type::For
                | Type::If
                | Type::While
                | Type::Print
                | Type::Return => return,
                _ => {}
            }

            self.advance();
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn match_either(&mut self, types: &[Type]) -> bool {
        for ty in types {
            if self.match_one(*ty) {
                // Already skipped in the `match_one`, just return result
                return true;
            }
        }

        false
    }

    fn match_one(&mut self, ty: Type) -> bool {
        if self.check(ty) {
            self.advance();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Expr, Stmt};
    use crate::errors::SiltError;
    use crate::parser::{Parser, StmtStream};
    use crate::scanner::Scanner;
    use crate::token::{Literal, Token, Type};

    macro_rules! token {
        ($ty:ident, $lex:literal) => {
            Token::new(Type::$ty, String::from($lex), 1, Literal::Nil)
        };
    }

    fn scan(src: &str) -> Vec<Token> {
        let mut scanner = Scanner::new(src);
        let (tokens, errors) = scanner.scan_tokens();
        assert!(errors.is_empty());
        tokens
    }

    #[test]
    fn test_statements() {
        let tests = [
            // simple expression
            (
                "3 < 4;",
                Stmt::expression(Expr::binary(
                    Expr::literal(3),
                    token!(Less, "<"),
                    Expr::literal(4),
                )),
            ),
            // grouping expression
            (
                "1 + (\"hello\" - 4) - foo;",
                Stmt::expression(Expr::binary(
                    Expr::binary(
                        Expr::literal(1),
                        token!(Plus, "+"),
                        Expr::grouping(Expr::binary(
                            Expr::literal("hello"),
                            token!(Minus, "-"),
                            Expr::literal(4),
                        )),
                    ),
                    token!(Minus, "-"),
                    Expr::variable(token!(Identifier, "foo")),
                )),
            ),
            // logical expression
            (
                "true and false;",
                Stmt::expression(Expr::logical(
                    Expr::literal(true),
                    token!(And, "and"),
                    Expr::literal(false),
                )),
            ),
            // nested grouping
            (
                "((1 + 2) / 4) * 10;",
                Stmt::expression(Expr::binary(
                    Expr::grouping(Expr::binary(
                        Expr::grouping(Expr::binary(
                            Expr::literal(1),
                            token!(Plus, "+"),
                            Expr::literal(2),
                        )),
                        token!(Slash, "/"),
                        Expr::literal(4),
                    )),
                    token!(Star, "*"),
                    Expr::literal(10),
                )),
            ),
            // print statement
            (
                "print 1 + 2;",
                Stmt::print(Expr::binary(
                    Expr::literal(1),
                    token!(Plus, "+"),
                    Expr::literal(2),
                )),
            ),
            // variable declarations, with and without initializer
            (
                "var foo = 10;",
                Stmt::var(token!(Identifier, "foo"), Some(Expr::literal(10))),
            ),
            ("var foo;", Stmt::var(token!(Identifier, "foo"), None)),
            // assignment is right-associative
            (
                "foo = bar = 3;",
                Stmt::expression(Expr::assign(
                    token!(Identifier, "foo"),
                    Expr::assign(token!(Identifier, "bar"), Expr::literal(3)),
                )),
            ),
            // if statement without else
            (
                "if (true) print 1;",
                Stmt::if_(Expr::literal(true), Stmt::print(Expr::literal(1)), None),
            ),
            // if statement with else
            (
                "if (foo) print 1; else print 2;",
                Stmt::if_(
                    Expr::variable(token!(Identifier, "foo")),
                    Stmt::print(Expr::literal(1)),
                    Some(Stmt::print(Expr::literal(2))),
                ),
            ),
            // while statement
            (
                "while (true) { foo; }",
                Stmt::while_(
                    Expr::literal(true),
                    Stmt::block(vec![Stmt::expression(Expr::variable(token!(
                        Identifier, "foo"
                    )))]),
                ),
            ),
        ];

        for (src, expected) in tests {
            let tokens = scan(src);
            let mut parser = Parser::new(&tokens);

            assert_eq!(parser.parse().unwrap(), StmtStream(vec![expected]));
        }
    }

    #[test]
    fn test_for_desugars_to_while() {
        let tokens = scan("for (var i = 0; i < 3; i = i + 1) print i;");
        let mut parser = Parser::new(&tokens);

        let expected = Stmt::block(vec![
            Stmt::var(token!(Identifier, "i"), Some(Expr::literal(0))),
            Stmt::while_(
                Expr::binary(
                    Expr::variable(token!(Identifier, "i")),
                    token!(Less, "<"),
                    Expr::literal(3),
                ),
                Stmt::block(vec![
                    Stmt::print(Expr::variable(token!(Identifier, "i"))),
                    Stmt::expression(Expr::assign(
                        token!(Identifier, "i"),
                        Expr::binary(
                            Expr::variable(token!(Identifier, "i")),
                            token!(Plus, "+"),
                            Expr::literal(1),
                        ),
                    )),
                ]),
            ),
        ]);

        assert_eq!(parser.parse().unwrap(), StmtStream(vec![expected]));
    }

    #[test]
    fn test_for_with_empty_clauses() {
        let tokens = scan("for (;;) print 1;");
        let mut parser = Parser::new(&tokens);

        // no initializer and no increment mean no wrapping blocks, and the condition
        // defaults to a literal true
        let expected = Stmt::while_(Expr::literal(true), Stmt::print(Expr::literal(1)));
        assert_eq!(parser.parse().unwrap(), StmtStream(vec![expected]));
    }

    #[test]
    fn test_invalid_assignment_target_keeps_lhs() {
        let tokens = scan("1 = 2");
        let mut parser = Parser::new(&tokens);

        // the error is recorded but the left expression comes back untouched, with no
        // Assign node built around it
        let expr = parser.expression().unwrap();
        assert_eq!(expr, Expr::literal(1));
        assert_eq!(parser.errors.len(), 1);
        assert!(
            matches!(&parser.errors[0], SiltError::ParserError { msg, .. } if msg == "Invalid assignment target.")
        );
    }

    #[test]
    fn test_recovery_reports_all_errors() {
        let tokens = scan("var a = ;\nvar b = ;");
        let mut parser = Parser::new(&tokens);

        let errs = parser.parse().unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(
            matches!(&errs[0], SiltError::ParserError { line: 1, msg, .. } if msg == "Expect expression.")
        );
        assert!(
            matches!(&errs[1], SiltError::ParserError { line: 2, msg, .. } if msg == "Expect expression.")
        );
    }

    #[test]
    fn test_recovery_inside_block() {
        let tokens = scan("{ var = 1; }\nprint 2;");
        let mut parser = Parser::new(&tokens);

        // the bad declaration inside the block is abandoned, the block and everything
        // after it still parse, and only the one error is reported
        let errs = parser.parse().unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(
            matches!(&errs[0], SiltError::ParserError { msg, .. } if msg == "Expect variable name.")
        );
    }

    #[test]
    fn test_missing_semicolon_reports_at_end() {
        let tokens = scan("print 1");
        let mut parser = Parser::new(&tokens);

        let errs = parser.parse().unwrap_err();
        assert_eq!(errs.len(), 1);
        match &errs[0] {
            SiltError::ParserError { token, msg, .. } => {
                assert_eq!(token.ty, Type::Eof);
                assert_eq!(msg, "Expect ';' after value.");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
