use crate::ast::{Expr, ExprVisitor};
use crate::errors::SiltError;
use crate::token::{Literal, Token};

// Renders an expression tree as a fully parenthesized string, prefix style, for
// eyeballing what the parser built. Has no effect on execution.
#[allow(dead_code)]
pub(crate) struct AstPrinter;

#[allow(dead_code)]
impl AstPrinter {
    pub(crate) fn print(&mut self, expr: &Expr) -> Result<String, SiltError> {
        self.visit_expr(expr)
    }

    fn parenthesize(&mut self, name: &str, exprs: &[&Expr]) -> Result<String, SiltError> {
        let mut out = format!("({}", name);
        for expr in exprs {
            out.push(' ');
            out.push_str(&self.visit_expr(expr)?);
        }
        out.push(')');
        Ok(out)
    }
}

impl ExprVisitor for AstPrinter {
    type Item = String;

    fn visit_assign(&mut self, name: &Token, value: &Expr) -> Result<String, SiltError> {
        let value = self.visit_expr(value)?;
        Ok(format!("(= {} {})", name.lexeme, value))
    }

    fn visit_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<String, SiltError> {
        self.parenthesize(&operator.lexeme, &[left, right])
    }

    fn visit_grouping(&mut self, expression: &Expr) -> Result<String, SiltError> {
        self.parenthesize("group", &[expression])
    }

    fn visit_literal(&mut self, value: &Literal) -> Result<String, SiltError> {
        Ok(value.to_string())
    }

    fn visit_logical(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<String, SiltError> {
        self.parenthesize(&operator.lexeme, &[left, right])
    }

    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> Result<String, SiltError> {
        self.parenthesize(&operator.lexeme, &[right])
    }

    fn visit_variable(&mut self, name: &Token) -> Result<String, SiltError> {
        Ok(name.lexeme.clone())
    }
}
