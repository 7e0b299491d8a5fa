use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use crate::ast::{Expr, ExprVisitor, Stmt, StmtVisitor};
use crate::env::Environment;
use crate::errors::SiltError;
use crate::parser::StmtStream;
use crate::token::{Literal, Token, Type};

pub struct Interpreter {
    env: Environment,
    stdout: Rc<RefCell<dyn Write>>,
}

impl Interpreter {
    pub fn new(stdout: Rc<RefCell<dyn Write>>) -> Self {
        Interpreter {
            env: Environment::new(),
            stdout,
        }
    }

    // Statements run in order until the first runtime fault, which aborts the rest of the
    // run. Bindings made before the fault survive in the environment, so an interactive
    // session can keep going with the same interpreter.
    pub fn interpret(&mut self, stmts: &StmtStream) -> Result<(), SiltError> {
        for stmt in &stmts.0 {
            self.visit_stmt(stmt)?;
        }
        Ok(())
    }

    fn execute_block(&mut self, statements: &[Stmt]) -> Result<(), SiltError> {
        self.env.push();

        let mut result = Ok(());
        for stmt in statements {
            if let err @ Err(_) = self.visit_stmt(stmt) {
                result = err;
                break;
            }
        }

        // the frame goes away no matter how the block exited
        self.env.pop();
        result
    }

    // Only nil and false are falsy, every other value counts as true.
    fn is_truthy(value: &Literal) -> bool {
        !matches!(value, Literal::Nil | Literal::Bool(false))
    }
}

impl ExprVisitor for Interpreter {
    type Item = Literal;

    fn visit_assign(&mut self, name: &Token, value: &Expr) -> Result<Literal, SiltError> {
        let value = self.visit_expr(value)?;

        match self.env.assign(&name.lexeme, value.clone()) {
            Ok(_) => Ok(value),
            Err(_) => Err(SiltError::runtime_error(
                name,
                &format!("Undefined variable '{}'.", name.lexeme),
            )),
        }
    }

    fn visit_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Literal, SiltError> {
        let left = self.visit_expr(left)?;
        let right = self.visit_expr(right)?;

        match operator.ty {
            Type::Plus => match (left, right) {
                (Literal::Num(left), Literal::Num(right)) => Ok(Literal::Num(left + right)),
                (Literal::Str(left), Literal::Str(right)) => {
                    Ok(Literal::from(String::from(left.as_str()) + &right))
                }
                _ => Err(SiltError::runtime_error(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },
            Type::Minus => match (left, right) {
                (Literal::Num(left), Literal::Num(right)) => Ok(Literal::Num(left - right)),
                _ => Err(SiltError::runtime_error(
                    operator,
                    "Operands must be numbers.",
                )),
            },
            Type::Slash => match (left, right) {
                // division by zero follows f64 semantics
                (Literal::Num(left), Literal::Num(right)) => Ok(Literal::Num(left / right)),
                _ => Err(SiltError::runtime_error(
                    operator,
                    "Operands must be numbers.",
                )),
            },
            Type::Star => match (left, right) {
                (Literal::Num(left), Literal::Num(right)) => Ok(Literal::Num(left * right)),
                _ => Err(SiltError::runtime_error(
                    operator,
                    "Operands must be numbers.",
                )),
            },
            Type::Greater => match (left, right) {
                (Literal::Num(left), Literal::Num(right)) => Ok(Literal::Bool(left > right)),
                _ => Err(SiltError::runtime_error(
                    operator,
                    "Operands must be numbers.",
                )),
            },
            Type::GreaterEqual => match (left, right) {
                (Literal::Num(left), Literal::Num(right)) => Ok(Literal::Bool(left >= right)),
                _ => Err(SiltError::runtime_error(
                    operator,
                    "Operands must be numbers.",
                )),
            },
            Type::Less => match (left, right) {
                (Literal::Num(left), Literal::Num(right)) => Ok(Literal::Bool(left < right)),
                _ => Err(SiltError::runtime_error(
                    operator,
                    "Operands must be numbers.",
                )),
            },
            Type::LessEqual => match (left, right) {
                (Literal::Num(left), Literal::Num(right)) => Ok(Literal::Bool(left <= right)),
                _ => Err(SiltError::runtime_error(
                    operator,
                    "Operands must be numbers.",
                )),
            },
            // nil compares equal only to nil, values of different kinds are never equal
            Type::EqualEqual => Ok(Literal::Bool(left == right)),
            Type::BangEqual => Ok(Literal::Bool(left != right)),
            _ => Err(SiltError::runtime_error(operator, "Invalid operator.")),
        }
    }

    fn visit_grouping(&mut self, expression: &Expr) -> Result<Literal, SiltError> {
        self.visit_expr(expression)
    }

    fn visit_literal(&mut self, value: &Literal) -> Result<Literal, SiltError> {
        Ok(value.clone())
    }

    fn visit_logical(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Literal, SiltError> {
        let left = self.visit_expr(left)?;

        // Short circuit: when the left operand already decides the outcome it is returned
        // as-is and the right operand is never evaluated. The result is whichever operand
        // value decided the expression, not a coerced boolean.
        if operator.ty == Type::Or {
            if Self::is_truthy(&left) {
                return Ok(left);
            }
        } else if !Self::is_truthy(&left) {
            return Ok(left);
        }

        self.visit_expr(right)
    }

    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> Result<Literal, SiltError> {
        let right = self.visit_expr(right)?;

        match operator.ty {
            Type::Minus => match right {
                Literal::Num(val) => Ok(Literal::Num(-val)),
                _ => Err(SiltError::runtime_error(
                    operator,
                    "Operand must be a number.",
                )),
            },
            Type::Bang => Ok(Literal::Bool(!Self::is_truthy(&right))),
            _ => Err(SiltError::runtime_error(operator, "Invalid operator.")),
        }
    }

    fn visit_variable(&mut self, name: &Token) -> Result<Literal, SiltError> {
        match self.env.get(&name.lexeme) {
            Some(value) => Ok(value),
            None => Err(SiltError::runtime_error(
                name,
                &format!("Undefined variable '{}'.", name.lexeme),
            )),
        }
    }
}

impl StmtVisitor for Interpreter {
    type Item = ();

    fn visit_block(&mut self, statements: &[Stmt]) -> Result<(), SiltError> {
        self.execute_block(statements)
    }

    fn visit_expression(&mut self, expression: &Expr) -> Result<(), SiltError> {
        self.visit_expr(expression)?;
        Ok(())
    }

    fn visit_if(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<(), SiltError> {
        let condition = self.visit_expr(condition)?;

        if Self::is_truthy(&condition) {
            self.visit_stmt(then_branch)
        } else if let Some(else_branch) = else_branch {
            self.visit_stmt(else_branch)
        } else {
            Ok(())
        }
    }

    fn visit_print(&mut self, expression: &Expr) -> Result<(), SiltError> {
        let value = self.visit_expr(expression)?;
        writeln!(RefCell::borrow_mut(&self.stdout), "{}", value).unwrap();
        Ok(())
    }

    fn visit_var(&mut self, name: &Token, init: Option<&Expr>) -> Result<(), SiltError> {
        let value = match init {
            Some(init) => self.visit_expr(init)?,
            None => Literal::Nil,
        };

        self.env.define(&name.lexeme, value);
        Ok(())
    }

    fn visit_while(&mut self, condition: &Expr, body: &Stmt) -> Result<(), SiltError> {
        loop {
            let value = self.visit_expr(condition)?;
            if !Self::is_truthy(&value) {
                return Ok(());
            }

            self.visit_stmt(body)?;
        }
    }
}
