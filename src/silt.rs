use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::process::exit;
use std::rc::Rc;

use crate::errors::SiltError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::scanner::Scanner;
use crate::token::Type;

// One session: the error flags for the current run plus the interpreter, which lives for
// the whole session so globals defined on one prompt line are visible on the next.
pub struct Silt {
    had_error: bool,
    had_runtime_error: bool,
    interpreter: Interpreter,
}

impl Silt {
    pub fn new() -> Self {
        let stdout: Rc<RefCell<dyn Write>> = Rc::new(RefCell::new(io::stdout()));

        Silt {
            had_error: false,
            had_runtime_error: false,
            interpreter: Interpreter::new(stdout),
        }
    }

    pub fn main(&mut self) {
        let args: Vec<String> = std::env::args().skip(1).collect();

        match args.len() {
            0 => self.run_prompt(),
            1 => self.run_file(&args[0]),
            _ => {
                eprintln!("Usage: silt [script]");
                exit(64);
            }
        }
    }

    fn run_prompt(&mut self) {
        let mut lines = io::stdin().lines();

        loop {
            print!("> ");
            io::stdout().flush().unwrap();

            match lines.next() {
                Some(Ok(line)) => {
                    if line == "exit" {
                        return;
                    }

                    self.run(&line);
                    self.had_error = false;
                    self.had_runtime_error = false;
                }
                _ => return,
            }
        }
    }

    fn run_file(&mut self, path: &str) {
        let source = fs::read_to_string(path).expect("Could not read script file.");

        self.run(&source);

        if self.had_error {
            exit(65);
        }
        if self.had_runtime_error {
            exit(70);
        }
    }

    fn run(&mut self, source: &str) {
        let mut scanner = Scanner::new(source);
        let (tokens, errors) = scanner.scan_tokens();
        for err in &errors {
            self.report(err);
        }

        let mut parser = Parser::new(&tokens);
        match parser.parse() {
            Ok(stmts) => {
                // a lexical error from this run also keeps the program from running
                if self.had_error {
                    return;
                }

                if let Err(err) = self.interpreter.interpret(&stmts) {
                    self.report(&err);
                }
            }
            Err(errs) => {
                for err in &errs {
                    self.report(err);
                }
            }
        }
    }

    fn report(&mut self, err: &SiltError) {
        match err {
            SiltError::ScannerError { line, msg } => self.static_error(*line, "", msg),
            SiltError::ParserError { token, line, msg } => {
                if token.ty == Type::Eof {
                    self.static_error(*line, " at end", msg);
                } else {
                    self.static_error(*line, &format!(" at '{}'", token.lexeme), msg);
                }
            }
            SiltError::RuntimeError { token, msg } => {
                eprintln!("{}\n[line {}]", msg, token.line);
                self.had_runtime_error = true;
            }
        }
    }

    fn static_error(&mut self, line: usize, at: &str, msg: &str) {
        eprintln!("[line {}] Error{}: {}", line, at, msg);
        self.had_error = true;
    }
}

impl Default for Silt {
    fn default() -> Self {
        Silt::new()
    }
}
