//! Expression language for rule condition predicates.
//!
//! Conditions are compiled once when a rule is built and evaluated at check
//! time against a JSON context record. Supported syntax:
//! - Comparisons: `==`, `!=`, `>`, `<`, `>=`, `<=`
//! - Boolean operators: `&&`, `||`, `!`
//! - Membership: `x in list`
//! - Dot-path access into the context: `actor.branch_id`, `record.owner_id`
//! - Literals: integers, floats, `"strings"`, `true`, `false`
//! - Parentheses for grouping

use crate::ability::errors::AbilityError;
use serde_json::Value;

/// A compiled condition predicate.
///
/// Evaluation never fails: a type mismatch against the context (or a path
/// that resolves to something non-boolean at the top level) reads as
/// "condition not satisfied".
#[derive(Debug, Clone)]
pub struct Predicate {
    source: String,
    expr: Expr,
}

impl Predicate {
    /// Compile a condition expression. Rejects syntax errors up front so a
    /// malformed predicate can never reach the check path.
    pub fn parse(source: &str) -> Result<Self, AbilityError> {
        let tokens = lex(source)?;
        if tokens.is_empty() {
            return Err(AbilityError::InvalidCondition("empty expression".into()));
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expression()?;
        if let Some(extra) = parser.peek() {
            return Err(AbilityError::InvalidCondition(format!(
                "unexpected trailing token: {extra:?}"
            )));
        }
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// The original expression text, as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against a context record. Fails closed.
    pub fn matches(&self, context: &Value) -> bool {
        matches!(self.expr.eval(context), Some(Scalar::Bool(true)))
    }
}

// ─── AST ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Lit(Scalar),
    Path(Vec<String>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Cmp {
        op: CmpOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Member {
        needle: Box<Expr>,
        haystack: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CmpOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

/// Runtime value a subexpression evaluates to.
#[derive(Debug, Clone)]
enum Scalar {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    List(Vec<Scalar>),
    Null,
}

impl Scalar {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(n) => Some(*n as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn from_json(value: &Value) -> Scalar {
        match value {
            Value::Null => Scalar::Null,
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Scalar::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Scalar::Float(f)
                } else {
                    Scalar::Null
                }
            }
            Value::String(s) => Scalar::Str(s.clone()),
            Value::Array(items) => Scalar::List(items.iter().map(Scalar::from_json).collect()),
            // Objects are not directly comparable
            Value::Object(_) => Scalar::Null,
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a == b,
            (Scalar::Int(a), Scalar::Float(b)) | (Scalar::Float(b), Scalar::Int(a)) => {
                (*a as f64) == *b
            }
            (Scalar::Str(a), Scalar::Str(b)) => a == b,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Null, Scalar::Null) => true,
            _ => false,
        }
    }
}

impl Expr {
    /// Evaluate to a scalar; `None` means the expression faulted (type
    /// mismatch) and the enclosing predicate does not match.
    fn eval(&self, context: &Value) -> Option<Scalar> {
        match self {
            Expr::Lit(s) => Some(s.clone()),
            Expr::Path(segments) => {
                let mut current = context;
                for seg in segments {
                    current = current.get(seg).unwrap_or(&Value::Null);
                }
                Some(Scalar::from_json(current))
            }
            Expr::Not(inner) => match inner.eval(context)? {
                Scalar::Bool(b) => Some(Scalar::Bool(!b)),
                _ => None,
            },
            Expr::And(lhs, rhs) => match (lhs.eval(context)?, rhs.eval(context)?) {
                (Scalar::Bool(a), Scalar::Bool(b)) => Some(Scalar::Bool(a && b)),
                _ => None,
            },
            Expr::Or(lhs, rhs) => match (lhs.eval(context)?, rhs.eval(context)?) {
                (Scalar::Bool(a), Scalar::Bool(b)) => Some(Scalar::Bool(a || b)),
                _ => None,
            },
            Expr::Cmp { op, lhs, rhs } => {
                let l = lhs.eval(context)?;
                let r = rhs.eval(context)?;
                match op {
                    CmpOp::Eq => Some(Scalar::Bool(l == r)),
                    CmpOp::Ne => Some(Scalar::Bool(l != r)),
                    CmpOp::Gt | CmpOp::Lt | CmpOp::Ge | CmpOp::Le => {
                        let (lf, rf) = (l.as_f64()?, r.as_f64()?);
                        let result = match op {
                            CmpOp::Gt => lf > rf,
                            CmpOp::Lt => lf < rf,
                            CmpOp::Ge => lf >= rf,
                            CmpOp::Le => lf <= rf,
                            CmpOp::Eq | CmpOp::Ne => unreachable!(),
                        };
                        Some(Scalar::Bool(result))
                    }
                }
            }
            Expr::Member { needle, haystack } => {
                let elem = needle.eval(context)?;
                match haystack.eval(context)? {
                    Scalar::List(items) => Some(Scalar::Bool(items.contains(&elem))),
                    _ => None,
                }
            }
        }
    }
}

// ─── Lexer ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    True,
    False,
    In,
    Dot,
    LParen,
    RParen,
    Not,
    And,
    Or,
    Cmp(CmpOp),
}

fn lex(input: &str) -> Result<Vec<Token>, AbilityError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' | '!' | '<' | '>' => {
                chars.next();
                let followed_by_eq = chars.peek() == Some(&'=');
                if followed_by_eq {
                    chars.next();
                }
                let token = match (c, followed_by_eq) {
                    ('=', true) => Token::Cmp(CmpOp::Eq),
                    ('!', true) => Token::Cmp(CmpOp::Ne),
                    ('<', true) => Token::Cmp(CmpOp::Le),
                    ('>', true) => Token::Cmp(CmpOp::Ge),
                    ('<', false) => Token::Cmp(CmpOp::Lt),
                    ('>', false) => Token::Cmp(CmpOp::Gt),
                    ('!', false) => Token::Not,
                    ('=', false) => {
                        return Err(AbilityError::InvalidCondition(
                            "single `=` is not an operator (use `==`)".into(),
                        ));
                    }
                    _ => unreachable!(),
                };
                tokens.push(token);
            }
            '&' | '|' => {
                chars.next();
                if chars.next() != Some(c) {
                    return Err(AbilityError::InvalidCondition(format!(
                        "expected `{c}{c}`"
                    )));
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => {
                            if let Some(escaped) = chars.next() {
                                s.push(escaped);
                            }
                        }
                        Some(other) => s.push(other),
                        None => {
                            return Err(AbilityError::InvalidCondition(
                                "unterminated string literal".into(),
                            ));
                        }
                    }
                }
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_digit() => {
                let mut num = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        num.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let token = if num.contains('.') {
                    Token::Float(num.parse().map_err(|_| {
                        AbilityError::InvalidCondition(format!("invalid float `{num}`"))
                    })?)
                } else {
                    Token::Int(num.parse().map_err(|_| {
                        AbilityError::InvalidCondition(format!("invalid integer `{num}`"))
                    })?)
                };
                tokens.push(token);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&a) = chars.peek() {
                    if a.is_ascii_alphanumeric() || a == '_' {
                        word.push(a);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(match word.as_str() {
                    "true" => Token::True,
                    "false" => Token::False,
                    "in" => Token::In,
                    _ => Token::Ident(word),
                });
            }
            other => {
                return Err(AbilityError::InvalidCondition(format!(
                    "unexpected character `{other}`"
                )));
            }
        }
    }
    Ok(tokens)
}

// ─── Parser ─────────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// expression = and_expr ("||" and_expr)*
    fn expression(&mut self) -> Result<Expr, AbilityError> {
        let mut left = self.conjunction()?;
        while self.eat(&Token::Or) {
            let right = self.conjunction()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// and_expr = comparison ("&&" comparison)*
    fn conjunction(&mut self) -> Result<Expr, AbilityError> {
        let mut left = self.comparison()?;
        while self.eat(&Token::And) {
            let right = self.comparison()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// comparison = unary (cmp_op unary | "in" unary)?
    fn comparison(&mut self) -> Result<Expr, AbilityError> {
        let left = self.unary()?;
        if let Some(Token::Cmp(op)) = self.peek() {
            let op = *op;
            self.pos += 1;
            let right = self.unary()?;
            return Ok(Expr::Cmp {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
            });
        }
        if self.eat(&Token::In) {
            let right = self.unary()?;
            return Ok(Expr::Member {
                needle: Box::new(left),
                haystack: Box::new(right),
            });
        }
        Ok(left)
    }

    /// unary = "!" unary | atom
    fn unary(&mut self) -> Result<Expr, AbilityError> {
        if self.eat(&Token::Not) {
            let inner = self.unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.atom()
    }

    /// atom = literal | path | "(" expression ")"
    fn atom(&mut self) -> Result<Expr, AbilityError> {
        match self.next() {
            Some(Token::Int(n)) => Ok(Expr::Lit(Scalar::Int(n))),
            Some(Token::Float(f)) => Ok(Expr::Lit(Scalar::Float(f))),
            Some(Token::Str(s)) => Ok(Expr::Lit(Scalar::Str(s))),
            Some(Token::True) => Ok(Expr::Lit(Scalar::Bool(true))),
            Some(Token::False) => Ok(Expr::Lit(Scalar::Bool(false))),
            Some(Token::Ident(first)) => {
                let mut path = vec![first];
                while self.eat(&Token::Dot) {
                    match self.next() {
                        Some(Token::Ident(seg)) => path.push(seg),
                        _ => {
                            return Err(AbilityError::InvalidCondition(
                                "expected identifier after `.`".into(),
                            ));
                        }
                    }
                }
                Ok(Expr::Path(path))
            }
            Some(Token::LParen) => {
                let expr = self.expression()?;
                if !self.eat(&Token::RParen) {
                    return Err(AbilityError::InvalidCondition(
                        "expected closing parenthesis `)`".into(),
                    ));
                }
                Ok(expr)
            }
            other => Err(AbilityError::InvalidCondition(format!(
                "unexpected token: {other:?}"
            ))),
        }
    }
}
