//! The constraint-expression compiler.
//!
//! Turns human-readable constraint strings such as `A + B == C`,
//! `A != B != C`, `5 <= A+B <= 7` or `A in [1,2,3]` into executable
//! predicates. Recognition is ordered: the specialized forms below are tried
//! first and the generic arithmetic evaluator is the fallback.
//!
//! 1. range constraint `c1 <=/< V1 + V2 + ... <=/< c2`
//! 2. chained inequality `V1 != V2 != V3 ...` (all-different)
//! 3. binary variable relation `V1 op V2`
//! 4. chained ordering `V1 </<= V2 </<= V3 ...`
//! 5. variable-to-constant `V op c`
//! 6. variable equation `V1 + V2 + ... == V` (also `*`)
//! 7. arithmetic equality `expr == c`
//! 8. arithmetic inequality `expr op c`
//! 9. set membership `V in [..]`, `V not in [..]`
//! 10. generic evaluator with `*`,`/` before `+`,`-`

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{Result, SolverError};
use crate::solver::{
    constraint::{ConstraintPredicate, NaryPredicate},
    constraints::{all_different, membership, ordering, product, sum},
    solution::{Assignment, Value},
};

/// A compiled string constraint, classified by arity through its predicate.
#[derive(Debug)]
pub struct ParsedConstraint {
    /// The distinct variables referenced, in order of first appearance.
    pub variables: Vec<String>,
    pub predicate: ConstraintPredicate,
    pub description: String,
}

/// Compiles `expr` against the set of declared variable names.
pub fn parse(expr: &str, declared: &HashSet<String>) -> Result<ParsedConstraint> {
    let parse_error = |reason: String| SolverError::Parse {
        expr: expr.trim().to_string(),
        reason,
    };

    let tokens = tokenize(expr).map_err(&parse_error)?;
    if tokens.is_empty() {
        return Err(parse_error("empty constraint".to_string()).into());
    }
    for token in &tokens {
        if let Token::Ident(name) = token {
            if !declared.contains(name) {
                return Err(SolverError::UnknownVariable(name.clone()).into());
            }
        }
    }
    let tokens = fold_negative_literals(tokens);

    let recognized = recognize_range(&tokens)
        .or_else(|| recognize_chained_not_equal(&tokens))
        .or_else(|| recognize_binary_relation(&tokens))
        .or_else(|| recognize_chained_ordering(&tokens))
        .or_else(|| recognize_var_constant(&tokens))
        .or_else(|| recognize_variable_equation(&tokens))
        .or_else(|| recognize_arithmetic_equality(&tokens))
        .or_else(|| recognize_arithmetic_inequality(&tokens))
        .or_else(|| recognize_membership(&tokens));

    let (variables, predicate) = match recognized {
        Some(compiled) => compiled,
        None => compile_generic(&tokens).map_err(&parse_error)?,
    };

    if variables.is_empty() {
        return Err(parse_error("constraint references no variables".to_string()).into());
    }

    Ok(ParsedConstraint {
        variables,
        predicate,
        description: expr.trim().to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    In,
    Not,
}

impl Token {
    fn is_relational(&self) -> bool {
        matches!(
            self,
            Token::Eq | Token::Ne | Token::Lt | Token::Le | Token::Gt | Token::Ge
        )
    }
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            tokens.push(match word.as_str() {
                "in" => Token::In,
                "not" => Token::Not,
                _ => Token::Ident(word),
            });
            continue;
        }
        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if i < chars.len() && chars[i] == '.' {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let literal: String = chars[start..i].iter().collect();
            let number = literal
                .parse::<f64>()
                .map_err(|_| format!("invalid number literal `{}`", literal))?;
            tokens.push(Token::Number(number));
            continue;
        }
        if c == '\'' || c == '"' {
            let quote = c;
            i += 1;
            let start = i;
            while i < chars.len() && chars[i] != quote {
                i += 1;
            }
            if i == chars.len() {
                return Err("unterminated string literal".to_string());
            }
            tokens.push(Token::Str(chars[start..i].iter().collect()));
            i += 1;
            continue;
        }
        let two = if i + 1 < chars.len() {
            Some((c, chars[i + 1]))
        } else {
            None
        };
        match two {
            Some(('=', '=')) => {
                tokens.push(Token::Eq);
                i += 2;
                continue;
            }
            Some(('!', '=')) => {
                tokens.push(Token::Ne);
                i += 2;
                continue;
            }
            Some(('<', '=')) => {
                tokens.push(Token::Le);
                i += 2;
                continue;
            }
            Some(('>', '=')) => {
                tokens.push(Token::Ge);
                i += 2;
                continue;
            }
            _ => {}
        }
        tokens.push(match c {
            '<' => Token::Lt,
            '>' => Token::Gt,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            _ => return Err(format!("unexpected character `{}`", c)),
        });
        i += 1;
    }
    Ok(tokens)
}

/// Merges a `-` directly before a number literal into a negative literal when
/// it sits in operand position (expression start, or after an operator,
/// bracket or comma).
fn fold_negative_literals(tokens: Vec<Token>) -> Vec<Token> {
    let mut folded: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i] == Token::Minus {
            if let Some(Token::Number(n)) = tokens.get(i + 1) {
                let operand_position = match folded.last() {
                    None => true,
                    Some(prev) => {
                        prev.is_relational()
                            || matches!(
                                prev,
                                Token::Plus
                                    | Token::Minus
                                    | Token::Star
                                    | Token::Slash
                                    | Token::LParen
                                    | Token::LBracket
                                    | Token::Comma
                            )
                    }
                };
                if operand_position {
                    folded.push(Token::Number(-n));
                    i += 2;
                    continue;
                }
            }
        }
        folded.push(tokens[i].clone());
        i += 1;
    }
    folded
}

// ---------------------------------------------------------------------------
// Pattern recognizers
// ---------------------------------------------------------------------------

type Compiled = (Vec<String>, ConstraintPredicate);

fn dedup_preserving_order(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .filter(|name| seen.insert((*name).clone()))
        .cloned()
        .collect()
}

/// `Ident (op Ident)+`, with every separator equal to `op`.
fn ident_chain(tokens: &[Token], op: &Token) -> Option<Vec<String>> {
    if tokens.len() < 3 || tokens.len() % 2 == 0 {
        return None;
    }
    let mut names = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if i % 2 == 0 {
            match token {
                Token::Ident(name) => names.push(name.clone()),
                _ => return None,
            }
        } else if token != op {
            return None;
        }
    }
    Some(names)
}

fn recognize_range(tokens: &[Token]) -> Option<Compiled> {
    if tokens.len() < 5 {
        return None;
    }
    let Token::Number(low) = tokens[0] else {
        return None;
    };
    let low_strict = match tokens[1] {
        Token::Lt => true,
        Token::Le => false,
        _ => return None,
    };
    let Token::Number(high) = tokens[tokens.len() - 1] else {
        return None;
    };
    let high_strict = match tokens[tokens.len() - 2] {
        Token::Lt => true,
        Token::Le => false,
        _ => return None,
    };
    let terms = ident_chain(&tokens[2..tokens.len() - 2], &Token::Plus)
        .or_else(|| match &tokens[2..tokens.len() - 2] {
            [Token::Ident(name)] => Some(vec![name.clone()]),
            _ => None,
        })?;
    let variables = dedup_preserving_order(&terms);
    let predicate = sum::sum_in_range(sum::unit_terms(&terms), low, high, low_strict, high_strict);
    Some((variables.clone(), ConstraintPredicate::binarized(&variables, predicate)))
}

fn recognize_chained_not_equal(tokens: &[Token]) -> Option<Compiled> {
    let names = ident_chain(tokens, &Token::Ne)?;
    if names.len() < 3 {
        return None;
    }
    let variables = dedup_preserving_order(&names);
    let predicate = all_different::all_different();
    Some((variables.clone(), ConstraintPredicate::binarized(&variables, predicate)))
}

fn recognize_binary_relation(tokens: &[Token]) -> Option<Compiled> {
    let [Token::Ident(a), op, Token::Ident(b)] = tokens else {
        return None;
    };
    if a == b {
        return None;
    }
    let predicate = match op {
        Token::Eq => ordering::equal(),
        Token::Ne => ordering::not_equal(),
        Token::Lt => ordering::less_than(),
        Token::Le => ordering::less_equal(),
        Token::Gt => ordering::greater_than(),
        Token::Ge => ordering::greater_equal(),
        _ => return None,
    };
    Some((
        vec![a.clone(), b.clone()],
        ConstraintPredicate::Binary(predicate),
    ))
}

fn recognize_chained_ordering(tokens: &[Token]) -> Option<Compiled> {
    if let Some(names) = ident_chain(tokens, &Token::Lt) {
        if names.len() >= 3 {
            let variables = dedup_preserving_order(&names);
            return Some((
                variables,
                ConstraintPredicate::Nary(ordering::strictly_ascending(names)),
            ));
        }
    }
    if let Some(names) = ident_chain(tokens, &Token::Le) {
        if names.len() >= 3 {
            let variables = dedup_preserving_order(&names);
            return Some((
                variables,
                ConstraintPredicate::Nary(ordering::ascending(names)),
            ));
        }
    }
    None
}

fn recognize_var_constant(tokens: &[Token]) -> Option<Compiled> {
    match tokens {
        [Token::Ident(name), op, Token::Number(constant)] => {
            let op = op.clone();
            if !op.is_relational() {
                return None;
            }
            let var = name.clone();
            let constant = *constant;
            let predicate: NaryPredicate = Arc::new(move |assignment: &Assignment| {
                let value = match assignment.get(&var) {
                    None => return true,
                    Some(value) => value,
                };
                let ordering = match value.numeric_cmp(&Value::real(constant)) {
                    None => return false,
                    Some(ordering) => ordering,
                };
                match op {
                    Token::Eq => ordering.is_eq(),
                    Token::Ne => ordering.is_ne(),
                    Token::Lt => ordering.is_lt(),
                    Token::Le => ordering.is_le(),
                    Token::Gt => ordering.is_gt(),
                    Token::Ge => ordering.is_ge(),
                    _ => false,
                }
            });
            Some((vec![name.clone()], ConstraintPredicate::Nary(predicate)))
        }
        [Token::Ident(name), op @ (Token::Eq | Token::Ne), Token::Str(literal)] => {
            let want_equal = *op == Token::Eq;
            let var = name.clone();
            let text = Value::text(literal.clone());
            let symbol = Value::symbol(literal.clone());
            let predicate: NaryPredicate = Arc::new(move |assignment: &Assignment| {
                match assignment.get(&var) {
                    None => true,
                    Some(value) => (*value == text || *value == symbol) == want_equal,
                }
            });
            Some((vec![name.clone()], ConstraintPredicate::Nary(predicate)))
        }
        _ => None,
    }
}

fn recognize_variable_equation(tokens: &[Token]) -> Option<Compiled> {
    let split = tokens.iter().position(|t| *t == Token::Eq)?;
    let [Token::Ident(total)] = &tokens[split + 1..] else {
        return None;
    };
    let lhs = &tokens[..split];

    if let Some(terms) = ident_chain(lhs, &Token::Plus) {
        let mut all = terms.clone();
        all.push(total.clone());
        let variables = dedup_preserving_order(&all);
        let predicate = sum::variable_sum(terms, total.clone());
        return Some((variables.clone(), ConstraintPredicate::binarized(&variables, predicate)));
    }
    if let Some(terms) = ident_chain(lhs, &Token::Star) {
        let mut all = terms.clone();
        all.push(total.clone());
        let variables = dedup_preserving_order(&all);
        let predicate = product::variable_product(terms, total.clone());
        return Some((variables.clone(), ConstraintPredicate::binarized(&variables, predicate)));
    }
    None
}

/// `term (+ term)*` with `term := c * V | V * c | V`; the simple weighted-sum
/// shape routed to the sum factories.
fn weighted_sum_terms(tokens: &[Token]) -> Option<Vec<(String, f64)>> {
    let mut terms = Vec::new();
    for group in tokens.split(|t| *t == Token::Plus) {
        match group {
            [Token::Ident(name)] => terms.push((name.clone(), 1.0)),
            [Token::Number(c), Token::Star, Token::Ident(name)]
            | [Token::Ident(name), Token::Star, Token::Number(c)] => {
                terms.push((name.clone(), *c))
            }
            _ => return None,
        }
    }
    if terms.is_empty() {
        return None;
    }
    Some(terms)
}

fn bare_product_terms(tokens: &[Token]) -> Option<Vec<String>> {
    ident_chain(tokens, &Token::Star)
}

fn recognize_arithmetic_equality(tokens: &[Token]) -> Option<Compiled> {
    let split = tokens.iter().position(|t| *t == Token::Eq)?;
    let [Token::Number(target)] = &tokens[split + 1..] else {
        return None;
    };
    let lhs = &tokens[..split];

    if let Some(terms) = weighted_sum_terms(lhs) {
        let names: Vec<String> = terms.iter().map(|(name, _)| name.clone()).collect();
        let variables = dedup_preserving_order(&names);
        let predicate = sum::exact_sum(terms, *target);
        return Some((variables.clone(), ConstraintPredicate::binarized(&variables, predicate)));
    }
    if let Some(terms) = bare_product_terms(lhs) {
        let variables = dedup_preserving_order(&terms);
        let predicate = product::exact_product(terms, *target);
        return Some((variables.clone(), ConstraintPredicate::binarized(&variables, predicate)));
    }
    None
}

fn recognize_arithmetic_inequality(tokens: &[Token]) -> Option<Compiled> {
    let split = tokens
        .iter()
        .position(|t| matches!(t, Token::Lt | Token::Le | Token::Gt | Token::Ge))?;
    let op = tokens[split].clone();
    let [Token::Number(target)] = &tokens[split + 1..] else {
        return None;
    };
    let lhs = &tokens[..split];

    if let Some(terms) = weighted_sum_terms(lhs) {
        let names: Vec<String> = terms.iter().map(|(name, _)| name.clone()).collect();
        let variables = dedup_preserving_order(&names);
        let predicate = match op {
            Token::Ge => sum::min_sum(terms, *target),
            Token::Gt => sum::min_sum(terms, *target + sum::STRICT_EPSILON),
            Token::Le => sum::max_sum(terms, *target),
            Token::Lt => sum::max_sum(terms, *target - sum::STRICT_EPSILON),
            _ => return None,
        };
        return Some((variables.clone(), ConstraintPredicate::binarized(&variables, predicate)));
    }
    if let Some(terms) = bare_product_terms(lhs) {
        let variables = dedup_preserving_order(&terms);
        let predicate = match op {
            Token::Ge => product::min_product(terms, *target),
            Token::Gt => product::min_product(terms, *target + sum::STRICT_EPSILON),
            Token::Le => product::max_product(terms, *target),
            Token::Lt => product::max_product(terms, *target - sum::STRICT_EPSILON),
            _ => return None,
        };
        return Some((variables.clone(), ConstraintPredicate::binarized(&variables, predicate)));
    }
    None
}

fn recognize_membership(tokens: &[Token]) -> Option<Compiled> {
    let (name, negated, rest) = match tokens {
        [Token::Ident(name), Token::In, rest @ ..] => (name, false, rest),
        [Token::Ident(name), Token::Not, Token::In, rest @ ..] => (name, true, rest),
        _ => return None,
    };
    let [Token::LBracket, items @ .., Token::RBracket] = rest else {
        return None;
    };

    let mut set = HashSet::new();
    for item in items.split(|t| *t == Token::Comma) {
        match item {
            [Token::Number(n)] => {
                // An integral literal matches either numeric representation.
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    set.insert(Value::int(*n as i64));
                }
                set.insert(Value::real(*n));
            }
            [Token::Str(s)] => {
                set.insert(Value::text(s.clone()));
                set.insert(Value::symbol(s.clone()));
            }
            _ => return None,
        }
    }

    let predicate = if negated {
        membership::not_in_set(set)
    } else {
        membership::in_set(set)
    };
    Some((vec![name.clone()], ConstraintPredicate::Nary(predicate)))
}

// ---------------------------------------------------------------------------
// Generic fallback evaluator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Expr {
    Number(f64),
    Var(String),
    Negate(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn eval(&self, assignment: &Assignment) -> Option<f64> {
        match self {
            Expr::Number(n) => Some(*n),
            Expr::Var(name) => assignment.get(name)?.as_f64(),
            Expr::Negate(inner) => Some(-inner.eval(assignment)?),
            Expr::Add(l, r) => Some(l.eval(assignment)? + r.eval(assignment)?),
            Expr::Sub(l, r) => Some(l.eval(assignment)? - r.eval(assignment)?),
            Expr::Mul(l, r) => Some(l.eval(assignment)? * r.eval(assignment)?),
            Expr::Div(l, r) => {
                let divisor = r.eval(assignment)?;
                if divisor == 0.0 {
                    return None;
                }
                Some(l.eval(assignment)? / divisor)
            }
        }
    }

    fn collect_vars(&self, out: &mut Vec<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Var(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Expr::Negate(inner) => inner.collect_vars(out),
            Expr::Add(l, r) | Expr::Sub(l, r) | Expr::Mul(l, r) | Expr::Div(l, r) => {
                l.collect_vars(out);
                r.collect_vars(out);
            }
        }
    }
}

struct ExprParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// `sum := term ((+|-) term)*`, left-associative.
    fn parse_sum(&mut self) -> std::result::Result<Expr, String> {
        let mut lhs = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    lhs = Expr::Add(Box::new(lhs), Box::new(self.parse_term()?));
                }
                Some(Token::Minus) => {
                    self.advance();
                    lhs = Expr::Sub(Box::new(lhs), Box::new(self.parse_term()?));
                }
                _ => return Ok(lhs),
            }
        }
    }

    /// `term := factor ((*|/) factor)*`, left-associative.
    fn parse_term(&mut self) -> std::result::Result<Expr, String> {
        let mut lhs = self.parse_factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    lhs = Expr::Mul(Box::new(lhs), Box::new(self.parse_factor()?));
                }
                Some(Token::Slash) => {
                    self.advance();
                    lhs = Expr::Div(Box::new(lhs), Box::new(self.parse_factor()?));
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_factor(&mut self) -> std::result::Result<Expr, String> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Ident(name)) => Ok(Expr::Var(name)),
            Some(Token::Minus) => Ok(Expr::Negate(Box::new(self.parse_factor()?))),
            Some(Token::LParen) => {
                let inner = self.parse_sum()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("expected closing parenthesis".to_string()),
                }
            }
            Some(other) => Err(format!("unexpected token {:?}", other)),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

fn compile_generic(tokens: &[Token]) -> std::result::Result<Compiled, String> {
    let mut parser = ExprParser::new(tokens);
    let lhs = parser.parse_sum()?;
    let op = match parser.advance() {
        Some(op) if op.is_relational() => op,
        Some(other) => return Err(format!("expected comparison operator, found {:?}", other)),
        None => return Err("expected comparison operator".to_string()),
    };
    let rhs = parser.parse_sum()?;
    if parser.peek().is_some() {
        return Err("trailing tokens after comparison".to_string());
    }

    let mut variables = Vec::new();
    lhs.collect_vars(&mut variables);
    rhs.collect_vars(&mut variables);

    let vars_for_predicate = variables.clone();
    let predicate: NaryPredicate = Arc::new(move |assignment: &Assignment| {
        if vars_for_predicate
            .iter()
            .any(|var| !assignment.contains_key(var))
        {
            return true;
        }
        let (left, right) = match (lhs.eval(assignment), rhs.eval(assignment)) {
            (Some(l), Some(r)) => (l, r),
            _ => return false,
        };
        match op {
            Token::Eq => (left - right).abs() <= sum::EXACT_TOLERANCE,
            Token::Ne => (left - right).abs() > sum::EXACT_TOLERANCE,
            Token::Lt => left < right,
            Token::Le => left <= right,
            Token::Gt => left > right,
            Token::Ge => left >= right,
            _ => false,
        }
    });

    Ok((
        variables.clone(),
        ConstraintPredicate::binarized(&variables, predicate),
    ))
}
