/// Projection formula parsing and evaluation
///
/// Formulas are scalar expressions over a fixed list of variables, written
/// either in plain notation (`x/y`, `sin(x)*2`) or in the LaTeX a math input
/// widget produces (`\frac{x}{y}`, `2\sin\left(x\right)`).
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit0, digit1, multispace1, satisfy},
    combinator::{map, map_opt, opt, recognize, value},
    error::{ErrorKind, ParseError},
    multi::{fold_many0, many0_count},
    sequence::{delimited, pair, preceded},
    IResult,
};
use std::f64::consts::{E, PI};
use std::fmt;
use std::cell::Cell;
use thiserror::Error;

/// Nesting limit for groups, signs, exponents and function calls
pub const MAX_DEPTH: usize = 128;

/// Formula text that could not be compiled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("formula is empty")]
    Empty,
    #[error("unknown symbol `{symbol}` at offset {offset}")]
    UnknownSymbol { symbol: String, offset: usize },
    #[error("unexpected {found} at offset {offset}")]
    Syntax { offset: usize, found: String },
    #[error("formula nests deeper than {} levels at offset {offset}", MAX_DEPTH)]
    TooDeep { offset: usize },
}

/// A compiled formula that failed for one set of bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NonFinite,
    #[error("expected {expected} variable bindings, got {got}")]
    MissingBinding { expected: usize, got: usize },
}

/// A scalar function of the variables it was compiled against
pub trait Formula: fmt::Debug {
    /// Evaluate with `bindings[i]` as the value of the i-th variable.
    fn evaluate(&self, bindings: &[f64]) -> Result<f64, EvalError>;

    /// The text this formula was compiled from.
    fn source(&self) -> &str;
}

/// Turns formula text into something that can be evaluated many times
pub trait Evaluator {
    fn compile(&self, text: &str, variables: &[&str]) -> Result<Box<dyn Formula>, CompileError>;
}

/// Built-in evaluator for plain and LaTeX math notation
#[derive(Debug, Default, Clone, Copy)]
pub struct MathEvaluator;

impl Evaluator for MathEvaluator {
    fn compile(&self, text: &str, variables: &[&str]) -> Result<Box<dyn Formula>, CompileError> {
        let expr = parse(text, variables)?;
        Ok(Box::new(CompiledFormula {
            source: text.to_string(),
            arity: variables.len(),
            expr,
        }))
    }
}

#[derive(Debug, Clone)]
struct CompiledFormula {
    source: String,
    arity: usize,
    expr: Expr,
}

impl Formula for CompiledFormula {
    fn evaluate(&self, bindings: &[f64]) -> Result<f64, EvalError> {
        if bindings.len() < self.arity {
            return Err(EvalError::MissingBinding {
                expected: self.arity,
                got: bindings.len(),
            });
        }

        let result = self.expr.eval(bindings)?;
        if result.is_finite() {
            Ok(result)
        } else {
            Err(EvalError::NonFinite)
        }
    }

    fn source(&self) -> &str {
        &self.source
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Log,
    Sqrt,
    Abs,
}

impl Func {
    fn apply(self, v: f64) -> f64 {
        match self {
            Func::Sin => v.sin(),
            Func::Cos => v.cos(),
            Func::Tan => v.tan(),
            Func::Asin => v.asin(),
            Func::Acos => v.acos(),
            Func::Atan => v.atan(),
            Func::Sinh => v.sinh(),
            Func::Cosh => v.cosh(),
            Func::Tanh => v.tanh(),
            Func::Exp => v.exp(),
            Func::Ln => v.ln(),
            Func::Log => v.log10(),
            Func::Sqrt => v.sqrt(),
            Func::Abs => v.abs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Var(usize),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
    /// n-th root: degree, radicand
    Root(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    fn eval(&self, bindings: &[f64]) -> Result<f64, EvalError> {
        Ok(match self {
            Expr::Number(v) => *v,
            Expr::Var(index) => bindings[*index],
            Expr::Neg(inner) => -inner.eval(bindings)?,
            Expr::Binary(op, lhs, rhs) => {
                let lhs = lhs.eval(bindings)?;
                let rhs = rhs.eval(bindings)?;
                match op {
                    BinaryOp::Add => lhs + rhs,
                    BinaryOp::Sub => lhs - rhs,
                    BinaryOp::Mul => lhs * rhs,
                    BinaryOp::Div if rhs == 0.0 => return Err(EvalError::DivisionByZero),
                    BinaryOp::Div => lhs / rhs,
                    BinaryOp::Pow => lhs.powf(rhs),
                }
            }
            Expr::Call(func, arg) => func.apply(arg.eval(bindings)?),
            Expr::Root(degree, radicand) => {
                let degree = degree.eval(bindings)?;
                let radicand = radicand.eval(bindings)?;
                if degree == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                let odd = degree.fract() == 0.0 && degree % 2.0 != 0.0;
                if radicand < 0.0 && odd {
                    -(-radicand).powf(degree.recip())
                } else {
                    radicand.powf(degree.recip())
                }
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reason {
    Syntax,
    UnknownSymbol,
    TooDeep,
}

/// Parse failure carrying the remaining input at the failure point
#[derive(Debug)]
struct SyntaxError<'a> {
    input: &'a str,
    reason: Reason,
}

impl<'a> SyntaxError<'a> {
    fn unknown_symbol(input: &'a str) -> Self {
        Self {
            input,
            reason: Reason::UnknownSymbol,
        }
    }

    fn too_deep(input: &'a str) -> Self {
        Self {
            input,
            reason: Reason::TooDeep,
        }
    }

    fn into_compile_error(self, text: &str) -> CompileError {
        let offset = text.len() - self.input.len();
        match self.reason {
            Reason::UnknownSymbol => CompileError::UnknownSymbol {
                symbol: self.input.chars().take(1).collect(),
                offset,
            },
            Reason::TooDeep => CompileError::TooDeep { offset },
            Reason::Syntax => syntax_error(text, self.input),
        }
    }
}

impl<'a> ParseError<&'a str> for SyntaxError<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        Self {
            input,
            reason: Reason::Syntax,
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    fn or(self, other: Self) -> Self {
        // report whichever branch got further
        if self.input.len() < other.input.len() {
            self
        } else {
            other
        }
    }
}

fn syntax_error(text: &str, rest: &str) -> CompileError {
    let found = if rest.is_empty() {
        "end of input".to_string()
    } else {
        format!("`{}`", rest.chars().take(12).collect::<String>())
    };
    CompileError::Syntax {
        offset: text.len() - rest.len(),
        found,
    }
}

type PResult<'a, O> = IResult<&'a str, O, SyntaxError<'a>>;

/// Whitespace and LaTeX spacing commands
fn blank(input: &str) -> PResult<'_, ()> {
    value(
        (),
        many0_count(alt((
            multispace1,
            tag("\\,"),
            tag("\\;"),
            tag("\\:"),
            tag("\\!"),
            tag("\\ "),
            tag("~"),
        ))),
    )(input)
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: FnMut(&'a str) -> PResult<'a, O>,
{
    delimited(blank, inner, blank)
}

fn number(input: &str) -> PResult<'_, Expr> {
    map_opt(
        recognize(alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        ))),
        |digits: &str| digits.parse().ok().map(Expr::Number),
    )(input)
}

fn function_name(input: &str) -> PResult<'_, Func> {
    alt((
        value(Func::Asin, alt((tag("arcsin"), tag("asin")))),
        value(Func::Acos, alt((tag("arccos"), tag("acos")))),
        value(Func::Atan, alt((tag("arctan"), tag("atan")))),
        value(Func::Sinh, tag("sinh")),
        value(Func::Cosh, tag("cosh")),
        value(Func::Tanh, tag("tanh")),
        value(Func::Sqrt, tag("sqrt")),
        value(Func::Sin, tag("sin")),
        value(Func::Cos, tag("cos")),
        value(Func::Tan, tag("tan")),
        value(Func::Exp, tag("exp")),
        value(Func::Abs, tag("abs")),
        value(Func::Ln, tag("ln")),
        value(Func::Log, tag("log")),
    ))(input)
}

fn additive(input: &str) -> PResult<'_, BinaryOp> {
    alt((value(BinaryOp::Add, char('+')), value(BinaryOp::Sub, char('-'))))(input)
}

fn multiplicative(input: &str) -> PResult<'_, BinaryOp> {
    alt((
        value(BinaryOp::Mul, char('*')),
        value(BinaryOp::Mul, tag("\\cdot")),
        value(BinaryOp::Mul, tag("\\times")),
        value(BinaryOp::Div, char('/')),
        value(BinaryOp::Div, tag("\\div")),
    ))(input)
}

/// Recursive-descent grammar; knows the variable names it may bind.
///
/// `unary`, `power` and `exponent` each count one nesting level; past
/// `MAX_DEPTH` parsing fails with `CompileError::TooDeep`.
///
/// ```text
/// expr     := term (('+' | '-') term)*
/// term     := unary (mul_op unary | power)*       implicit product
/// unary    := ('-' | '+') unary | power
/// power    := atom ('^' exponent)?
/// exponent := '-' exponent | power
/// atom     := number | group | frac | root | call | symbol
/// ```
struct Grammar<'v> {
    variables: &'v [&'v str],
    depth: Cell<usize>,
}

impl<'v> Grammar<'v> {
    fn new(variables: &'v [&'v str]) -> Self {
        Self {
            variables,
            depth: Cell::new(0),
        }
    }

    fn nested<'a, O>(&self, input: &'a str, parser: impl FnOnce(&'a str) -> PResult<'a, O>) -> PResult<'a, O> {
        let depth = self.depth.get();
        if depth >= MAX_DEPTH {
            return Err(nom::Err::Failure(SyntaxError::too_deep(input)));
        }
        self.depth.set(depth + 1);
        let result = parser(input);
        self.depth.set(depth);
        result
    }

    fn expr<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        let (input, first) = self.term(input)?;
        fold_many0(
            pair(ws(additive), |i: &'a str| self.term(i)),
            move || first.clone(),
            |lhs, (op, rhs)| Expr::binary(op, lhs, rhs),
        )(input)
    }

    fn term<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        let (input, first) = self.unary(input)?;
        fold_many0(
            alt((
                pair(ws(multiplicative), |i: &'a str| self.unary(i)),
                map(|i: &'a str| self.power(i), |rhs| (BinaryOp::Mul, rhs)),
            )),
            move || first.clone(),
            |lhs, (op, rhs)| Expr::binary(op, lhs, rhs),
        )(input)
    }

    fn unary<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        self.nested(input, |input| {
            alt((
                map(preceded(ws(char('-')), |i: &'a str| self.unary(i)), |e| Expr::Neg(Box::new(e))),
                preceded(ws(char('+')), |i: &'a str| self.unary(i)),
                |i: &'a str| self.power(i),
            ))(input)
        })
    }

    fn power<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        self.nested(input, |input| {
            let (input, base) = preceded(blank, |i: &'a str| self.atom(i))(input)?;
            let (input, exponent) = opt(preceded(ws(char('^')), |i: &'a str| self.exponent(i)))(input)?;
            Ok(match exponent {
                Some(exponent) => (input, Expr::binary(BinaryOp::Pow, base, exponent)),
                None => (input, base),
            })
        })
    }

    fn exponent<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        self.nested(input, |input| {
            alt((
                map(preceded(ws(char('-')), |i: &'a str| self.exponent(i)), |e| Expr::Neg(Box::new(e))),
                |i: &'a str| self.power(i),
            ))(input)
        })
    }

    fn atom<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        alt((
            number,
            |i: &'a str| self.group(i),
            |i: &'a str| self.frac(i),
            |i: &'a str| self.root(i),
            |i: &'a str| self.call(i),
            |i: &'a str| self.symbol(i),
        ))(input)
    }

    fn braced<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        delimited(ws(char('{')), |i: &'a str| self.expr(i), ws(char('}')))(input)
    }

    fn group<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        let abs = |e| Expr::Call(Func::Abs, Box::new(e));
        alt((
            delimited(tag("\\left("), |i: &'a str| self.expr(i), ws(tag("\\right)"))),
            delimited(tag("\\left["), |i: &'a str| self.expr(i), ws(tag("\\right]"))),
            map(delimited(tag("\\left|"), |i: &'a str| self.expr(i), ws(tag("\\right|"))), abs),
            delimited(char('('), |i: &'a str| self.expr(i), ws(char(')'))),
            delimited(char('['), |i: &'a str| self.expr(i), ws(char(']'))),
            |i: &'a str| self.braced(i),
        ))(input)
    }

    fn frac<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        map(
            preceded(
                alt((tag("\\frac"), tag("\\dfrac"), tag("\\tfrac"))),
                pair(|i: &'a str| self.braced(i), |i: &'a str| self.braced(i)),
            ),
            |(num, den)| Expr::binary(BinaryOp::Div, num, den),
        )(input)
    }

    fn root<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        map(
            preceded(
                tag("\\sqrt"),
                pair(
                    opt(delimited(ws(char('[')), |i: &'a str| self.expr(i), ws(char(']')))),
                    |i: &'a str| self.braced(i),
                ),
            ),
            |(degree, radicand)| match degree {
                Some(degree) => Expr::Root(Box::new(degree), Box::new(radicand)),
                None => Expr::Call(Func::Sqrt, Box::new(radicand)),
            },
        )(input)
    }

    /// `sin(x)`, `\sin\left(x\right)` or `\sin x`
    fn call<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        let (input, func) = preceded(opt(char('\\')), function_name)(input)?;
        let (input, arg) = self.power(input)?;
        Ok((input, Expr::Call(func, Box::new(arg))))
    }

    fn symbol<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        if let Ok((rest, _)) = alt((tag::<_, _, SyntaxError<'a>>("\\pi"), tag("pi")))(input) {
            return Ok((rest, Expr::Number(PI)));
        }

        // longest variable name wins so `xy` binds before `x` when both exist
        let bound = self
            .variables
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty() && input.starts_with(**name))
            .max_by_key(|(_, name)| name.len());
        if let Some((index, name)) = bound {
            return Ok((&input[name.len()..], Expr::Var(index)));
        }

        let (rest, c) = satisfy(|c| c.is_alphabetic())(input)?;
        if c == 'e' {
            return Ok((rest, Expr::Number(E)));
        }
        Err(nom::Err::Failure(SyntaxError::unknown_symbol(input)))
    }
}

fn parse(text: &str, variables: &[&str]) -> Result<Expr, CompileError> {
    if text.trim().is_empty() {
        return Err(CompileError::Empty);
    }

    let grammar = Grammar::new(variables);
    let parsed = ws(|i| grammar.expr(i))(text);
    match parsed {
        Ok(("", expr)) => Ok(expr),
        Ok((rest, _)) => Err(syntax_error(text, rest)),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(e.into_compile_error(text)),
        Err(nom::Err::Incomplete(_)) => Err(syntax_error(text, "")),
    }
}
