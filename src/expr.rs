//! Value expressions.
//!
//! Output channels and variables are bound to expressions over device channels:
//!
//! ```text
//! expr    := term (("+" | "-") term)*
//! term    := unary (("*" | "/") unary)*
//! unary   := "-" unary | primary
//! primary := number | device "." channel | variable | "(" expr ")"
//! ```
//!
//! A device name is everything before the first `.` of a word, so names like `8bitdo`,
//! `left-pad` or `046d:c21d` can be referenced. A `-` directly before such a reference is part
//! of the device name; write `a - pad.BTN_A` to subtract. Device names that are all digits, or
//! that contain whitespace, `.` or one of `+*/()`, can't be referenced (see [`is_device_name`]).
//!
//! References are resolved once, when the expression is parsed. Evaluation only reads the
//! committed values of live devices and the cached values of variables.

use std::{fmt, iter::Peekable, str::CharIndices};

use crate::device::{ChannelId, InputDevice};
use crate::error::ConfigError;
use crate::registry::{DeviceHandle, DeviceRegistry};
use crate::variables::Variables;

/// Index of a variable in its [`Variables`] table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableId(pub(crate) usize);

/// Name resolution for [`Expr::parse`].
pub trait Resolver {
    fn find_device(&self, name: &str) -> Option<(DeviceHandle, &dyn InputDevice)>;
    fn find_variable(&self, name: &str) -> Option<VariableId>;
}

/// Resolves names against live devices and the variables declared so far.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub registry: &'a DeviceRegistry,
    pub variables: &'a Variables,
}

impl Resolver for Scope<'_> {
    fn find_device(&self, name: &str) -> Option<(DeviceHandle, &dyn InputDevice)> {
        let handle = self.registry.find_by_name(name)?;
        Some((handle, self.registry.get(handle)?))
    }

    fn find_variable(&self, name: &str) -> Option<VariableId> {
        self.variables.find(name)
    }
}

/// A resolved `device.channel` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRef {
    pub device: DeviceHandle,
    pub channel: ChannelId,
}

impl ChannelRef {
    /// Reads the channel, or `None` if the device is gone.
    pub fn read(&self, registry: &DeviceRegistry) -> Option<f32> {
        registry.get(self.device)?.value(self.channel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    fn apply(self, lhs: f32, rhs: f32) -> f32 {
        match self {
            BinOp::Add => lhs + rhs,
            BinOp::Sub => lhs - rhs,
            BinOp::Mul => lhs * rhs,
            BinOp::Div => lhs / rhs,
        }
    }
}

/// What an expression is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub registry: &'a DeviceRegistry,
    /// Cached variable values, indexed by [`VariableId`].
    pub variables: &'a [Option<f32>],
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f32),
    Channel(ChannelRef),
    Variable(VariableId),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Parses and resolves `text`.
    pub fn parse(text: &str, resolver: &dyn Resolver) -> Result<Self, ConfigError> {
        let mut parser = Parser {
            text,
            tokens: Lexer::new(text).peekable(),
            resolver,
        };
        let expr = parser.expr()?;
        match parser.next()? {
            None => Ok(expr),
            Some(token) => Err(parser.syntax(format!("unexpected {token}"))),
        }
    }

    /// Computes the current value.
    ///
    /// Returns `None` if a referenced device is gone, a referenced variable has no value, or the
    /// result is not finite.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Option<f32> {
        let value = match self {
            Expr::Const(value) => *value,
            Expr::Channel(channel) => channel.read(ctx.registry)?,
            Expr::Variable(id) => ctx.variables.get(id.0).copied().flatten()?,
            Expr::Neg(expr) => -expr.evaluate(ctx)?,
            Expr::Binary(op, lhs, rhs) => op.apply(lhs.evaluate(ctx)?, rhs.evaluate(ctx)?),
        };
        value.is_finite().then_some(value)
    }

    /// If this expression is a plain channel reference, returns it.
    pub fn as_channel(&self) -> Option<ChannelRef> {
        match self {
            Expr::Channel(channel) => Some(*channel),
            _ => None,
        }
    }
}

/// Returns whether `name` can appear as the device part of a `device.channel` reference.
pub fn is_device_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && !name.bytes().all(|b| b.is_ascii_digit())
        && !name.chars().any(|c| c.is_whitespace() || is_delimiter(c) || c == '.')
}

/// Characters that end a word.
fn is_delimiter(c: char) -> bool {
    matches!(c, '+' | '*' | '/' | '(' | ')')
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Number(f32),
    Ident(&'a str),
    /// `device.channel` written without spaces.
    Reference(&'a str, &'a str),
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number `{n}`"),
            Token::Ident(ident) => write!(f, "`{ident}`"),
            Token::Reference(device, channel) => write!(f, "`{device}.{channel}`"),
            Token::Dot => f.write_str("`.`"),
            Token::Plus => f.write_str("`+`"),
            Token::Minus => f.write_str("`-`"),
            Token::Star => f.write_str("`*`"),
            Token::Slash => f.write_str("`/`"),
            Token::LParen => f.write_str("`(`"),
            Token::RParen => f.write_str("`)`"),
        }
    }
}

/// Splits an expression into tokens. Lexical errors are reported as `Err(reason)`.
struct Lexer<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.char_indices().peekable(),
        }
    }

    /// Byte offset of the next unconsumed character.
    fn pos(&mut self) -> usize {
        self.chars.peek().map_or(self.text.len(), |&(i, _)| i)
    }

    /// Consumes characters matching `pred` and returns the text from `start` up to the new
    /// position.
    fn take_while(&mut self, start: usize, pred: impl Fn(char) -> bool) -> &'a str {
        while self.chars.next_if(|&(_, c)| pred(c)).is_some() {}
        &self.text[start..self.pos()]
    }

    /// If the word starting at `start` is a `device.channel` reference, returns the device part.
    fn reference_device(&self, start: usize) -> Option<&'a str> {
        let rest = &self.text[start..];
        let end = rest
            .find(|c: char| c.is_whitespace() || is_delimiter(c))
            .unwrap_or(rest.len());
        let (device, _) = rest[..end].split_once('.')?;
        is_device_name(device).then_some(device)
    }

    /// Lexes a reference whose device part starts at `start`.
    fn reference(&mut self, start: usize, device: &'a str) -> Result<Token<'a>, String> {
        let dot = start + device.len();
        while self.chars.next_if(|&(i, _)| i <= dot).is_some() {}
        let channel = self.take_while(dot + 1, is_ident);
        if !channel.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
            return Err(format!("expected a channel name after `{device}.`"));
        }
        Ok(Token::Reference(device, channel))
    }
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, String>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}

        let (start, c) = self.chars.next()?;
        if !matches!(c, '.' | '-') && !is_delimiter(c) {
            if let Some(device) = self.reference_device(start) {
                return Some(self.reference(start, device));
            }
        }
        let token = match c {
            '.' => Token::Dot,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '0'..='9' => {
                self.take_while(start, |c| c.is_ascii_digit());
                // A fractional part needs a digit after the dot.
                let mut lookahead = self.chars.clone();
                if matches!(
                    (lookahead.next(), lookahead.next()),
                    (Some((_, '.')), Some((_, d))) if d.is_ascii_digit()
                ) {
                    self.chars.next();
                    self.take_while(start, |c| c.is_ascii_digit());
                }
                let end = self.pos();
                if self.chars.peek().is_some_and(|&(_, c)| is_ident(c)) {
                    let word = self.take_while(start, is_ident);
                    return Some(Err(format!("invalid number `{word}`")));
                }
                match self.text[start..end].parse() {
                    Ok(n) => Token::Number(n),
                    Err(e) => return Some(Err(format!("invalid number: {e}"))),
                }
            }
            c if is_ident(c) => Token::Ident(self.take_while(start, is_ident)),
            c => return Some(Err(format!("unexpected character `{c}`"))),
        };
        Some(Ok(token))
    }
}

struct Parser<'a, 'r> {
    text: &'a str,
    tokens: Peekable<Lexer<'a>>,
    resolver: &'r dyn Resolver,
}

impl<'a> Parser<'a, '_> {
    fn syntax(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::Syntax {
            expr: self.text.into(),
            reason: reason.into(),
        }
    }

    fn next(&mut self) -> Result<Option<Token<'a>>, ConfigError> {
        match self.tokens.next() {
            Some(Ok(token)) => Ok(Some(token)),
            Some(Err(reason)) => Err(self.syntax(reason)),
            None => Ok(None),
        }
    }

    /// Consumes the next token if it is one of `ops`.
    fn eat(&mut self, ops: &[Token<'_>]) -> Option<Token<'a>> {
        self.tokens
            .next_if(|t| t.as_ref().is_ok_and(|t| ops.contains(t)))
            .and_then(Result::ok)
    }

    fn expr(&mut self) -> Result<Expr, ConfigError> {
        let mut lhs = self.term()?;
        while let Some(token) = self.eat(&[Token::Plus, Token::Minus]) {
            let op = if token == Token::Plus {
                BinOp::Add
            } else {
                BinOp::Sub
            };
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(self.term()?));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, ConfigError> {
        let mut lhs = self.unary()?;
        while let Some(token) = self.eat(&[Token::Star, Token::Slash]) {
            let op = if token == Token::Star {
                BinOp::Mul
            } else {
                BinOp::Div
            };
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(self.unary()?));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ConfigError> {
        if self.eat(&[Token::Minus]).is_some() {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ConfigError> {
        match self.next()? {
            Some(Token::Number(n)) => Ok(Expr::Const(n)),
            Some(Token::LParen) => {
                let expr = self.expr()?;
                match self.next()? {
                    Some(Token::RParen) => Ok(expr),
                    Some(token) => Err(self.syntax(format!("expected `)`, found {token}"))),
                    None => Err(self.syntax("unclosed `(`")),
                }
            }
            Some(Token::Reference(device, channel)) => self.channel(device, channel),
            Some(Token::Ident(name)) => {
                if self.eat(&[Token::Dot]).is_some() {
                    match self.next()? {
                        Some(Token::Ident(channel)) => self.channel(name, channel),
                        Some(token) => {
                            Err(self.syntax(format!("expected channel name, found {token}")))
                        }
                        None => Err(self.syntax(format!("missing channel name after `{name}.`"))),
                    }
                } else {
                    self.variable(name)
                }
            }
            Some(token) => Err(self.syntax(format!("unexpected {token}"))),
            None => Err(self.syntax("unexpected end of expression")),
        }
    }

    fn channel(&self, device: &str, channel: &str) -> Result<Expr, ConfigError> {
        let Some((handle, dev)) = self.resolver.find_device(device) else {
            return Err(ConfigError::UnknownDevice {
                expr: self.text.into(),
                device: device.into(),
            });
        };
        let Some(id) = dev.parse_channel(channel) else {
            return Err(ConfigError::UnknownChannel {
                device: device.into(),
                channel: channel.into(),
            });
        };
        Ok(Expr::Channel(ChannelRef {
            device: handle,
            channel: id,
        }))
    }

    fn variable(&self, name: &str) -> Result<Expr, ConfigError> {
        self.resolver
            .find_variable(name)
            .map(Expr::Variable)
            .ok_or_else(|| ConfigError::UnknownVariable {
                expr: self.text.into(),
                name: name.into(),
            })
    }
}
