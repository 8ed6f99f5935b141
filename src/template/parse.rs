use std::{iter::Peekable, vec::IntoIter};

use miette::SourceSpan;

use super::{Helper, ParseErrorKind};

const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";
const TRIM_MARKER: char = '-';
const LEFT_COMMENT: &str = "/*";
const RIGHT_COMMENT: &str = "*/";

#[derive(Debug)]
pub(super) enum Node {
    Text(String),
    Action(Pipeline),
}

/// Commands separated by `|`, each receiving the previous value as its last argument.
#[derive(Debug)]
pub(super) struct Pipeline {
    pub(super) commands: Vec<Command>,
}

#[derive(Debug)]
pub(super) enum Command {
    /// Only valid as the first stage of a pipeline.
    Operand(Operand),
    Call {
        helper: Helper,
        args: Vec<Operand>,
        span: SourceSpan,
    },
}

#[derive(Debug)]
pub(super) enum Operand {
    /// An empty path is `.`, the whole issue.
    Field { path: Vec<String>, span: SourceSpan },
    Literal(String),
    Pipeline(Pipeline),
}

#[derive(Debug)]
pub(super) struct Failure {
    pub(super) kind: ParseErrorKind,
    pub(super) span: SourceSpan,
}

impl Failure {
    fn new(kind: ParseErrorKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            span: (start..end).into(),
        }
    }
}

type Result<T> = std::result::Result<T, Failure>;

pub(super) fn parse(source: &str) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut pos = 0;
    let mut trim_leading = false;

    loop {
        let rest = &source[pos..];
        let Some(offset) = rest.find(LEFT_DELIM) else {
            push_text(&mut nodes, rest, trim_leading, false);
            return Ok(nodes);
        };
        let open = pos + offset;
        let mut body = open + LEFT_DELIM.len();
        let trim_trailing = source[body..].starts_with(TRIM_MARKER)
            && source[body + 1..].starts_with(char::is_whitespace);
        if trim_trailing {
            body += 1;
        }
        push_text(&mut nodes, &source[pos..open], trim_leading, trim_trailing);

        let close = if source[body..].trim_start().starts_with(LEFT_COMMENT) {
            skip_comment(source, open, body)?
        } else {
            let mut lexer = Lexer { source, pos: body };
            let (tokens, close) = lexer.action(open)?;
            let span = (open..close.end).into();
            let pipeline = Parser::new(tokens, span).action()?;
            nodes.push(Node::Action(pipeline));
            close
        };
        trim_leading = close.trim;
        pos = close.end;
    }
}

fn push_text(nodes: &mut Vec<Node>, text: &str, trim_leading: bool, trim_trailing: bool) {
    let text = if trim_leading { text.trim_start() } else { text };
    let text = if trim_trailing { text.trim_end() } else { text };
    if !text.is_empty() {
        nodes.push(Node::Text(text.to_string()));
    }
}

/// Where an action ended and whether it asked for the following text to be trimmed.
struct Close {
    end: usize,
    trim: bool,
}

/// Match a right delimiter at the start of `source[pos..]`, optionally preceded by whitespace.
fn right_delim(source: &str, pos: usize) -> Option<Close> {
    let rest = &source[pos..];
    let trimmed = rest.trim_start();
    let whitespace = rest.len() - trimmed.len();
    if trimmed.starts_with(RIGHT_DELIM) {
        return Some(Close {
            end: pos + whitespace + RIGHT_DELIM.len(),
            trim: false,
        });
    }
    let marked = trimmed.strip_prefix(TRIM_MARKER)?;
    (whitespace > 0 && marked.starts_with(RIGHT_DELIM)).then(|| Close {
        end: pos + whitespace + 1 + RIGHT_DELIM.len(),
        trim: true,
    })
}

fn skip_comment(source: &str, open: usize, body: usize) -> Result<Close> {
    let start = body + source[body..].find(LEFT_COMMENT).unwrap_or_default() + LEFT_COMMENT.len();
    let end = source[start..]
        .find(RIGHT_COMMENT)
        .map(|offset| start + offset + RIGHT_COMMENT.len())
        .ok_or_else(|| Failure::new(ParseErrorKind::UnclosedComment, open, start))?;
    right_delim(source, end)
        .ok_or_else(|| Failure::new(ParseErrorKind::UnclosedComment, open, end))
}

#[derive(Debug, PartialEq)]
enum TokenKind {
    Field(Vec<String>),
    Identifier(String),
    Literal(String),
    Pipe,
    LeftParen,
    RightParen,
}

#[derive(Debug)]
struct Token {
    kind: TokenKind,
    span: SourceSpan,
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let source = self.source;
        let start = self.pos;
        while self.peek().is_some_and(&predicate) {
            self.bump();
        }
        &source[start..self.pos]
    }

    /// Tokenize the body of the action opened at `open`, up to and including its right delimiter.
    fn action(&mut self, open: usize) -> Result<(Vec<Token>, Close)> {
        let mut tokens = Vec::new();
        loop {
            if let Some(close) = right_delim(self.source, self.pos) {
                return Ok((tokens, close));
            }
            self.take_while(char::is_whitespace);
            let start = self.pos;
            let Some(c) = self.bump() else {
                return Err(Failure::new(
                    ParseErrorKind::UnclosedAction,
                    open,
                    open + LEFT_DELIM.len(),
                ));
            };
            let kind = match c {
                '|' => TokenKind::Pipe,
                '(' => TokenKind::LeftParen,
                ')' => TokenKind::RightParen,
                '.' => self.field(start)?,
                '"' => TokenKind::Literal(self.quoted(start)?),
                '`' => TokenKind::Literal(self.raw(start)?),
                c if c.is_ascii_alphabetic() || c == '_' => {
                    self.pos = start;
                    TokenKind::Identifier(self.take_while(is_identifier).to_string())
                }
                c => {
                    return Err(Failure::new(
                        ParseErrorKind::UnexpectedCharacter(c),
                        start,
                        self.pos,
                    ))
                }
            };
            tokens.push(Token {
                kind,
                span: (start..self.pos).into(),
            });
        }
    }

    /// The leading `.` has already been consumed.
    fn field(&mut self, start: usize) -> Result<TokenKind> {
        let mut path = Vec::new();
        loop {
            let name = self.take_while(is_identifier);
            if name.is_empty() {
                if path.is_empty() {
                    return Ok(TokenKind::Field(path));
                }
                return Err(Failure::new(ParseErrorKind::BadField, start, self.pos));
            }
            path.push(name.to_string());
            if self.peek() != Some('.') {
                return Ok(TokenKind::Field(path));
            }
            self.bump();
        }
    }

    fn quoted(&mut self, start: usize) -> Result<String> {
        let mut value = String::new();
        loop {
            let c = match self.bump() {
                None | Some('\n') => {
                    return Err(Failure::new(
                        ParseErrorKind::UnterminatedString,
                        start,
                        self.pos,
                    ))
                }
                Some('"') => return Ok(value),
                Some(c) => c,
            };
            if c != '\\' {
                value.push(c);
                continue;
            }
            let escape = self.pos - 1;
            value.push(match self.bump() {
                Some('\\') => '\\',
                Some('"') => '"',
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                _ => {
                    return Err(Failure::new(
                        ParseErrorKind::UnknownEscape,
                        escape,
                        self.pos,
                    ))
                }
            });
        }
    }

    fn raw(&mut self, start: usize) -> Result<String> {
        let value = self.take_while(|c| c != '`').to_string();
        if self.bump().is_none() {
            return Err(Failure::new(
                ParseErrorKind::UnterminatedString,
                start,
                self.pos,
            ));
        }
        Ok(value)
    }
}

fn is_identifier(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

struct Parser {
    tokens: Peekable<IntoIter<Token>>,
    /// The whole action, for errors with no better place to point at.
    action: SourceSpan,
}

impl Parser {
    fn new(tokens: Vec<Token>, action: SourceSpan) -> Self {
        Self {
            tokens: tokens.into_iter().peekable(),
            action,
        }
    }

    fn action(mut self) -> Result<Pipeline> {
        let pipeline = self.pipeline()?;
        match self.tokens.next() {
            None => Ok(pipeline),
            Some(token) => Err(Failure {
                kind: ParseErrorKind::UnexpectedRightParen,
                span: token.span,
            }),
        }
    }

    /// Stops before a `)` or at the end of the action.
    fn pipeline(&mut self) -> Result<Pipeline> {
        let mut commands = Vec::new();
        loop {
            commands.push(self.command(commands.len())?);
            match self.tokens.peek().map(|token| &token.kind) {
                Some(TokenKind::Pipe) => {
                    self.tokens.next();
                }
                _ => return Ok(Pipeline { commands }),
            }
        }
    }

    fn command(&mut self, stage: usize) -> Result<Command> {
        let helper = match self.tokens.peek() {
            Some(Token {
                kind: TokenKind::Identifier(name),
                span,
            }) => {
                let span = *span;
                let helper = Helper::from_name(name).ok_or_else(|| Failure {
                    kind: ParseErrorKind::UnknownFunction(name.clone()),
                    span,
                })?;
                self.tokens.next();
                Some((helper, span))
            }
            _ => None,
        };

        let mut operands = Vec::new();
        while let Some(operand) = self.operand()? {
            operands.push(operand);
        }

        let Some((helper, span)) = helper else {
            return self.plain_command(stage, operands);
        };
        Ok(Command::Call {
            helper,
            args: operands,
            span,
        })
    }

    fn plain_command(&mut self, stage: usize, mut operands: Vec<Operand>) -> Result<Command> {
        let span = self.tokens.peek().map_or(self.action, |token| token.span);
        if operands.len() > 1 {
            return Err(Failure {
                kind: ParseErrorKind::NotAFunction,
                span,
            });
        }
        let Some(operand) = operands.pop() else {
            return Err(Failure {
                kind: ParseErrorKind::MissingValue,
                span,
            });
        };
        if stage > 0 {
            return Err(Failure {
                kind: ParseErrorKind::NotExecutable(stage + 1),
                span: operand_span(&operand).unwrap_or(span),
            });
        }
        Ok(Command::Operand(operand))
    }

    /// The next argument, or `None` at the end of the command.
    fn operand(&mut self) -> Result<Option<Operand>> {
        let Some(token) = self.tokens.next_if(|token| {
            !matches!(token.kind, TokenKind::Pipe | TokenKind::RightParen)
        }) else {
            return Ok(None);
        };
        let operand = match token.kind {
            TokenKind::Field(path) => Operand::Field {
                path,
                span: token.span,
            },
            TokenKind::Literal(value) => Operand::Literal(value),
            TokenKind::LeftParen => {
                let pipeline = self.pipeline()?;
                self.tokens
                    .next_if(|next| next.kind == TokenKind::RightParen)
                    .ok_or(Failure {
                        kind: ParseErrorKind::UnclosedParen,
                        span: token.span,
                    })?;
                Operand::Pipeline(pipeline)
            }
            TokenKind::Identifier(name) => {
                let kind = if Helper::from_name(&name).is_some() {
                    ParseErrorKind::NestedFunction(name)
                } else {
                    ParseErrorKind::UnknownFunction(name)
                };
                return Err(Failure {
                    kind,
                    span: token.span,
                });
            }
            TokenKind::Pipe | TokenKind::RightParen => return Ok(None),
        };
        Ok(Some(operand))
    }
}

fn operand_span(operand: &Operand) -> Option<SourceSpan> {
    match operand {
        Operand::Field { span, .. } => Some(*span),
        Operand::Literal(_) | Operand::Pipeline(_) => None,
    }
}
