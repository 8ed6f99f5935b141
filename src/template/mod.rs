//! A small, closed template language for building branch names.
//!
//! Text is copied verbatim, and anything between `{{` and `}}` is an action which reads a field
//! of the issue and optionally pipes it through [helper functions](Helper), e.g.
//! `{{ .Key | ToLower }}-{{ .Fields.Summary | Trim | KebabCase }}`. `{{-` and `-}}` trim
//! whitespace around an action and `{{/* ... */}}` is a comment.

use miette::{Diagnostic, SourceSpan};

pub use self::functions::{help_text, Helper};
use self::parse::{Command, Node, Operand, Pipeline};

mod functions;
mod parse;

/// Supplies the values of field paths like `.Fields.Summary` to a [`Template`].
pub trait Context {
    fn field(&self, path: &[String]) -> Field<'_>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Field<'a> {
    Text(&'a str),
    /// The field exists but isn't set on this particular value.
    NoValue,
    Unknown,
}

/// A parsed template, ready to render any number of times.
#[derive(Debug)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

impl Template {
    /// Parse `source`, checking that every function it calls exists.
    ///
    /// # Errors
    ///
    /// If the template is syntactically invalid or names an unknown function.
    pub fn parse(source: impl Into<String>) -> Result<Self, ParseError> {
        let source = source.into();
        match parse::parse(&source) {
            Ok(nodes) => Ok(Self { source, nodes }),
            Err(failure) => Err(ParseError {
                kind: failure.kind,
                source_code: source,
                span: failure.span,
            }),
        }
    }

    /// Render the template, reading fields from `context`.
    ///
    /// # Errors
    ///
    /// If a field doesn't exist or has no value, or a function gets the wrong number of
    /// arguments.
    pub fn render(&self, context: &impl Context) -> Result<String, ExecError> {
        let mut output = String::new();
        for node in &self.nodes {
            match node {
                Node::Text(text) => output.push_str(text),
                Node::Action(pipeline) => {
                    let value = self
                        .pipeline(pipeline, context)
                        .map_err(|(kind, span)| ExecError {
                            kind,
                            source_code: self.source.clone(),
                            span,
                        })?;
                    output.push_str(&value);
                }
            }
        }
        Ok(output)
    }

    fn pipeline(
        &self,
        pipeline: &Pipeline,
        context: &impl Context,
    ) -> Result<String, (ExecErrorKind, SourceSpan)> {
        let mut piped = None;
        for command in &pipeline.commands {
            let value = match command {
                Command::Operand(operand) => self.operand(operand, context)?,
                Command::Call { helper, args, span } => {
                    let mut values = args
                        .iter()
                        .map(|arg| self.operand(arg, context))
                        .collect::<Result<Vec<_>, _>>()?;
                    values.extend(piped.take());
                    helper.apply(&values).ok_or_else(|| {
                        let kind = ExecErrorKind::Arity {
                            name: helper.name(),
                            expected: helper.arity(),
                            actual: values.len(),
                        };
                        (kind, *span)
                    })?
                }
            };
            piped = Some(value);
        }
        Ok(piped.unwrap_or_default())
    }

    fn operand(
        &self,
        operand: &Operand,
        context: &impl Context,
    ) -> Result<String, (ExecErrorKind, SourceSpan)> {
        match operand {
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Pipeline(pipeline) => self.pipeline(pipeline, context),
            Operand::Field { path, span } if path.is_empty() => {
                Err((ExecErrorKind::WholeValue, *span))
            }
            Operand::Field { path, span } => match context.field(path) {
                Field::Text(text) => Ok(text.to_string()),
                Field::NoValue => Err((ExecErrorKind::NoValue(dotted(path)), *span)),
                Field::Unknown => Err((ExecErrorKind::UnknownField(dotted(path)), *span)),
            },
        }
    }
}

fn dotted(path: &[String]) -> String {
    path.iter().map(|name| format!(".{name}")).collect()
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unclosed action")]
    UnclosedAction,
    #[error("unclosed comment")]
    UnclosedComment,
    #[error("unterminated quoted string")]
    UnterminatedString,
    #[error("unknown escape sequence")]
    UnknownEscape,
    #[error("unexpected {0:?} in action")]
    UnexpectedCharacter(char),
    #[error("unexpected \".\" after field name")]
    BadField,
    #[error("function {0:?} not defined")]
    UnknownFunction(String),
    #[error("function {0:?} can only be called at the start of a command, wrap it in parentheses")]
    NestedFunction(String),
    #[error("missing value for command")]
    MissingValue,
    #[error("arguments given to something that isn't a function")]
    NotAFunction,
    #[error("non executable command in pipeline stage {0}")]
    NotExecutable(usize),
    #[error("unclosed left paren")]
    UnclosedParen,
    #[error("unexpected right paren")]
    UnexpectedRightParen,
}

#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("Could not parse the template: {kind}")]
#[diagnostic(
    code(template::parse),
    help("Run with --help for the template syntax and the available functions")
)]
pub struct ParseError {
    kind: ParseErrorKind,
    #[source_code]
    source_code: String,
    #[label("here")]
    span: SourceSpan,
}

impl ParseError {
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ExecErrorKind {
    #[error("can't evaluate field {0}")]
    UnknownField(String),
    #[error("field {0} has no value")]
    NoValue(String),
    #[error("wrong number of args for {name}: want {expected} got {actual}")]
    Arity {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("\".\" can't be rendered as text, pick a field such as .Key")]
    WholeValue,
}

#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("Could not render the template: {kind}")]
#[diagnostic(
    code(template::render),
    help("Run with --help for the fields and functions a template can use")
)]
pub struct ExecError {
    kind: ExecErrorKind,
    #[source_code]
    source_code: String,
    #[label("here")]
    span: SourceSpan,
}

impl ExecError {
    pub fn kind(&self) -> &ExecErrorKind {
        &self.kind
    }
}

#[cfg(test)]
mod test_template {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    struct Fields(HashMap<&'static str, Option<&'static str>>);

    impl Context for Fields {
        fn field(&self, path: &[String]) -> Field<'_> {
            match self.0.get(path.join(".").as_str()) {
                Some(Some(text)) => Field::Text(text),
                Some(None) => Field::NoValue,
                None => Field::Unknown,
            }
        }
    }

    fn context() -> Fields {
        Fields(HashMap::from([
            ("Key", Some("TST-123")),
            (
                "Fields.Summary",
                Some("  Developments Phase 1: Implement Feature γ Bäume  "),
            ),
            ("Fields.Assignee.DisplayName", None),
        ]))
    }

    fn render(source: &str) -> Result<String, ExecError> {
        Template::parse(source).unwrap().render(&context())
    }

    #[rstest]
    #[case::plain_text("feature/branch", "feature/branch")]
    #[case::field("{{.Key}}", "TST-123")]
    #[case::default_template(
        "{{.Key | ToLower }}-{{.Fields.Summary | Trim | KebabCase }}",
        "tst-123-developments-phase-1-implement-feature--bume"
    )]
    #[case::replace(r#"{{ .Key | Replace "-" "_" }}"#, "TST_123")]
    #[case::call_with_args(r#"{{ Replace "-" "" .Key }}"#, "TST123")]
    #[case::parentheses("{{ ToLower (Trim .Fields.Summary) | UpperCamelCase }}", "DevelopmentsPhase1ImplementFeatureBume")]
    #[case::literal(r#"{{ "a:b" | Replace ":" "!" }}"#, "a!b")]
    #[case::raw_literal("{{ `a\\b` }}", "a\\b")]
    #[case::escapes(r#"{{ "say \"hi\"" }}"#, "say \"hi\"")]
    #[case::trim_markers("feature/ \n {{- .Key -}} \n /end", "feature/TST-123/end")]
    #[case::dash_without_trim("{{.Key}}-x", "TST-123-x")]
    #[case::comment("{{/* ignored */}}{{.Key}}", "TST-123")]
    #[case::trimmed_comment("a {{- /* ignored */ -}} b", "ab")]
    fn renders(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(render(source).unwrap(), expected);
    }

    #[rstest]
    #[case::unclosed_action("{{ .Key", ParseErrorKind::UnclosedAction)]
    #[case::garbage("{{ .I am a bo} sdfsdfeef {{ .Broken }}", ParseErrorKind::UnexpectedCharacter('}'))]
    #[case::unknown_first_function("{{ am .I }}", ParseErrorKind::UnknownFunction("am".into()))]
    #[case::unknown_function("{{ .Key | Lower }}", ParseErrorKind::UnknownFunction("Lower".into()))]
    #[case::nested_function("{{ ToLower Trim .Key }}", ParseErrorKind::NestedFunction("Trim".into()))]
    #[case::empty_action("{{ }}", ParseErrorKind::MissingValue)]
    #[case::empty_stage("{{ .Key | }}", ParseErrorKind::MissingValue)]
    #[case::argument_to_field(r#"{{ .Key "x" }}"#, ParseErrorKind::NotAFunction)]
    #[case::field_after_pipe("{{ .Key | .Key }}", ParseErrorKind::NotExecutable(2))]
    #[case::unterminated_string(r#"{{ "abc }}"#, ParseErrorKind::UnterminatedString)]
    #[case::unknown_escape(r#"{{ "\q" }}"#, ParseErrorKind::UnknownEscape)]
    #[case::trailing_dot("{{ .Fields. }}", ParseErrorKind::BadField)]
    #[case::unclosed_paren("{{ (Trim .Key }}", ParseErrorKind::UnclosedParen)]
    #[case::extra_paren("{{ .Key ) }}", ParseErrorKind::UnexpectedRightParen)]
    #[case::unclosed_comment("{{/* never ends }}", ParseErrorKind::UnclosedComment)]
    fn rejects(#[case] source: &str, #[case] expected: ParseErrorKind) {
        let err = Template::parse(source).unwrap_err();
        assert_eq!(err.kind(), &expected);
    }

    #[test]
    fn unknown_function_is_labelled() {
        let err = Template::parse("{{ .Key | Lower }}").unwrap_err();
        assert_eq!(err.span, SourceSpan::from((10, 5)));
    }

    #[test]
    fn unknown_field() {
        let err = render("{{ .Fields.Nope }}").unwrap_err();
        assert_eq!(err.kind(), &ExecErrorKind::UnknownField(".Fields.Nope".into()));
        assert_eq!(err.span, SourceSpan::from((3, 12)));
    }

    #[test]
    fn field_without_value() {
        let err = render("{{ .Fields.Assignee.DisplayName }}").unwrap_err();
        assert_eq!(
            err.kind(),
            &ExecErrorKind::NoValue(".Fields.Assignee.DisplayName".into())
        );
    }

    #[test]
    fn wrong_arity() {
        let err = render(r#"{{ .Key | Replace "-" }}"#).unwrap_err();
        assert_eq!(
            err.kind(),
            &ExecErrorKind::Arity {
                name: "Replace",
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn too_many_args() {
        let err = render(r#"{{ .Key | Trim "x" }}"#).unwrap_err();
        assert!(matches!(err.kind(), ExecErrorKind::Arity { actual: 2, .. }));
    }

    #[test]
    fn whole_value() {
        let err = render("{{ . }}").unwrap_err();
        assert_eq!(err.kind(), &ExecErrorKind::WholeValue);
    }
}
