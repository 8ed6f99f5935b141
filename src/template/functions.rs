use std::fmt::Write;

use crate::case;

/// The closed set of functions a template can call.
///
/// A value piped into a function is passed as its last argument, so
/// `{{ .Fields.Summary | Replace ":" "!" }}` calls `Replace(":", "!", summary)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Helper {
    Trim,
    ToLower,
    ToUpper,
    Replace,
    KebabCase,
    LowerSnakeCase,
    LowerCamelCase,
    ScreamingKebabCase,
    ScreamingSnakeCase,
    UpperCamelCase,
    UpperKebabCase,
}

impl Helper {
    pub const ALL: [Self; 11] = [
        Self::Trim,
        Self::ToLower,
        Self::ToUpper,
        Self::Replace,
        Self::KebabCase,
        Self::LowerSnakeCase,
        Self::LowerCamelCase,
        Self::ScreamingKebabCase,
        Self::ScreamingSnakeCase,
        Self::UpperCamelCase,
        Self::UpperKebabCase,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|helper| helper.name() == name)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Trim => "Trim",
            Self::ToLower => "ToLower",
            Self::ToUpper => "ToUpper",
            Self::Replace => "Replace",
            Self::KebabCase => "KebabCase",
            Self::LowerSnakeCase => "LowerSnakeCase",
            Self::LowerCamelCase => "LowerCamelCase",
            Self::ScreamingKebabCase => "ScreamingKebabCase",
            Self::ScreamingSnakeCase => "ScreamingSnakeCase",
            Self::UpperCamelCase => "UpperCamelCase",
            Self::UpperKebabCase => "UpperKebabCase",
        }
    }

    /// The number of arguments, including any piped value.
    pub const fn arity(self) -> usize {
        match self {
            Self::Replace => 3,
            _ => 1,
        }
    }

    const fn description(self) -> &'static str {
        match self {
            Self::Trim => "Remove whitespace at the start and end",
            Self::ToLower => "Lower case everything",
            Self::ToUpper => "Upper case everything",
            Self::Replace => r#"Replace text, {{ .Fields.Summary | Replace "A" "B" }} replaces A with B"#,
            Self::KebabCase => "Lower case words joined by dashes",
            Self::LowerSnakeCase => "Lower case words joined by underscores",
            Self::LowerCamelCase => "Words run together, capitalised after the first",
            Self::ScreamingKebabCase => "Upper case words joined by dashes",
            Self::ScreamingSnakeCase => "Upper case words joined by underscores",
            Self::UpperCamelCase => "Capitalised words run together",
            Self::UpperKebabCase => "Capitalised words joined by dashes",
        }
    }

    fn unary(self) -> Option<fn(&str) -> String> {
        Some(match self {
            Self::Trim => case::trim,
            Self::ToLower => case::to_lower,
            Self::ToUpper => case::to_upper,
            Self::Replace => return None,
            Self::KebabCase => case::kebab_case,
            Self::LowerSnakeCase => case::lower_snake_case,
            Self::LowerCamelCase => case::lower_camel_case,
            Self::ScreamingKebabCase => case::screaming_kebab_case,
            Self::ScreamingSnakeCase => case::screaming_snake_case,
            Self::UpperCamelCase => case::upper_camel_case,
            Self::UpperKebabCase => case::upper_kebab_case,
        })
    }

    /// Run the function, or `None` if `args` doesn't match [`Self::arity`].
    pub(crate) fn apply(self, args: &[String]) -> Option<String> {
        match (self.unary(), args) {
            (Some(transform), [s]) => Some(transform(s)),
            (None, [search, replacement, s]) => Some(case::replace(search, replacement, s)),
            _ => None,
        }
    }
}

/// A listing of every function with an example, for `--help`.
pub fn help_text() -> String {
    const EXAMPLE: &str = "Developments Phase 1: Implement Feature γ Bäume";

    let mut text = format!(
        "The following functions are available for templating (examples use {EXAMPLE:?}). \
        The case conversions drop anything that isn't an ASCII letter, digit or space first:\n"
    );
    for helper in Helper::ALL {
        let _ = write!(text, "\n  * {} - {}", helper.name(), helper.description());
        if let Some(transform) = helper.unary() {
            let _ = write!(text, ", e.g. {}", transform(EXAMPLE));
        }
    }
    text
}

#[cfg(test)]
mod test_helpers {
    use pretty_assertions::{assert_eq, assert_ne};

    use super::*;

    #[test]
    fn names_round_trip() {
        for helper in Helper::ALL {
            assert_eq!(Helper::from_name(helper.name()), Some(helper));
        }
    }

    #[test]
    fn unknown_name() {
        assert_eq!(Helper::from_name("kebabcase"), None);
    }

    #[test]
    fn apply_checks_arity() {
        let args = vec![String::from("a"), String::from("b")];
        assert_eq!(Helper::Trim.apply(&args), None);
        assert_eq!(Helper::Replace.apply(&args), None);
    }

    #[test]
    fn apply_replace() {
        let args = [":", "!", "a:b"].map(String::from);
        assert_eq!(Helper::Replace.apply(&args), Some(String::from("a!b")));
    }

    #[test]
    fn every_function_has_its_own_description() {
        for (index, helper) in Helper::ALL.into_iter().enumerate() {
            for other in &Helper::ALL[index + 1..] {
                assert_ne!(helper.description(), other.description(), "{helper:?} and {other:?}");
            }
        }
    }

    #[test]
    fn help_lists_every_function() {
        let help = help_text();
        for helper in Helper::ALL {
            assert!(help.contains(helper.name()), "{} missing", helper.name());
        }
        assert!(help.contains("e.g. developments-phase-1-implement-feature--bume"));
    }
}
