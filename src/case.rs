//! Text transformations available to branch name templates.
//!
//! Every naming convention here is built in two stages: the input is first normalized with
//! [`lower_snake_case`], then the underscore-separated words are re-joined in the target
//! convention. Anything that isn't an ASCII letter, digit or space is dropped during
//! normalization, so `"Bäume"` becomes `"bume"` rather than being transliterated.

/// Strip leading and trailing whitespace.
pub fn trim(s: &str) -> String {
    s.trim().to_string()
}

pub fn to_lower(s: &str) -> String {
    s.to_lowercase()
}

pub fn to_upper(s: &str) -> String {
    s.to_uppercase()
}

/// Replace every occurrence of `search` in `s` with `replacement`.
pub fn replace(search: &str, replacement: &str, s: &str) -> String {
    s.replace(search, replacement)
}

/// The normalized form every other convention starts from.
///
/// Each space maps to its own underscore, so a dropped word between two spaces leaves a
/// double underscore behind (`"feature γ bume"` → `"feature__bume"`).
pub fn lower_snake_case(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .map(|c| if c == ' ' { '_' } else { c.to_ascii_lowercase() })
        .collect()
}

pub fn kebab_case(s: &str) -> String {
    words(s).join("-")
}

pub fn screaming_snake_case(s: &str) -> String {
    lower_snake_case(s).to_ascii_uppercase()
}

pub fn screaming_kebab_case(s: &str) -> String {
    kebab_case(s).to_ascii_uppercase()
}

pub fn upper_kebab_case(s: &str) -> String {
    words(s)
        .iter()
        .map(|word| capitalize(word))
        .collect::<Vec<_>>()
        .join("-")
}

pub fn upper_camel_case(s: &str) -> String {
    words(s).iter().map(|word| capitalize(word)).collect()
}

pub fn lower_camel_case(s: &str) -> String {
    let words = words(s);
    let mut words = words.iter();
    let mut result = words.next().map(ToString::to_string).unwrap_or_default();
    result.extend(words.map(|word| capitalize(word)));
    result
}

/// Empty words are kept so separators line up with the normalized form.
fn words(s: &str) -> Vec<String> {
    lower_snake_case(s).split('_').map(String::from).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        let mut capitalized = first.to_ascii_uppercase().to_string();
        capitalized.push_str(chars.as_str());
        capitalized
    })
}
