//! Line classification and per-field extraction for the board document.
//!
//! Every line is first classified by its leading marker, then the matching
//! sub-extractor pulls out the fields. Extractors report the sub-field that
//! failed so parse errors can name it.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::snapshot::{decode_label_name, encode_label_name};

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^}]*)\}").unwrap());
static DUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)due:(\S+(?:\s+\d{1,2}:\d{2})?)").unwrap());
static LABEL_REF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:^|\s)@").unwrap());

/// Characters a backslash can escape, and the private-use stand-in each one
/// takes while a line is being split into fields
const ESCAPES: [(char, char); 7] = [
    ('\\', '\u{e000}'),
    ('{', '\u{e001}'),
    ('}', '\u{e002}'),
    ('@', '\u{e003}'),
    (':', '\u{e004}'),
    ('!', '\u{e005}'),
    ('~', '\u{e006}'),
];

fn is_escapable(c: char) -> bool {
    ESCAPES.iter().any(|&(literal, _)| literal == c)
}

/// Replace escape sequences with stand-ins the field extractors ignore
fn protect(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(&next) = chars.peek()
            && let Some(&(_, stand_in)) = ESCAPES.iter().find(|&&(literal, _)| literal == next)
        {
            out.push(stand_in);
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

/// Turn stand-ins back into the literal characters
fn unprotect(text: &str) -> String {
    text.chars()
        .map(|c| {
            ESCAPES
                .iter()
                .find(|&&(_, stand_in)| stand_in == c)
                .map_or(c, |&(literal, _)| literal)
        })
        .collect()
}

/// Escape a board or list name so it parses back as written
pub fn escape_heading(name: &str) -> String {
    escape_name(name, false)
}

/// Escape a card name: on top of the heading rules, a word starting with `@`
/// or `due:` would otherwise read back as a label ref or a due date
pub fn escape_card_name(name: &str) -> String {
    escape_name(name, true)
}

fn escape_name(name: &str, card: bool) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len());
    for (i, &c) in chars.iter().enumerate() {
        let word_start = i == 0 || chars[i - 1].is_whitespace();
        let escape = match c {
            '\\' => chars.get(i + 1).is_some_and(|&n| is_escapable(n)),
            '{' | '}' => true,
            '@' => card && word_start,
            ':' => {
                card && i >= 3
                    && chars[i - 3..i] == ['d', 'u', 'e']
                    && (i == 3 || chars[i - 4].is_whitespace())
            }
            '!' => i + 1 == chars.len() && (word_start || chars[i - 1] == '}'),
            _ => false,
        };
        if escape {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape and encode a label name for a label line or an `@` reference
pub fn escape_label_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '\\' | '{' | '}' | '~') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    encode_label_name(&escaped)
}

/// What a (trimmed) line is, judged by its leading marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    /// Text after `# `
    BoardHeading(&'a str),
    /// Text after `## `
    ListHeading(&'a str),
    /// Text after `@`
    Label(&'a str),
    /// Text after `- `, starting at the checkbox
    Card(&'a str),
    Other,
}

/// A sub-field that could not be extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Line is structurally wrong; names the part that failed
    Malformed { field: &'static str, detail: String },
    /// Label name or label reference contains whitespace
    LabelFormat(String),
}

impl FieldError {
    fn malformed(field: &'static str, detail: impl Into<String>) -> Self {
        FieldError::Malformed {
            field,
            detail: detail.into(),
        }
    }
}

pub fn classify(line: &str) -> LineKind<'_> {
    let line = line.trim();
    if line.is_empty() {
        LineKind::Blank
    } else if let Some(rest) = line.strip_prefix("##") {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            LineKind::ListHeading(rest.trim_start())
        } else {
            LineKind::Other
        }
    } else if let Some(rest) = line.strip_prefix('#') {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            LineKind::BoardHeading(rest.trim_start())
        } else {
            LineKind::Other
        }
    } else if let Some(rest) = line.strip_prefix('@') {
        LineKind::Label(rest)
    } else if let Some(rest) = line.strip_prefix('-')
        && rest.trim_start().starts_with('[')
    {
        LineKind::Card(rest.trim_start())
    } else {
        LineKind::Other
    }
}

/// Strip a trailing extended-edit `!`. It only counts after a `{token}` or
/// after whitespace, so names ending in `!` are left alone.
pub fn split_extended(text: &str) -> (&str, bool) {
    let text = text.trim_end();
    if let Some(rest) = text.strip_suffix('!')
        && (rest.ends_with('}') || rest.ends_with(char::is_whitespace) || rest.is_empty())
    {
        return (rest.trim_end(), true);
    }
    (text, false)
}

/// Remove the `{token}` annotation. Returns the remaining text and the token
/// (empty when absent).
pub fn extract_token(text: &str) -> Result<(String, String), FieldError> {
    let mut tokens = TOKEN_RE.captures_iter(text);
    let token = match tokens.next() {
        Some(caps) => caps[1].trim().to_string(),
        None => return Ok((text.trim().to_string(), String::new())),
    };
    if tokens.next().is_some() {
        return Err(FieldError::malformed("id token", "more than one {token} on the line"));
    }
    let rest = TOKEN_RE.replace(text, "");
    Ok((collapse_spaces(&rest), token))
}

/// Name and ID token of a `#` or `##` heading (marker already removed)
pub fn parse_heading(text: &str) -> Result<(String, String, bool), FieldError> {
    let text = protect(text);
    let (text, extended) = split_extended(&text);
    let (name, token) = extract_token(text)?;
    if name.is_empty() {
        return Err(FieldError::malformed("heading", "heading has no name"));
    }
    Ok((unprotect(&name), token, extended))
}

/// A label line `name:colour {token}` (leading `@` already removed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelLine {
    pub name: String,
    pub colour: String,
    pub token: String,
}

pub fn parse_label_line(text: &str) -> Result<LabelLine, FieldError> {
    let (text, token) = extract_token(&protect(text))?;
    let Some((name, colour)) = text.rsplit_once(':') else {
        return Err(FieldError::malformed(
            "label line",
            "expected @name:colour",
        ));
    };
    if name.is_empty() {
        return Err(FieldError::malformed("label line", "label has no name"));
    }
    if name.contains(char::is_whitespace) {
        return Err(FieldError::LabelFormat(unprotect(name)));
    }
    let colour = colour.trim();
    if colour.is_empty() || colour.contains(char::is_whitespace) {
        return Err(FieldError::malformed(
            "label colour",
            format!("invalid colour '{}'", unprotect(colour)),
        ));
    }
    Ok(LabelLine {
        name: unprotect(&decode_label_name(name)),
        colour: colour.to_string(),
        token,
    })
}

/// Fields of a card line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardLine {
    pub checkbox: char,
    pub name: String,
    /// Decoded label names, in line order
    pub labels: Vec<String>,
    pub due: Option<String>,
    pub token: String,
    pub extended: bool,
}

/// Parse a card line starting at its checkbox: `[ ] name @label due:<date> {token}`
pub fn parse_card_line(text: &str) -> Result<CardLine, FieldError> {
    let checkbox = parse_checkbox(text)?;
    let body = protect(&text[3..]);
    let (body, extended) = split_extended(&body);
    let (body, token) = extract_token(body)?;
    let (body, due) = extract_due(&body)?;

    let (name, refs) = match LABEL_REF_RE.find(&body) {
        Some(m) => (&body[..m.start()], &body[m.start()..]),
        None => (body.as_str(), ""),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(FieldError::malformed("card name", "card has no name"));
    }
    let labels = parse_label_refs(refs)?;

    Ok(CardLine {
        checkbox,
        name: unprotect(name),
        labels,
        due,
        token,
        extended,
    })
}

fn parse_checkbox(text: &str) -> Result<char, FieldError> {
    let mut chars = text.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('['), Some(c @ (' ' | 'x' | 'X')), Some(']')) => Ok(c),
        _ => Err(FieldError::malformed(
            "checkbox",
            "expected [ ], [x] or [X]",
        )),
    }
}

fn extract_due(body: &str) -> Result<(String, Option<String>), FieldError> {
    let mut matches = DUE_RE.captures_iter(body);
    let due = match matches.next() {
        Some(caps) => caps[1].to_string(),
        None => return Ok((body.to_string(), None)),
    };
    if matches.next().is_some() {
        return Err(FieldError::malformed("due date", "more than one due: field"));
    }
    let rest = DUE_RE.replace(body, " ");
    Ok((collapse_spaces(&rest), Some(due)))
}

/// Label references trail the card name; any plain word among them means a
/// label name was written with a space instead of the filler.
fn parse_label_refs(refs: &str) -> Result<Vec<String>, FieldError> {
    let mut labels = Vec::new();
    let mut previous: Option<&str> = None;
    for word in refs.split_whitespace() {
        match word.strip_prefix('@') {
            Some(name) if !name.is_empty() => {
                labels.push(unprotect(&decode_label_name(name)));
                previous = Some(name);
            }
            Some(_) => {
                return Err(FieldError::LabelFormat("@".to_string()));
            }
            None => {
                let broken = match previous {
                    Some(p) => format!("{} {}", p, word),
                    None => word.to_string(),
                };
                return Err(FieldError::LabelFormat(unprotect(&broken)));
            }
        }
    }
    Ok(labels)
}

fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("   "), LineKind::Blank);
        assert_eq!(classify("# Sprint {ab12c}"), LineKind::BoardHeading("Sprint {ab12c}"));
        assert_eq!(classify("## Todo {de34f}"), LineKind::ListHeading("Todo {de34f}"));
        assert_eq!(classify("@bug:red {11111}"), LineKind::Label("bug:red {11111}"));
        assert_eq!(classify("- [x] Done thing"), LineKind::Card("[x] Done thing"));
        assert_eq!(classify("### Deeper"), LineKind::Other);
        assert_eq!(classify("#hashtag"), LineKind::Other);
        assert_eq!(classify("- plain bullet"), LineKind::Other);
        assert_eq!(classify("some notes"), LineKind::Other);
    }

    #[test]
    fn test_split_extended() {
        assert_eq!(split_extended("Todo {de34f}!"), ("Todo {de34f}", true));
        assert_eq!(split_extended("Todo {de34f} !"), ("Todo {de34f}", true));
        assert_eq!(split_extended("Todo {de34f}"), ("Todo {de34f}", false));
        assert_eq!(split_extended("Ship it!"), ("Ship it!", false));
        assert_eq!(split_extended("Ship it !"), ("Ship it", true));
    }

    #[test]
    fn test_parse_heading() {
        assert_eq!(
            parse_heading("Sprint {ab12c}").unwrap(),
            ("Sprint".to_string(), "ab12c".to_string(), false)
        );
        assert_eq!(
            parse_heading("New list").unwrap(),
            ("New list".to_string(), String::new(), false)
        );
        assert_eq!(
            parse_heading("Todo{de34f}!").unwrap(),
            ("Todo".to_string(), "de34f".to_string(), true)
        );
        assert!(matches!(
            parse_heading("{ab12c}"),
            Err(FieldError::Malformed { field: "heading", .. })
        ));
        assert!(matches!(
            parse_heading("A {ab12c} {de34f}"),
            Err(FieldError::Malformed { field: "id token", .. })
        ));
    }

    #[test]
    fn test_parse_label_line() {
        assert_eq!(
            parse_label_line("front~end:blue {aaaaa}").unwrap(),
            LabelLine {
                name: "front end".into(),
                colour: "blue".into(),
                token: "aaaaa".into(),
            }
        );
        assert_eq!(parse_label_line("new:none").unwrap().token, "");
        assert!(matches!(
            parse_label_line("front end:blue"),
            Err(FieldError::LabelFormat(_))
        ));
        assert!(matches!(
            parse_label_line("nocolour"),
            Err(FieldError::Malformed { field: "label line", .. })
        ));
        assert!(matches!(
            parse_label_line("bug:"),
            Err(FieldError::Malformed { field: "label colour", .. })
        ));
    }

    #[test]
    fn test_parse_card_line_full() {
        let card = parse_card_line("[x] Draft outline @docs @front~end due:2024-01-15 {9a0b1}")
            .unwrap();
        assert_eq!(
            card,
            CardLine {
                checkbox: 'x',
                name: "Draft outline".into(),
                labels: vec!["docs".into(), "front end".into()],
                due: Some("2024-01-15".into()),
                token: "9a0b1".into(),
                extended: false,
            }
        );
    }

    #[test]
    fn test_parse_card_line_fields_in_any_order() {
        let card = parse_card_line("[ ] {9a0b1} due:2024-01-15 14:30 Draft outline @docs !")
            .unwrap();
        assert_eq!(card.name, "Draft outline");
        assert_eq!(card.due.as_deref(), Some("2024-01-15 14:30"));
        assert_eq!(card.labels, vec!["docs".to_string()]);
        assert!(card.extended);
    }

    #[test]
    fn test_parse_card_line_keeps_email_like_names() {
        let card = parse_card_line("[ ] Mail bob@example.com").unwrap();
        assert_eq!(card.name, "Mail bob@example.com");
        assert!(card.labels.is_empty());
    }

    #[test]
    fn test_parse_card_line_errors() {
        assert!(matches!(
            parse_card_line("[?] Task"),
            Err(FieldError::Malformed { field: "checkbox", .. })
        ));
        assert!(matches!(
            parse_card_line("[ ] Task @front end"),
            Err(FieldError::LabelFormat(ref s)) if s == "front end"
        ));
        assert!(matches!(
            parse_card_line("[ ] @bug"),
            Err(FieldError::Malformed { field: "card name", .. })
        ));
        assert!(matches!(
            parse_card_line("[ ] Task due:2024-01-01 due:2024-01-02"),
            Err(FieldError::Malformed { field: "due date", .. })
        ));
    }

    #[test]
    fn test_escaped_card_name_keeps_markup_literal() {
        let name = "Ping @alice re due:friday {draft} !";
        let escaped = escape_card_name(name);
        assert_eq!(escaped, "Ping \\@alice re due\\:friday \\{draft\\} \\!");
        let card = parse_card_line(&format!("[ ] {} @bug {{9a0b1}}", escaped)).unwrap();
        assert_eq!(card.name, name);
        assert_eq!(card.labels, vec!["bug".to_string()]);
        assert_eq!(card.due, None);
        assert!(!card.extended);
    }

    #[test]
    fn test_escapes_leave_plain_names_alone() {
        assert_eq!(escape_card_name("Mail bob@example.com"), "Mail bob@example.com");
        assert_eq!(escape_card_name("Ship it!"), "Ship it!");
        assert_eq!(escape_card_name(r"C:\temp"), r"C:\temp");
        assert_eq!(escape_heading("@home"), "@home");
        assert_eq!(escape_heading("Later !"), r"Later \!");
    }

    #[test]
    fn test_escaped_heading_and_label_parse_back() {
        let (name, token, extended) =
            parse_heading(&format!("{} {{de34f}} !", escape_heading("Inbox {old}"))).unwrap();
        assert_eq!(name, "Inbox {old}");
        assert_eq!(token, "de34f");
        assert!(extended);

        let encoded = escape_label_name("needs~review {x}");
        assert_eq!(encoded, r"needs\~review~\{x\}");
        let label = parse_label_line(&format!("{}:red {{11111}}", encoded)).unwrap();
        assert_eq!(label.name, "needs~review {x}");
        assert_eq!(label.token, "11111");
    }

    #[test]
    fn test_backslash_before_plain_character_is_literal() {
        let card = parse_card_line(r"[ ] Fix C:\temp\logs").unwrap();
        assert_eq!(card.name, r"Fix C:\temp\logs");
    }
}
