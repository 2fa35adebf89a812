//! Format-preserving edits on MSBuild/NuGet XML documents
//!
//! Declaration files are edited in place rather than re-serialized, so
//! comments, attribute order and whitespace survive the update. Matching is
//! done on start tags with quoted attribute values, which is enough for the
//! shapes tooling writes into these files.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

// Any start tag; quoted attribute values may contain `>`
static START_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([A-Za-z_][\w.:-]*)\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).unwrap()
});

// `name="value"` or `name='value'`
static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s([A-Za-z_][\w.:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static VERSION_CHILD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<Version\s*>([^<]*)</Version\s*>").unwrap());

/// Result of rewriting declarations in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Rewritten document (identical to the input when nothing changed)
    pub content: String,
    /// Number of declarations of the package that were found
    pub matched: usize,
    /// Whether the content differs from the input
    pub changed: bool,
}

impl Rewrite {
    fn unchanged(content: &str) -> Self {
        Self {
            content: content.to_string(),
            matched: 0,
            changed: false,
        }
    }
}

/// Describes which elements declare a package and where their version lives
#[derive(Debug, Clone, Copy)]
pub struct DeclarationShape {
    /// Element names that declare a package
    pub elements: &'static [&'static str],
    /// Attributes carrying the package id
    pub id_attributes: &'static [&'static str],
    /// Attribute carrying the version
    pub version_attribute: &'static str,
    /// Whether the version may be a `<Version>` child element instead
    pub version_child: bool,
}

/// A start tag located in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag<'a> {
    /// Element name as written
    pub name: &'a str,
    /// Byte range of the whole tag, `<` through `>`
    pub range: Range<usize>,
    /// Tag text
    pub text: &'a str,
}

impl StartTag<'_> {
    /// Returns true for `<Element ... />`
    pub fn is_self_closing(&self) -> bool {
        self.text.trim_end_matches('>').trim_end().ends_with('/')
    }
}

/// Finds every start tag of `element` (case-insensitive)
pub fn find_start_tags<'a>(content: &'a str, element: &str) -> Vec<StartTag<'a>> {
    START_TAG_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            name.as_str().eq_ignore_ascii_case(element).then(|| StartTag {
                name: name.as_str(),
                range: whole.range(),
                text: whole.as_str(),
            })
        })
        .collect()
}

/// Locates an attribute value inside a tag, returning its range relative to the tag
pub fn attribute_value<'a>(tag: &'a str, attribute: &str) -> Option<(Range<usize>, &'a str)> {
    ATTRIBUTE_RE
        .captures_iter(tag)
        .filter(|caps| caps[1].eq_ignore_ascii_case(attribute))
        .find_map(|caps| caps.get(2).or_else(|| caps.get(3)))
        .map(|value| (value.range(), value.as_str()))
}

/// Sets an attribute on a tag, replacing the value or appending the attribute
pub fn set_attribute(tag: &str, attribute: &str, value: &str) -> String {
    if let Some((range, _)) = attribute_value(tag, attribute) {
        let mut updated = tag.to_string();
        updated.replace_range(range, value);
        return updated;
    }

    let body_end = if tag.ends_with("/>") {
        tag.len() - 2
    } else {
        tag.len() - 1
    };
    let head = tag[..body_end].trim_end();
    let padding = &tag[head.len()..body_end];
    format!(
        r#"{} {}="{}"{}{}"#,
        head,
        attribute,
        value,
        padding,
        &tag[body_end..]
    )
}

/// Rewrites the version of every declaration of `package` in `content`
///
/// Package ids compare case-insensitively. A declaration whose version
/// already equals `new_version` counts as matched without changing anything.
/// `format_version` receives the old value and returns the value to write.
pub fn rewrite_declarations(
    content: &str,
    shape: &DeclarationShape,
    package: &str,
    new_version: &str,
    format_version: impl Fn(&str, &str) -> String,
) -> Rewrite {
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let mut matched = 0;

    for element in shape.elements {
        for tag in find_start_tags(content, element) {
            let declares_package = shape.id_attributes.iter().any(|attr| {
                attribute_value(tag.text, attr)
                    .map(|(_, id)| id.trim().eq_ignore_ascii_case(package))
                    .unwrap_or(false)
            });
            if !declares_package {
                continue;
            }

            let located = match attribute_value(tag.text, shape.version_attribute) {
                Some((range, old)) => Some((
                    tag.range.start + range.start..tag.range.start + range.end,
                    old,
                )),
                None if shape.version_child && !tag.is_self_closing() => {
                    version_child(content, &tag)
                }
                None => None,
            };

            let Some((range, old)) = located else {
                continue;
            };
            matched += 1;

            let replacement = format_version(old.trim(), new_version);
            if old.trim() != replacement {
                edits.push((range, replacement));
            }
        }
    }

    if matched == 0 {
        return Rewrite::unchanged(content);
    }

    let changed = !edits.is_empty();
    let mut result = content.to_string();
    edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    for (range, replacement) in edits {
        result.replace_range(range, &replacement);
    }

    Rewrite {
        content: result,
        matched,
        changed,
    }
}

/// Finds `<Version>...</Version>` between a start tag and its closing tag
fn version_child<'a>(content: &'a str, tag: &StartTag<'_>) -> Option<(Range<usize>, &'a str)> {
    let body_start = tag.range.end;
    let closing = format!("</{}", tag.name);
    let body_len = content[body_start..].find(&closing)?;
    let body = &content[body_start..body_start + body_len];

    let value = VERSION_CHILD_RE.captures(body)?.get(1)?;
    let range = body_start + value.start()..body_start + value.end();
    Some((range.clone(), &content[range]))
}

/// Writes the new version verbatim
pub fn plain_version(_old: &str, new_version: &str) -> String {
    new_version.to_string()
}
