//! Regex-driven text rewrites applied to compiled and concatenated sources.

/// Which block comments a rewrite step should match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum CommentPolicy {
    /// Every block comment that opens a line, unless flagged with `/*!`.
    UnlessFlagged,
    /// Only the comment at the very start of a file (after whitespace), unless flagged.
    LeadingUnflagged,
}

impl CommentPolicy {
    pub(crate) fn regex(self) -> &'static Regex {
        // `(?:[^!]…)??` prefers the empty body, so `/**/` can't run on to a later `*/`.
        static UNLESS_FLAGGED: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?m)^[ \t]*/\*(?:[^!][\s\S]*?)??\*/[ \t]*(?:\r?\n(?:[ \t]*\r?\n)?)?")
                .unwrap()
        });
        static LEADING_UNFLAGGED: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"(?s)\A\s*/\*(?:[^!].*?)??\*/").unwrap());

        match self {
            Self::UnlessFlagged => &UNLESS_FLAGGED,
            Self::LeadingUnflagged => &LEADING_UNFLAGGED,
        }
    }
}

/// Remove every comment `policy` matches.
pub(crate) fn strip_comments(text: &str, policy: CommentPolicy) -> Cow<'_, str> {
    policy.regex().replace_all(text, "")
}

/// Replace the first comment `policy` matches with the result of `rewrite`.
///
/// Returns `None` if nothing matched.
pub(crate) fn rewrite_leading(
    text: &str,
    policy: CommentPolicy,
    rewrite: HeaderRewrite,
) -> Option<String> {
    let found = policy.regex().find(text)?;
    let mut output = String::with_capacity(text.len() + 1);
    output.push_str(&text[..found.start()]);
    output.push_str(&rewrite.apply(found.as_str()));
    output.push_str(&text[found.end()..]);
    Some(output)
}

/// Whether `text` already opens with a comment flagged to survive minification.
pub(crate) fn starts_flagged(text: &str) -> bool {
    text.trim_start().starts_with("/*!")
}

/// A named pure transform over a source file's leading header comment.
#[derive(Clone, Copy)]
pub(crate) struct HeaderRewrite {
    name: &'static str,
    f: fn(&str) -> String,
}

impl HeaderRewrite {
    /// Flag the header with `/*!` so that minifiers keep it.
    pub(crate) const FLAG_PRESERVED: Self = Self {
        name: "flag-preserved",
        f: flag_preserved,
    };

    /// Leave the header untouched.
    pub(crate) const KEEP: Self = Self {
        name: "keep",
        f: str::to_owned,
    };

    const ALL: [Self; 2] = [Self::FLAG_PRESERVED, Self::KEEP];

    pub(crate) fn name(self) -> &'static str {
        self.name
    }

    pub(crate) fn apply(self, raw_header: &str) -> String {
        (self.f)(raw_header)
    }
}

fn flag_preserved(raw_header: &str) -> String {
    raw_header.replacen("/*", "/*!", 1)
}

impl PartialEq for HeaderRewrite {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for HeaderRewrite {}

impl Debug for HeaderRewrite {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "HeaderRewrite({})", self.name)
    }
}

impl FromStr for HeaderRewrite {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rewrite| rewrite.name == s)
            .ok_or_else(|| {
                let known = Self::ALL.map(Self::name).join("`, `");
                anyhow!("unknown header rewrite `{s}` (expected one of `{known}`)")
            })
    }
}

impl<'de> Deserialize<'de> for HeaderRewrite {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

/// A compiled regular expression, compared by its source text.
#[derive(Clone)]
pub(crate) struct Pattern(Regex);

impl Pattern {
    pub(crate) fn new(regex: Regex) -> Self {
        Self(regex)
    }

    pub(crate) fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}
impl Eq for Pattern {}

impl Debug for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Regex::new(&source).map(Self).map_err(de::Error::custom)
    }
}

/// Insert a line of text before lines matching a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SectionHeaderInsertion {
    /// Matched against each line without its line ending.
    pub(crate) match_before: Pattern,
    pub(crate) insert_text: String,
    pub(crate) stop_after_first_match: bool,
}

impl SectionHeaderInsertion {
    /// Returns `None` if no line matched.
    pub(crate) fn apply(&self, text: &str) -> Option<String> {
        let mut output = String::with_capacity(text.len() + self.insert_text.len() + 2);
        let mut inserted = false;

        for line in text.split_inclusive('\n') {
            let content = line.trim_end_matches(['\n', '\r']);
            if !(inserted && self.stop_after_first_match) && self.match_before.is_match(content) {
                output.push_str(&self.insert_text);
                output.push_str(if line.ends_with("\r\n") { "\r\n" } else { "\n" });
                inserted = true;
            }
            output.push_str(line);
        }

        inserted.then_some(output)
    }
}

/// Name the minified variant of `file_name` by replacing its extension with `suffix`.
pub(crate) fn minified_name(file_name: &str, suffix: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{stem}{suffix}"),
        _ => format!("{file_name}{suffix}"),
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn flagged_comments_are_not_matched() {
        let regex = CommentPolicy::UnlessFlagged.regex();
        assert!(!regex.is_match("/*! License: ISC */\n.a{}\n"));
        assert!(!regex.is_match("/*!\n** Banner\n**/\n"));
        assert!(regex.is_match("/* Ordinary documentation */\n"));
        assert!(regex.is_match("  /* indented\n   * block\n   */\n"));
    }

    #[test]
    fn strip_keeps_flagged_and_code() {
        let css = concat!(
            "/*! keep me */\n",
            "/* ======\n",
            "** Section docs\n",
            "**/\n",
            "\n",
            ".a { color: red; }\n",
            "/**/\n",
            ".b { color: blue; } /* inline stays */\n",
            "/* last */",
        );
        assert_eq!(
            strip_comments(css, CommentPolicy::UnlessFlagged),
            concat!(
                "/*! keep me */\n",
                ".a { color: red; }\n",
                ".b { color: blue; } /* inline stays */\n",
            )
        );
    }

    #[test]
    fn strip_removes_at_most_one_blank_line() {
        let css = "/* x */\n\n\n.a{}\n";
        assert_eq!(strip_comments(css, CommentPolicy::UnlessFlagged), "\n.a{}\n");
    }

    #[test]
    fn empty_comment_does_not_swallow_code() {
        let css = "/**/\n.a{}\n/* b */\n";
        assert_eq!(strip_comments(css, CommentPolicy::UnlessFlagged), ".a{}\n");
    }

    #[test]
    fn leading_policy_only_matches_file_start() {
        let regex = CommentPolicy::LeadingUnflagged.regex();
        assert!(regex.is_match("/* Header */\nvar a;"));
        assert!(regex.is_match("\n  /* Header */\nvar a;"));
        assert!(!regex.is_match("/*! Header */\nvar a;"));
        assert!(!regex.is_match("var a; /* trailing */"));
    }

    #[test]
    fn leading_header_gets_flagged() {
        let js = "/* jQuery.forms.js\n * AUTHOR: someone\n */\n(function($){})(jQuery);\n/* inner */\n";
        assert_eq!(
            rewrite_leading(js, CommentPolicy::LeadingUnflagged, HeaderRewrite::FLAG_PRESERVED)
                .unwrap(),
            "/*! jQuery.forms.js\n * AUTHOR: someone\n */\n(function($){})(jQuery);\n/* inner */\n"
        );
        assert_eq!(
            rewrite_leading(js, CommentPolicy::LeadingUnflagged, HeaderRewrite::KEEP).unwrap(),
            js
        );
    }

    #[test]
    fn rewrite_reports_no_match() {
        let policy = CommentPolicy::LeadingUnflagged;
        let rewrite = HeaderRewrite::FLAG_PRESERVED;
        assert_eq!(rewrite_leading("/*! kept */ x();", policy, rewrite), None);
        assert_eq!(rewrite_leading("x();", policy, rewrite), None);
        assert!(starts_flagged("\n/*! kept */ x();"));
        assert!(!starts_flagged("x();"));
    }

    #[test]
    fn header_rewrites_by_name() {
        assert_eq!(
            "flag-preserved".parse::<HeaderRewrite>().unwrap(),
            HeaderRewrite::FLAG_PRESERVED
        );
        assert_eq!("keep".parse::<HeaderRewrite>().unwrap(), HeaderRewrite::KEEP);
        let e = "uppercase".parse::<HeaderRewrite>().unwrap_err();
        assert!(e.to_string().contains("unknown header rewrite `uppercase`"));
    }

    fn media_insertion(stop_after_first_match: bool) -> SectionHeaderInsertion {
        SectionHeaderInsertion {
            match_before: Pattern::new(Regex::new("^@media").unwrap()),
            insert_text: "/*! Media queries */".to_owned(),
            stop_after_first_match,
        }
    }

    const THREE_QUERIES: &str = concat!(
        ".a{}\n",
        "@media (min-width: 1px) { .a{} }\n",
        "@media (min-width: 2px) { .a{} }\n",
        "@media (min-width: 3px) { .a{} }\n",
    );

    #[test]
    fn insertion_stops_after_first_match() {
        assert_eq!(
            media_insertion(true).apply(THREE_QUERIES).unwrap(),
            concat!(
                ".a{}\n",
                "/*! Media queries */\n",
                "@media (min-width: 1px) { .a{} }\n",
                "@media (min-width: 2px) { .a{} }\n",
                "@media (min-width: 3px) { .a{} }\n",
            )
        );
    }

    #[test]
    fn insertion_before_every_match() {
        let output = media_insertion(false).apply(THREE_QUERIES).unwrap();
        assert_eq!(output.matches("/*! Media queries */\n@media").count(), 3);
        assert!(output.starts_with(".a{}\n/*! Media queries */\n"));
    }

    #[test]
    fn insertion_keeps_line_endings() {
        assert_eq!(
            media_insertion(true)
                .apply(".a{}\r\n@media print{}")
                .unwrap(),
            ".a{}\r\n/*! Media queries */\n@media print{}"
        );
        assert_eq!(
            media_insertion(true).apply("@media print{}\r\n").unwrap(),
            "/*! Media queries */\r\n@media print{}\r\n"
        );
    }

    #[test]
    fn insertion_without_match() {
        assert_eq!(media_insertion(true).apply(".a{}\n  @media x{}\n"), None);
        assert_eq!(media_insertion(true).apply(""), None);
    }

    #[test]
    fn patterns_compare_by_source() {
        let a = Pattern::new(Regex::new("^@media").unwrap());
        let b = Pattern::new(Regex::new("^@media").unwrap());
        let c = Pattern::new(Regex::new("^@supports").unwrap());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(format!("{a:?}"), "/^@media/");
    }

    #[test]
    fn minified_names() {
        assert_eq!(minified_name("oue-custom.css", ".min.css"), "oue-custom.min.css");
        assert_eq!(minified_name("oue-build.js", ".min.js"), "oue-build.min.js");
        assert_eq!(minified_name("bundle", ".min.js"), "bundle.min.js");
        assert_eq!(minified_name(".hidden", ".min"), ".hidden.min");
    }

    use super::minified_name;
    use super::rewrite_leading;
    use super::starts_flagged;
    use super::strip_comments;
    use super::CommentPolicy;
    use super::HeaderRewrite;
    use super::Pattern;
    use super::SectionHeaderInsertion;
    use regex::Regex;
}

use anyhow::anyhow;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de;
use serde::Deserialize;
use serde::Deserializer;
use std::borrow::Cow;
use std::fmt;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::str::FromStr;
