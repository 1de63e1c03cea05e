//! Text normalizer: strips Reddit-flavoured markdown and collapses whitespace.

use regex::Regex;
use std::sync::OnceLock;

/// Emphasis is unwrapped this many times so `***x***` ends up as `x`.
///
/// Deeper nesting keeps its innermost markers: `****x****` normalizes to `*x*`,
/// and only a second call reduces that to `x`. Normalization is therefore
/// idempotent only for emphasis nested at most three levels deep.
const EMPHASIS_PASSES: usize = 3;

struct Patterns {
    link: Regex,
    star: Regex,
    underscore: Regex,
    code: Regex,
    strike: Regex,
    spoiler: Regex,
    spaces: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("static regex");
        Patterns {
            link: re(r"\[([^\]]+)\] ?\(([^)]+)\)"),
            star: re(r"\*([^\]]+)\*"),
            underscore: re(r"_([^\]]+)_"),
            code: re(r"`([^\]]+)`"),
            strike: re(r"~~([^\]]+)~~"),
            spoiler: re(r">!([^\]]+)!<"),
            spaces: re(r"\s+"),
        }
    })
}

/// Remove links, emphasis, code, strikethrough and spoiler markup.
/// Unbalanced delimiters are left where they are.
pub fn remove_markdown(text: &str) -> String {
    let p = patterns();
    let mut out = p.link.replace_all(text, "$1").into_owned();
    for _ in 0..EMPHASIS_PASSES {
        out = p.star.replace_all(&out, "$1").into_owned();
    }
    for _ in 0..EMPHASIS_PASSES {
        out = p.underscore.replace_all(&out, "$1").into_owned();
    }
    for re in [&p.code, &p.strike, &p.spoiler] {
        out = re.replace_all(&out, "$1").into_owned();
    }
    out
}

/// Collapse every run of whitespace (newlines included) into one space.
pub fn conflate_spaces(text: &str) -> String {
    patterns().spaces.replace_all(text, " ").into_owned()
}

/// Full normalization: markup removal followed by whitespace collapsing.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    conflate_spaces(&remove_markdown(text))
}
