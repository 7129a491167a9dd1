//! Fallback tokenizer used when no syntax tree is attached to a buffer.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)
          //[^\n]*                              # line comment
        | /\*(?s:.*?)\*/                        # block comment
        | r\x23*"(?s:.*?)"\x23*                 # raw string (hash count unchecked)
        | "(?s:(?:[^"\\]|\\.)*)"                # string literal
        | '(?:[^'\\\n]|\\.[^']*)'               # char literal
        | [\p{Alphabetic}_][\p{Alphabetic}\p{Nd}_]*   # identifier / keyword
        | \p{Nd}[\p{Alphabetic}\p{Nd}_]*(?:\.\p{Nd}+)?  # number
        | ->|=>|::|==|!=|<=|>=|&&|\|\||\.\.=?|<<=?|>>=?|[-+*/%^&|]=
        | \S                                    # any other single character
        "#,
    )
    .expect("valid token regex")
});

/// Lexical tokens of `text`; literals and comments come back as single tokens.
pub fn tokens(text: &str) -> Vec<Range<usize>> {
    TOKEN.find_iter(text).map(|m| m.range()).collect()
}
