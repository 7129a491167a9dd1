//! Word segmentation for the two word modes.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Lower,
    Upper,
    Digit,
    Underscore,
    Punct,
    Space,
}

fn classify(g: &str) -> Class {
    let Some(c) = g.chars().next() else {
        return Class::Space;
    };
    if c.is_whitespace() {
        Class::Space
    } else if c == '_' {
        Class::Underscore
    } else if c.is_numeric() {
        Class::Digit
    } else if c.is_uppercase() {
        Class::Upper
    } else if c.is_alphabetic() {
        // Uncased scripts behave like lowercase runs.
        Class::Lower
    } else {
        Class::Punct
    }
}

fn graphemes(text: &str) -> Vec<(usize, &str, Class)> {
    text.grapheme_indices(true)
        .map(|(i, g)| (i, g, classify(g)))
        .collect()
}

/// Minimal casing units: `myOatPepperBanana` yields `my`, `Oat`, `Pepper`,
/// `Banana`; `snake_case` yields `snake_`, `case`; `HTTPServer` yields `HTTP`,
/// `Server`. Digit runs and punctuation runs form their own units.
pub fn short_words(text: &str) -> Vec<Range<usize>> {
    let gs = graphemes(text);
    let n = gs.len();
    let end_of = |i: usize| if i < n { gs[i].0 } else { text.len() };
    let run = |mut i: usize, pred: &dyn Fn(Class) -> bool| {
        while i < n && pred(gs[i].2) {
            i += 1;
        }
        i
    };
    let mut out = Vec::new();
    let mut i = 0;
    while i < n {
        let start = i;
        let next = match gs[i].2 {
            Class::Space => {
                i += 1;
                continue;
            }
            Class::Digit => run(i, &|c| c == Class::Digit),
            Class::Underscore | Class::Punct => {
                run(i, &|c| matches!(c, Class::Underscore | Class::Punct))
            }
            Class::Lower => {
                let j = run(i, &|c| c == Class::Lower);
                run(j, &|c| c == Class::Underscore)
            }
            Class::Upper => {
                let j = run(i, &|c| c == Class::Upper);
                if j - i >= 2 {
                    if j < n && gs[j].2 == Class::Lower {
                        // Acronym followed by a capitalised word: the last capital opens the word.
                        j - 1
                    } else {
                        run(j, &|c| c == Class::Underscore)
                    }
                } else {
                    let k = run(j, &|c| c == Class::Lower);
                    run(k, &|c| c == Class::Underscore)
                }
            }
        };
        out.push(gs[start].0..end_of(next));
        i = next;
    }
    out
}

fn is_long_word(class: Class) -> bool {
    matches!(
        class,
        Class::Lower | Class::Upper | Class::Digit | Class::Underscore
    )
}

/// Identifier-like units: alphanumerics and `_` joined, with `-` kept inside a
/// word when another word character follows it. Other punctuation forms runs.
pub fn long_words(text: &str) -> Vec<Range<usize>> {
    let gs = graphemes(text);
    let n = gs.len();
    let end_of = |i: usize| if i < n { gs[i].0 } else { text.len() };
    let mut out = Vec::new();
    let mut i = 0;
    while i < n {
        let start = i;
        let class = gs[i].2;
        if class == Class::Space {
            i += 1;
            continue;
        }
        if is_long_word(class) {
            i += 1;
            while i < n {
                if is_long_word(gs[i].2) {
                    i += 1;
                } else if gs[i].1 == "-" && i + 1 < n && is_long_word(gs[i + 1].2) {
                    i += 2;
                } else {
                    break;
                }
            }
        } else {
            while i < n && gs[i].2 == Class::Punct {
                i += 1;
            }
        }
        out.push(gs[start].0..end_of(i));
    }
    out
}
