//! Key Pattern Module
//!
//! Glob-style matching over stored keys: `*` matches any run of characters,
//! `?` matches exactly one, everything else is literal. A backslash makes
//! the next character literal, so `sale\*` matches only the key `sale*`.

// == Key Pattern ==
/// A compiled key pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    raw: String,
    tokens: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyOne,
    AnyRun,
}

impl KeyPattern {
    // == Constructor ==
    pub fn new(pattern: impl Into<String>) -> Self {
        let raw = pattern.into();
        let mut tokens = Vec::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            let token = match c {
                // A trailing backslash stands for itself.
                '\\' => Token::Literal(chars.next().unwrap_or('\\')),
                '*' => Token::AnyRun,
                '?' => Token::AnyOne,
                other => Token::Literal(other),
            };
            // Collapse "**" into one run.
            if token == Token::AnyRun && tokens.last() == Some(&Token::AnyRun) {
                continue;
            }
            tokens.push(token);
        }
        Self { raw, tokens }
    }

    /// Pattern matching every key that starts with `prefix`.
    pub fn prefix(prefix: &str) -> Self {
        Self::new(format!("{}*", Self::escape(prefix)))
    }

    /// Escapes wildcards and backslashes so `literal` matches only itself.
    pub fn escape(literal: &str) -> String {
        let mut escaped = String::with_capacity(literal.len());
        for c in literal.chars() {
            if matches!(c, '*' | '?' | '\\') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    // == Literal Prefix ==
    /// Literal text before the first wildcard.
    ///
    /// Every matching key starts with this, which lets ordered backends
    /// restrict the scan to a key range.
    pub fn literal_prefix(&self) -> String {
        self.tokens
            .iter()
            .map_while(|t| match t {
                Token::Literal(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    // == Matches ==
    /// Tests a key against the pattern.
    pub fn matches(&self, key: &str) -> bool {
        let text: Vec<char> = key.chars().collect();
        let (mut t, mut p) = (0usize, 0usize);
        // Position of the last `*` and the text index it was tried at.
        let mut backtrack: Option<(usize, usize)> = None;

        while t < text.len() {
            match self.tokens.get(p) {
                Some(Token::AnyOne) => {
                    t += 1;
                    p += 1;
                }
                Some(Token::Literal(c)) if *c == text[t] => {
                    t += 1;
                    p += 1;
                }
                Some(Token::AnyRun) => {
                    backtrack = Some((p, t));
                    p += 1;
                }
                _ => match backtrack {
                    Some((star_p, star_t)) => {
                        p = star_p + 1;
                        t = star_t + 1;
                        backtrack = Some((star_p, star_t + 1));
                    }
                    None => return false,
                },
            }
        }

        self.tokens[p..].iter().all(|tok| *tok == Token::AnyRun)
    }
}
