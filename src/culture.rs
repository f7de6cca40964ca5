//! Number formatting culture used when driving the coverage conversion tool.
//!
//! The current culture is per thread. [`CultureScope`] swaps it for the
//! lifetime of the guard and puts the previous one back when dropped, which
//! also happens while unwinding.

use std::cell::RefCell;

/// Languages whose default decimal separator is a comma.
const COMMA_DECIMAL_LANGUAGES: &[&str] = &[
    "bg", "ca", "cs", "da", "de", "el", "es", "et", "fi", "fr", "hr", "hu", "id", "is", "it",
    "lt", "lv", "nb", "nl", "nn", "no", "pl", "pt", "ro", "ru", "sk", "sl", "sr", "sv", "tr",
    "uk", "vi",
];

const INVARIANT_NAME: &str = "";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Culture {
    name: String,
    decimal_separator: char,
}

thread_local! {
    static CURRENT: RefCell<Culture> = RefCell::new(Culture::from_env());
}

impl Culture {
    /// Culture-neutral formatting: `.` as decimal separator.
    pub fn invariant() -> Self {
        Self {
            name: INVARIANT_NAME.to_string(),
            decimal_separator: '.',
        }
    }

    /// A named culture such as `de-DE`, `fr_FR.UTF-8` or `en-US`.
    /// `C` and `POSIX` (and the empty name) are the invariant culture.
    pub fn from_name(name: &str) -> Self {
        let tag = name.split(['.', '@']).next().unwrap_or("").trim();
        if tag.is_empty() || tag.eq_ignore_ascii_case("C") || tag.eq_ignore_ascii_case("POSIX") {
            return Self::invariant();
        }
        let tag = tag.replace('_', "-");
        let language = tag.split('-').next().unwrap_or("").to_ascii_lowercase();
        let decimal_separator = if COMMA_DECIMAL_LANGUAGES.contains(&language.as_str()) {
            ','
        } else {
            '.'
        };
        Self {
            name: tag,
            decimal_separator,
        }
    }

    /// The culture described by the process locale variables.
    pub fn from_env() -> Self {
        ["LC_ALL", "LC_NUMERIC", "LANG"]
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
            .map(|v| Self::from_name(&v))
            .unwrap_or_else(Self::invariant)
    }

    /// The culture currently in effect on this thread.
    pub fn current() -> Self {
        CURRENT.with(|c| c.borrow().clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    pub fn is_invariant(&self) -> bool {
        self.name == INVARIANT_NAME
    }

    /// Locale name understood by child processes (`LC_ALL`/`LANG`).
    pub fn posix_locale(&self) -> String {
        if self.is_invariant() {
            "C".to_string()
        } else {
            format!("{}.UTF-8", self.name.replace('-', "_"))
        }
    }
}

/// Guard that pins the thread's culture until dropped.
#[must_use = "the previous culture is restored as soon as the scope is dropped"]
pub struct CultureScope {
    previous: Option<Culture>,
}

impl CultureScope {
    pub fn enter(culture: Culture) -> Self {
        let previous = CURRENT.with(|c| c.replace(culture));
        Self {
            previous: Some(previous),
        }
    }
}

impl Drop for CultureScope {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            CURRENT.with(|c| {
                *c.borrow_mut() = previous;
            });
        }
    }
}
