//! Adapter for an embedded linter with its own lint taxonomy.
//!
//! Lint kinds are mapped onto the engine's categories here and nowhere else;
//! the store only ever sees normalized suggestions.

use super::readability::grade_level;
use super::{AnalyzeFuture, Analyzer};
use crate::suggest::{Category, RewriteState, Suggestion, SuggestionDetail, SuggestionSource};
use crate::util::{byte_to_char, slice_chars};
use regex::Regex;
use std::sync::OnceLock;

/// One finding from a linter, anchored by char offsets into the linted text.
#[derive(Debug, Clone, PartialEq)]
pub struct Lint {
    pub start: usize,
    pub end: usize,
    pub kind: String,
    pub message: String,
    pub replacements: Vec<String>,
}

pub trait Linter: Send + Sync {
    fn lint(&self, text: &str) -> anyhow::Result<Vec<Lint>>;
}

/// `"WordChoice"` / `"word_choice"` -> `"word choice"`
fn normalize_kind(kind: &str) -> String {
    let mut out = String::with_capacity(kind.len() + 4);
    let mut prev_lower = false;
    for c in kind.chars() {
        if c == '_' || c == '-' {
            out.push(' ');
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            out.push(' ');
        }
        prev_lower = c.is_lowercase();
        out.extend(c.to_lowercase());
    }
    out
}

pub fn map_lint_kind(kind: &str) -> Category {
    let kind = normalize_kind(kind);
    let has = |needle: &str| kind.contains(needle);

    if has("style") || has("word choice") || has("capitalization") || has("miscellaneous") {
        Category::Clarity
    } else if has("redundancy") || has("repetition") {
        Category::Conciseness
    } else if has("readability") {
        Category::Readability
    } else if has("spelling")
        || has("grammar")
        || has("punctuation")
        || has("compounding")
        || has("regional")
        || has("formatting")
    {
        Category::Grammar
    } else {
        Category::Clarity
    }
}

/// `"WordChoice"` -> `"Word Choice"`, `"sentence_capitalization"` -> `"Sentence Capitalization"`
pub fn display_title(kind: &str) -> String {
    normalize_kind(kind)
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn to_suggestion(text: &str, lint: Lint) -> Option<Suggestion> {
    let category = map_lint_kind(&lint.kind);
    let mut replacements: Vec<String> = lint.replacements;
    if replacements.is_empty() && category == Category::Conciseness {
        // Redundant text with no suggested wording: offer removal.
        replacements.push(String::new());
    }
    let detail = match category {
        Category::Grammar => SuggestionDetail::Grammar {
            title: display_title(&lint.kind),
            lint_kind: lint.kind,
        },
        Category::Conciseness => SuggestionDetail::Conciseness,
        Category::Readability => SuggestionDetail::Readability {
            grade: slice_chars(text, lint.start, lint.end)
                .and_then(grade_level)
                .unwrap_or(0.0),
            rewrite: RewriteState::NotRequested,
        },
        _ => SuggestionDetail::Clarity {
            lint_kind: Some(lint.kind),
        },
    };
    Suggestion::anchored(text, lint.start, lint.end, SuggestionSource::Linter, detail)
        .map(|s| s.with_replacements(replacements).with_explanation(lint.message))
}

pub struct LinterAnalyzer<L> {
    linter: L,
}

impl<L: Linter> LinterAnalyzer<L> {
    pub fn new(linter: L) -> Self {
        Self { linter }
    }

    pub fn check(&self, text: &str) -> Vec<Suggestion> {
        let lints = match self.linter.lint(text) {
            Ok(lints) => lints,
            Err(err) => {
                tracing::warn!(error = %err, "linter failed; no lint suggestions this run");
                return Vec::new();
            }
        };
        let total = lints.len();
        let out: Vec<Suggestion> = lints
            .into_iter()
            .filter_map(|lint| to_suggestion(text, lint))
            .collect();
        if out.len() < total {
            tracing::debug!(dropped = total - out.len(), "lints with out-of-range spans dropped");
        }
        out
    }
}

impl<L: Linter> Analyzer for LinterAnalyzer<L> {
    fn name(&self) -> &'static str {
        "linter"
    }

    fn categories(&self) -> &'static [Category] {
        &[
            Category::Grammar,
            Category::Clarity,
            Category::Conciseness,
            Category::Readability,
        ]
    }

    fn source(&self) -> SuggestionSource {
        SuggestionSource::Linter
    }

    fn analyze<'a>(&'a self, text: &'a str) -> AnalyzeFuture<'a> {
        Box::pin(async move { Ok(self.check(text)) })
    }
}

/// A small built-in linter: repeated words, doubled spaces, sentence
/// capitalization and "a"/"an" agreement.
#[derive(Debug, Default, Clone)]
pub struct BasicLinter;

struct BasicRules {
    word: Regex,
    double_space: Regex,
    sentence_start: Regex,
    article: Regex,
}

fn rules() -> Option<&'static BasicRules> {
    static RULES: OnceLock<Option<BasicRules>> = OnceLock::new();
    RULES
        .get_or_init(|| {
            Some(BasicRules {
                word: Regex::new(r"\b\w+\b").ok()?,
                double_space: Regex::new(r"\S( {2,})\S").ok()?,
                sentence_start: Regex::new(r"(?:^|[.!?]\s+)([a-z])").ok()?,
                article: Regex::new(r"(?i)\b(a)\s+([aeio]\w*)\b").ok()?,
            })
        })
        .as_ref()
}

impl Linter for BasicLinter {
    fn lint(&self, text: &str) -> anyhow::Result<Vec<Lint>> {
        let rules = rules().ok_or_else(|| anyhow::anyhow!("lint rules failed to compile"))?;
        let to_char = |byte: usize| byte_to_char(text, byte);
        let mut lints = Vec::new();

        let words: Vec<regex::Match> = rules.word.find_iter(text).collect();
        for pair in words.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let gap = &text[prev.end()..next.start()];
            if prev.as_str().eq_ignore_ascii_case(next.as_str())
                && !gap.is_empty()
                && gap.chars().all(char::is_whitespace)
            {
                lints.push(Lint {
                    start: to_char(prev.end()),
                    end: to_char(next.end()),
                    kind: "Repetition".into(),
                    message: format!("\u{201c}{}\u{201d} is repeated.", next.as_str()),
                    replacements: Vec::new(),
                });
            }
        }

        for caps in rules.double_space.captures_iter(text) {
            if let Some(spaces) = caps.get(1) {
                lints.push(Lint {
                    start: to_char(spaces.start()),
                    end: to_char(spaces.end()),
                    kind: "Formatting".into(),
                    message: "Use a single space between words.".into(),
                    replacements: vec![" ".into()],
                });
            }
        }

        for caps in rules.sentence_start.captures_iter(text) {
            if let Some(letter) = caps.get(1) {
                let start = to_char(letter.start());
                lints.push(Lint {
                    start,
                    end: start + 1,
                    kind: "Capitalization".into(),
                    message: "Sentences should start with a capital letter.".into(),
                    replacements: vec![letter.as_str().to_uppercase()],
                });
            }
        }

        for caps in rules.article.captures_iter(text) {
            if let (Some(article), Some(next)) = (caps.get(1), caps.get(2)) {
                // "a one-off", "a European": initial vowel letter, consonant sound.
                let lower = next.as_str().to_lowercase();
                if lower.starts_with("one") || lower.starts_with("eu") {
                    continue;
                }
                let start = to_char(article.start());
                let replacement = if article.as_str() == "A" { "An" } else { "an" };
                lints.push(Lint {
                    start,
                    end: start + 1,
                    kind: "Grammar".into(),
                    message: format!("Use \u{201c}an\u{201d} before \u{201c}{}\u{201d}.", next.as_str()),
                    replacements: vec![replacement.into()],
                });
            }
        }

        lints.sort_by_key(|l| (l.start, l.end));
        Ok(lints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLinter(Vec<Lint>);

    impl Linter for FixedLinter {
        fn lint(&self, _text: &str) -> anyhow::Result<Vec<Lint>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenLinter;

    impl Linter for BrokenLinter {
        fn lint(&self, _text: &str) -> anyhow::Result<Vec<Lint>> {
            Err(anyhow::anyhow!("worker crashed"))
        }
    }

    fn lint(start: usize, end: usize, kind: &str) -> Lint {
        Lint {
            start,
            end,
            kind: kind.into(),
            message: "msg".into(),
            replacements: Vec::new(),
        }
    }

    #[test]
    fn test_map_lint_kind() {
        assert_eq!(map_lint_kind("WordChoice"), Category::Clarity);
        assert_eq!(map_lint_kind("Capitalization"), Category::Clarity);
        assert_eq!(map_lint_kind("Redundancy"), Category::Conciseness);
        assert_eq!(map_lint_kind("repetition"), Category::Conciseness);
        assert_eq!(map_lint_kind("Readability"), Category::Readability);
        assert_eq!(map_lint_kind("Spelling"), Category::Grammar);
        assert_eq!(map_lint_kind("punctuation"), Category::Grammar);
        assert_eq!(map_lint_kind("Formatting"), Category::Grammar);
        assert_eq!(map_lint_kind("Enhancement"), Category::Clarity);
    }

    #[test]
    fn test_display_title() {
        assert_eq!(display_title("WordChoice"), "Word Choice");
        assert_eq!(display_title("sentence_capitalization"), "Sentence Capitalization");
        assert_eq!(display_title("Spelling"), "Spelling");
    }

    #[test]
    fn test_adapter_normalizes_and_offers_removal() {
        let text = "This is is fine. Teh end.";
        let analyzer = LinterAnalyzer::new(FixedLinter(vec![
            lint(7, 10, "Repetition"),
            Lint {
                replacements: vec!["The".into()],
                ..lint(17, 20, "Spelling")
            },
            lint(40, 50, "Spelling"),
        ]));
        let found = analyzer.check(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].category(), Category::Conciseness);
        assert_eq!(found[0].replacements, vec![String::new()]);
        assert_eq!(found[1].category(), Category::Grammar);
        match &found[1].detail {
            SuggestionDetail::Grammar { title, .. } => assert_eq!(title, "Spelling"),
            _ => panic!("expected grammar detail"),
        }
        assert!(found.iter().all(|s| s.source == SuggestionSource::Linter));
    }

    #[test]
    fn test_linter_failure_degrades_to_empty() {
        assert!(LinterAnalyzer::new(BrokenLinter).check("anything").is_empty());
    }

    #[test]
    fn test_basic_linter_rules() {
        let text = "the the cat.  it ate a apple.";
        let lints = BasicLinter.lint(text).unwrap();
        let kinds: Vec<&str> = lints.iter().map(|l| l.kind.as_str()).collect();
        assert!(kinds.contains(&"Repetition"));
        assert!(kinds.contains(&"Capitalization"));
        assert!(kinds.contains(&"Grammar"));
        assert!(kinds.contains(&"Formatting"));

        let article = lints.iter().find(|l| l.kind == "Grammar").unwrap();
        assert_eq!(slice_chars(text, article.start, article.end), Some("a"));
        assert_eq!(article.replacements, vec!["an".to_string()]);
    }

    #[test]
    fn test_basic_linter_double_space_between_words() {
        let lints = BasicLinter.lint("Two  spaces here.").unwrap();
        assert_eq!(lints.len(), 1);
        assert_eq!(lints[0].kind, "Formatting");
        assert_eq!((lints[0].start, lints[0].end), (3, 5));
    }

    #[test]
    fn test_basic_linter_through_adapter_is_valid() {
        let text = "we went to to the shop. it was an European brand.";
        let found = LinterAnalyzer::new(BasicLinter).check(text);
        assert!(!found.is_empty());
        assert!(found.iter().all(|s| s.is_valid_in(text)));
    }
}
