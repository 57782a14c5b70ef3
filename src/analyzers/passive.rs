//! Passive voice: a form of "to be" (or "get") followed by a past participle.
//!
//! Suggestions anchor to the whole sentence so an accepted active-voice
//! rewrite replaces it; the flagged phrase is kept for display.

use super::sentences::sentence_bounds;
use super::{AnalyzeFuture, Analyzer};
use crate::suggest::{Category, RewriteState, Suggestion, SuggestionDetail, SuggestionSource};
use crate::util::byte_to_char;
use regex::Regex;
use std::sync::OnceLock;

const IRREGULAR_PARTICIPLES: &[&str] = &[
    "arisen", "awoken", "beaten", "become", "begun", "bent", "bitten", "blown", "bought", "bound",
    "broken", "brought", "built", "burnt", "caught", "chosen", "cut", "dealt", "done", "drawn",
    "driven", "eaten", "fed", "felt", "forbidden", "forgiven", "forgotten", "found", "frozen",
    "given", "gone", "grown", "heard", "held", "hidden", "hit", "hung", "hurt", "kept", "known",
    "laid", "led", "left", "lent", "lost", "made", "meant", "met", "paid", "put", "read", "ridden",
    "rung", "risen", "run", "said", "seen", "sent", "set", "shaken", "shot", "shown", "shut",
    "sold", "sought", "spent", "split", "spoken", "spread", "stolen", "struck", "sung", "sunk",
    "swept", "sworn", "taken", "taught", "thought", "thrown", "told", "torn", "understood",
    "undertaken", "upset", "won", "worn", "woven", "written", "wound",
];

/// Words ending in "ed" that are not past participles ("The car is red.").
const NOT_PARTICIPLES: &[&str] = &[
    "bed", "red", "need", "seed", "speed", "feed", "weed", "breed", "greed", "indeed", "exceed",
    "proceed", "succeed", "hundred", "sacred", "naked", "wicked", "kindred", "hatred", "rugged",
];

fn passive_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            r"(?i)\b(?:am|is|are|was|were|be|been|being|get|gets|got|gotten)(?:\s+\w+ly)?\s+(\w+ed|{})\b",
            IRREGULAR_PARTICIPLES.join("|")
        );
        Regex::new(&pattern).ok()
    })
    .as_ref()
}

#[derive(Debug, Default, Clone)]
pub struct PassiveAnalyzer;

impl PassiveAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, text: &str) -> Vec<Suggestion> {
        let Some(re) = passive_regex() else {
            return Vec::new();
        };
        let mut out: Vec<Suggestion> = Vec::new();
        for caps in re.captures_iter(text) {
            let (Some(m), Some(participle)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let participle = participle.as_str().to_lowercase();
            if NOT_PARTICIPLES.contains(&participle.as_str()) {
                continue;
            }
            let phrase_start = byte_to_char(text, m.start());
            let phrase_end = phrase_start + m.as_str().chars().count();
            let (start, end) = sentence_bounds(text, phrase_start, phrase_end);
            // One suggestion per sentence.
            if out.iter().any(|s| s.start == start && s.end == end) {
                continue;
            }
            let suggestion = Suggestion::anchored(
                text,
                start,
                end,
                SuggestionSource::Rules,
                SuggestionDetail::Passive {
                    phrase_start,
                    phrase_end,
                    rewrite: RewriteState::NotRequested,
                },
            )
            .map(|s| {
                s.with_explanation(format!(
                    "\u{201c}{}\u{201d} is passive. Active voice names who acts and usually reads more directly.",
                    m.as_str()
                ))
            });
            out.extend(suggestion);
        }
        out
    }
}

impl Analyzer for PassiveAnalyzer {
    fn name(&self) -> &'static str {
        "passive"
    }

    fn categories(&self) -> &'static [Category] {
        &[Category::Passive]
    }

    fn source(&self) -> SuggestionSource {
        SuggestionSource::Rules
    }

    fn analyze<'a>(&'a self, text: &'a str) -> AnalyzeFuture<'a> {
        Box::pin(async move { Ok(self.check(text)) })
    }
}
