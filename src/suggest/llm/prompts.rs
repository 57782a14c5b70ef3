//! Prompt builders for every remote call. Each returns a ready [`Prompt`].

use super::client::Prompt;
use super::tone::Tone;
use crate::suggest::advisory::AdvisoryReason;

const SPELLING_SYSTEM: &str = "You are a precise English spell checker. You only report genuine misspellings and you never rewrite correct words.";

pub fn spelling(words: &[String], limit_suggestions: bool) -> Prompt {
    let limit_rule = if limit_suggestions {
        "Give only the single most likely correction for each word."
    } else {
        "Give the most likely corrections for each word, best first."
    };
    let user = format!(
        r#"Check the spelling of each word in this list.

RULES:
1. Suggest corrections only for typos and misspellings.
2. Leave proper nouns, brand names and technical terms alone.
3. {limit_rule}
4. Reply with one JSON object and nothing else. Keys are the original words, values are arrays of corrections. Omit words that are spelled correctly.

WORDS: {words}

EXAMPLE:
{{"recieve": ["receive"], "teh": ["the"]}}"#,
        limit_rule = limit_rule,
        words = words.join(", "),
    );
    Prompt::user(user)
        .with_system(SPELLING_SYSTEM)
        .json()
        .max_tokens(500)
        .temperature(0.0)
}

pub fn advisory(document: &str) -> Prompt {
    let categories: String = AdvisoryReason::all()
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}: {}\n", i + 1, r.label(), r.description()))
        .collect();
    let user = format!(
        r#"Review the document below for substance, not style. Only use these advisory categories:

{categories}
Reply with a JSON array and nothing else. Each element:
{{"reason": "<category name>", "originalText": "<a sentence copied exactly from the document, at least 20 characters, that appears once>", "explanation": "<one or two sentences of advice addressed to the writer>"}}

Copy originalText character for character, including punctuation and whitespace. Do not report spelling, grammar or wording issues. If nothing applies, reply [].

DOCUMENT:
{document}"#,
        categories = categories,
        document = serde_json::to_string(document).unwrap_or_else(|_| document.to_string()),
    );
    Prompt::user(user)
        .with_system("You are an editor giving structural and argumentative feedback on business and technical writing.")
        .max_tokens(2048)
        .temperature(0.2)
}

pub fn passive_rewrite(sentence: &str) -> Prompt {
    let user = format!(
        r#"Rewrite this sentence in the active voice.

- Make the actor the subject.
- Keep the original tense and meaning.
- If the sentence is already active, return it unchanged.
- Reply with the rewritten sentence only, without quotes or commentary.

SENTENCE:
{sentence}"#
    );
    Prompt::user(user).max_tokens(150).temperature(0.7)
}

pub fn readability_rewrite(sentence: &str) -> Prompt {
    let user = format!(
        r#"Rewrite this text so it is easier to read.

- Prefer short, common words.
- Split long sentences.
- Use the active voice.
- Aim for a Flesch-Kincaid grade of 8 or lower.
- Reply with the rewritten text only, without quotes or commentary.

TEXT:
{sentence}"#
    );
    Prompt::user(user).max_tokens(200).temperature(0.7)
}

pub fn tone_detect(text: &str) -> Prompt {
    let options: Vec<&str> = Tone::all().iter().map(|t| t.label()).collect();
    let user = format!(
        r#"Classify the tone of the text below. Pick exactly one of: {options}.

Reply with JSON only: {{"tone": "<tone>", "confidence": <number between 0 and 1>}}

TEXT:
{text}"#,
        options = options.join(", "),
    );
    Prompt::user(user).json().max_tokens(150).temperature(0.0)
}

pub fn tone_rewrite(text: &str, tone: Tone) -> Prompt {
    let user = format!(
        r#"Rewrite the text below in a {tone} tone. Keep its meaning, facts and approximate length. Reply with the rewritten text only.

TEXT:
{text}"#,
        tone = tone.label().to_lowercase(),
    );
    Prompt::user(user).max_tokens(2048).temperature(0.7)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spelling_prompt_lists_words_and_limit() {
        let p = spelling(&["recieve".into(), "teh".into()], true);
        assert!(p.user.contains("recieve, teh"));
        assert!(p.user.contains("single most likely"));
        assert!(p.json);
    }

    #[test]
    fn test_advisory_prompt_names_every_reason() {
        let p = advisory("Some document.");
        for reason in AdvisoryReason::all() {
            assert!(p.user.contains(reason.label()));
        }
        assert!(p.user.contains("\"Some document.\""));
    }

    #[test]
    fn test_tone_prompts() {
        assert!(tone_detect("hi").user.contains("Empathetic"));
        assert!(tone_rewrite("hi", Tone::Academic).user.contains("academic tone"));
    }
}
