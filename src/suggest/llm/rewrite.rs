//! Sentence rewrites backing passive-voice and readability suggestions.

use super::client::{Completer, CompletionError};
use super::{parse, prompts};
use crate::suggest::Category;

/// Ask the model to rewrite `sentence` for `category`.
///
/// Only passive and readability suggestions have rewrites; any other
/// category is a validation error.
pub async fn rewrite_sentence(
    completer: &dyn Completer,
    category: Category,
    sentence: &str,
) -> Result<String, CompletionError> {
    let prompt = match category {
        Category::Passive => prompts::passive_rewrite(sentence),
        Category::Readability => prompts::readability_rewrite(sentence),
        other => {
            return Err(CompletionError::Validation(format!(
                "{} suggestions have no rewrite",
                other
            )))
        }
    };
    let response = completer.complete(&prompt).await?;
    parse::clean_rewrite(&response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::llm::testing::ScriptedCompleter;

    #[tokio::test]
    async fn test_passive_rewrite_uses_passive_prompt() {
        let completer = ScriptedCompleter::new(|p| {
            assert!(p.user.contains("active voice"));
            Ok("\"Sam threw the ball.\"".to_string())
        });
        let out = rewrite_sentence(completer.as_ref(), Category::Passive, "The ball was thrown by Sam.")
            .await
            .unwrap();
        assert_eq!(out, "Sam threw the ball.");
    }

    #[tokio::test]
    async fn test_rewrite_rejects_other_categories() {
        let completer = ScriptedCompleter::reply("x");
        let err = rewrite_sentence(completer.as_ref(), Category::Spelling, "teh")
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(completer.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_rewrite_is_error() {
        let completer = ScriptedCompleter::reply("   ");
        let err = rewrite_sentence(completer.as_ref(), Category::Readability, "Long sentence.")
            .await
            .unwrap_err();
        assert_eq!(err, CompletionError::EmptyResponse);
    }
}
