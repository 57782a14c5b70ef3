//! The live text surface the engine annotates.
//!
//! The real editor is external; the engine only needs its plain-text
//! projection and a way to replace a char range of it.

use crate::util::splice_chars;

pub trait LiveSurface: Send {
    /// Current plain-text projection of the document.
    fn text(&self) -> String;

    /// Replace chars `[start, end)` with `replacement`.
    fn replace_range(&mut self, start: usize, end: usize, replacement: &str) -> anyhow::Result<()>;
}

/// A surface that is just a string. Used by hosts without a rich document
/// model, and by tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlainTextSurface {
    text: String,
}

impl PlainTextSurface {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl LiveSurface for PlainTextSurface {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn replace_range(&mut self, start: usize, end: usize, replacement: &str) -> anyhow::Result<()> {
        self.text = splice_chars(&self.text, start, end, replacement).ok_or_else(|| {
            anyhow::anyhow!("range {}..{} is outside the document", start, end)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_range() {
        let mut surface = PlainTextSurface::new("I recieve mail");
        surface.replace_range(2, 9, "receive").unwrap();
        assert_eq!(surface.as_str(), "I receive mail");
        assert!(surface.replace_range(10, 99, "x").is_err());
        assert_eq!(surface.text(), "I receive mail");
    }
}
