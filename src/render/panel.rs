//! Interactive panel for an activated annotation.

use crate::suggest::{Category, RewriteState, Suggestion, SuggestionDetail};

#[derive(Debug, Clone, PartialEq)]
pub enum PanelOptions {
    /// Replacement candidates, best first.
    Ready(Vec<String>),
    /// A rewrite was requested and has not come back yet.
    Pending,
    /// The rewrite failed; reopening the panel retries it.
    Unavailable(String),
    /// Advice with nothing to apply.
    AdviceOnly,
}

/// Actions the panel offers, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Apply(usize),
    Ignore,
    Dismiss,
    DismissPermanently,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub suggestion_id: String,
    pub category: Category,
    pub title: String,
    pub explanation: String,
    pub anchor_text: String,
    pub options: PanelOptions,
}

impl Panel {
    pub fn for_suggestion(suggestion: &Suggestion) -> Self {
        Self {
            suggestion_id: suggestion.id.clone(),
            category: suggestion.category(),
            title: title(suggestion),
            explanation: suggestion.explanation.clone(),
            anchor_text: suggestion.anchor_text.clone(),
            options: options(suggestion),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.options, PanelOptions::Pending)
    }

    pub fn actions(&self) -> Vec<PanelAction> {
        let mut actions = Vec::new();
        if let PanelOptions::Ready(options) = &self.options {
            actions.extend((0..options.len()).map(PanelAction::Apply));
        }
        if self.category.is_advisory() {
            actions.push(PanelAction::Dismiss);
            actions.push(PanelAction::DismissPermanently);
        } else {
            actions.push(PanelAction::Ignore);
        }
        actions
    }
}

fn title(suggestion: &Suggestion) -> String {
    match &suggestion.detail {
        SuggestionDetail::Grammar { title, .. } if !title.is_empty() => title.clone(),
        SuggestionDetail::Advisory { reason, .. } => reason.label().to_string(),
        SuggestionDetail::Readability { grade, .. } => format!("Hard to read (grade {:.0})", grade),
        _ => suggestion.category().label().to_string(),
    }
}

fn options(suggestion: &Suggestion) -> PanelOptions {
    if !suggestion.replacements.is_empty() {
        return PanelOptions::Ready(suggestion.replacements.clone());
    }
    match suggestion.rewrite_state() {
        Some(RewriteState::Pending { .. }) => PanelOptions::Pending,
        Some(RewriteState::Failed(message)) => PanelOptions::Unavailable(message.clone()),
        // Not requested yet: opening the panel is what triggers the request.
        Some(RewriteState::NotRequested) => PanelOptions::Pending,
        Some(RewriteState::Ready) | None => PanelOptions::AdviceOnly,
    }
}
