use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::message::Message;
use super::tool::ToolDescriptor;

/// How much the model should think before answering
///
/// Each adapter maps this to its own knob: a token budget, a named level, or
/// nothing at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Effort {
    /// No reasoning configuration is sent
    #[default]
    None,
    Minimal,
    Low,
    Medium,
    High,
    Xhigh,
}

impl Effort {
    /// Whether any reasoning configuration should be sent
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Named level for models with adaptive reasoning
    pub const fn adaptive(self) -> Option<AdaptiveEffort> {
        match self {
            Self::None => None,
            Self::Minimal | Self::Low => Some(AdaptiveEffort::Low),
            Self::Medium => Some(AdaptiveEffort::Medium),
            Self::High => Some(AdaptiveEffort::High),
            Self::Xhigh => Some(AdaptiveEffort::Max),
        }
    }
}

/// Effort labels understood by adaptive-reasoning model families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AdaptiveEffort {
    Low,
    Medium,
    High,
    Max,
}

/// Parameters of one completion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionParams {
    /// Model identifier as the provider knows it
    pub model: String,
    /// Conversation messages
    pub messages: Vec<Message>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Reasoning effort
    #[serde(default)]
    pub effort: Effort,
    /// Tools the model may call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDescriptor>>,
}

impl CompletionParams {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            effort: Effort::None,
            tools: None,
        }
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub const fn with_effort(mut self, effort: Effort) -> Self {
        self.effort = effort;
        self
    }

    /// Offer tools to the model; an empty list offers none
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.tools = (!tools.is_empty()).then_some(tools);
        self
    }

    /// Tool descriptors, empty when tool calling is off
    pub fn tools(&self) -> &[ToolDescriptor] {
        self.tools.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn effort_parses_lowercase() {
        assert_eq!(Effort::from_str("xhigh").unwrap(), Effort::Xhigh);
        assert_eq!(Effort::from_str("none").unwrap(), Effort::None);
        assert!(Effort::from_str("extreme").is_err());
        assert_eq!(Effort::Medium.to_string(), "medium");
    }

    #[test]
    fn adaptive_labels() {
        assert_eq!(Effort::None.adaptive(), None);
        assert_eq!(Effort::Minimal.adaptive(), Some(AdaptiveEffort::Low));
        assert_eq!(Effort::Low.adaptive(), Some(AdaptiveEffort::Low));
        assert_eq!(Effort::Medium.adaptive(), Some(AdaptiveEffort::Medium));
        assert_eq!(Effort::High.adaptive(), Some(AdaptiveEffort::High));
        assert_eq!(Effort::Xhigh.adaptive(), Some(AdaptiveEffort::Max));
        assert_eq!(AdaptiveEffort::Max.to_string(), "max");
    }

    #[test]
    fn empty_tool_list_disables_tools() {
        let params = CompletionParams::new("m", Vec::new()).with_tools(Vec::new());
        assert!(params.tools.is_none());
        assert!(params.tools().is_empty());
    }
}
