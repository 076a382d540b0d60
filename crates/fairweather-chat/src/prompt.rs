//! System prompt assembly.

use fairweather_core::config::ChatConfig;

/// What the user asked the assistant to do with the forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Recommend what to wear for the day.
    Clothing,
    /// Tell a short story set in the weather.
    Story,
    /// Free-form follow-up over the existing conversation.
    FollowUp,
}

impl TaskKind {
    /// Sampling temperature for this task. Practical advice runs cool,
    /// storytelling runs hot, follow-ups run coolest of all.
    pub fn temperature(&self, config: &ChatConfig) -> f64 {
        match self {
            TaskKind::Clothing => config.clothing_temperature,
            TaskKind::Story => config.story_temperature,
            TaskKind::FollowUp => config.fallback_temperature,
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            TaskKind::Clothing => {
                "Recommend what to wear for this weather. Be practical and specific, \
                 and keep it to a few sentences."
            }
            TaskKind::Story => {
                "Tell a short, vivid story set in this weather. A few paragraphs at most."
            }
            TaskKind::FollowUp => {
                "Answer the user's questions about this forecast plainly and accurately. \
                 If something is not in the forecast, say you don't know."
            }
        }
    }
}

/// Build the system prompt for one turn.
///
/// The rendered forecast is embedded whole; the model never sees raw API
/// fields. Rebuilt fresh every turn so stale forecasts are never replayed.
pub fn system_prompt(forecast_text: &str, task: TaskKind) -> String {
    format!(
        "You are a weather assistant. {}\n\nForecast:\n{}",
        task.instruction(),
        forecast_text
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn config() -> ChatConfig {
        ChatConfig {
            base_url: "http://localhost:11434".to_string(),
            default_model: "tinyllama".to_string(),
            clothing_temperature: 0.5,
            story_temperature: 0.9,
            fallback_temperature: 0.2,
        }
    }

    #[test]
    fn temperatures_follow_the_task() {
        let config = config();
        assert_eq!(TaskKind::Clothing.temperature(&config), 0.5);
        assert_eq!(TaskKind::Story.temperature(&config), 0.9);
        assert_eq!(TaskKind::FollowUp.temperature(&config), 0.2);
    }

    #[test]
    fn prompt_embeds_the_rendered_forecast() {
        let prompt = system_prompt("The weather in Oslo is overcast.", TaskKind::Clothing);
        assert!(prompt.contains("You are a weather assistant."));
        assert!(prompt.contains("Forecast:\nThe weather in Oslo is overcast."));
    }

    #[test]
    fn each_task_gets_its_own_instruction() {
        let clothing = system_prompt("x", TaskKind::Clothing);
        let story = system_prompt("x", TaskKind::Story);
        let follow_up = system_prompt("x", TaskKind::FollowUp);
        assert_ne!(clothing, story);
        assert_ne!(story, follow_up);
        assert!(clothing.contains("what to wear"));
        assert!(story.contains("story"));
    }
}
