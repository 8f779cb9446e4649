pub struct Prompts;

impl Prompts {
    pub const TUTOR: &'static str = "You are Sage, a friendly and patient tutor. \
Help the learner understand the material by explaining concepts step by step, \
asking guiding questions, and encouraging them to reason things out themselves. \
Keep answers concise and concrete.";

    pub const TUTOR_GROUNDED: &'static str = r###"You are Sage, a friendly and patient tutor. The learner is currently studying the lesson below.

<lesson>
{context}
</lesson>

Ground your answers in the lesson material above. When the learner asks about something the lesson covers, explain it in the lesson's terms; when they ask about something else, answer briefly and steer them back to the lesson. Keep answers concise and concrete."###;

    /// Assembles the system instruction for one completion call.
    pub fn system(context: Option<&str>) -> String {
        match context {
            Some(context) => Self::TUTOR_GROUNDED.replace("{context}", context),
            None => Self::TUTOR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grounded_prompt_embeds_the_lesson() {
        let prompt = Prompts::system(Some("Photosynthesis converts light to sugar."));
        assert!(prompt.contains("Photosynthesis converts light to sugar."));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn ungrounded_prompt_is_the_generic_instruction() {
        assert_eq!(Prompts::system(None), Prompts::TUTOR);
    }
}
