use aboutme_wire::Endpoint;

const ANSWER_FORMAT: &str =
    "Return only the keywords as a comma-separated list, without any preamble or explanation.";

const SUBJECT_PROMPT: &str = "Generate 5-7 concise keywords that describe the person or main \
subject in this image. Focus on descriptive terms.";

const COLORS_PROMPT: &str = "Analyze this image and generate 8-12 keywords focusing primarily on \
colors, lighting, basic shapes, and fundamental visual elements you can observe. Include dominant \
colors, color tones, lighting conditions, and basic visual characteristics.";

/// Which prompt a relay request is answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt<'a> {
    /// Flat mode: describe the person or main subject.
    Subject,
    /// First layer: colors, lighting and basic shapes.
    Colors,
    /// Later layers: refine the previous layer's keywords.
    Refine(&'a [String]),
}

impl<'a> Prompt<'a> {
    /// Select the prompt for an endpoint. The flat route ignores prior
    /// keywords; the layered route refines them when there are any.
    pub fn select(endpoint: Endpoint, existing: Option<&'a [String]>) -> Self {
        match (endpoint, existing) {
            (Endpoint::Flat, _) => Prompt::Subject,
            (Endpoint::Layered, Some(keywords)) if !keywords.is_empty() => {
                Prompt::Refine(keywords)
            }
            (Endpoint::Layered, _) => Prompt::Colors,
        }
    }

    /// Output token cap sent upstream.
    pub fn max_tokens(&self) -> u32 {
        match self {
            Prompt::Subject => 60,
            Prompt::Colors | Prompt::Refine(_) => 80,
        }
    }

    /// Full prompt text.
    pub fn text(&self) -> String {
        match self {
            Prompt::Subject => format!("{SUBJECT_PROMPT} {ANSWER_FORMAT}"),
            Prompt::Colors => format!("{COLORS_PROMPT} {ANSWER_FORMAT}"),
            Prompt::Refine(keywords) => format!(
                "Based on this image and the existing keywords [{}], generate 8-12 more specific \
                 and detailed keywords that dive deeper into the visual elements, emotions, \
                 actions, or specific details you can observe. Build upon the existing keywords \
                 to create a more nuanced description. {ANSWER_FORMAT}",
                keywords.join(", ")
            ),
        }
    }
}
