//! System-instruction synthesis
//!
//! The instruction sent with every request is a pure function of the
//! current persona. It is recomputed per request, so persona edits between
//! turns affect future turns only.

use crate::config::PersonaConfig;

/// Instruction used by the proxy when it receives a bare text prompt.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a helpful assistant.";

/// Synthesize the system instruction from the persona fields.
///
/// An empty or missing location falls back to the literal `unspecified`.
pub fn system_instruction(persona: &PersonaConfig) -> String {
    let location = persona
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or("unspecified");

    format!(
        "{}\n\n\
         --- KNOWLEDGE BASE ---\n{}\n\n\
         [CUSTOM Q&A]:\n{}\n\n\
         [LOCATION]:\n{}\n\n\
         --- INSTRUCTIONS ---\n\
         - Prioritize the knowledge base for all answers.\n\
         - Analyze images if uploaded.\n\
         - Respond concisely and professionally.",
        persona.purpose, persona.knowledge_base, persona.qna, location
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona(location: Option<&str>) -> PersonaConfig {
        PersonaConfig {
            purpose: "P".into(),
            knowledge_base: "K".into(),
            qna: "Q".into(),
            location: location.map(String::from),
            website_url: None,
        }
    }

    #[test]
    fn test_template_field_order() {
        let instruction = system_instruction(&persona(None));

        let p = instruction.find("P\n").unwrap();
        let k = instruction.find("---\nK\n").unwrap();
        let q = instruction.find("]:\nQ\n").unwrap();
        let loc = instruction.find("]:\nunspecified").unwrap();
        assert!(p < k && k < q && q < loc);
    }

    #[test]
    fn test_location_fallback() {
        assert!(system_instruction(&persona(None)).contains("[LOCATION]:\nunspecified"));
        assert!(system_instruction(&persona(Some("  "))).contains("[LOCATION]:\nunspecified"));
        assert!(system_instruction(&persona(Some("Berlin"))).contains("[LOCATION]:\nBerlin"));
    }

    #[test]
    fn test_instructions_block_present() {
        let instruction = system_instruction(&persona(None));
        assert!(instruction.contains("--- INSTRUCTIONS ---"));
        assert!(instruction.contains("Prioritize the knowledge base"));
        assert!(instruction.ends_with("Respond concisely and professionally."));
    }
}
