//! Template generation: field map → ISO document template text.

use crate::error::ComplianceError;
use crate::output::{FieldMap, GeneratedTemplate};
use crate::pipeline::llm::TextGenerator;
use crate::prompts::build_template_prompt;
use tracing::{debug, info, warn};

/// Draft a `document_type` template for `iso_standard`.
///
/// An empty `fields` map is accepted and yields a placeholder-style template.
/// The model's text is trimmed and otherwise kept verbatim; an empty answer
/// gives an empty template rather than an error.
pub async fn generate_template(
    generator: &dyn TextGenerator,
    document_type: &str,
    iso_standard: &str,
    fields: &FieldMap,
) -> Result<GeneratedTemplate, ComplianceError> {
    let prompt = build_template_prompt(document_type, iso_standard, fields);
    debug!("Template prompt: {} chars", prompt.len());

    let text = match generator.generate(&prompt).await? {
        Some(raw) => raw.trim().to_string(),
        None => {
            warn!("Template generation: model returned no content");
            String::new()
        }
    };
    info!(
        "Generated {} template for {} ({} chars)",
        document_type,
        iso_standard,
        text.len()
    );

    Ok(GeneratedTemplate {
        text,
        document_type: document_type.to_string(),
        iso_standard: iso_standard.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Echo {
        reply: Option<&'static str>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate(&self, prompt: &str) -> Result<Option<String>, ComplianceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.map(str::to_string))
        }
    }

    #[tokio::test]
    async fn trims_model_text_and_keeps_target() {
        let gen = Echo {
            reply: Some("\n\n# SOP-001 Calibration\n\n"),
            prompts: Mutex::new(Vec::new()),
        };
        let mut fields = FieldMap::new();
        fields.insert("document_number".into(), "SOP-001".into());

        let t = generate_template(&gen, "sop", "ISO 13485:2016", &fields).await.unwrap();
        assert_eq!(t.text, "# SOP-001 Calibration");
        assert_eq!(t.document_type, "sop");
        assert_eq!(t.iso_standard, "ISO 13485:2016");
        assert!(gen.prompts.lock().unwrap()[0].contains("- document_number: SOP-001"));
    }

    #[tokio::test]
    async fn empty_answer_gives_empty_template() {
        let gen = Echo {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        };
        let t = generate_template(&gen, "sop", "ISO 9001:2015", &FieldMap::new())
            .await
            .unwrap();
        assert!(t.text.is_empty());
    }
}
