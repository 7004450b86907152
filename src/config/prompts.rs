//! Prompt templates for docbrain.
//!
//! Prompts can be customized by placing a `rag.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for question rewriting and grounded answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// Instruction for turning a follow-up into a standalone question.
    pub rewrite_system: String,
    /// Grounded-answer instruction. Receives `{{refusal}}` and `{{context}}`.
    pub qa_system: String,
    /// Template for one evidence passage. Receives `{{source}}`, `{{page}}` and `{{content}}`.
    pub document: String,
    /// Sentence emitted verbatim when the documents do not cover the question.
    pub refusal: String,
    /// Follow-up request turning an answer into an email. Receives `{{answer}}`.
    pub email_user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            rewrite_system: r#"Given a chat history and the latest user question which might reference context in the chat history, formulate a standalone question which can be understood without the chat history. Do NOT answer the question, just reformulate it if needed and otherwise return it as is."#.to_string(),

            qa_system: r#"You are a strict Enterprise Analyst. Use the following pieces of retrieved context to answer the question.

CRITICAL RULES:
1. You must answer ONLY using the information present in the Context.
2. If the user asks about a topic that is NOT in the Context (e.g., other companies, sports, general knowledge), you MUST say exactly: "{{refusal}}"
3. Do NOT make up answers. Do NOT use your internal training data.
4. CITATION IS REQUIRED: For every fact, explicitly mention the Source (filename).

Context:
{{context}}"#.to_string(),

            document: "Source: {{source}}{{page}}\nContent: {{content}}".to_string(),

            refusal: "I cannot find information about this topic in the uploaded documents.".to_string(),

            email_user: r#"Based on this information: "{{answer}}"
Draft a short, professional email to a manager."#.to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// The template is scanned once from left to right. Inserted values are
    /// copied verbatim and never scanned again, so document text containing
    /// `{{name}}` reaches the model unchanged. Unknown placeholders are kept.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let Some(end) = after.find("}}") else {
                result.push_str(&rest[start..]);
                return result;
            };

            match vars.get(&after[..end]) {
                Some(value) => {
                    result.push_str(value);
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str("{{");
                    rest = after;
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
