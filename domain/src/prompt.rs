use crate::models::{ContextBlock, Prompt};

/// ChatML turn delimiters understood by the Qwen2.5 family. Another model
/// family needs its own template.
pub const IM_START: &str = "<|im_start|>";
pub const IM_END: &str = "<|im_end|>";

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "Bạn là một trợ lý AI chuyên về Data Science. Nhiệm vụ của bạn là trả lời câu hỏi dựa trên thông tin được cung cấp trong phần NGỮ CẢNH.\nNếu thông tin không có trong ngữ cảnh, hãy nói \"Tôi không biết\". Không được bịa đặt thông tin.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    system_instruction: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_INSTRUCTION)
    }
}

impl PromptTemplate {
    pub fn new(system_instruction: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
        }
    }

    /// System turn with the context, user turn with the question, then an
    /// open assistant turn for the model to continue.
    pub fn render(&self, context: &ContextBlock, query: &str) -> Prompt {
        Prompt(format!(
            "{IM_START}system\n{}\n\nNGỮ CẢNH:\n{}\n{IM_END}\n{IM_START}user\nCâu hỏi: {}\n{IM_END}\n{IM_START}assistant\n",
            self.system_instruction,
            context.as_str(),
            query
        ))
    }
}

pub fn build_prompt(context: &ContextBlock, query: &str) -> Prompt {
    PromptTemplate::default().render(context, query)
}
