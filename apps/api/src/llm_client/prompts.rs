// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments.

/// Appended to system prompts whose reply must parse as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "JSON 형식으로만 응답해주세요. \
    JSON 객체 밖에 다른 텍스트를 포함하지 마세요. \
    마크다운 코드 블록을 사용하지 마세요.";
