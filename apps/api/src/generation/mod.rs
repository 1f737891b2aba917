// Cover letter generation.
// Implements: prompt assembly, single / variation generation, job posting
// analysis, and the retrieval-backed pipeline.
// All LLM calls go through llm_client; nothing here talks to the API directly.

pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod writer;
