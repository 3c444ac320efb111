//! Default context limits for known model families.

/// Tokens held back from the context window for the model's answer.
const RESERVED_OUTPUT_TOKENS: usize = 4_096;

/// Returns the default context limit (in tokens) for a known model ID.
///
/// Uses prefix matching against known model families. Unknown models
/// return 8192 as a conservative default.
pub fn default_context_limit(model_id: &str) -> usize {
    // provider-prefixed ids, e.g. `openai:gpt-4o`
    let model_id = model_id
        .split_once(':')
        .map(|(_, id)| id)
        .unwrap_or(model_id);

    if model_id.starts_with("claude-") {
        return 200_000;
    }
    if model_id.starts_with("gpt-4o")
        || model_id.starts_with("gpt-4-turbo")
        || model_id.starts_with("gpt-4.1")
    {
        return 128_000;
    }
    if model_id.starts_with("gpt-4") {
        return 8_192;
    }
    if model_id.starts_with("gpt-3.5") {
        return 16_385;
    }
    // OpenAI o-series (o1, o3, o4)
    if model_id.starts_with("o1") || model_id.starts_with("o3") || model_id.starts_with("o4") {
        return 200_000;
    }
    if model_id.starts_with("grok-") {
        return 131_072;
    }
    if model_id.starts_with("deepseek-") {
        return 64_000;
    }
    if model_id.starts_with("llama-3") || model_id.starts_with("llama3") {
        return 128_000;
    }
    if model_id.starts_with("qwen-") || model_id.starts_with("qwq-") {
        return 32_768;
    }
    8_192
}

/// Token budget for the prompt after reserving room for the answer.
///
/// Small windows reserve a quarter of the limit instead of the fixed
/// output reservation.
pub fn max_allowed_tokens(context_limit: usize) -> usize {
    let reserved = RESERVED_OUTPUT_TOKENS.min(context_limit / 4);
    context_limit - reserved
}

/// Whether the model only emits reasoning-style answers.
///
/// Related-question suggestions are skipped for these models.
pub fn is_reasoning_model(model_id: &str) -> bool {
    let model_id = model_id
        .split_once(':')
        .map(|(_, id)| id)
        .unwrap_or(model_id);
    model_id.starts_with("o1")
        || model_id.starts_with("o3")
        || model_id.starts_with("o4")
        || model_id.contains("deepseek-r1")
        || model_id.contains("deepseek-reasoner")
        || model_id.contains("-reasoning")
}
