// Shared prompt fragments. Stage prompts live in curriculum::prompts.

/// System instruction sent with every call. Output is still run through the
/// extractor because the model does not always comply.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
