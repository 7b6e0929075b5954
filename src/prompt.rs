//! Prompt assembly for batch generation.

// Prompt templates loaded at compile time
const SYSTEM_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/system.md"
));
const USER_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/user.md"
));

/// System and user instructions for one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Render both instructions for a batch of `count` records that must avoid
/// `excluded_names`.
pub fn build_prompts(count: usize, excluded_names: &[&str]) -> PromptPair {
    let count = count.to_string();
    let excluded = excluded_names.join(", ");
    PromptPair {
        system: SYSTEM_TEMPLATE.trim_end().replace("{count}", &count),
        user: USER_TEMPLATE
            .trim_end()
            .replace("{count}", &count)
            .replace("{excluded_names}", &excluded),
    }
}
