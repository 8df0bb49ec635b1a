//! Steering text sent alongside the image to the embedding model.

/// Used when no category is selected.
pub const GENERIC_PROMPT: &str = "I am trying to find pieces of apparel that are similar to what is in this picture. Pretend as if there is no model in the image, only clothing.";

/// Prompt scoping the embedding to one category. `code` is the backend
/// category code, fenced in triple backticks.
pub fn category_prompt(code: &str) -> String {
    format!(
        "I am trying to find pieces of apparel that are similar to what is in this picture. \
         Ignore the model and only focus on finding the most similar clothing. \
         I only care about apparel that falls within the category contained within triple backticks: ```{code}```"
    )
}
