pub mod prompt;
pub mod sanitize;

pub use prompt::build_recipe_prompt;
pub use sanitize::sanitize_recipe;

pub const NO_RECIPE_SENTINEL: &str = "No recipe generated.";
pub const RECIPE_READY_MESSAGE: &str = "Here is your recipe!";
pub const NO_RECIPE_MESSAGE: &str = "Sorry, no recipe could be generated.";

/// Message shown next to a sanitized recipe; an empty recipe gets the apology.
pub fn chat_message_for(recipe: &str) -> &'static str {
    if recipe.is_empty() { NO_RECIPE_MESSAGE } else { RECIPE_READY_MESSAGE }
}
