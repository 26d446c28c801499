use crate::models::recipe::{ field_text, RecipeRequest };
use serde_json::Value;

pub const DEFAULT_CUISINE: &str = "any";
pub const DEFAULT_DIETARY: &str = "none";
pub const DEFAULT_TIME_LIMIT: i64 = 30;
pub const DEFAULT_DIFFICULTY: &str = "easy";
pub const DEFAULT_NOTES: &str = "none";

fn or_default(value: &Option<Value>, default: &str) -> String {
    field_text(value.as_ref()).unwrap_or_else(|| default.to_string())
}

/// Renders a recipe request as the instruction sent to the model.
///
/// Values are not validated; whatever the caller sent (a negative or
/// fractional time limit, an unknown difficulty) ends up in the prompt as-is.
pub fn build_recipe_prompt(request: &RecipeRequest) -> String {
    let cuisine = or_default(&request.cuisine, DEFAULT_CUISINE);
    let dietary = or_default(&request.dietary, DEFAULT_DIETARY);
    let difficulty = or_default(&request.difficulty, DEFAULT_DIFFICULTY);
    let notes = or_default(&request.additional_notes, DEFAULT_NOTES);
    let time_limit = field_text(request.time_limit.as_ref())
        .unwrap_or_else(|| DEFAULT_TIME_LIMIT.to_string());
    let ingredients = request.ingredient_list().join(", ");

    format!(
        "Generate a clear and simple recipe for a {cuisine} dish that meets these dietary restrictions: {dietary}.\n\
         Use the following ingredients: {ingredients}. The cooking time should be under {time_limit} minutes.\n\
         Ensure the recipe is suitable for a {difficulty} level cook. \
         Provide a simple, step-by-step recipe with clear ingredient measurements and concise instructions.\n\
         Additional notes: {notes}.\n\
         Avoid excessive explanations or fancy formatting like markdown."
    )
}
