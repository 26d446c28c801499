use serde::{ Serialize, Deserialize };
use serde_json::Value;

/// Body of `POST /generate_recipe`. Every field is optional on the wire and
/// accepts any JSON value; values are rendered into the prompt as sent.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct RecipeRequest {
    pub cuisine: Option<Value>,
    pub dietary: Option<Value>,
    pub ingredients: Option<Value>,
    pub leftover_ingredients: Option<Value>,
    pub time_limit: Option<Value>,
    pub difficulty: Option<Value>,
    pub additional_notes: Option<Value>,
    pub session_id: Option<Value>,
}

/// Display form of a loosely typed field: strings are trimmed, numbers and
/// booleans print as JSON does (`12.5`, `20`, `true`), arrays join their
/// items with `", "`. Null and blank values give `None`.
pub fn field_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| field_text(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    };
    if text.is_empty() { None } else { Some(text) }
}

impl RecipeRequest {
    /// `ingredients` takes precedence over `leftover_ingredients`. A scalar
    /// counts as a one-item list.
    pub fn ingredient_list(&self) -> Vec<String> {
        let chosen = [&self.ingredients, &self.leftover_ingredients]
            .into_iter()
            .flatten()
            .find(|v| !v.is_null());
        match chosen {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| field_text(Some(item)))
                .collect(),
            other => field_text(other).into_iter().collect(),
        }
    }

    pub fn session_id_text(&self) -> Option<String> {
        field_text(self.session_id.as_ref())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecipeResponse {
    pub chat_message: String,
    pub recipe: String,
    pub session_id: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct EmailRequest {
    pub email: Option<String>,
    pub recipes: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_text_renders_scalars_as_sent() {
        assert_eq!(field_text(Some(&json!(12.5))).as_deref(), Some("12.5"));
        assert_eq!(field_text(Some(&json!(20))).as_deref(), Some("20"));
        assert_eq!(field_text(Some(&json!(" Thai "))).as_deref(), Some("Thai"));
        assert_eq!(field_text(Some(&json!(false))).as_deref(), Some("false"));
        assert_eq!(field_text(Some(&json!(["a", 2]))).as_deref(), Some("a, 2"));
        assert_eq!(field_text(Some(&json!(null))), None);
        assert_eq!(field_text(Some(&json!("  "))), None);
        assert_eq!(field_text(None), None);
    }

    #[test]
    fn test_loose_body_deserializes() {
        let request: RecipeRequest = serde_json::from_value(
            json!({ "time_limit": "20", "cuisine": 5, "ingredients": "egg", "session_id": 7 })
        ).unwrap();
        assert_eq!(request.ingredient_list(), vec!["egg".to_string()]);
        assert_eq!(request.session_id_text().as_deref(), Some("7"));
    }

    #[test]
    fn test_null_ingredients_fall_through_to_leftovers() {
        let request: RecipeRequest = serde_json::from_value(
            json!({ "ingredients": null, "leftover_ingredients": ["rice", "egg"] })
        ).unwrap();
        assert_eq!(request.ingredient_list(), vec!["rice".to_string(), "egg".to_string()]);
    }
}
