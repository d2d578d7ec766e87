use super::dto::RecipeFields;
use crate::ai::GeneratedRecipe;

/// Maps a generated recipe onto the fields stored for a recipe. Image and
/// owner are filled in by the caller.
pub fn transform_generated(payload: GeneratedRecipe) -> RecipeFields {
    RecipeFields {
        recipe_title: payload.title.trim().to_string(),
        recipe_description: payload
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        recipe_ingredients: payload.ingredients,
        recipe_instructions: payload.instructions,
        recipe_tags: payload.tags.unwrap_or_default(),
        recipe_special_diets: payload.special_diets.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_generated_fields() {
        let payload: GeneratedRecipe = serde_json::from_value(json!({
            "title": " Lemon Chicken ",
            "description": "Bright and quick.",
            "ingredients": ["chicken", "lemon"],
            "instructions": ["Roast."],
            "tags": ["dinner"],
            "specialDiets": ["gluten-free"],
            "image": "http://img/1.png"
        }))
        .unwrap();

        let fields = transform_generated(payload);
        assert_eq!(fields.recipe_title, "Lemon Chicken");
        assert_eq!(fields.recipe_description.as_deref(), Some("Bright and quick."));
        assert_eq!(fields.recipe_ingredients, vec!["chicken", "lemon"]);
        assert_eq!(fields.recipe_instructions, vec!["Roast."]);
        assert_eq!(fields.recipe_tags, vec!["dinner"]);
        assert_eq!(fields.recipe_special_diets, vec!["gluten-free"]);
    }

    #[test]
    fn optional_lists_default_to_empty() {
        let payload: GeneratedRecipe = serde_json::from_value(json!({
            "title": "Rice",
            "description": "  ",
            "ingredients": ["rice"],
            "instructions": ["Boil."]
        }))
        .unwrap();

        let fields = transform_generated(payload);
        assert!(fields.recipe_tags.is_empty());
        assert!(fields.recipe_special_diets.is_empty());
        assert_eq!(fields.recipe_description, None);
    }
}
