use serde::Serialize;
use serde_json::{json, Value};

use super::{generator::GenerationSettings, GeneratedRecipe};

pub const RECIPE_FUNCTION_NAME: &str = "create_recipe";

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that generates delicious recipes for various ingredients. \
Your goal is to provide unique recipes based on user input, considering specific ingredients, dietary preferences, \
or cuisine types that are safe for human consumption. Please do not provide recipes that are poisonous, such as fly agaric. \
Please note that you can only answer recipe-related queries. If you cannot find a relevant meaning in the presented text, \
please ask the user to try re-phrasing the question.";

const IMAGE_QUERY_INGREDIENTS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// Body of a chat-completions call.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub functions: Vec<Value>,
}

pub fn user_message(query: &str, options: &[String]) -> String {
    format!(
        "User receives a recipe based on following ingredient: {}. Preferences or Dietaries:{}",
        query.trim(),
        options.join(", ")
    )
}

/// Signature the model has to fill in.
pub fn recipe_function() -> Value {
    let string_list = |description: &str| {
        json!({
            "type": "array",
            "description": description,
            "items": { "type": "string" }
        })
    };

    json!({
        "name": RECIPE_FUNCTION_NAME,
        "description": "Create a recipe from the user's ingredients and preferences.",
        "parameters": {
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "Name of the dish." },
                "description": { "type": "string", "description": "One or two sentences about the dish." },
                "ingredients": string_list("Ingredients with quantities, one per item."),
                "instructions": string_list("Preparation steps in order, one per item."),
                "tags": string_list("Short labels such as cuisine or meal type."),
                "specialDiets": string_list("Diets the recipe satisfies, e.g. vegan or gluten-free.")
            },
            "required": ["title", "ingredients", "instructions"]
        }
    })
}

pub fn chat_request(query: &str, options: &[String], settings: &GenerationSettings) -> ChatRequest {
    ChatRequest {
        model: settings.model.clone(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: user_message(query, options),
            },
        ],
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
        top_p: 1.0,
        frequency_penalty: 0.0,
        presence_penalty: 0.0,
        functions: vec![recipe_function()],
    }
}

/// Image-search query for a generated recipe: the title followed by its
/// leading ingredients.
pub fn image_search_query(recipe: &GeneratedRecipe) -> String {
    let title = recipe.title.trim();
    let ingredients: Vec<&str> = recipe
        .ingredients
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .take(IMAGE_QUERY_INGREDIENTS)
        .collect();

    if ingredients.is_empty() {
        title.to_string()
    } else {
        format!("{} with {}", title, ingredients.join(", "))
    }
}
