//! Fixed prompt templates for the two generation calls.

use crate::generation::ChatMessage;
use crate::meals::MealRecord;

pub const GROCERY_TASK: &str = "Grocery List Generation";
pub const COMPARISON_TASK: &str = "Store Comparison";

const GROCERY_SYSTEM: &str = "Concise assistant: Create a consolidated grocery list from meal details, \
combining quantities. Only use mentioned ingredients.";

/// Phrase the model must use for items it could not match.
pub fn no_match_phrase(store: &str) -> String {
    format!("No close match found in {store} list")
}

/// `Meal: <name>\n<body>` blocks separated by `---` lines.
pub fn consolidate_meals(meals: &[MealRecord]) -> String {
    meals
        .iter()
        .map(|m| format!("Meal: {}\n{}", m.name, m.body))
        .collect::<Vec<_>>()
        .join("\n---\n")
}

pub fn grocery_messages(meals: &[MealRecord]) -> Vec<ChatMessage> {
    let user = format!(
        "Meal Details:\n{}\n\nGenerate the consolidated grocery list.",
        consolidate_meals(meals)
    );
    vec![ChatMessage::system(GROCERY_SYSTEM), ChatMessage::user(user)]
}

/// Comparison request. Inventory items are listed sorted so the prompt does
/// not depend on document order.
pub fn comparison_messages(grocery_list: &str, inventory: &[String], store: &str) -> Vec<ChatMessage> {
    let mut items: Vec<&str> = inventory.iter().map(String::as_str).collect();
    items.sort_unstable();
    let items = items.join("\n");

    let system = format!(
        "You are a precise shopping assistant. Compare the 'Generated Grocery List' to 'Available {store} Items'. \
         For each grocery item, find the closest {store} match. Crucially, for every matched item, provide a \
         confident estimated price in USD ($). Even if approximating, state the price confidently."
    );

    let user = format!(
        "Generated Grocery List:\n```\n{grocery_list}\n```\n\n\
         Available {store} Items:\n```\n{items}\n```\n\n\
         Task: For each item in the 'Generated Grocery List':\n\
         1. Find the *closest* match from 'Available {store} Items'.\n\
         2. State the match and provide a *confidently estimated price* for the matched {store} item.\n\
         Use this exact format for matches:\n\
         \"Grocery Item\" -> \"{store} Product Match\" (Estimated Price: $X.XX)\n\
         If no close match is found, use this exact format:\n\
         \"Grocery Item\" -> \"{no_match}\"\n\
         Be precise. Only estimate prices for items you successfully match to the {store} list.",
        no_match = no_match_phrase(store),
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}
