use crate::model::{ShoppingListItem, User};

const RECIPE_NAME_WIDTH: usize = 50;

pub fn shopping_list_filename(user: &User) -> String {
    format!("{}_shopping_list.txt", user.username)
}

/// Renders the aggregated shopping list as a plain-text document.
pub fn render_shopping_list(
    user: &User,
    items: &[ShoppingListItem],
    recipe_names: &[String],
) -> String {
    let mut lines = vec![
        "Shopping list".to_string(),
        format!("User: {}", user.full_name()),
    ];

    lines.extend(items.iter().enumerate().map(|(index, item)| {
        format!(
            "{}. {} ({}) - {}",
            index + 1,
            item.name,
            item.measurement_unit,
            item.amount
        )
    }));

    lines.push("Recipes:".to_string());
    lines.extend(recipe_names.iter().enumerate().map(|(index, name)| {
        let name: String = name.chars().take(RECIPE_NAME_WIDTH).collect();
        format!("{}. {}", index + 1, name)
    }));

    let mut document = lines.join("\n");
    document.push('\n');
    document
}
