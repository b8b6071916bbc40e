use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Id = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: String,
    pub role: UserRole,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// List projection carrying the window `count` column.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct UserRow {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: UserRole,

    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Tag {
    pub id: Id,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeRow {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
    pub created_at: DateTime<Utc>,

    pub count: i64,
}

impl RecipeRow {
    /// Drops the window count, leaving the plain entity.
    pub fn into_recipe(self) -> Recipe {
        Recipe {
            id: self.id,
            author_id: self.author_id,
            name: self.name,
            image: self.image,
            text: self.text,
            cooking_time: self.cooking_time,
            created_at: self.created_at,
        }
    }
}

/// Join row of `recipe_ingredients` with the ingredient name and unit
/// pulled in, the shape the recipe representation needs.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeIngredient {
    pub recipe_id: Id,
    pub ingredient_id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Subscription {
    pub id: Id,
    pub user_id: Id,
    pub author_id: Id,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct FavoriteEntry {
    pub id: Id,
    pub user_id: Id,
    pub recipe_id: Id,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct ShoppingListEntry {
    pub id: Id,
    pub user_id: Id,
    pub recipe_id: Id,
}

/// One line of the aggregated shopping list: amounts summed across
/// every carted recipe, grouped by ingredient.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}
