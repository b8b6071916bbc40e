use serde::{Deserialize, Serialize};

use crate::schema::{Id, Recipe, RecipeIngredient, Tag, User, UserRow};

/// Outward user representation. `is_subscribed` depends on the
/// requesting principal and is computed fresh on every request.
#[derive(Debug, Clone, Serialize)]
pub struct UserRepr {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_subscribed: bool,
}

impl UserRepr {
    pub fn from_user(user: &User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
        }
    }

    pub fn from_row(row: &UserRow, is_subscribed: bool) -> Self {
        Self {
            id: row.id,
            username: row.username.clone(),
            email: row.email.clone(),
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            is_subscribed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeIngredientRepr {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<RecipeIngredient> for RecipeIngredientRepr {
    fn from(row: RecipeIngredient) -> Self {
        Self {
            id: row.ingredient_id,
            name: row.name,
            measurement_unit: row.measurement_unit,
            amount: row.amount,
        }
    }
}

/// Full read representation of a recipe, nested author and per-request
/// computed flags included.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeRepr {
    pub id: Id,
    pub author: UserRepr,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<RecipeIngredientRepr>,
    pub image: Option<String>,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeRepr {
    pub fn assemble(
        recipe: Recipe,
        author: UserRepr,
        tags: Vec<Tag>,
        ingredients: Vec<RecipeIngredient>,
        is_favorited: bool,
        is_in_shopping_cart: bool,
    ) -> Self {
        Self {
            id: recipe.id,
            author,
            tags,
            ingredients: ingredients.into_iter().map(Into::into).collect(),
            image: recipe.image,
            name: recipe.name,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
            is_favorited,
            is_in_shopping_cart,
        }
    }
}

/// Lightweight representation returned by favorite / cart additions.
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteRepr {
    pub id: Id,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

impl From<&Recipe> for FavoriteRepr {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: recipe.image.clone(),
            cooking_time: recipe.cooking_time,
        }
    }
}

/// Author entry in the subscriptions listing: user fields plus that
/// author's recipes, truncated to `recipes_limit` when given.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRepr {
    #[serde(flatten)]
    pub author: UserRepr,
    pub recipes: Vec<FavoriteRepr>,
    pub recipe_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetPasswordForm {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IngredientAmount {
    pub id: Id,
    pub amount: i32,
}

/// Write payload for recipe creation. Tag and ingredient sets are
/// replaced wholesale on save, never merged.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeWrite {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub text: String,
    pub cooking_time: i32,
    pub tags: Vec<Id>,
    pub ingredients: Vec<IngredientAmount>,
}

/// Partial update; omitted fields keep their stored values, while a
/// submitted tag or ingredient list replaces the stored set in full.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub tags: Option<Vec<Id>>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagWrite {
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientWrite {
    pub name: String,
    pub measurement_unit: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::UserRole;
    use chrono::Utc;

    fn sample_user() -> User {
        User {
            id: 7,
            username: "chef".to_string(),
            email: "chef@example.com".to_string(),
            first_name: Some("Anna".to_string()),
            last_name: None,
            password: "hash".to_string(),
            role: UserRole::User,
        }
    }

    fn sample_recipe() -> Recipe {
        Recipe {
            id: 3,
            author_id: 7,
            name: "Pancakes".to_string(),
            image: None,
            text: "Mix and fry".to_string(),
            cooking_time: 20,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn password_never_leaks_into_user_repr() {
        let repr = UserRepr::from_user(&sample_user(), false);
        let value = serde_json::to_value(&repr).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["is_subscribed"], false);
    }

    #[test]
    fn recipe_repr_carries_join_amounts() {
        let ingredients = vec![RecipeIngredient {
            recipe_id: 3,
            ingredient_id: 11,
            name: "flour".to_string(),
            measurement_unit: "g".to_string(),
            amount: 200,
        }];
        let repr = RecipeRepr::assemble(
            sample_recipe(),
            UserRepr::from_user(&sample_user(), false),
            vec![],
            ingredients,
            false,
            false,
        );
        assert_eq!(repr.ingredients.len(), 1);
        assert_eq!(repr.ingredients[0].id, 11);
        assert_eq!(repr.ingredients[0].amount, 200);
        assert!(!repr.is_favorited);
        assert!(!repr.is_in_shopping_cart);
    }

    #[test]
    fn subscription_repr_flattens_author_fields() {
        let repr = SubscriptionRepr {
            author: UserRepr::from_user(&sample_user(), true),
            recipes: vec![FavoriteRepr::from(&sample_recipe())],
            recipe_count: 1,
        };
        let value = serde_json::to_value(&repr).unwrap();
        assert_eq!(value["username"], "chef");
        assert_eq!(value["is_subscribed"], true);
        assert_eq!(value["recipe_count"], 1);
        assert_eq!(value["recipes"][0]["name"], "Pancakes");
    }
}
