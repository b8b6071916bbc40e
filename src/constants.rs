pub const USER_COUNT_PER_PAGE: i64 = 10;
pub const RECIPE_COUNT_PER_PAGE: i64 = 10;
pub const SUBSCRIPTION_COUNT_PER_PAGE: i64 = 10;

pub const USERNAME_MAX_LENGTH: usize = 150;
pub const EMAIL_MAX_LENGTH: usize = 254;

/// Upper bound for `cooking_time`, in minutes. Mirrored by the
/// check constraint on `recipes.cooking_time`.
pub const MAX_COOKING_TIME: i32 = 240;

/// Upper bound for a single `recipe_ingredients.amount` value.
pub const MAX_INGREDIENT_AMOUNT: i32 = 2000;

pub const SHOPPING_LIST_HEADER: &str = "Shopping list:";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_cart.txt";

pub const SESSION_COOKIE: &str = "session";
