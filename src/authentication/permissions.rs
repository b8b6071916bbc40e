use crate::jwt::SessionData;
use crate::schema::UserRole;

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::ManageAllRecipes,
            ActionType::ManageTags,
            ActionType::ManageIngredients,
            ActionType::ManageUsers,
        ],
    ),
];

#[derive(Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnFavorites,
    ManageOwnCart,
    ManageOwnSubscriptions,

    ManageAllRecipes,
    ManageTags,
    ManageIngredients,
    ManageUsers,
}

impl ActionType {
    pub fn authenticate(self, session: &SessionData) -> bool {
        let role = &session.role;

        ACTION_TABLE
            .iter()
            .find_map(|(r, actions)| (role == r).then(|| actions.contains(&self)))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: UserRole) -> SessionData {
        SessionData {
            user_id: 1,
            username: "chef".to_string(),
            is_admin: role == UserRole::Admin,
            role,
        }
    }

    #[test]
    fn regular_users_manage_their_own_data_only() {
        let s = session(UserRole::User);
        assert!(ActionType::CreateRecipes.authenticate(&s));
        assert!(ActionType::ManageOwnFavorites.authenticate(&s));
        assert!(!ActionType::ManageAllRecipes.authenticate(&s));
        assert!(!ActionType::ManageTags.authenticate(&s));
    }

    #[test]
    fn admins_manage_everything() {
        let s = session(UserRole::Admin);
        assert!(ActionType::ManageAllRecipes.authenticate(&s));
        assert!(ActionType::ManageTags.authenticate(&s));
        assert!(ActionType::ManageIngredients.authenticate(&s));
    }

    #[test]
    fn forbidden_action_surfaces_as_error() {
        let s = session(UserRole::User);
        assert!(s.authenticate(ActionType::ManageTags).is_err());
        assert!(s.authenticate(ActionType::CreateRecipes).is_ok());
    }
}
