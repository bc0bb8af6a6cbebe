//! User domain entity.

use serde::{Deserialize, Serialize};

/// User domain entity.
///
/// Serialized with capitalised field names (`Id`, `Name`, `Age`), which is the
/// shape accepted on the HTTP surface and on the user topic. `Id` may be
/// omitted on input: the store assigns it on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "PascalCase")]
pub struct User {
    /// Store-assigned identifier
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(example = 1))]
    pub id: i32,
    /// Display name
    #[cfg_attr(feature = "openapi", schema(example = "TEST"))]
    pub name: String,
    /// Age in years
    #[cfg_attr(feature = "openapi", schema(example = 14))]
    pub age: i32,
}

impl User {
    /// Create a user that has not been stored yet
    pub fn new(name: impl Into<String>, age: i32) -> Self {
        Self {
            id: 0,
            name: name.into(),
            age,
        }
    }

    /// Same user targeting the given id
    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "User: id:{}, name:{}, age:{};", self.id, self.name, self.age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_without_id() {
        let user: User = serde_json::from_str(r#"{"Name":"TEST","Age":14}"#).unwrap();
        assert_eq!(user.id, 0);
        assert_eq!(user.name, "TEST");
        assert_eq!(user.age, 14);
    }

    #[test]
    fn test_serialize_uses_capitalised_fields() {
        let json = serde_json::to_value(User::new("Ann", 30).with_id(7)).unwrap();
        assert_eq!(json, serde_json::json!({"Id": 7, "Name": "Ann", "Age": 30}));
    }

    #[test]
    fn test_rejects_wrong_types() {
        let result = serde_json::from_str::<User>(r#"{"Name":"TEST","Age":"old"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        let user = User::new("Bob", 41).with_id(3);
        assert_eq!(user.to_string(), "User: id:3, name:Bob, age:41;");
    }
}
