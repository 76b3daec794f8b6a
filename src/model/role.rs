use serde_json::Value;
use strum_macros::Display;

/// Coarse role parsed from an employee record's free-form `role` field.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    /// Only the exact string `"admin"` is privileged.
    pub fn from_field(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("admin") => Role::Admin,
            _ => Role::Employee,
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_exact_admin_is_privileged() {
        assert_eq!(Role::from_field(Some(&json!("admin"))), Role::Admin);
        assert_eq!(Role::from_field(Some(&json!("Admin"))), Role::Employee);
        assert_eq!(Role::from_field(Some(&json!("hr"))), Role::Employee);
        assert_eq!(Role::from_field(Some(&json!(true))), Role::Employee);
        assert_eq!(Role::from_field(None), Role::Employee);
    }
}
