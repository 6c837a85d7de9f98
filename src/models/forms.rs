use serde::{Deserialize, Serialize};
use super::Role;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<Role>,
}

// Keys are camelCase like every response body; snake_case is still accepted.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(alias = "expected_role")]
    pub expected_role: Option<Role>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReservationForm {
    #[serde(alias = "full_name")]
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(alias = "car_number")]
    pub car_number: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_accepts_both_key_styles() {
        let camel: ReservationForm = serde_json::from_str(
            r#"{"fullName": "Priya Desai", "email": "priya@example.com", "carNumber": "DL1AA1234"}"#,
        )
        .unwrap();
        assert_eq!(camel.full_name, "Priya Desai");
        assert_eq!(camel.car_number.as_deref(), Some("DL1AA1234"));

        let snake: ReservationForm =
            serde_json::from_str(r#"{"full_name": "Priya Desai", "email": "priya@example.com"}"#)
                .unwrap();
        assert_eq!(snake.full_name, "Priya Desai");
        assert!(snake.car_number.is_none());
    }

    #[test]
    fn login_reads_expected_role_in_camel_case() {
        let form: LoginForm = serde_json::from_str(
            r#"{"email": "a@example.com", "password": "pw", "expectedRole": "Admin"}"#,
        )
        .unwrap();
        assert_eq!(form.expected_role, Some(Role::Admin));
    }
}
