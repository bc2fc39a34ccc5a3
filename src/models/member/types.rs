use serde::{Deserialize, Serialize};

/// Member record used for login. Includes the password hash.
#[derive(Debug, Clone)]
pub struct MemberAuth {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub password: String,
    pub is_admin: bool,
}

/// A team member as shown on the board. No password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub role_label: String,
    /// Displayed as-is; maintained by hand.
    pub productivity: f64,
    pub is_admin: bool,
}

impl TeamMember {
    pub fn initials(&self) -> String {
        initials(&self.display_name)
    }
}

/// Up to two uppercase initials from a display name ("Ana Pérez" -> "AP").
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|w| w.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() { "?".to_string() } else { letters }
}

/// New member data for creation. `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub role_label: String,
    pub productivity: f64,
    pub is_admin: bool,
}

/// Form data from the "add member" form.
#[derive(Debug, Deserialize)]
pub struct MemberForm {
    pub username: String,
    pub password: String,
    pub display_name: String,
    #[serde(default)]
    pub role_label: String,
    pub csrf_token: String,
}
