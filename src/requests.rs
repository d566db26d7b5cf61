use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub remember: Option<String>,
}

impl LoginForm {
    /// Any non-empty value of the checkbox counts as checked.
    pub fn remember(&self) -> bool {
        self.remember.as_deref().is_some_and(|value| !value.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "firstName")]
    pub first_name: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub msg: String,
}
