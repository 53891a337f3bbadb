use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const GET_INSTALLED_ADDON_COUNT: &str = "get_installed_addon_count";
pub const UPDATE: &str = "update";

/// A named backend operation plus its optional argument payload.
///
/// The payload shape belongs to the backend; the bridge forwards it untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    args: Option<Value>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: None,
        }
    }

    pub fn with_args(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args: Some(args),
        }
    }

    pub fn get_installed_addon_count() -> Self {
        Self::new(GET_INSTALLED_ADDON_COUNT)
    }

    pub fn update() -> Self {
        Self::new(UPDATE)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> Option<&Value> {
        self.args.as_ref()
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
