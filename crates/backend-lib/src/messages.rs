// ================
// crates/backend-lib/src/messages.rs
// ================
//! Human-readable strings returned to clients.

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const WRONG_REFRESH_TOKEN: &str = "Refresh Token is Wrong";
pub const UNAUTHORIZED: &str = "Unauthorized";
pub const USER_CREATED: &str = "Welcome aboard! Your registration was successful.";
pub const TASK_CREATED: &str = "Task created";
pub const TASK_UPDATED: &str = "Task updated";
pub const TASK_DELETED: &str = "Task deleted";
pub const NOT_TASK_OWNER: &str = "Forbidden resource";

/// `"<name> does not exist"`
pub fn resource_not_found(name: &str) -> String {
    format!("{name} does not exist")
}

/// `"<name> already exist"`
pub fn existing_resource(name: &str) -> String {
    format!("{name} already exist")
}
