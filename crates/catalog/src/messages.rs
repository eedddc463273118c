/// Maps upstream application error codes to user-facing messages.
///
/// Unmapped codes fall back to the raw server message at the call site.
pub fn user_message(code: &str) -> Option<&'static str> {
    match code {
        "RLS_DENIED" => Some("You don't have permission to modify this organization's data."),
        "GEOM_INVALID" => Some("Invalid geometry."),
        "GEOM_INVALID_LARGE_FIX" => {
            Some("Geometry invalid and auto-fix changed shape >5%. Please correct.")
        }
        "PARENT_NOT_FOUND" => Some("Linked parent does not exist."),
        "VALIDATION_FAILED" => Some("Missing required fields."),
        _ => None,
    }
}
