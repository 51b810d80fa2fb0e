/// ` (502)` when an upstream HTTP status is known, empty otherwise.
///
/// Takes a reference so it can be called from `thiserror` format arguments.
#[must_use]
pub fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}
