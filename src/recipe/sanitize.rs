const HEADING_MARKER: &str = "##";

/// Strips markdown heading markers and blank lines from model output.
///
/// Both replacements repeat until nothing matches, so the result is a fixed
/// point: sanitizing it again changes nothing.
pub fn sanitize_recipe(raw: &str) -> String {
    let mut text = raw.to_string();
    while text.contains(HEADING_MARKER) {
        text = text.replace(HEADING_MARKER, "");
    }
    while text.contains("\n\n") {
        text = text.replace("\n\n", "\n");
    }
    text.trim().to_string()
}
