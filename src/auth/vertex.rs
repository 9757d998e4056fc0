//! Vertex AI endpoint helpers.

/// Publisher segment for first-party Gemini models.
pub const GOOGLE_PUBLISHER: &str = "google";

/// Build a Vertex AI publisher base URL.
///
/// Regional locations use the regional host (`{location}-aiplatform.googleapis.com`);
/// the `global` location uses the non-regional host.
pub fn vertex_base_url(project: &str, location: &str, publisher: &str) -> String {
    let host = if location == "global" {
        "aiplatform.googleapis.com".to_string()
    } else {
        format!("{location}-aiplatform.googleapis.com")
    };
    format!("https://{host}/v1/projects/{project}/locations/{location}/publishers/{publisher}")
}
