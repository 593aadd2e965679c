//! Authentication headers for provider requests.

use crate::core::providers::EndpointFamily;

/// Attach the credential the way each endpoint family expects it:
/// - OpenAI-compatible (OpenAI, Grok): `Authorization: Bearer <key>`
/// - Gemini: `x-goog-api-key: <key>`
pub fn add_auth_headers(
    request: reqwest::RequestBuilder,
    family: EndpointFamily,
    api_key: &str,
) -> reqwest::RequestBuilder {
    match family {
        EndpointFamily::Gemini => request.header("x-goog-api-key", api_key),
        EndpointFamily::OpenAiCompatible => {
            request.header("Authorization", format!("Bearer {api_key}"))
        }
    }
}
