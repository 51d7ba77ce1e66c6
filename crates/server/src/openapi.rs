use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String, pub worker: String, pub credentials: u64 }

#[derive(ToSchema)]
pub struct CredentialRequestDoc { pub id: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueResponseDoc {
    /// `Credential issued` or `Credential already issued`
    pub message: String,
    pub worker: String,
    /// RFC 3339 timestamp of the original issuance
    pub issued_at: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponseDoc {
    pub valid: bool,
    pub worker: Option<String>,
    pub issued_at: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::credentials::issue,
        crate::routes::credentials::verify,
    ),
    components(
        schemas(
            HealthResponse,
            CredentialRequestDoc,
            IssueResponseDoc,
            VerifyResponseDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "credentials")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_credential_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/issue"));
        assert!(doc.paths.paths.contains_key("/verify"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
