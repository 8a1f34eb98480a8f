//! One typed descriptor per REST contract.
//!
//! Each endpoint names its output type and the single response shape it
//! accepts. Decoding fails with [`ApiError::Decode`] instead of guessing.

use serde::{de::DeserializeOwned, de::IgnoredAny, Deserialize};

use crate::{
    error::ApiError,
    models::{
        AuthPayload, Group, LoginRequest, MarkResult, MarkingJob, MarkingScheme, NewGroup,
        NewMarkingJob, PageTextUpdate, RefreshRequest, RegisterRequest, SchemeInput, Upload,
        UploadPage, User,
    },
    pagination::Paginated,
    table::SortState,
    transport::{segment, ApiRequest, FilePart, MultipartForm},
};

/// How an endpoint wraps its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{ "success": bool, "data": T, "message"?: string }`
    Enveloped,
    /// `T` as the whole body.
    Bare,
}

/// A REST contract: how to build the request and how to read the answer.
pub trait Endpoint {
    /// Decoded payload.
    type Output: DeserializeOwned;
    /// Name used in decode errors and logs.
    const NAME: &'static str;
    /// Accepted response shape.
    const SHAPE: ResponseShape;

    /// Request relative to the API root.
    fn request(&self) -> Result<ApiRequest, ApiError>;
}

/// Payload of endpoints that only acknowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ack;

impl<'de> Deserialize<'de> for Ack {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer)?;
        Ok(Self)
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: Option<bool>,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn decode_error(endpoint: &'static str, err: impl ToString) -> ApiError {
    ApiError::Decode {
        endpoint,
        detail: err.to_string(),
    }
}

/// Decode a 2xx body for endpoint `E`.
pub fn decode<E: Endpoint>(status: u16, body: &str) -> Result<E::Output, ApiError> {
    if body.trim().is_empty() {
        return serde_json::from_value(serde_json::Value::Null)
            .map_err(|_| decode_error(E::NAME, "empty body"));
    }
    match E::SHAPE {
        ResponseShape::Bare => serde_json::from_str(body).map_err(|e| decode_error(E::NAME, e)),
        ResponseShape::Enveloped => {
            let envelope: Envelope<E::Output> =
                serde_json::from_str(body).map_err(|e| decode_error(E::NAME, e))?;
            if envelope.success == Some(false) {
                return Err(ApiError::Validation {
                    status,
                    message: envelope
                        .message
                        .or(envelope.error)
                        .unwrap_or_else(|| "The request was not successful".to_string()),
                });
            }
            match envelope.data {
                Some(data) => Ok(data),
                None => serde_json::from_value(serde_json::Value::Null)
                    .map_err(|_| decode_error(E::NAME, "missing `data`")),
            }
        },
    }
}

/// Page and size of a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page.
    pub page: usize,
    /// Rows per page.
    pub per_page: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: crate::pagination::DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Request `page` with `per_page` rows.
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    fn apply(self, request: ApiRequest) -> ApiRequest {
        request.query("page", self.page).query("per_page", self.per_page)
    }
}

/// `POST /auth/login`
#[derive(Debug, Clone)]
pub struct Login(pub LoginRequest);

impl Endpoint for Login {
    type Output = AuthPayload;
    const NAME: &'static str = "auth.login";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        ApiRequest::post("/auth/login").anonymous().json(&self.0)
    }
}

/// `POST /auth/register`
#[derive(Debug, Clone)]
pub struct Register(pub RegisterRequest);

impl Endpoint for Register {
    type Output = AuthPayload;
    const NAME: &'static str = "auth.register";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        ApiRequest::post("/auth/register").anonymous().json(&self.0)
    }
}

/// `POST /auth/refresh`
#[derive(Debug, Clone)]
pub struct Refresh(pub RefreshRequest);

impl Endpoint for Refresh {
    type Output = AuthPayload;
    const NAME: &'static str = "auth.refresh";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        ApiRequest::post("/auth/refresh").anonymous().json(&self.0)
    }
}

/// `GET /auth/me`
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser;

impl Endpoint for CurrentUser {
    type Output = User;
    const NAME: &'static str = "auth.me";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::get("/auth/me"))
    }
}

/// `GET /groups`
#[derive(Debug, Clone, Default)]
pub struct ListGroups {
    /// Page to fetch.
    pub page: PageRequest,
    /// Server-side ordering.
    pub sort: Option<SortState>,
}

impl Endpoint for ListGroups {
    type Output = Paginated<Group>;
    const NAME: &'static str = "groups.list";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        let mut request = self.page.apply(ApiRequest::get("/groups"));
        if let Some(SortState {
            field: Some(field),
            direction,
        }) = &self.sort
        {
            request = request.query("sort", field).query("order", direction.as_str());
        }
        Ok(request)
    }
}

/// `GET /groups/{id}`
#[derive(Debug, Clone)]
pub struct GetGroup {
    /// Group id.
    pub id: String,
}

impl Endpoint for GetGroup {
    type Output = Group;
    const NAME: &'static str = "groups.get";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::get(format!("/groups/{}", segment(&self.id))))
    }
}

/// `POST /groups`
#[derive(Debug, Clone)]
pub struct CreateGroup(pub NewGroup);

impl Endpoint for CreateGroup {
    type Output = Group;
    const NAME: &'static str = "groups.create";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        ApiRequest::post("/groups").json(&self.0)
    }
}

/// `DELETE /groups/{id}`
#[derive(Debug, Clone)]
pub struct DeleteGroup {
    /// Group id.
    pub id: String,
}

impl Endpoint for DeleteGroup {
    type Output = Ack;
    const NAME: &'static str = "groups.delete";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::delete(format!("/groups/{}", segment(&self.id))))
    }
}

/// `GET /groups/{id}/uploads`
#[derive(Debug, Clone)]
pub struct ListUploads {
    /// Group id.
    pub group_id: String,
    /// Page to fetch.
    pub page: PageRequest,
}

impl Endpoint for ListUploads {
    type Output = Paginated<Upload>;
    const NAME: &'static str = "uploads.list";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(self
            .page
            .apply(ApiRequest::get(format!("/groups/{}/uploads", segment(&self.group_id)))))
    }
}

/// `GET /groups/{id}/batches/{batch}/uploads`
#[derive(Debug, Clone)]
pub struct ListBatchUploads {
    /// Group id.
    pub group_id: String,
    /// Batch name.
    pub batch_name: String,
}

impl Endpoint for ListBatchUploads {
    type Output = Vec<Upload>;
    const NAME: &'static str = "uploads.batch";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::get(format!(
            "/groups/{}/batches/{}/uploads",
            segment(&self.group_id),
            segment(&self.batch_name)
        )))
    }
}

/// How the backend should split the submitted files into pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadMode {
    /// Each file is one page image.
    #[default]
    Images,
    /// Each file is a multi-page PDF.
    Pdf,
}

impl UploadMode {
    /// Query value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Pdf => "pdf",
        }
    }

    /// Parse the query value.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "images" => Some(Self::Images),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Form field carrying each uploaded file.
pub const UPLOAD_FILE_FIELD: &str = "files";

/// `POST /groups/{id}/uploads?mode=..&batch_name=..`
#[derive(Debug, Clone)]
pub struct CreateUploads {
    /// Target group.
    pub group_id: String,
    /// Page splitting mode.
    pub mode: UploadMode,
    /// Batch to file the uploads under (batch groups only).
    pub batch_name: Option<String>,
    /// Files, in order.
    pub files: Vec<FilePart>,
}

impl CreateUploads {
    /// Client route to show once the upload succeeded.
    pub fn follow_up_path(&self) -> String {
        match self.batch_name() {
            Some(batch) => {
                format!("/uploads/group/{}/batch/{}", segment(&self.group_id), segment(batch))
            },
            None => format!("/uploads/group/{}", segment(&self.group_id)),
        }
    }

    fn batch_name(&self) -> Option<&str> {
        self.batch_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

impl Endpoint for CreateUploads {
    type Output = Vec<Upload>;
    const NAME: &'static str = "uploads.create";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        if self.files.is_empty() {
            return Err(ApiError::Request("no files selected".to_string()));
        }
        let form = MultipartForm {
            fields: Vec::new(),
            files: self
                .files
                .iter()
                .cloned()
                .map(|file| FilePart {
                    field: UPLOAD_FILE_FIELD.to_string(),
                    ..file
                })
                .collect(),
        };
        Ok(ApiRequest::post(format!("/groups/{}/uploads", segment(&self.group_id)))
            .query("mode", self.mode.as_str())
            .query_opt("batch_name", self.batch_name())
            .multipart(form))
    }
}

/// `GET /uploads/{id}`
#[derive(Debug, Clone)]
pub struct GetUpload {
    /// Upload id.
    pub id: String,
}

impl Endpoint for GetUpload {
    type Output = Upload;
    const NAME: &'static str = "uploads.get";
    const SHAPE: ResponseShape = ResponseShape::Bare;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::get(format!("/uploads/{}", segment(&self.id))))
    }
}

/// `DELETE /uploads/{id}`
#[derive(Debug, Clone)]
pub struct DeleteUpload {
    /// Upload id.
    pub id: String,
}

impl Endpoint for DeleteUpload {
    type Output = Ack;
    const NAME: &'static str = "uploads.delete";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::delete(format!("/uploads/{}", segment(&self.id))))
    }
}

/// `GET /uploads/{id}/pages`
#[derive(Debug, Clone)]
pub struct ListPages {
    /// Upload id.
    pub upload_id: String,
}

impl Endpoint for ListPages {
    type Output = Vec<UploadPage>;
    const NAME: &'static str = "pages.list";
    const SHAPE: ResponseShape = ResponseShape::Bare;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::get(format!("/uploads/{}/pages", segment(&self.upload_id))))
    }
}

/// `PUT /uploads/{id}/pages/{n}/text`
#[derive(Debug, Clone)]
pub struct UpdatePageText {
    /// Upload id.
    pub upload_id: String,
    /// 1-based page number.
    pub page_number: u32,
    /// Corrected text.
    pub ocr_text: String,
}

impl Endpoint for UpdatePageText {
    type Output = UploadPage;
    const NAME: &'static str = "pages.update_text";
    const SHAPE: ResponseShape = ResponseShape::Bare;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        ApiRequest::put(format!(
            "/uploads/{}/pages/{}/text",
            segment(&self.upload_id),
            self.page_number
        ))
        .json(&PageTextUpdate {
            ocr_text: self.ocr_text.clone(),
        })
    }
}

/// `POST /uploads/{id}/pages/{n}/ocr`
#[derive(Debug, Clone)]
pub struct RedoOcr {
    /// Upload id.
    pub upload_id: String,
    /// 1-based page number.
    pub page_number: u32,
}

impl Endpoint for RedoOcr {
    type Output = Ack;
    const NAME: &'static str = "pages.redo_ocr";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::post(format!(
            "/uploads/{}/pages/{}/ocr",
            segment(&self.upload_id),
            self.page_number
        )))
    }
}

/// `GET /marking-schemes`
#[derive(Debug, Clone, Default)]
pub struct ListSchemes {
    /// Page to fetch.
    pub page: PageRequest,
}

impl Endpoint for ListSchemes {
    type Output = Paginated<MarkingScheme>;
    const NAME: &'static str = "schemes.list";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(self.page.apply(ApiRequest::get("/marking-schemes")))
    }
}

/// `GET /marking-schemes/{id}`
#[derive(Debug, Clone)]
pub struct GetScheme {
    /// Scheme id.
    pub id: String,
}

impl Endpoint for GetScheme {
    type Output = MarkingScheme;
    const NAME: &'static str = "schemes.get";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::get(format!("/marking-schemes/{}", segment(&self.id))))
    }
}

/// `POST /marking-schemes`
#[derive(Debug, Clone)]
pub struct CreateScheme(pub SchemeInput);

impl Endpoint for CreateScheme {
    type Output = MarkingScheme;
    const NAME: &'static str = "schemes.create";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        ApiRequest::post("/marking-schemes").json(&self.0)
    }
}

/// `PUT /marking-schemes/{id}`
#[derive(Debug, Clone)]
pub struct UpdateScheme {
    /// Scheme id.
    pub id: String,
    /// New contents.
    pub input: SchemeInput,
}

impl Endpoint for UpdateScheme {
    type Output = MarkingScheme;
    const NAME: &'static str = "schemes.update";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        ApiRequest::put(format!("/marking-schemes/{}", segment(&self.id))).json(&self.input)
    }
}

/// `GET /groups/{id}/marking-jobs`
#[derive(Debug, Clone)]
pub struct ListMarkingJobs {
    /// Group id.
    pub group_id: String,
}

impl Endpoint for ListMarkingJobs {
    type Output = Vec<MarkingJob>;
    const NAME: &'static str = "jobs.list";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::get(format!("/groups/{}/marking-jobs", segment(&self.group_id))))
    }
}

/// `POST /groups/{id}/marking-jobs`
#[derive(Debug, Clone)]
pub struct CreateMarkingJob {
    /// Group to mark.
    pub group_id: String,
    /// Scheme and model.
    pub job: NewMarkingJob,
}

impl Endpoint for CreateMarkingJob {
    type Output = MarkingJob;
    const NAME: &'static str = "jobs.create";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        ApiRequest::post(format!("/groups/{}/marking-jobs", segment(&self.group_id)))
            .json(&self.job)
    }
}

/// `GET /marking-jobs/{id}/results`
#[derive(Debug, Clone)]
pub struct ListResults {
    /// Job id.
    pub job_id: String,
    /// Page to fetch.
    pub page: PageRequest,
}

impl Endpoint for ListResults {
    type Output = Paginated<MarkResult>;
    const NAME: &'static str = "results.list";
    const SHAPE: ResponseShape = ResponseShape::Enveloped;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(self
            .page
            .apply(ApiRequest::get(format!("/marking-jobs/{}/results", segment(&self.job_id)))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        table::SortDirection,
        transport::{Method, RequestBody},
    };

    fn file(name: &str) -> FilePart {
        FilePart {
            field: String::new(),
            file_name: name.to_string(),
            content_type: Some("image/jpeg".to_string()),
            bytes: vec![0xff, 0xd8],
        }
    }

    #[test]
    fn batch_upload_targets_mode_and_batch_query() {
        let endpoint = CreateUploads {
            group_id: "42".to_string(),
            mode: UploadMode::Images,
            batch_name: Some("Term1".to_string()),
            files: vec![file("a.jpg"), file("b.jpg"), file("c.jpg")],
        };
        let request = endpoint.request().expect("build request");
        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.url(""),
            "/groups/42/uploads?mode=images&batch_name=Term1"
        );
        let RequestBody::Multipart(form) = &request.body else {
            panic!("expected multipart body");
        };
        assert_eq!(form.len(), 3);
        assert!(form.files.iter().all(|part| part.field == UPLOAD_FILE_FIELD));
        assert_eq!(endpoint.follow_up_path(), "/uploads/group/42/batch/Term1");
    }

    #[test]
    fn blank_batch_name_is_dropped() {
        let endpoint = CreateUploads {
            group_id: "7".to_string(),
            mode: UploadMode::Pdf,
            batch_name: Some("  ".to_string()),
            files: vec![file("scan.pdf")],
        };
        let request = endpoint.request().expect("build request");
        assert_eq!(request.url(""), "/groups/7/uploads?mode=pdf");
        assert_eq!(endpoint.follow_up_path(), "/uploads/group/7");
    }

    #[test]
    fn empty_upload_is_rejected_locally() {
        let endpoint = CreateUploads {
            group_id: "7".to_string(),
            mode: UploadMode::Images,
            batch_name: None,
            files: Vec::new(),
        };
        assert!(matches!(endpoint.request(), Err(ApiError::Request(_))));
    }

    #[test]
    fn list_groups_carries_page_and_sort() {
        let endpoint = ListGroups {
            page: PageRequest::new(2, 25),
            sort: Some(SortState::by("name", SortDirection::Desc)),
        };
        assert_eq!(
            endpoint.request().expect("build request").url(""),
            "/groups?page=2&per_page=25&sort=name&order=desc"
        );
    }

    #[test]
    fn enveloped_decoder_rejects_bare_body() {
        let bare = r#"{"id":"g1","name":"Year 9"}"#;
        let err = decode::<GetGroup>(200, bare).expect_err("bare body must not decode");
        assert!(matches!(err, ApiError::Decode { endpoint: "groups.get", .. }));

        let wrapped = r#"{"success":true,"data":{"id":"g1","name":"Year 9"}}"#;
        let group = decode::<GetGroup>(200, wrapped).expect("decode group");
        assert_eq!(group.name, "Year 9");
    }

    #[test]
    fn bare_decoder_rejects_envelope() {
        let wrapped = r#"{"success":true,"data":{"id":"u1","group_id":"g","filename":"a"}}"#;
        assert!(matches!(decode::<GetUpload>(200, wrapped), Err(ApiError::Decode { .. })));
    }

    #[test]
    fn unsuccessful_envelope_is_validation_error() {
        let body = r#"{"success":false,"message":"Group is locked"}"#;
        assert_eq!(
            decode::<DeleteGroup>(200, body),
            Err(ApiError::Validation {
                status: 200,
                message: "Group is locked".to_string()
            })
        );
    }

    #[test]
    fn acknowledgements_accept_empty_bodies() {
        assert_eq!(decode::<RedoOcr>(204, ""), Ok(Ack));
        assert_eq!(decode::<DeleteUpload>(200, r#"{"success":true}"#), Ok(Ack));
    }

    #[test]
    fn paginated_groups_decode_from_envelope() {
        let body = r#"{"success":true,"data":{"items":[{"id":"1","name":"A","group_type":"batch"}],"page":1,"per_page":10,"total":23}}"#;
        let page = decode::<ListGroups>(200, body).expect("decode page");
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.items[0].group_type, crate::models::GroupKind::Batch);
    }
}
