//! Cloud drive client implementation
//!
//! Implements the CloudApi trait from pan-core over a `Transport`. Personal and
//! family spaces expose the same operations on different routes, so every call
//! picks its urls through the `Routes` of the requested scope.

use async_trait::async_trait;
use pan_core::{
    BatchTaskHandle, BatchTaskStatus, BatchTaskSubmission, CloudApi, Config, Entity, Result,
    Scope, SearchParams, SearchResult,
};
use url::Url;

use crate::transport::{HttpTransport, Transport, TransportConfig};
use crate::wire;

/// Url layout of one namespace
pub trait Routes: Send + Sync {
    /// Listing/search of one folder
    fn search(&self, params: &SearchParams) -> Result<Url>;

    /// Metadata of one entity
    fn file_info(&self, file_id: &str) -> Result<Url>;

    fn create_batch(&self) -> Result<Url>;

    fn check_batch(&self) -> Result<Url>;

    /// Extra form fields sent with a batch submission
    fn batch_fields(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Routes of the personal space, on the web API
#[derive(Debug, Clone)]
pub struct PersonalRoutes {
    web_url: String,
}

impl PersonalRoutes {
    pub fn new(web_url: &str) -> Self {
        Self {
            web_url: web_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Routes for PersonalRoutes {
    fn search(&self, params: &SearchParams) -> Result<Url> {
        endpoint(
            &self.web_url,
            "/v2/listFiles.action",
            &[
                ("fileId", params.folder_id.clone()),
                ("mediaType", params.media_type.code().to_string()),
                ("keyword", params.keyword.clone()),
                ("inGroupSpace", params.in_group_space.to_string()),
                ("orderBy", params.order_by.code().to_string()),
                ("order", params.order.as_str().to_string()),
                ("pageNum", params.page_num.to_string()),
                ("pageSize", params.page_size.to_string()),
            ],
        )
    }

    fn file_info(&self, file_id: &str) -> Result<Url> {
        endpoint(
            &self.web_url,
            "/v2/getFileInfo.action",
            &[("fileId", file_id.to_string())],
        )
    }

    fn create_batch(&self) -> Result<Url> {
        endpoint(&self.web_url, "/createBatchTask.action", &[])
    }

    fn check_batch(&self) -> Result<Url> {
        endpoint(&self.web_url, "/checkBatchTask.action", &[])
    }
}

/// Routes of one family space, on the API host
#[derive(Debug, Clone)]
pub struct FamilyRoutes {
    api_url: String,
    family_id: i64,
}

impl FamilyRoutes {
    pub fn new(api_url: &str, family_id: i64) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            family_id,
        }
    }
}

impl Routes for FamilyRoutes {
    fn search(&self, params: &SearchParams) -> Result<Url> {
        let mut query = vec![("familyId", self.family_id.to_string())];
        // The family root has no id; omitting folderId lists it
        if !params.folder_id.is_empty() {
            query.push(("folderId", params.folder_id.clone()));
        }
        query.extend([
            ("mediaType", params.media_type.code().to_string()),
            ("keyword", params.keyword.clone()),
            ("orderBy", params.order_by.field().to_string()),
            ("descending", params.order.is_descending().to_string()),
            ("pageNum", params.page_num.to_string()),
            ("pageSize", params.page_size.to_string()),
        ]);
        endpoint(&self.api_url, "/family/file/listFiles.action", &query)
    }

    fn file_info(&self, file_id: &str) -> Result<Url> {
        endpoint(
            &self.api_url,
            "/family/file/getFileInfo.action",
            &[
                ("familyId", self.family_id.to_string()),
                ("fileId", file_id.to_string()),
            ],
        )
    }

    fn create_batch(&self) -> Result<Url> {
        endpoint(&self.api_url, "/batch/createBatchTask.action", &[])
    }

    fn check_batch(&self) -> Result<Url> {
        endpoint(&self.api_url, "/batch/checkBatchTask.action", &[])
    }

    fn batch_fields(&self) -> Vec<(String, String)> {
        vec![("familyId".to_string(), self.family_id.to_string())]
    }
}

fn endpoint(base: &str, path: &str, query: &[(&str, String)]) -> Result<Url> {
    let url = format!("{base}{path}");
    if query.is_empty() {
        Ok(Url::parse(&url)?)
    } else {
        Ok(Url::parse_with_params(&url, query)?)
    }
}

/// Cloud drive client
pub struct PanClient<T: Transport = HttpTransport> {
    transport: T,
    web_url: String,
    api_url: String,
}

impl PanClient<HttpTransport> {
    /// Create a client from the loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(&TransportConfig::try_from(config)?)?;
        Ok(Self::new(transport).with_base_urls(&config.web_url, &config.api_url))
    }
}

impl<T: Transport> PanClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            web_url: pan_core::config::DEFAULT_WEB_URL.to_string(),
            api_url: pan_core::config::DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_base_urls(mut self, web_url: &str, api_url: &str) -> Self {
        self.web_url = web_url.trim_end_matches('/').to_string();
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// Get the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn routes(&self, scope: Scope) -> Box<dyn Routes> {
        match scope {
            Scope::Personal => Box::new(PersonalRoutes::new(&self.web_url)),
            Scope::Family(family_id) => Box::new(FamilyRoutes::new(&self.api_url, family_id)),
        }
    }
}

#[async_trait]
impl<T: Transport> CloudApi for PanClient<T> {
    async fn search(&self, scope: Scope, params: &SearchParams) -> Result<SearchResult> {
        params.validate()?;
        let url = self.routes(scope).search(params)?;
        let body = self.transport.get(url.as_str()).await?;

        let mut page = wire::decode_search(&body)?;
        // Not every route echoes the paging fields
        if page.page_num == 0 {
            page.page_num = params.page_num;
        }
        if page.page_size == 0 {
            page.page_size = params.page_size;
        }
        tracing::debug!(
            "Folder '{}' page {}: {} of {} record(s)",
            params.folder_id,
            page.page_num,
            page.entities.len(),
            page.record_count
        );
        Ok(page)
    }

    async fn file_info(&self, scope: Scope, file_id: &str) -> Result<Entity> {
        let url = self.routes(scope).file_info(file_id)?;
        let body = self.transport.get(url.as_str()).await?;
        wire::decode_entity(&body)
    }

    async fn create_batch_task(
        &self,
        scope: Scope,
        submission: &BatchTaskSubmission,
    ) -> Result<BatchTaskHandle> {
        let routes = self.routes(scope);
        let mut fields = vec![
            ("type".to_string(), submission.kind().type_flag().to_string()),
            (
                "taskInfos".to_string(),
                wire::encode_task_infos(submission.items())?,
            ),
            (
                "targetFolderId".to_string(),
                submission.target_folder_id().unwrap_or_default().to_string(),
            ),
        ];
        fields.extend(routes.batch_fields());

        let body = self
            .transport
            .post_form(routes.create_batch()?.as_str(), &fields)
            .await?;
        let task_id = wire::decode_task_id(&body)?;
        tracing::debug!(
            "Created {} task {} with {} item(s) in {}",
            submission.kind(),
            task_id,
            submission.items().len(),
            scope
        );

        Ok(BatchTaskHandle {
            task_id,
            kind: submission.kind(),
        })
    }

    async fn check_batch_task(
        &self,
        scope: Scope,
        handle: &BatchTaskHandle,
    ) -> Result<BatchTaskStatus> {
        let fields = vec![
            ("type".to_string(), handle.kind.type_flag().to_string()),
            ("taskId".to_string(), handle.task_id.clone()),
        ];
        let body = self
            .transport
            .post_form(self.routes(scope).check_batch()?.as_str(), &fields)
            .await?;
        wire::decode_task_status(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use pan_core::{BatchTaskItem, BatchTaskKind, Error, OrderBy, OrderDirection, TaskState};

    const LISTING: &[u8] = br#"{"data": [{"fileId": 5, "fileName": "a.txt", "fileSize": 3,
        "isFolder": false, "parentId": -11}], "recordCount": 1, "path": []}"#;

    fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
        fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn delete_submission() -> BatchTaskSubmission {
        let items = vec![BatchTaskItem::from(&Entity::file("5", "a.txt", 3, "-11"))];
        BatchTaskSubmission::new(BatchTaskKind::Delete, items, None).unwrap()
    }

    #[test]
    fn test_personal_search_url() {
        let params = SearchParams {
            keyword: "report 2024".into(),
            order_by: OrderBy::Size,
            order: OrderDirection::Desc,
            ..SearchParams::in_folder("-11")
        };
        let url = PersonalRoutes::new("https://cloud.example.com/")
            .search(&params)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://cloud.example.com/v2/listFiles.action?fileId=-11&mediaType=0\
             &keyword=report+2024&inGroupSpace=false&orderBy=2&order=DESC&pageNum=1&pageSize=60"
        );
    }

    #[test]
    fn test_family_routes() {
        let routes = FamilyRoutes::new("https://api.example.com", 42);

        let url = routes.search(&SearchParams::in_folder("")).unwrap();
        assert!(url.as_str().starts_with(
            "https://api.example.com/family/file/listFiles.action?familyId=42&mediaType=0"
        ));
        assert!(!url.as_str().contains("folderId"));
        assert!(url.as_str().contains("descending=false"));

        let url = routes.search(&SearchParams::in_folder("77")).unwrap();
        assert!(url.as_str().contains("folderId=77"));

        assert_eq!(
            routes.file_info("9").unwrap().as_str(),
            "https://api.example.com/family/file/getFileInfo.action?familyId=42&fileId=9"
        );
        assert_eq!(
            routes.create_batch().unwrap().as_str(),
            "https://api.example.com/batch/createBatchTask.action"
        );
        assert_eq!(
            routes.batch_fields(),
            vec![("familyId".to_string(), "42".to_string())]
        );
    }

    #[tokio::test]
    async fn test_search_uses_scope_routes() {
        let mut mock = MockTransport::new();
        mock.expect_get()
            .withf(|url| url.starts_with("http://web.test/v2/listFiles.action?fileId=-11"))
            .times(1)
            .returning(|_| Ok(LISTING.to_vec()));
        mock.expect_get()
            .withf(|url| url.starts_with("http://api.test/family/file/listFiles.action?familyId=8"))
            .times(1)
            .returning(|_| Ok(LISTING.to_vec()));

        let client = PanClient::new(mock).with_base_urls("http://web.test", "http://api.test");

        let page = client
            .search(Scope::Personal, &SearchParams::default())
            .await
            .unwrap();
        assert_eq!(page.entities[0].id, "5");
        assert_eq!(page.page_num, 1);
        assert_eq!(page.page_size, 60);

        client
            .search(Scope::Family(8), &SearchParams::in_folder(""))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_params_never_reach_transport() {
        let mut mock = MockTransport::new();
        mock.expect_get().times(0);

        let client = PanClient::new(mock);
        let params = SearchParams {
            page_size: 5000,
            ..SearchParams::default()
        };
        let result = client.search(Scope::Personal, &params).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let mut mock = MockTransport::new();
        mock.expect_get()
            .returning(|_| Err(Error::Network("connection refused".into())));

        let client = PanClient::new(mock);
        let result = client.file_info(Scope::Personal, "5").await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_file_info_not_found_envelope() {
        let mut mock = MockTransport::new();
        mock.expect_get()
            .withf(|url| url.ends_with("/v2/getFileInfo.action?fileId=5"))
            .returning(|_| Ok(br#"{"errorCode": "FileNotFound", "errorMsg": "gone"}"#.to_vec()));

        let client = PanClient::new(mock).with_base_urls("http://web.test", "http://api.test");
        let err = client.file_info(Scope::Personal, "5").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_personal_batch_task() {
        let mut mock = MockTransport::new();
        mock.expect_post_form()
            .withf(|url, fields| {
                url == "http://web.test/createBatchTask.action"
                    && field(fields, "type") == Some("DELETE")
                    && field(fields, "targetFolderId") == Some("")
                    && field(fields, "taskInfos").is_some_and(|v| v.contains("\"fileId\":\"5\""))
                    && field(fields, "familyId").is_none()
            })
            .times(1)
            .returning(|_, _| Ok(b"task-abc".to_vec()));

        let client = PanClient::new(mock).with_base_urls("http://web.test", "http://api.test");
        let handle = client
            .create_batch_task(Scope::Personal, &delete_submission())
            .await
            .unwrap();
        assert_eq!(handle.task_id, "task-abc");
        assert_eq!(handle.kind, BatchTaskKind::Delete);
    }

    #[tokio::test]
    async fn test_create_family_move_task() {
        let mut mock = MockTransport::new();
        mock.expect_post_form()
            .withf(|url, fields| {
                url == "http://api.test/batch/createBatchTask.action"
                    && field(fields, "type") == Some("MOVE")
                    && field(fields, "targetFolderId") == Some("900")
                    && field(fields, "familyId") == Some("3")
            })
            .times(1)
            .returning(|_, _| Ok(br#"{"taskId": "fam-1"}"#.to_vec()));

        let items = vec![BatchTaskItem::from(&Entity::file("5", "a.txt", 3, ""))];
        let submission =
            BatchTaskSubmission::new(BatchTaskKind::Move, items, Some("900".into())).unwrap();

        let client = PanClient::new(mock).with_base_urls("http://web.test", "http://api.test");
        let handle = client
            .create_batch_task(Scope::Family(3), &submission)
            .await
            .unwrap();
        assert_eq!(handle.task_id, "fam-1");
    }

    #[tokio::test]
    async fn test_check_batch_task() {
        let mut mock = MockTransport::new();
        mock.expect_post_form()
            .withf(|url, fields| {
                url == "http://web.test/checkBatchTask.action"
                    && field(fields, "taskId") == Some("t-1")
                    && field(fields, "type") == Some("COPY")
            })
            .times(2)
            .returning({
                let mut answers = vec![
                    br#"{"taskStatus": 4, "successedCount": 1}"#.to_vec(),
                    br#"{"taskStatus": 1}"#.to_vec(),
                ];
                move |_, _| Ok(answers.pop().unwrap_or_default())
            });

        let client = PanClient::new(mock).with_base_urls("http://web.test", "http://api.test");
        let handle = BatchTaskHandle {
            task_id: "t-1".into(),
            kind: BatchTaskKind::Copy,
        };

        let first = client.check_batch_task(Scope::Personal, &handle).await.unwrap();
        assert_eq!(first.state, TaskState::Pending);
        let second = client.check_batch_task(Scope::Personal, &handle).await.unwrap();
        assert_eq!(second.state, TaskState::Ok);
        assert_eq!(second.success_count, 1);
    }

    #[tokio::test]
    async fn test_submit_decode_error() {
        let mut mock = MockTransport::new();
        mock.expect_post_form()
            .returning(|_, _| Ok(br#"{"unexpected": true}"#.to_vec()));

        let client = PanClient::new(mock);
        let result = client
            .create_batch_task(Scope::Personal, &delete_submission())
            .await;
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.set_key("web_url", "http://localhost:8080/").unwrap();
        let client = PanClient::from_config(&config).unwrap();
        assert_eq!(client.web_url, "http://localhost:8080");
        assert_eq!(client.api_url, pan_core::config::DEFAULT_API_URL);
    }
}
