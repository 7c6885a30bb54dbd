//! Path-to-entity resolution
//!
//! The service can only list the children of a folder, so an absolute path is
//! resolved by walking it one segment at a time from the scope root. Every
//! segment costs at least one search call.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::path;
use crate::scope::Scope;
use crate::search::{DEFAULT_PAGE_SIZE, SearchParams};
use crate::traits::CloudApi;

/// Upper bound on result pages scanned for one segment
const DEFAULT_MAX_PAGES: u32 = 50;

/// How a child name is compared against a path segment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Byte-for-byte equality
    #[default]
    CaseSensitive,
    /// Unicode case-insensitive equality; an exact match still wins
    CaseInsensitive,
}

impl MatchPolicy {
    pub fn matches(self, candidate: &str, segment: &str) -> bool {
        match self {
            MatchPolicy::CaseSensitive => candidate == segment,
            MatchPolicy::CaseInsensitive => candidate.to_lowercase() == segment.to_lowercase(),
        }
    }
}

impl std::str::FromStr for MatchPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "case_sensitive" | "sensitive" => Ok(MatchPolicy::CaseSensitive),
            "case_insensitive" | "insensitive" => Ok(MatchPolicy::CaseInsensitive),
            other => Err(Error::Config(format!(
                "unknown match policy '{other}', expected case_sensitive or case_insensitive"
            ))),
        }
    }
}

/// Resolves absolute paths to remote entities
pub struct PathResolver<'a, A: CloudApi + ?Sized> {
    api: &'a A,
    policy: MatchPolicy,
    max_pages: u32,
}

impl<'a, A: CloudApi + ?Sized> PathResolver<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            policy: MatchPolicy::default(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Resolve an absolute path within a scope
    ///
    /// `/` resolves to the scope root without any remote call. A relative path
    /// is rejected before anything is sent.
    pub async fn resolve(&self, absolute_path: &str, scope: Scope) -> Result<Entity> {
        if !path::is_absolute(absolute_path) {
            return Err(Error::InvalidPath(format!(
                "'{absolute_path}' is not an absolute path"
            )));
        }

        let mut current = Entity::root(scope);
        let mut consumed = String::new();

        for segment in path::segments(absolute_path) {
            if !current.is_folder {
                return Err(Error::NotFound(format!(
                    "'{consumed}' is a file, cannot descend into '{segment}'"
                )));
            }

            let child = self.find_child(&current, segment, scope).await?;
            let Some(child) = child else {
                let parent = if consumed.is_empty() { "/" } else { consumed.as_str() };
                return Err(Error::NotFound(format!(
                    "'{segment}' does not exist in '{parent}'"
                )));
            };

            consumed.push(path::SEPARATOR);
            consumed.push_str(segment);
            tracing::debug!("Resolved {} to {}", consumed, child.id);
            current = child;
        }

        Ok(current)
    }

    /// Find the child of `folder` named `segment`, scanning result pages
    async fn find_child(
        &self,
        folder: &Entity,
        segment: &str,
        scope: Scope,
    ) -> Result<Option<Entity>> {
        let params = SearchParams {
            page_size: DEFAULT_PAGE_SIZE,
            ..SearchParams::child_named(&folder.id, segment)
        };

        // The family root has no id; its children carry the real one
        let unnamed_root = folder.id.is_empty();
        let mut fallback: Option<Entity> = None;
        let mut page_num = 1;

        loop {
            let page = self.api.search(scope, &params.with_page(page_num)).await?;
            let has_more = page.has_more() && !page.entities.is_empty();

            for entity in page.entities {
                // Keyword search may reach into subfolders
                if !unnamed_root && !entity.parent_id.is_empty() && entity.parent_id != folder.id
                {
                    continue;
                }
                if entity.name == segment {
                    return Ok(Some(entity));
                }
                if fallback.is_none() && self.policy.matches(&entity.name, segment) {
                    fallback = Some(entity);
                }
            }

            if !has_more || page_num >= self.max_pages {
                break;
            }
            page_num += 1;
        }

        Ok(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCloud;

    /// /docs/2024/report.pdf, /docs/report-old.pdf, /music
    fn sample_cloud() -> (FakeCloud, String, String) {
        let cloud = FakeCloud::new();
        let docs = cloud.add_folder("-11", "docs");
        let year = cloud.add_folder(&docs, "2024");
        let report = cloud.add_file(&year, "report.pdf", 4096);
        cloud.add_file(&docs, "report-old.pdf", 10);
        cloud.add_folder("-11", "music");
        (cloud, docs, report)
    }

    #[tokio::test]
    async fn test_resolve_existing_file() {
        let (cloud, _, report) = sample_cloud();
        let resolver = PathResolver::new(&cloud);

        let entity = resolver
            .resolve("/docs/2024/report.pdf", Scope::Personal)
            .await
            .unwrap();
        assert_eq!(entity.id, report);
        assert!(!entity.is_folder);
        assert_eq!(cloud.search_calls(), 3);
    }

    #[tokio::test]
    async fn test_resolve_folder() {
        let (cloud, docs, _) = sample_cloud();
        let entity = PathResolver::new(&cloud)
            .resolve("/docs/", Scope::Personal)
            .await
            .unwrap();
        assert_eq!(entity.id, docs);
        assert!(entity.is_folder);
    }

    #[tokio::test]
    async fn test_resolve_root_without_remote_call() {
        let (cloud, _, _) = sample_cloud();
        let entity = PathResolver::new(&cloud)
            .resolve("/", Scope::Personal)
            .await
            .unwrap();
        assert_eq!(entity.id, "-11");
        assert_eq!(cloud.total_calls(), 0);

        let family_root = PathResolver::new(&cloud)
            .resolve("/", Scope::Family(5))
            .await
            .unwrap();
        assert!(family_root.is_root_of(Scope::Family(5)));
    }

    #[tokio::test]
    async fn test_relative_path_rejected_without_remote_call() {
        let (cloud, _, _) = sample_cloud();
        let resolver = PathResolver::new(&cloud);

        for input in ["docs/2024", "", "./docs", "report.pdf"] {
            let result = resolver.resolve(input, Scope::Personal).await;
            assert!(matches!(result, Err(Error::InvalidPath(_))), "{input}");
        }
        assert_eq!(cloud.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_segment_stops_walk() {
        let (cloud, _, _) = sample_cloud();
        let err = PathResolver::new(&cloud)
            .resolve("/docs/2023/report.pdf", Scope::Personal)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        let message = err.to_string();
        assert!(message.contains("'2023'"), "{message}");
        assert!(message.contains("'/docs'"), "{message}");
        // "docs" then "2023", nothing deeper
        assert_eq!(cloud.search_calls(), 2);
    }

    #[tokio::test]
    async fn test_cannot_descend_through_file() {
        let (cloud, _, _) = sample_cloud();
        let err = PathResolver::new(&cloud)
            .resolve("/docs/report-old.pdf/inner", Scope::Personal)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("is a file"));
        assert_eq!(cloud.search_calls(), 2);
    }

    #[tokio::test]
    async fn test_partial_name_is_not_a_match() {
        let (cloud, _, _) = sample_cloud();
        // "report" is a keyword hit for report-old.pdf but not an exact name
        let err = PathResolver::new(&cloud)
            .resolve("/docs/report", Scope::Personal)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_case_policy() {
        let (cloud, docs, _) = sample_cloud();

        let err = PathResolver::new(&cloud)
            .resolve("/Docs", Scope::Personal)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let entity = PathResolver::new(&cloud)
            .with_policy(MatchPolicy::CaseInsensitive)
            .resolve("/DOCS", Scope::Personal)
            .await
            .unwrap();
        assert_eq!(entity.id, docs);
    }

    #[tokio::test]
    async fn test_case_insensitive_prefers_exact() {
        let cloud = FakeCloud::new();
        cloud.add_folder("-11", "Notes");
        let exact = cloud.add_folder("-11", "notes");

        let entity = PathResolver::new(&cloud)
            .with_policy(MatchPolicy::CaseInsensitive)
            .resolve("/notes", Scope::Personal)
            .await
            .unwrap();
        assert_eq!(entity.id, exact);
    }

    #[tokio::test]
    async fn test_match_found_on_later_page() {
        let cloud = FakeCloud::new();
        // 70 keyword hits sort ahead of the exact name, pushing it to page 2
        for i in 0..70 {
            cloud.add_file("-11", &format!("a-log-{i:02}.txt"), 1);
        }
        let target = cloud.add_folder("-11", "log");

        let entity = PathResolver::new(&cloud)
            .resolve("/log", Scope::Personal)
            .await
            .unwrap();
        assert_eq!(entity.id, target);
        assert_eq!(cloud.search_calls(), 2);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let (cloud, docs, _) = sample_cloud();
        cloud.break_folder(&docs);
        let err = PathResolver::new(&cloud)
            .resolve("/docs/2024", Scope::Personal)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_resolve_in_family_scope() {
        let cloud = FakeCloud::new();
        cloud.set_family_root("8000");
        let photos = cloud.add_folder("8000", "photos");
        let picture = cloud.add_file(&photos, "beach.jpg", 2048);

        let resolver = PathResolver::new(&cloud);
        let folder = resolver.resolve("/photos", Scope::Family(42)).await.unwrap();
        assert_eq!(folder.id, photos);
        assert_eq!(folder.parent_id, "8000");

        let file = resolver
            .resolve("/photos/beach.jpg", Scope::Family(42))
            .await
            .unwrap();
        assert_eq!(file.id, picture);
        assert_eq!(cloud.search_calls(), 3);
    }

    #[test]
    fn test_match_policy_from_str() {
        assert_eq!(
            "case_insensitive".parse::<MatchPolicy>().unwrap(),
            MatchPolicy::CaseInsensitive
        );
        assert_eq!(
            "sensitive".parse::<MatchPolicy>().unwrap(),
            MatchPolicy::CaseSensitive
        );
        assert!("fuzzy".parse::<MatchPolicy>().is_err());
    }
}
