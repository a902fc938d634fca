//! Blocking GitLab REST v4 client.

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::{
    Branch, FileContent, Hosting, HostingError, HostingResult, MergeRequest, MergeRequestQuery,
    NewTag, Project, TagRecord, TreeEntry,
};

/// Items per page for the list endpoints GitLab paginates.
const PAGE_SIZE: usize = 100;

type Response = ureq::http::Response<ureq::Body>;

/// A successful response body plus the `x-next-page` pagination header.
struct Page {
    body: String,
    next: Option<u32>,
}

pub struct GitlabClient {
    agent: ureq::Agent,
    api: String,
    token: String,
}

impl GitlabClient {
    /// Create a client for `host` (e.g. `https://gitlab.example.com`).
    pub fn new(host: &str, token: &str, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            api: format!("{}/api/v4", host.trim_end_matches('/')),
            token: token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.api)
    }

    fn fetch(&self, path: &str, query: &[(&str, String)]) -> HostingResult<Page> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let mut request = self
            .agent
            .get(&url)
            .header("Accept", "application/json")
            .header("PRIVATE-TOKEN", self.token.as_str());
        for (key, value) in query {
            request = request.query(*key, value);
        }
        read_page(&url, request.call())
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> HostingResult<T> {
        let page = self.fetch(path, query)?;
        decode(&self.url(path), &page.body)
    }

    /// Follow `page=` until a short page or a missing `x-next-page`.
    fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> HostingResult<Vec<T>> {
        let url = self.url(path);
        let mut items = Vec::new();
        let mut page = 1u32;
        loop {
            let mut paged = query.to_vec();
            paged.push(("per_page", PAGE_SIZE.to_string()));
            paged.push(("page", page.to_string()));
            let reply = self.fetch(path, &paged)?;
            let batch: Vec<T> = decode(&url, &reply.body)?;
            let full = batch.len() >= PAGE_SIZE;
            items.extend(batch);
            match reply.next {
                Some(next) if full && next > page => page = next,
                _ => return Ok(items),
            }
        }
    }
}

impl Hosting for GitlabClient {
    fn group_projects(&self, group: &str, search: Option<&str>) -> HostingResult<Vec<Project>> {
        let mut query = vec![("include_subgroups", "true".to_string())];
        if let Some(search) = search {
            query.push(("search", search.to_string()));
        }
        self.get_all(&format!("groups/{}/projects", encode_segment(group)), &query)
    }

    fn branches(&self, project: &str) -> HostingResult<Vec<Branch>> {
        self.get_all(
            &format!("projects/{}/repository/branches", encode_segment(project)),
            &[],
        )
    }

    fn branch(&self, project: &str, name: &str) -> HostingResult<Branch> {
        self.get(
            &format!(
                "projects/{}/repository/branches/{}",
                encode_segment(project),
                encode_segment(name)
            ),
            &[],
        )
    }

    fn tree(&self, project: &str, reference: &str) -> HostingResult<Vec<TreeEntry>> {
        self.get_all(
            &format!("projects/{}/repository/tree", encode_segment(project)),
            &[("ref", reference.to_string())],
        )
    }

    fn file(&self, project: &str, path: &str, reference: &str) -> HostingResult<FileContent> {
        self.get(
            &format!(
                "projects/{}/repository/files/{}",
                encode_segment(project),
                encode_segment(path)
            ),
            &[("ref", reference.to_string())],
        )
    }

    fn tags(&self, project: &str, search: &str) -> HostingResult<Vec<TagRecord>> {
        self.get(
            &format!("projects/{}/repository/tags", encode_segment(project)),
            &[
                ("order_by", "version".to_string()),
                ("search", search.to_string()),
            ],
        )
    }

    fn create_tag(&self, project: &str, tag: &NewTag) -> HostingResult<TagRecord> {
        let url = self.url(&format!(
            "projects/{}/repository/tags",
            encode_segment(project)
        ));
        tracing::debug!(%url, tag = %tag.name, reference = %tag.reference, "POST");
        let response = self
            .agent
            .post(&url)
            .header("Accept", "application/json")
            .header("PRIVATE-TOKEN", self.token.as_str())
            .send_form([
                ("tag_name", tag.name.as_str()),
                ("ref", tag.reference.as_str()),
                ("message", tag.message.as_str()),
            ]);
        let page = read_page(&url, response)?;
        decode(&url, &page.body)
    }

    fn merge_requests(
        &self,
        project: &str,
        query: &MergeRequestQuery,
        page: u32,
    ) -> HostingResult<Vec<MergeRequest>> {
        self.get(
            &format!("projects/{}/merge_requests", encode_segment(project)),
            &[
                ("state", "merged".to_string()),
                ("scope", "all".to_string()),
                ("created_after", query.created_after.to_rfc3339()),
                ("target_branch", query.target_branch.clone()),
                ("per_page", query.per_page.to_string()),
                ("page", page.to_string()),
            ],
        )
    }
}

/// Read the body of `response`. Statuses of 400 and above become
/// [`HostingError::Status`] carrying GitLab's error message.
fn read_page(url: &str, response: Result<Response, ureq::Error>) -> HostingResult<Page> {
    let mut response = response.map_err(|e| request_error(url, e))?;
    let status = response.status().as_u16();
    let next = response
        .headers()
        .get("x-next-page")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok());
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| request_error(url, e))?;
    if status >= 400 {
        return Err(HostingError::Status {
            status,
            url: url.to_string(),
            message: error_message(&body),
        });
    }
    Ok(Page { body, next })
}

/// GitLab errors look like `{"message": ...}` or `{"error": ...}`; anything
/// else is kept as trimmed text.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().chars().take(200).collect();
    };
    match value.get("message").or_else(|| value.get("error")) {
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => body.trim().to_string(),
    }
}

fn request_error(url: &str, err: ureq::Error) -> HostingError {
    match err {
        ureq::Error::StatusCode(status) => HostingError::Status {
            status,
            url: url.to_string(),
            message: String::new(),
        },
        other => HostingError::Transport {
            url: url.to_string(),
            message: other.to_string(),
        },
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> HostingResult<T> {
    serde_json::from_str(body).map_err(|e| HostingError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Percent-encode a single path segment. GitLab accepts `group/name` project
/// paths and file paths only in this form.
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> GitlabClient {
        GitlabClient::new(&server.base_url(), "secret", Duration::from_secs(5))
    }

    #[test]
    fn encode_segment_escapes_separators() {
        assert_eq!(encode_segment("billing/values.yaml"), "billing%2Fvalues.yaml");
        assert_eq!(encode_segment("platform/billing"), "platform%2Fbilling");
        assert_eq!(encode_segment("42"), "42");
        assert_eq!(encode_segment("release-1.2_x"), "release-1.2_x");
    }

    #[test]
    fn tags_sends_token_and_version_order() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects/12/repository/tags")
                .header("PRIVATE-TOKEN", "secret")
                .query_param("order_by", "version")
                .query_param("search", "^v4.3");
            then.status(200).json_body(json!([
                {
                    "name": "v4.3.7",
                    "commit": {
                        "id": "abc123",
                        "message": "release",
                        "created_at": "2024-05-01T12:00:00Z"
                    }
                }
            ]));
        });

        let tags = client(&server).tags("12", "^v4.3").unwrap();
        mock.assert();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "v4.3.7");
        assert_eq!(tags[0].commit.id, "abc123");
    }

    #[test]
    fn group_projects_passes_search() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/groups/platform/projects")
                .query_param("search", "billing");
            then.status(200).json_body(json!([
                { "id": 7, "name": "billing", "path": "billing" },
                { "id": 8, "name": "billing-worker", "path": "billing-worker" }
            ]));
        });

        let projects = client(&server).group_projects("platform", Some("billing")).unwrap();
        mock.assert();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].id, 7);
    }

    #[test]
    fn not_found_maps_to_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v4/projects/42/repository/branches/nope");
            then.status(404).json_body(json!({ "message": "404 Branch Not Found" }));
        });

        let err = client(&server).branch("42", "nope").unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("404 Branch Not Found"));
    }

    #[test]
    fn malformed_body_is_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v4/projects/42/repository/branches");
            then.status(200).body("<html>maintenance</html>");
        });

        let err = client(&server).branches("42").unwrap_err();
        assert!(matches!(err, HostingError::Decode { .. }));
    }

    #[test]
    fn create_tag_posts_and_parses_result() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/v4/projects/12/repository/tags");
            then.status(201).json_body(json!({
                "name": "v4.3.8",
                "message": "Generated",
                "commit": {
                    "id": "abc123",
                    "message": "release",
                    "created_at": "2024-05-02T08:30:00+03:00"
                }
            }));
        });

        let created = client(&server)
            .create_tag(
                "12",
                &NewTag {
                    name: "v4.3.8".into(),
                    reference: "abc123".into(),
                    message: "Generated".into(),
                },
            )
            .unwrap();
        mock.assert();
        assert_eq!(created.name, "v4.3.8");
    }

    fn rejected_create(message: &str) -> HostingError {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/v4/projects/12/repository/tags");
            then.status(400).json_body(json!({ "message": message }));
        });

        client(&server)
            .create_tag(
                "12",
                &NewTag {
                    name: "v4.3.8".into(),
                    reference: "abc123".into(),
                    message: String::new(),
                },
            )
            .unwrap_err()
    }

    #[test]
    fn create_tag_duplicate_keeps_message() {
        let err = rejected_create("Tag v4.3.8 already exists");
        assert_eq!(err.status(), Some(400));
        assert!(err.already_exists());
        assert!(err.to_string().ends_with("status 400: Tag v4.3.8 already exists"));
    }

    #[test]
    fn create_tag_bad_request_is_not_a_duplicate() {
        let err = rejected_create("Target abc123 is invalid");
        assert_eq!(err.status(), Some(400));
        assert!(!err.already_exists());
        assert!(err.to_string().contains("Target abc123 is invalid"));
    }

    #[test]
    fn tree_follows_next_page_header() {
        let server = MockServer::start();
        let first_page: Vec<_> = (0..PAGE_SIZE)
            .map(|i| json!({ "name": format!("svc-{i}"), "type": "tree", "path": format!("svc-{i}") }))
            .collect();
        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects/7/repository/tree")
                .query_param("ref", "stage")
                .query_param("per_page", "100")
                .query_param("page", "1");
            then.status(200)
                .header("x-next-page", "2")
                .json_body(json!(first_page));
        });
        let second = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects/7/repository/tree")
                .query_param("ref", "stage")
                .query_param("page", "2");
            then.status(200).header("x-next-page", "").json_body(json!([
                { "name": "zeta", "type": "tree", "path": "zeta" },
                { "name": "values.yaml", "type": "blob", "path": "values.yaml" }
            ]));
        });

        let entries = client(&server).tree("7", "stage").unwrap();
        first.assert();
        second.assert();
        assert_eq!(entries.len(), PAGE_SIZE + 2);
        assert_eq!(entries[0].name, "svc-0");
        assert_eq!(entries[PAGE_SIZE].name, "zeta");
    }

    #[test]
    fn short_page_stops_even_with_next_header() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/projects/7/repository/branches")
                .query_param("page", "1");
            then.status(200)
                .header("x-next-page", "2")
                .json_body(json!([{ "name": "prod" }, { "name": "stage" }]));
        });

        let branches = client(&server).branches("7").unwrap();
        mock.assert();
        assert_eq!(branches.len(), 2);
    }

    #[test]
    fn unreachable_host_is_transport_error() {
        let client = GitlabClient::new("http://127.0.0.1:1", "secret", Duration::from_secs(2));
        let err = client.branches("42").unwrap_err();
        assert!(matches!(err, HostingError::Transport { .. }));
    }
}
