//! In-memory collaborators for driving `Service` without a network.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use gdata_core::error::{AuthError, TransportError};
use gdata_core::{Authorizer, Method, Request, Response, ServiceConfig, ServiceUrl, Transport};
use url::Url;

pub const BASE: &str = "https://docs.example.com";
pub const FEED_URI: &str = "https://docs.example.com/feeds/default";
pub const OWNER: &str = "owner@example.com";

pub fn config() -> ServiceConfig {
    ServiceConfig::new(ServiceUrl::new(BASE).unwrap())
}

/// Authorizer with a fixed identity and token.
pub struct StaticAuthorizer {
    identity: Option<String>,
}

impl StaticAuthorizer {
    pub fn signed_in(identity: &str) -> Self {
        Self {
            identity: Some(identity.to_string()),
        }
    }

    pub fn anonymous() -> Self {
        Self { identity: None }
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn authorize(&self, request: Request) -> Result<Request, AuthError> {
        Ok(request.with_header("Authorization", "Bearer test-token"))
    }

    fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }
}

struct StoredEntry {
    number: usize,
    version: u32,
    author: String,
}

impl StoredEntry {
    fn etag(&self) -> String {
        format!("\"v{}\"", self.version)
    }

    fn edit_uri(&self) -> String {
        format!("{FEED_URI}/entries/{}", self.number)
    }

    fn to_xml(&self, namespaces: bool) -> String {
        let xmlns = if namespaces {
            r#" xmlns="http://www.w3.org/2005/Atom" xmlns:gd="http://schemas.google.com/g/2005""#
        } else {
            ""
        };
        format!(
            r#"<entry{xmlns} gd:etag="&quot;v{version}&quot;">
                 <id>{uri}</id>
                 <title>Entry {number}</title>
                 <updated>2010-01-01T00:00:00Z</updated>
                 <author><name>Author</name><email>{author}</email></author>
                 <link rel="edit" href="{uri}"/>
               </entry>"#,
            version = self.version,
            uri = self.edit_uri(),
            number = self.number,
            author = self.author,
        )
    }
}

/// A feed of numbered entries served with start-index paging, supporting
/// ETag-guarded updates and deletes.
pub struct CorpusTransport {
    entries: Mutex<Vec<StoredEntry>>,
    requests: Mutex<Vec<Request>>,
}

impl CorpusTransport {
    pub fn new(count: usize) -> Self {
        let entries = (1..=count)
            .map(|number| StoredEntry {
                number,
                version: 1,
                author: OWNER.to_string(),
            })
            .collect();
        Self {
            entries: Mutex::new(entries),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Change entry `number` behind the client's back.
    pub fn touch(&self, number: usize) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.iter_mut().find(|e| e.number == number) {
            entry.version += 1;
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    fn page(&self, url: &Url) -> Response {
        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.parse::<usize>().ok())
        };
        let start = param("start-index").unwrap_or(1).max(1);
        let max = param("max-results").unwrap_or(25);

        let entries = self.entries.lock().unwrap();
        let total = entries.len();
        let page: Vec<String> = entries
            .iter()
            .skip(start - 1)
            .take(max)
            .map(|e| e.to_xml(false))
            .collect();
        let next = if start - 1 + max < total {
            format!(
                r#"<link rel="next" href="{FEED_URI}?start-index={}&amp;max-results={max}"/>"#,
                start + max
            )
        } else {
            String::new()
        };

        let body = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
               <feed xmlns="http://www.w3.org/2005/Atom" xmlns:gd="http://schemas.google.com/g/2005"
                     xmlns:openSearch="http://a9.com/-/spec/opensearch/1.1/" gd:etag="W/&quot;feed-{start}&quot;">
                 <id>{FEED_URI}</id>
                 <title>Corpus</title>
                 <openSearch:totalResults>{total}</openSearch:totalResults>
                 <openSearch:startIndex>{start}</openSearch:startIndex>
                 <openSearch:itemsPerPage>{max}</openSearch:itemsPerPage>
                 {next}
                 {entries}
               </feed>"#,
            entries = page.join("\n"),
        );
        Response::new(200, body).with_content_type("application/atom+xml")
    }

    fn modify(&self, request: &Request) -> Response {
        let mut entries = self.entries.lock().unwrap();
        let Some(position) = entries.iter().position(|e| e.edit_uri() == request.uri) else {
            return Response::new(404, "no such entry");
        };
        if let Some(if_match) = request.header("If-Match") {
            if if_match != entries[position].etag() {
                return Response::new(412, "etag mismatch");
            }
        }

        match request.method {
            Method::Delete => {
                entries.remove(position);
                Response::new(204, "")
            }
            _ => {
                entries[position].version += 1;
                Response::new(200, entries[position].to_xml(true))
                    .with_content_type("application/atom+xml")
            }
        }
    }
}

#[async_trait]
impl Transport for CorpusTransport {
    async fn perform(&self, request: Request) -> Result<Response, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        let url = Url::parse(&request.uri).map_err(|e| TransportError::Http {
            message: e.to_string(),
        })?;
        let path = url.path();
        let response = match request.method {
            Method::Get if path == "/feeds/default" => self.page(&url),
            Method::Put | Method::Delete => self.modify(&request),
            _ => Response::new(405, "unsupported"),
        };
        Ok(response)
    }
}

/// Answers requests from a queue of canned results, recording every request.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Response, TransportError>>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(self, response: Response) -> Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn fail(self, error: TransportError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn perform(&self, request: Request) -> Result<Response, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connection {
                message: "no scripted response left".to_string(),
            }))
    }
}

pub fn atom(body: impl Into<String>) -> Response {
    Response::new(200, body).with_content_type("application/atom+xml")
}
