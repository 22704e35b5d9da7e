//! Query parameters and pagination state.

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::form_urlencoded;

use crate::feed::Feed;
use crate::parsable::format_time;
use crate::request::Request;

/// How a query moves between pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaginationType {
    /// `start-index` is stepped by the page size.
    #[default]
    Indexed,
    /// The `next`/`previous` links of the last feed are followed verbatim.
    Uris,
    /// The `nextPageToken` of the last feed is sent as `pageToken`.
    Tokens,
}

/// Filters and paging state for a feed query.
///
/// A query is reused across pages: the service records each feed it returns
/// with [`Query::record_feed`], and [`Query::advance_page`] moves to the next
/// one. Feeds already returned are never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    q: Option<String>,
    categories: Option<String>,
    author: Option<String>,
    updated_min: Option<DateTime<Utc>>,
    updated_max: Option<DateTime<Utc>>,
    published_min: Option<DateTime<Utc>>,
    published_max: Option<DateTime<Utc>>,
    start_index: u32,
    max_results: Option<u32>,
    strict: bool,
    params: Vec<(String, String)>,
    etag: Option<String>,

    pagination: PaginationType,
    next_uri: Option<String>,
    previous_uri: Option<String>,
    next_page_token: Option<String>,
    use_next: bool,
    use_previous: bool,
    last_page_size: Option<u32>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            q: None,
            categories: None,
            author: None,
            updated_min: None,
            updated_max: None,
            published_min: None,
            published_max: None,
            start_index: 1,
            max_results: None,
            strict: false,
            params: Vec::new(),
            etag: None,
            pagination: PaginationType::default(),
            next_uri: None,
            previous_uri: None,
            next_page_token: None,
            use_next: false,
            use_previous: false,
            last_page_size: None,
        }
    }
}

macro_rules! param {
    ($(#[$doc:meta])* $field:ident, $setter:ident, $builder:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $field(&self) -> Option<&$ty> {
            self.$field.as_ref()
        }

        pub fn $setter(&mut self, value: Option<$ty>) {
            self.$field = value;
            self.etag = None;
        }

        pub fn $builder(mut self, value: impl Into<$ty>) -> Self {
            self.$setter(Some(value.into()));
            self
        }
    };
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// A query paging with `pagination` instead of start indexes.
    pub fn with_pagination(pagination: PaginationType) -> Self {
        Self {
            pagination,
            ..Self::default()
        }
    }

    param!(
        /// Free-text search terms.
        q, set_q, with_q, String
    );
    param!(
        /// Category filter, as `/`-separated terms (`folder/starred`).
        categories, set_categories, with_categories, String
    );
    param!(author, set_author, with_author, String);
    param!(updated_min, set_updated_min, with_updated_min, DateTime<Utc>);
    param!(updated_max, set_updated_max, with_updated_max, DateTime<Utc>);
    param!(published_min, set_published_min, with_published_min, DateTime<Utc>);
    param!(published_max, set_published_max, with_published_max, DateTime<Utc>);

    /// One-based index of the first result.
    pub fn start_index(&self) -> u32 {
        self.start_index
    }

    /// Values below 1 are treated as 1.
    pub fn set_start_index(&mut self, start_index: u32) {
        self.start_index = start_index.max(1);
        self.etag = None;
    }

    pub fn with_start_index(mut self, start_index: u32) -> Self {
        self.set_start_index(start_index);
        self
    }

    pub fn max_results(&self) -> Option<u32> {
        self.max_results
    }

    pub fn set_max_results(&mut self, max_results: Option<u32>) {
        self.max_results = max_results.filter(|&m| m > 0);
        self.etag = None;
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.set_max_results(Some(max_results));
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Ask the server to reject parameters it does not understand.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
        self.etag = None;
    }

    /// Set a service-specific parameter, replacing a previous value.
    pub fn set_param(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.params.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.params.push((name.to_string(), value)),
        }
        self.etag = None;
    }

    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_param(name, value);
        self
    }

    pub fn remove_param(&mut self, name: &str) {
        self.params.retain(|(n, _)| n != name);
        self.etag = None;
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// ETag of the last feed; sent as `If-None-Match`.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn set_etag(&mut self, etag: Option<String>) {
        self.etag = etag;
    }

    pub fn pagination(&self) -> PaginationType {
        self.pagination
    }

    /// The URI for the current page of `feed_uri`.
    pub fn query_uri(&self, feed_uri: &str) -> String {
        if self.pagination == PaginationType::Uris {
            if self.use_next {
                if let Some(next) = &self.next_uri {
                    return next.clone();
                }
            }
            if self.use_previous {
                if let Some(previous) = &self.previous_uri {
                    return previous.clone();
                }
            }
        }

        let (path, existing_query) = match feed_uri.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (feed_uri, None),
        };

        let mut uri = path.to_string();
        if let Some(categories) = &self.categories {
            uri.push_str("/-");
            for term in categories.split('/').filter(|t| !t.is_empty()) {
                uri.push('/');
                uri.push_str(&encode_segment(term));
            }
        }

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(q) = &self.q {
            params.push(("q", encode(q)));
        }
        if let Some(author) = &self.author {
            params.push(("author", encode(author)));
        }
        for (name, value) in [
            ("updated-min", &self.updated_min),
            ("updated-max", &self.updated_max),
            ("published-min", &self.published_min),
            ("published-max", &self.published_max),
        ] {
            if let Some(t) = value {
                params.push((name, encode(&format_time(t))));
            }
        }
        if self.pagination == PaginationType::Indexed {
            params.push(("start-index", self.start_index.to_string()));
        }
        if self.strict {
            params.push(("strict", "true".to_string()));
        }
        if let Some(max) = self.max_results {
            params.push(("max-results", max.to_string()));
        }
        if self.pagination == PaginationType::Tokens && self.use_next {
            if let Some(token) = self.next_page_token.as_deref().filter(|t| !t.is_empty()) {
                params.push(("pageToken", encode(token)));
            }
        }
        for (name, value) in &self.params {
            params.push((name.as_str(), encode(value)));
        }

        let mut separator = match existing_query {
            Some(query) => {
                uri.push('?');
                uri.push_str(query);
                '&'
            }
            None => '?',
        };
        for (name, value) in params {
            uri.push(separator);
            uri.push_str(name);
            uri.push('=');
            uri.push_str(&value);
            separator = '&';
        }
        uri
    }

    /// A GET request for the current page of `feed_uri`.
    pub fn build_request(&self, feed_uri: &str) -> Request {
        let mut request = Request::get(self.query_uri(feed_uri));
        if let Some(etag) = &self.etag {
            request.set_header("If-None-Match", etag.clone());
        }
        request
    }

    /// Remember the paging links, token and ETag of the feed just returned.
    pub fn record_feed<E>(&mut self, feed: &Feed<E>) {
        self.etag = feed.etag().map(str::to_string);
        self.last_page_size = Some(u32::try_from(feed.len()).unwrap_or(u32::MAX));
        match self.pagination {
            PaginationType::Indexed => {}
            PaginationType::Uris => {
                self.next_uri = feed.next_link().map(|l| l.href().to_string());
                self.previous_uri = feed.previous_link().map(|l| l.href().to_string());
            }
            PaginationType::Tokens => {
                self.next_page_token = feed.next_page_token().map(str::to_string);
            }
        }
    }

    /// Move to the next page.
    ///
    /// Indexed queries step the start index by the page size, so a start
    /// index is never requested twice. Link and token queries switch to the
    /// recorded next page; without one the query is finished.
    pub fn advance_page(&mut self) {
        match self.pagination {
            PaginationType::Indexed => {
                let step = self.max_results.or(self.last_page_size).unwrap_or(1).max(1);
                self.start_index = self.start_index.saturating_add(step);
            }
            PaginationType::Uris | PaginationType::Tokens => {
                self.use_next = true;
                self.use_previous = false;
            }
        }
        self.etag = None;
    }

    /// Move to the previous page. Returns false, changing nothing, when there
    /// is none; token paging never has one.
    pub fn previous_page(&mut self) -> bool {
        let moved = match self.pagination {
            PaginationType::Indexed => {
                let step = self.max_results.or(self.last_page_size).unwrap_or(1).max(1);
                if self.start_index <= step {
                    false
                } else {
                    self.start_index -= step;
                    true
                }
            }
            PaginationType::Uris => {
                if self.previous_uri.is_some() {
                    self.use_next = false;
                    self.use_previous = true;
                    true
                } else {
                    false
                }
            }
            PaginationType::Tokens => false,
        };
        if moved {
            self.etag = None;
        }
        moved
    }

    /// Whether the query was advanced past its last page.
    pub fn is_finished(&self) -> bool {
        match self.pagination {
            PaginationType::Indexed => false,
            PaginationType::Uris => self.use_next && self.next_uri.is_none(),
            PaginationType::Tokens => self.use_next && self.next_page_token.is_none(),
        }
    }

    /// Forget all paging state and return to the first page.
    pub fn reset_pagination(&mut self) {
        self.start_index = 1;
        self.next_uri = None;
        self.previous_uri = None;
        self.next_page_token = None;
        self.use_next = false;
        self.use_previous = false;
        self.last_page_size = None;
        self.etag = None;
    }
}

/// Everything but the RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Category terms go in the path, where `+` is a literal plus.
fn encode_segment(term: &str) -> String {
    utf8_percent_encode(term, PATH_SEGMENT).to_string()
}
