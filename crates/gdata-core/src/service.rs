//! The service: queries and entry CRUD over an authorizer and a transport.

use futures_core::Stream;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::Result;
use crate::atom::rel;
use crate::batch::{BatchOperation, BatchResult};
use crate::comment::{Comment, Commentable};
use crate::config::ServiceConfig;
use crate::entry::EntryType;
use crate::error::{AuthError, Error, InvalidInputError, ParseError, ServiceError, TransportError};
use crate::feed::Feed;
use crate::parsable::{JsonParsable, Parsable};
use crate::query::Query;
use crate::request::{Method, Request, Response};
use crate::services::{GraphQuery, GraphResult};
use crate::traits::{Authorizer, Transport};
use crate::xml;

const ATOM_CONTENT_TYPE: &str = "application/atom+xml";

/// Longest error body carried into an error message.
const MAX_ERROR_MESSAGE: usize = 512;

/// A client for one GData-style service.
///
/// Every operation issues exactly one request: the authorizer attaches
/// credentials, the transport performs it, and the response status is mapped
/// to an [`Error`]. Nothing is retried.
///
/// # Example
///
/// ```ignore
/// let service = Service::new(ServiceConfig::default(), authorizer, transport);
/// let mut query = Query::new().with_max_results(10);
/// loop {
///     let feed: Feed<Entry> = service.query("feeds/default", &mut query).await?;
///     if feed.is_empty() {
///         break;
///     }
///     // ...
///     query.advance_page();
/// }
/// ```
pub struct Service<A, T> {
    config: ServiceConfig,
    authorizer: A,
    transport: T,
}

impl<A: Authorizer, T: Transport> Service<A, T> {
    pub fn new(config: ServiceConfig, authorizer: A, transport: T) -> Self {
        Self {
            config,
            authorizer,
            transport,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn authorizer(&self) -> &A {
        &self.authorizer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch the current page of `query` from `feed_uri` and record the
    /// feed's paging state in the query.
    ///
    /// A query already advanced past its last page returns an empty feed
    /// without a request.
    #[instrument(skip(self, query))]
    pub async fn query<E: EntryType>(&self, feed_uri: &str, query: &mut Query) -> Result<Feed<E>> {
        if query.is_finished() {
            debug!("query finished, returning empty feed");
            return Ok(Feed::empty());
        }

        let request = query.build_request(&self.config.base_url.resolve(feed_uri));
        let response = self.send(request).await?;

        let mut feed: Feed<E> = parse_body(&response)?;
        if feed.etag().is_none() {
            if let Some(etag) = &response.etag {
                feed = feed.with_etag(etag.clone());
            }
        }
        query.record_feed(&feed);

        debug!(entries = feed.len(), total = ?feed.total_results(), "query complete");
        Ok(feed)
    }

    /// Fetch one entry. With a `query`, its parameters and ETag are sent too,
    /// so an unchanged entry fails with [`ServiceError::NotModified`].
    #[instrument(skip(self, query))]
    pub async fn query_single_entry<E: EntryType>(
        &self,
        entry_uri: &str,
        query: Option<&Query>,
    ) -> Result<E> {
        let uri = self.config.base_url.resolve(entry_uri);
        let request = match query {
            Some(query) => query.build_request(&uri),
            None => Request::get(uri),
        };
        let response = self.send(request).await?;
        parse_entry(&response)
    }

    /// POST a new entry to `upload_uri` and return the server's version of it.
    #[instrument(skip(self, entry))]
    pub async fn insert<E: EntryType>(&self, upload_uri: &str, entry: &E) -> Result<E> {
        if entry.entry().is_inserted() {
            return Err(InvalidInputError::AlreadyInserted.into());
        }

        let request = Request::new(Method::Post, self.config.base_url.resolve(upload_uri))
            .with_body(ATOM_CONTENT_TYPE, entry.to_xml());
        let response = self.send(request).await?;
        expect_status(&response, &[200, 201])?;

        let inserted: E = parse_entry(&response)?;
        debug!(id = ?inserted.entry().id(), "inserted entry");
        Ok(inserted)
    }

    /// PUT `entry` to its edit link, guarded by its ETag.
    ///
    /// A stale ETag fails with [`ServiceError::Conflict`].
    #[instrument(skip(self, entry), fields(id = ?entry.entry().id()))]
    pub async fn update<E: EntryType>(&self, entry: &E) -> Result<E> {
        if !entry.entry().is_inserted() {
            return Err(InvalidInputError::NotInserted.into());
        }
        self.check_ownership(entry)?;

        let mut request = Request::new(Method::Put, self.edit_uri(entry)?)
            .with_body(ATOM_CONTENT_TYPE, entry.to_xml());
        if let Some(etag) = entry.etag() {
            request.set_header("If-Match", etag);
        }
        let response = self.send(request).await?;

        let updated: E = parse_entry(&response)?;
        debug!(etag = ?updated.etag(), "updated entry");
        Ok(updated)
    }

    /// DELETE `entry` through its edit link, guarded by its ETag.
    #[instrument(skip(self, entry), fields(id = ?entry.entry().id()))]
    pub async fn delete<E: EntryType>(&self, entry: &E) -> Result<()> {
        if !entry.entry().is_inserted() {
            return Err(InvalidInputError::NotInserted.into());
        }
        self.check_ownership(entry)?;
        self.delete_entry(entry).await
    }

    /// Whether the signed-in account is one of the entry's authors, by exact
    /// email match. Without an identity nothing is owned.
    pub fn is_owner<E: EntryType>(&self, entry: &E) -> bool {
        match self.authorizer.identity() {
            Some(identity) => entry
                .entry()
                .authors()
                .iter()
                .any(|a| a.email() == Some(identity)),
            None => false,
        }
    }

    /// Query the comments on `commentable`. Every comment returned is
    /// checked for content and an author.
    #[instrument(skip(self, commentable, query), fields(id = ?commentable.entry().id()))]
    pub async fn query_comments<C: Commentable>(
        &self,
        commentable: &C,
        query: &mut Query,
    ) -> Result<Feed<C::Comment>> {
        let uri = commentable.query_comments_uri()?;
        let feed: Feed<C::Comment> = self.query(&uri, query).await?;
        for comment in feed.entries() {
            comment
                .validate()
                .map_err(|e| ParseError::malformed("entry", e.to_string()))?;
        }
        Ok(feed)
    }

    /// Add `comment` to `commentable`.
    #[instrument(skip(self, commentable, comment), fields(id = ?commentable.entry().id()))]
    pub async fn insert_comment<C: Commentable>(
        &self,
        commentable: &C,
        comment: &C::Comment,
    ) -> Result<C::Comment> {
        comment.validate()?;
        let uri = commentable.insert_comment_uri(comment)?;
        self.insert(&uri, comment).await
    }

    /// Remove `comment` from `commentable`.
    ///
    /// Whether a comment may be deleted is the commentable's decision; the
    /// author ownership guard does not apply.
    #[instrument(skip(self, commentable, comment), fields(id = ?comment.entry().id()))]
    pub async fn delete_comment<C: Commentable>(
        &self,
        commentable: &C,
        comment: &C::Comment,
    ) -> Result<()> {
        if !commentable.is_comment_deletable(comment) {
            return Err(ServiceError::PermissionDenied {
                reason: "comment cannot be deleted by this account".to_string(),
            }
            .into());
        }
        self.delete_entry(comment).await
    }

    /// Run a graph query against `endpoint`.
    #[instrument(skip(self, query))]
    pub async fn query_graph(&self, endpoint: &str, query: &GraphQuery) -> Result<GraphResult> {
        let endpoint = self.config.base_url.resolve(endpoint);
        let url = Url::parse(&endpoint).map_err(|e| InvalidInputError::Other {
            message: format!("invalid graph endpoint '{endpoint}': {e}"),
        })?;

        let response = self.send(Request::get(query.to_url(&url).to_string())).await?;
        Ok(GraphResult::from_json_str(&response.body)?)
    }

    /// Send `batch` to its batch feed as a single request.
    ///
    /// The request fails as a whole only if the batch feed itself is
    /// refused; each operation then reports its own outcome. The batch is
    /// consumed, so it cannot be sent twice.
    #[instrument(skip(self, batch), fields(uri = %batch.feed_uri(), operations = batch.len()))]
    pub async fn run_batch<E: EntryType>(
        &self,
        batch: BatchOperation<E>,
    ) -> Result<Vec<BatchResult<E>>> {
        if batch.is_empty() {
            return Err(InvalidInputError::Other {
                message: "batch has no operations".to_string(),
            }
            .into());
        }

        let request = Request::new(Method::Post, self.config.base_url.resolve(batch.feed_uri()))
            .with_body(ATOM_CONTENT_TYPE, xml::write(&batch.to_node()));
        let response = self.send(request).await?;
        expect_status(&response, &[200])?;

        let results = batch.read_results(&xml::parse(&response.body)?)?;
        debug!(
            results = results.len(),
            failed = results.iter().filter(|r| r.outcome.is_err()).count(),
            "batch complete"
        );
        Ok(results)
    }

    /// Every entry of `query`, page after page.
    ///
    /// The stream ends on an empty page, once a link or token query runs out
    /// of pages, or after yielding the first error.
    pub fn entries<'a, E: EntryType>(
        &'a self,
        feed_uri: &'a str,
        mut query: Query,
    ) -> impl Stream<Item = Result<E>> + 'a {
        async_stream::try_stream! {
            while !query.is_finished() {
                let feed: Feed<E> = self.query(feed_uri, &mut query).await?;
                if feed.is_empty() {
                    break;
                }
                for entry in feed.into_entries() {
                    yield entry;
                }
                query.advance_page();
            }
        }
    }

    fn check_ownership<E: EntryType>(&self, entry: &E) -> Result<()> {
        if !self.config.enforce_ownership {
            return Ok(());
        }
        if self.authorizer.identity().is_none() {
            return Err(AuthError::NoAccountFound.into());
        }
        if !self.is_owner(entry) {
            return Err(ServiceError::PermissionDenied {
                reason: "authenticated account is not an author of the entry".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn edit_uri<E: EntryType>(&self, entry: &E) -> Result<String> {
        let link = entry
            .entry()
            .look_up_link(rel::EDIT)
            .ok_or_else(|| InvalidInputError::MissingLink {
                rel: rel::EDIT.to_string(),
            })?;
        Ok(self.config.base_url.resolve(link.href()))
    }

    async fn delete_entry<E: EntryType>(&self, entry: &E) -> Result<()> {
        let mut request = Request::new(Method::Delete, self.edit_uri(entry)?);
        if let Some(etag) = entry.etag() {
            request.set_header("If-Match", etag);
        }
        let response = self.send(request).await?;
        expect_status(&response, &[200, 204])?;
        debug!("deleted entry");
        Ok(())
    }

    async fn send(&self, mut request: Request) -> Result<Response> {
        request.set_header("GData-Version", self.config.api_version.clone());
        if let Some(locale) = &self.config.locale {
            request.uri = with_locale(&request.uri, locale);
        }
        let uri = request.uri.clone();
        debug!(method = %request.method, %uri, "sending request");

        let request = self.authorizer.authorize(request).await?;
        let response = self.transport.perform(request).await?;
        check_status(&uri, response)
    }
}

/// Append `hl=<locale>` unless the URI already carries one.
fn with_locale(uri: &str, locale: &str) -> String {
    let has_locale = uri
        .split_once('?')
        .is_some_and(|(_, q)| q.split('&').any(|p| p.starts_with("hl=")));
    if has_locale {
        return uri.to_string();
    }
    let separator = if uri.contains('?') { '&' } else { '?' };
    let locale: String = url::form_urlencoded::byte_serialize(locale.as_bytes()).collect();
    format!("{uri}{separator}hl={locale}")
}

fn check_status(uri: &str, response: Response) -> Result<Response> {
    if response.is_success() {
        return Ok(response);
    }

    let err = status_error(uri, response.status, error_message(&response));
    warn!(status = response.status, %uri, error = %err, "request failed");
    Err(err)
}

/// Map a failure status to an error. Batch results carry their own statuses
/// and go through here too.
pub(crate) fn status_error(uri: &str, status: u16, message: String) -> Error {
    match status {
        304 => ServiceError::NotModified.into(),
        400 => ServiceError::Protocol { status, message }.into(),
        401 => AuthError::CredentialsExpired.into(),
        403 => ServiceError::PermissionDenied { reason: message }.into(),
        404 => ServiceError::NotFound {
            uri: uri.to_string(),
        }
        .into(),
        409 | 412 => ServiceError::Conflict { message }.into(),
        _ => TransportError::Status { status, message }.into(),
    }
}

fn error_message(response: &Response) -> String {
    let body = response.body.trim();
    if body.is_empty() {
        format!("HTTP {}", response.status)
    } else {
        body.chars().take(MAX_ERROR_MESSAGE).collect()
    }
}

fn expect_status(response: &Response, accepted: &[u16]) -> Result<()> {
    if accepted.contains(&response.status) {
        Ok(())
    } else {
        Err(ServiceError::Protocol {
            status: response.status,
            message: format!("unexpected status {}", response.status),
        }
        .into())
    }
}

fn parse_body<P: Parsable + JsonParsable>(response: &Response) -> std::result::Result<P, ParseError> {
    if response.is_json() {
        P::from_json_str(&response.body)
    } else {
        P::from_xml(&response.body)
    }
}

fn parse_entry<E: EntryType>(response: &Response) -> Result<E> {
    let entry: E = parse_body(response)?;
    entry.entry().validate_response()?;
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_parameter() {
        assert_eq!(with_locale("https://x/feed", "en_GB"), "https://x/feed?hl=en_GB");
        assert_eq!(with_locale("https://x/feed?q=a", "fr"), "https://x/feed?q=a&hl=fr");
        assert_eq!(with_locale("https://x/feed?hl=de", "fr"), "https://x/feed?hl=de");
    }

    #[test]
    fn status_mapping() {
        let check = |status| check_status("https://x/e", Response::new(status, "boom")).unwrap_err();

        assert!(matches!(check(304), Error::Service(ServiceError::NotModified)));
        assert!(matches!(check(400), Error::Service(ServiceError::Protocol { status: 400, .. })));
        assert!(matches!(check(401), Error::Auth(AuthError::CredentialsExpired)));
        assert!(matches!(check(403), Error::Service(ServiceError::PermissionDenied { .. })));
        assert!(matches!(
            check(404),
            Error::Service(ServiceError::NotFound { ref uri }) if uri == "https://x/e"
        ));
        assert!(matches!(check(409), Error::Service(ServiceError::Conflict { .. })));
        assert!(matches!(check(412), Error::Service(ServiceError::Conflict { .. })));
        assert!(matches!(
            check(503),
            Error::Transport(TransportError::Status { status: 503, ref message }) if message == "boom"
        ));
        assert!(check_status("https://x", Response::new(204, "")).is_ok());
    }

    #[test]
    fn empty_error_body_names_status() {
        assert_eq!(error_message(&Response::new(500, "  ")), "HTTP 500");
    }
}
