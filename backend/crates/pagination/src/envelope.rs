//! Response envelope for cursor-paginated collections.

use serde::{Deserialize, Serialize};
use url::Url;

/// Navigation links attached to a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLinks {
    /// URL of the page being returned.
    #[serde(rename = "self")]
    pub self_: String,
    /// URL of the following page, absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl PaginationLinks {
    /// Derive links from the URL that produced the page.
    ///
    /// The `next` link keeps every query parameter of `request_url` except
    /// `cursor` and `limit`, which are replaced by the effective values.
    ///
    /// # Examples
    /// ```
    /// use pagination::PaginationLinks;
    /// use url::Url;
    ///
    /// let url = Url::parse("http://localhost/items?limit=2").expect("url");
    /// let links = PaginationLinks::for_request(&url, 2, Some("abc"));
    /// assert_eq!(
    ///     links.next.as_deref(),
    ///     Some("http://localhost/items?limit=2&cursor=abc")
    /// );
    /// ```
    pub fn for_request(request_url: &Url, limit: usize, next_cursor: Option<&str>) -> Self {
        let next = next_cursor.map(|cursor| {
            let retained: Vec<(String, String)> = request_url
                .query_pairs()
                .filter(|(name, _)| name != "cursor" && name != "limit")
                .map(|(name, value)| (name.into_owned(), value.into_owned()))
                .collect();
            let mut next = request_url.clone();
            next.query_pairs_mut()
                .clear()
                .extend_pairs(retained)
                .append_pair("limit", &limit.to_string())
                .append_pair("cursor", cursor);
            next.to_string()
        });

        Self {
            self_: request_url.to_string(),
            next,
        }
    }
}

/// A page of items plus the metadata needed to fetch the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Items on this page, in collection order.
    pub data: Vec<T>,
    /// Effective page size used to produce `data`.
    pub limit: usize,
    /// Navigation links.
    pub links: PaginationLinks,
}

impl<T> Paginated<T> {
    /// Assemble an envelope.
    pub const fn new(data: Vec<T>, limit: usize, links: PaginationLinks) -> Self {
        Self { data, limit, links }
    }
}
