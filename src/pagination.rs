use axum::http::Uri;
use serde_aux::field_attributes::deserialize_option_number_from_string;
use validator::Validate;

use crate::{db::error::DatabaseError, error::Error};

const PAGE_PARAM: &str = "page";
pub const MAX_PAGE_SIZE: i64 = 100;

/// `?page=<n>&limit=<n>`, pages are 1-based.
#[derive(serde::Deserialize, serde::Serialize, Debug, Default, Validate)]
pub struct Pagination {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    #[validate(range(min = 1))]
    pub page: Option<i64>,

    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

/// Resolved window into a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn skip(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Whether rows remain after this page.
    fn has_more(&self, count: i64) -> bool {
        self.page
            .checked_mul(self.limit)
            .is_some_and(|end| end < count)
    }
}

impl Pagination {
    pub fn resolve(&self, default_page_size: i64) -> Result<PageRequest, Error> {
        self.validate().map_err(Error::Validation)?;

        let page = self.page.unwrap_or(1);
        let limit = self
            .limit
            .unwrap_or(default_page_size)
            .clamp(1, MAX_PAGE_SIZE);

        // an offset past i64 is past the end of any result set
        (page - 1)
            .checked_mul(limit)
            .ok_or(Error::Database(DatabaseError::NotFound))?;

        Ok(PageRequest { page, limit })
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Wraps one page of results. Asking for a page past the end is a 404,
    /// except for the first page of an empty result set.
    pub fn new(
        results: Vec<T>,
        count: i64,
        request: PageRequest,
        uri: &Uri,
        host: Option<&str>,
    ) -> Result<Self, Error> {
        if request.page > 1 && request.skip() >= count {
            return Err(Error::Database(DatabaseError::NotFound));
        }

        let next = request
            .has_more(count)
            .then(|| page_link(uri, host, Some(request.page + 1)));
        let previous = match request.page {
            1 => None,
            2 => Some(page_link(uri, host, None)),
            page => Some(page_link(uri, host, Some(page - 1))),
        };

        Ok(Page {
            count,
            next,
            previous,
            results,
        })
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// The request URL with its `page` parameter replaced (or dropped for the
/// first page). Other parameters keep their original encoding and order.
fn page_link(uri: &Uri, host: Option<&str>, page: Option<i64>) -> String {
    let mut params: Vec<String> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split('=').next() != Some(PAGE_PARAM))
        .map(str::to_string)
        .collect();

    if let Some(page) = page {
        params.push(format!("{}={}", PAGE_PARAM, page));
    }

    let mut link = match host {
        Some(host) => format!("http://{}{}", host, uri.path()),
        None => uri.path().to_string(),
    };
    if !params.is_empty() {
        link.push('?');
        link.push_str(&params.join("&"));
    }

    link
}
