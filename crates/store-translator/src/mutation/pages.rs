//! Lazy page sequence over a paginated remote query.
//!
//! [`pages`] issues the query on first poll, then follows the continuation
//! cursor of each page until a page reports `done`. The stream is finite,
//! cannot be restarted, and ends after yielding the first error.

use futures::stream::{self, Stream};
use tracing::debug;

use crate::core::traits::{QueryPage, RemoteStore};
use crate::error::{Result, TranslateError};

enum PageState {
    Query(String),
    Next(String),
    Exhausted,
}

impl PageState {
    fn after(page: &QueryPage) -> Result<Self> {
        if page.done {
            return Ok(PageState::Exhausted);
        }
        match &page.cursor {
            Some(cursor) => Ok(PageState::Next(cursor.clone())),
            None => Err(TranslateError::remote(
                "fetch-next-page",
                "page is not done but carries no cursor",
            )),
        }
    }
}

async fn advance(
    store: &dyn RemoteStore,
    state: PageState,
    page_size: usize,
) -> Result<Option<(QueryPage, PageState)>> {
    let page = match state {
        PageState::Query(statement) => {
            debug!("Issuing query: {}", statement);
            store.query(&statement, page_size).await?
        }
        PageState::Next(cursor) => {
            debug!("Fetching next page with cursor {}", cursor);
            store.fetch_next_page(&cursor, page_size).await?
        }
        PageState::Exhausted => return Ok(None),
    };
    let next = PageState::after(&page)?;
    Ok(Some((page, next)))
}

/// Stream the pages of `statement`, `page_size` records at a time.
pub fn pages<'a>(
    store: &'a dyn RemoteStore,
    statement: String,
    page_size: usize,
) -> impl Stream<Item = Result<QueryPage>> + 'a {
    stream::try_unfold(PageState::Query(statement), move |state| {
        advance(store, state, page_size)
    })
}
