use crate::api::error::ApiError;
use crate::api::generation::GenerationCounter;
use crate::api::traits::ListingApi;
use crate::api::types::ListingFilters;
use crate::models::Listing;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Result of asking the feed for more listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    /// A page arrived and this many listings were appended
    Appended(usize),
    /// Nothing left to fetch
    Exhausted,
    /// The response belonged to a superseded request and was dropped
    Discarded,
}

#[derive(Debug)]
struct FeedState {
    filters: ListingFilters,
    listings: Vec<Listing>,
    next_page: u32,
    exhausted: bool,
}

impl FeedState {
    fn fresh(filters: ListingFilters) -> Self {
        Self {
            filters,
            listings: Vec::new(),
            next_page: 1,
            exhausted: false,
        }
    }
}

/// Listings accumulated page by page ("load more" / infinite scroll)
#[derive(Debug)]
pub struct ListingFeed {
    generation: GenerationCounter,
    state: Mutex<FeedState>,
}

impl ListingFeed {
    pub fn new(filters: ListingFilters) -> Self {
        Self {
            generation: GenerationCounter::new(),
            state: Mutex::new(FeedState::fresh(filters)),
        }
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fetch the next page and append it, unless a newer request or a
    /// reset has happened in the meantime.
    pub async fn load_more<A>(&self, api: &A) -> Result<FeedOutcome, ApiError>
    where
        A: ListingApi + ?Sized,
    {
        let (ticket, filters, page) = {
            let state = self.state();
            if state.exhausted {
                return Ok(FeedOutcome::Exhausted);
            }
            (self.generation.begin(), state.filters.clone(), state.next_page)
        };

        debug!("Fetching listings page {}", page);
        let result = api.list_listings(&filters, page).await;

        let mut state = self.state();
        if !self.generation.is_current(ticket) {
            warn!("Dropping stale response for listings page {}", page);
            return Ok(FeedOutcome::Discarded);
        }

        // Envelopes may leave out their page number; the requested page is authoritative
        let fetched = result?;
        let count = fetched.items.len();
        state.exhausted = count == 0 || page >= fetched.total_pages;
        state.next_page = page + 1;
        state.listings.extend(fetched.items);
        Ok(FeedOutcome::Appended(count))
    }

    /// Start over with new filters; responses still in flight are ignored
    pub fn reset(&self, filters: ListingFilters) {
        let mut state = self.state();
        self.generation.invalidate();
        *state = FeedState::fresh(filters);
    }

    pub fn listings(&self) -> Vec<Listing> {
        self.state().listings.clone()
    }

    pub fn len(&self) -> usize {
        self.state().listings.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.state().exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::ListingSubmission;
    use crate::models::{BusinessHours, Page};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex as StdMutex};
    use tokio::sync::{oneshot, Mutex as AsyncMutex};

    fn listing(id: &str) -> Listing {
        serde_json::from_value(serde_json::json!({"_id": id, "name": id})).unwrap()
    }

    /// Serves `total_pages` pages of two listings each. When gated, the first
    /// call reports that it started and then waits to be released.
    struct PagedSource {
        total_pages: u32,
        numbered: bool,
        requested: StdMutex<Vec<u32>>,
        started: AsyncMutex<Option<oneshot::Sender<()>>>,
        release: AsyncMutex<Option<oneshot::Receiver<()>>>,
    }

    impl PagedSource {
        fn new(total_pages: u32) -> Self {
            Self {
                total_pages,
                numbered: true,
                requested: StdMutex::new(Vec::new()),
                started: AsyncMutex::new(None),
                release: AsyncMutex::new(None),
            }
        }

        /// Answers with an envelope that carries `totalPages` but no `page`
        fn unnumbered(total_pages: u32) -> Self {
            Self {
                numbered: false,
                ..Self::new(total_pages)
            }
        }
    }

    #[async_trait]
    impl ListingApi for PagedSource {
        async fn list_listings(&self, filters: &ListingFilters, page: u32) -> Result<Page<Listing>, ApiError> {
            self.requested.lock().unwrap().push(page);
            if !self.numbered {
                let body = serde_json::json!({
                    "listings": [{"_id": format!("p{}", page), "name": "Listing"}],
                    "totalPages": self.total_pages,
                    "total": self.total_pages,
                });
                return Ok(serde_json::from_value(body)?);
            }
            if let Some(started) = self.started.lock().await.take() {
                let _ = started.send(());
            }
            let release = self.release.lock().await.take();
            if let Some(release) = release {
                let _ = release.await;
            }

            let prefix = filters.search.clone().unwrap_or_default();
            Ok(Page {
                items: vec![
                    listing(&format!("{}{}a", prefix, page)),
                    listing(&format!("{}{}b", prefix, page)),
                ],
                page,
                total_pages: self.total_pages,
                total: u64::from(self.total_pages) * 2,
            })
        }

        async fn get_listing(&self, _id: &str) -> Result<Listing, ApiError> {
            unreachable!()
        }

        async fn create_listing(&self, _submission: ListingSubmission) -> Result<Listing, ApiError> {
            unreachable!()
        }

        async fn update_listing(&self, _id: &str, _submission: ListingSubmission) -> Result<Listing, ApiError> {
            unreachable!()
        }

        async fn delete_listing(&self, _id: &str) -> Result<(), ApiError> {
            unreachable!()
        }

        async fn listing_hours(&self, _id: &str) -> Result<BusinessHours, ApiError> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn test_pages_accumulate_until_exhausted() {
        let source = PagedSource::new(2);
        let feed = ListingFeed::new(ListingFilters::default());

        assert_eq!(feed.load_more(&source).await.unwrap(), FeedOutcome::Appended(2));
        assert_eq!(feed.load_more(&source).await.unwrap(), FeedOutcome::Appended(2));
        assert!(feed.is_exhausted());
        assert_eq!(feed.load_more(&source).await.unwrap(), FeedOutcome::Exhausted);

        let ids: Vec<_> = feed.listings().into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec!["1a", "1b", "2a", "2b"]);
    }

    #[tokio::test]
    async fn test_envelope_without_page_number_advances_by_request() {
        let source = PagedSource::unnumbered(3);
        let feed = ListingFeed::new(ListingFilters::default());

        for _ in 0..5 {
            if feed.load_more(&source).await.unwrap() == FeedOutcome::Exhausted {
                break;
            }
        }

        assert_eq!(*source.requested.lock().unwrap(), vec![1, 2, 3]);
        let ids: Vec<_> = feed.listings().into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
        assert!(feed.is_exhausted());
    }

    #[tokio::test]
    async fn test_response_arriving_after_reset_is_discarded() {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let source = Arc::new(PagedSource::new(5));
        *source.started.lock().await = Some(started_tx);
        *source.release.lock().await = Some(release_rx);

        let feed = Arc::new(ListingFeed::new(ListingFilters {
            search: Some("old-".to_string()),
            ..Default::default()
        }));

        let stale = {
            let feed = Arc::clone(&feed);
            let source = Arc::clone(&source);
            tokio::spawn(async move { feed.load_more(source.as_ref()).await })
        };

        started_rx.await.unwrap();
        feed.reset(ListingFilters {
            search: Some("new-".to_string()),
            ..Default::default()
        });
        release_tx.send(()).unwrap();

        assert_eq!(stale.await.unwrap().unwrap(), FeedOutcome::Discarded);
        assert_eq!(feed.len(), 0);

        assert_eq!(feed.load_more(source.as_ref()).await.unwrap(), FeedOutcome::Appended(2));
        assert_eq!(feed.listings()[0].id, "new-1a");
    }
}
