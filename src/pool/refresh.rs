//! Build a fresh pool for one bucket from the problem catalog.
use super::{Candidate, Pool};
use crate::bucket::Bucket;
use crate::catalog::{CatalogQuery, ProblemCatalog};
use crate::error::ExamError;
use crate::util::now_epoch_ms;
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct RefreshOptions {
    pub tags: Vec<String>,
    pub max_pages: u32,
    pub page_size: u32,
}

#[derive(Debug)]
pub struct RefreshOutcome {
    pub pool: Pool,
    pub pages_fetched: u32,
    /// Set when a page query failed; items from earlier pages are kept.
    pub aborted: Option<ExamError>,
}

/// Query the catalog page by page until a short page or `max_pages`, then
/// normalize the collected items into a pool.
///
/// A failed page stops pagination for this bucket only.
pub fn refresh_pool(
    catalog: &dyn ProblemCatalog,
    bucket: &Bucket,
    options: &RefreshOptions,
) -> Result<RefreshOutcome> {
    let tags: Vec<String> = options
        .tags
        .iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect();
    let mut collected: Vec<Candidate> = Vec::new();
    let mut pages_fetched = 0;
    let mut aborted = None;

    for page in 1..=options.max_pages {
        let query = CatalogQuery {
            range: bucket.range,
            tags: &tags,
            page,
            page_size: options.page_size,
        };
        match catalog.search(&query) {
            Ok(result) => {
                pages_fetched += 1;
                let returned = result.items.len();
                tracing::debug!(
                    bucket = %bucket.name,
                    page,
                    returned,
                    total = ?result.total_count,
                    "catalog page fetched"
                );
                collected.extend(result.items);
                if returned < options.page_size as usize {
                    break;
                }
            }
            Err(err) => {
                tracing::warn!(bucket = %bucket.name, page, error = %err, "catalog query failed");
                aborted = Some(err);
                break;
            }
        }
    }

    let pool = Pool::new(bucket.clone(), tags, now_epoch_ms()?, collected)?;
    tracing::info!(
        bucket = %bucket.name,
        items = pool.len(),
        pages_fetched,
        "pool refreshed"
    );
    Ok(RefreshOutcome {
        pool,
        pages_fetched,
        aborted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::canonical_bucket;
    use crate::catalog::CatalogPage;
    use std::cell::RefCell;

    /// Serves fixed pages and records every query it receives.
    struct ScriptedCatalog {
        pages: Vec<Result<Vec<Candidate>, String>>,
        seen: RefCell<Vec<(String, u32)>>,
    }

    impl ProblemCatalog for ScriptedCatalog {
        fn search(&self, query: &CatalogQuery<'_>) -> Result<CatalogPage, ExamError> {
            self.seen
                .borrow_mut()
                .push((query.query_string(), query.page));
            match self.pages.get(query.page as usize - 1) {
                Some(Ok(items)) => Ok(CatalogPage {
                    items: items.clone(),
                    total_count: None,
                }),
                Some(Err(reason)) => Err(ExamError::CatalogQueryFailed {
                    page: query.page,
                    reason: reason.clone(),
                }),
                None => Ok(CatalogPage {
                    items: Vec::new(),
                    total_count: None,
                }),
            }
        }
    }

    fn page(ids: &[u64]) -> Vec<Candidate> {
        ids.iter().map(|id| Candidate::new(*id, "p", 1)).collect()
    }

    fn options(max_pages: u32, page_size: u32) -> RefreshOptions {
        RefreshOptions {
            tags: vec![" graph ".to_string(), String::new(), "dp".to_string()],
            max_pages,
            page_size,
        }
    }

    #[test]
    fn stops_on_short_page_and_normalizes_items() {
        let catalog = ScriptedCatalog {
            pages: vec![Ok(page(&[9, 3])), Ok(page(&[3])), Ok(page(&[1, 2]))],
            seen: RefCell::new(Vec::new()),
        };
        let bucket = canonical_bucket("veasy").expect("veasy");
        let outcome = refresh_pool(&catalog, &bucket, &options(5, 2)).expect("refresh");
        assert_eq!(outcome.pages_fetched, 2);
        assert!(outcome.aborted.is_none());
        let ids: Vec<u64> = outcome.pool.items.iter().map(|c| c.problem_id).collect();
        assert_eq!(ids, [3, 9]);
        assert_eq!(outcome.pool.tags, ["graph", "dp"]);
        let seen = catalog.seen.borrow();
        assert_eq!(seen[0].0, "tier:1..3 tag:graph tag:dp");
        assert_eq!(seen.iter().map(|(_, p)| *p).collect::<Vec<_>>(), [1, 2]);
    }

    #[test]
    fn page_ceiling_bounds_pagination() {
        let catalog = ScriptedCatalog {
            pages: vec![Ok(page(&[1, 2])), Ok(page(&[3, 4])), Ok(page(&[5, 6]))],
            seen: RefCell::new(Vec::new()),
        };
        let bucket = canonical_bucket("mid").expect("mid");
        let outcome = refresh_pool(&catalog, &bucket, &options(2, 2)).expect("refresh");
        assert_eq!(outcome.pages_fetched, 2);
        assert_eq!(outcome.pool.len(), 4);
    }

    #[test]
    fn failed_page_keeps_earlier_items() {
        let catalog = ScriptedCatalog {
            pages: vec![Ok(page(&[5, 4])), Err("status 503".to_string())],
            seen: RefCell::new(Vec::new()),
        };
        let bucket = canonical_bucket("hard").expect("hard");
        let outcome = refresh_pool(&catalog, &bucket, &options(3, 2)).expect("refresh");
        assert_eq!(outcome.pool.len(), 2);
        assert!(matches!(
            outcome.aborted,
            Some(ExamError::CatalogQueryFailed { page: 2, .. })
        ));
        assert_eq!(catalog.seen.borrow().len(), 2);
    }
}
