//! Outcome aggregation
//!
//! Folds one write response and/or a sequence of read pages into a single
//! reportable result.
//!
//! For paginated reads `success` is a latch: once any page fails it stays
//! false, while `status` keeps following the most recent page.

use futures::TryStreamExt;
use tracing::{debug, warn};

use crate::errors::StoreResult;
use crate::store::{Document, FeedPage, FeedStream, StatusCode, StoreResponse};

/// Keys the store injects into every returned document
pub const SYSTEM_PROPERTIES: [&str; 5] = ["_rid", "_self", "_etag", "_attachments", "_ts"];

/// Which success rule applies to a single write response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Delete,
}

impl WriteKind {
    pub fn is_success(self, status: StatusCode) -> bool {
        match self {
            Self::Create => status == StatusCode::CREATED || status == StatusCode::OK,
            Self::Delete => status == StatusCode::NO_CONTENT || status == StatusCode::OK,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationOutcome {
    pub success: bool,
    pub status: StatusCode,
    pub request_charge: f64,
    /// Retrieved documents; `None` unless a read ran
    pub items: Option<Vec<Document>>,
}

impl OperationOutcome {
    /// Outcome of a single create or delete response
    pub fn from_response(kind: WriteKind, response: &StoreResponse) -> Self {
        Self {
            success: kind.is_success(response.status),
            status: response.status,
            request_charge: response.request_charge,
            items: None,
        }
    }

    /// Outcome of a response that stopped the request before its action ran
    pub fn aborted(response: &StoreResponse) -> Self {
        Self {
            success: false,
            status: response.status,
            request_charge: response.request_charge,
            items: None,
        }
    }

    /// Starting point for a read that has no preceding write
    pub fn seed() -> Self {
        Self {
            success: true,
            status: StatusCode::OK,
            request_charge: 0.0,
            items: None,
        }
    }

    /// Prepare to collect read results
    pub fn begin_read(mut self) -> Self {
        self.items.get_or_insert_with(Vec::new);
        self
    }

    /// Fold one page into the outcome
    pub fn absorb(mut self, page: FeedPage) -> Self {
        self.request_charge += page.request_charge;
        if !page.status.is_success() {
            warn!(status = %page.status, "Result page reported failure");
            self.success = false;
        }
        self.status = page.status;

        let items = self.items.get_or_insert_with(Vec::new);
        items.extend(page.documents.into_iter().map(strip_system_properties));
        self
    }
}

/// Remove store-injected metadata, keeping only user fields
pub fn strip_system_properties(mut document: Document) -> Document {
    for key in SYSTEM_PROPERTIES {
        document.remove(key);
    }
    document
}

/// Consume every page in order, folding each onto `seed`.
///
/// Pages are requested one at a time; a transport error stops the fold.
pub async fn fold_pages(
    seed: OperationOutcome,
    pages: FeedStream<'_>,
) -> StoreResult<OperationOutcome> {
    let outcome = pages
        .try_fold(seed.begin_read(), |outcome, page| async move {
            debug!(
                status = %page.status,
                charge = page.request_charge,
                documents = page.documents.len(),
                "Received result page"
            );
            Ok(outcome.absorb(page))
        })
        .await?;
    Ok(outcome)
}
