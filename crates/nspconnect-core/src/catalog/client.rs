use std::sync::Arc;

use tracing::{debug, warn};

use super::IntentTypeKey;
use crate::auth::manager::Authorized;
use crate::auth::SessionManager;
use crate::endpoints::{intent_type_path, SEARCH_INTENT_TYPES_PATH};
use crate::error::NspError;
use crate::models::{IntentTypeDefinition, IntentTypeSearchRequest, IntentTypeSearchResponse, YangModule};
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Page size used by `list_intent_types`.
const DEFAULT_PAGE_SIZE: u32 = 300;

/// Hard stop for one search, independent of server-reported totals.
const DEFAULT_MAX_PAGES: u32 = 1000;

/// Progress through one paginated search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageCursor {
    page_number: u32,
    page_size: u32,
    fetched: u64,
}

impl PageCursor {
    fn new(page_size: u32) -> Self {
        Self {
            page_number: 0,
            page_size,
            fetched: 0,
        }
    }

    /// Record a received page and decide whether another one is needed.
    fn advance(&mut self, received: usize, reported_page_size: u32, total_count: u64) -> bool {
        self.fetched += received as u64;
        self.page_number += 1;
        received > 0 && reported_page_size == self.page_size && self.fetched < total_count
    }
}

pub struct IntentCatalog {
    session: Arc<SessionManager>,
    transport: Arc<dyn Transport>,
    default_page_size: u32,
    max_pages: u32,
}

impl IntentCatalog {
    pub fn new(session: Arc<SessionManager>) -> Self {
        let transport = session.transport();
        Self {
            session,
            transport,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_default_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Borrow the session's host and token for one request
    async fn authorize(&self) -> Result<Authorized, NspError> {
        self.session.authorized().await.map_err(|e| match e {
            NspError::NotConnected => NspError::Session,
            other => other,
        })
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, NspError> {
        let response = self.transport.send(request).await?;
        Ok(response.error_for_status()?)
    }

    /// List the whole catalog with the default page size
    pub async fn list_intent_types(&self) -> Result<Vec<IntentTypeKey>, NspError> {
        self.search_intent_types(self.default_page_size).await
    }

    /// Fetch every intent type, page by page, in server order.
    ///
    /// Paging continues while the server echoes the requested page size and
    /// the running count is below its reported total. At most `max_pages`
    /// pages are requested; hitting that bound returns what was collected.
    pub async fn search_intent_types(&self, page_size: u32) -> Result<Vec<IntentTypeKey>, NspError> {
        if page_size == 0 {
            return Err(NspError::InvalidArgument("page size must be positive".to_string()));
        }

        let mut cursor = PageCursor::new(page_size);
        let mut keys = Vec::new();

        loop {
            if cursor.page_number >= self.max_pages {
                warn!(
                    pages = cursor.page_number,
                    fetched = cursor.fetched,
                    "Intent type search stopped at page limit"
                );
                break;
            }

            let output = self.fetch_page(&cursor).await?.output;
            let received = output.intent_type.len();
            debug!(
                page = cursor.page_number,
                received,
                total = output.total_count,
                "Intent type page received"
            );

            keys.extend(output.intent_type.into_iter().map(IntentTypeKey::from));

            if !cursor.advance(received, output.page_size, output.total_count) {
                break;
            }
        }

        Ok(keys)
    }

    async fn fetch_page(&self, cursor: &PageCursor) -> Result<IntentTypeSearchResponse, NspError> {
        let auth = self.authorize().await?;
        let payload = serde_json::to_value(IntentTypeSearchRequest::new(
            cursor.page_number,
            cursor.page_size,
        ))
        .map_err(|e| NspError::Schema(format!("Failed to build search payload: {}", e)))?;

        let request = ApiRequest::post(&auth.host, SEARCH_INTENT_TYPES_PATH)
            .bearer_auth(auth.token.access_token())
            .json(payload);

        let response = self.send(request).await?;
        response
            .json()
            .map_err(|e| NspError::Schema(format!("Failed to parse intent type search response: {}", e)))
    }

    /// Fetch the YANG modules of the intent type named by `key` (`name_version`)
    pub async fn fetch_modules(&self, key: &str) -> Result<Vec<YangModule>, NspError> {
        let key: IntentTypeKey = key.parse()?;
        let auth = self.authorize().await?;

        let request = ApiRequest::get(&auth.host, intent_type_path(&key.name, key.version))
            .bearer_auth(auth.token.access_token());

        let response = self.send(request).await?;
        let definition: IntentTypeDefinition = response
            .json()
            .map_err(|e| NspError::Schema(format!("Failed to parse YANG modules response: {}", e)))?;

        debug!(
            intent_type = %key,
            modules = definition.intent_type.module.len(),
            "YANG modules fetched"
        );
        Ok(definition.intent_type.module)
    }
}
