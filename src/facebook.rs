pub mod api;
pub mod dto;
pub mod extractor;
pub mod model;

use api::NavigationError;
use async_trait::async_trait;
use model::RawEventCard;

/// Where the pipeline gets its raw event cards from
#[async_trait]
pub trait EventSource {
    /// Returns the cards found for every keyword, in encounter order
    async fn fetch_event_cards(
        &self,
        keywords: &[String],
        city: &str,
    ) -> Result<Vec<RawEventCard>, NavigationError>;
}
