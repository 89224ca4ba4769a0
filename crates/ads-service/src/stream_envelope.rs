use ads_model::{Ad, RequestId};
use serde::{Deserialize, Serialize};

/// The wire shape of a stream entry's payload: a
/// `CreateAdRequest{ RequestID, Ad }`, JSON-encoded. Carrying the original
/// request id alongside the ad is what lets the replay loop log which
/// request produced a given entry without guessing from the ad alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdStreamEvent {
    pub request_id: RequestId,
    pub ad: Ad,
}
