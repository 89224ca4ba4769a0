use ads_model::{Ad, AdError, AdId, GetAdsQuery, RequestId};

/// `CreateAdRequest{ RequestID, Ad }`.
#[derive(Debug, Clone)]
pub struct CreateAdRequest {
    pub request_id: RequestId,
    pub ad: Ad,
}

/// `CreateBatchAdRequest{ RequestID, Ads }`. Used only for
/// snapshot/replay restore.
#[derive(Debug, Clone)]
pub struct CreateBatchAdRequest {
    pub request_id: RequestId,
    pub ads: Vec<Ad>,
}

/// `GetAdRequest{ RequestID, GetAdRequest{...} }`. The inner
/// struct is [`GetAdsQuery`] here, to avoid a type named the same as its
/// own field.
#[derive(Debug, Clone)]
pub struct GetAdRequest {
    pub request_id: RequestId,
    pub query: GetAdsQuery,
}

/// The request kinds the runner accepts: handlers map 1:1 to
/// `Store` operations and never block on external I/O.
#[derive(Debug, Clone)]
pub enum RunnerRequest {
    CreateAd(CreateAdRequest),
    CreateBatchAd(CreateBatchAdRequest),
    GetAd(GetAdRequest),
}

impl RunnerRequest {
    pub fn request_id(&self) -> &RequestId {
        match self {
            RunnerRequest::CreateAd(r) => &r.request_id,
            RunnerRequest::CreateBatchAd(r) => &r.request_id,
            RunnerRequest::GetAd(r) => &r.request_id,
        }
    }
}

/// `CreateAdResponse{ AdID:string, Err }`. `ad_id` is the empty
/// string on `CreateBatchAdRequest` responses ("unused", per spec) and on
/// any error response, matching the original's zero-value convention.
#[derive(Debug, Clone)]
pub struct CreateAdResponse {
    pub ad_id: AdId,
    pub err: Option<AdError>,
}

impl CreateAdResponse {
    pub fn ok(ad_id: AdId) -> Self {
        Self { ad_id, err: None }
    }

    pub fn err(err: AdError) -> Self {
        Self {
            ad_id: AdId::new(""),
            err: Some(err),
        }
    }
}

/// `GetAdResponse{ Ads, Total, Err }`.
#[derive(Debug, Clone)]
pub struct GetAdResponse {
    pub ads: Vec<Ad>,
    pub total: i64,
    pub err: Option<AdError>,
}

impl GetAdResponse {
    pub fn ok(ads: Vec<Ad>, total: i64) -> Self {
        Self {
            ads,
            total,
            err: None,
        }
    }

    pub fn err(err: AdError) -> Self {
        Self {
            ads: Vec::new(),
            total: 0,
            err: Some(err),
        }
    }
}

/// The response kinds the runner produces, one per request kind.
#[derive(Debug, Clone)]
pub enum RunnerResponse {
    CreateAd(CreateAdResponse),
    GetAd(GetAdResponse),
}

impl RunnerResponse {
    /// Unwraps a `CreateAd` response, panicking if a caller mismatches
    /// request/response kinds — a programmer error, since `RunnerHandle`
    /// always pairs the two correctly.
    pub fn into_create_ad(self) -> CreateAdResponse {
        match self {
            RunnerResponse::CreateAd(r) => r,
            RunnerResponse::GetAd(_) => panic!("expected CreateAd response, got GetAd"),
        }
    }

    pub fn into_get_ad(self) -> GetAdResponse {
        match self {
            RunnerResponse::GetAd(r) => r,
            RunnerResponse::CreateAd(_) => panic!("expected GetAd response, got CreateAd"),
        }
    }
}
