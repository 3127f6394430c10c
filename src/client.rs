use crate::state::Update;
use crate::types::{ParkingSnapshot, SpotMap};
use failure::Error;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use url::Url;

/// The two status resources the backend exposes. They describe the same lot
/// in different shapes and are kept apart on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Aggregate counters plus a list of spots.
    Dashboard,
    /// Map of spot number to status and plate.
    SpotMap,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Dashboard => "get_parking_status",
            Endpoint::SpotMap => "api/parking/status",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path())
    }
}

#[derive(Clone)]
pub struct StatusClient {
    http: reqwest::Client,
    base: Url,
}

impl StatusClient {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(StatusClient { http, base })
    }

    pub async fn fetch(&self, endpoint: Endpoint) -> Result<Update, Error> {
        let value = self.get_json(endpoint).await?;
        Ok(match endpoint {
            Endpoint::Dashboard => Update::Snapshot(ParkingSnapshot::from_json(&value)?),
            Endpoint::SpotMap => Update::SpotMap(SpotMap::from_json(&value)?),
        })
    }

    async fn get_json(&self, endpoint: Endpoint) -> Result<Value, Error> {
        let url = self.base.join(endpoint.path())?;
        let value = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(value)
    }
}
