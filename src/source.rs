//! TLE data sources.
//!
//! The tracker only needs "give me the TLE text for this group". The HTTP
//! source talks either to the product backend or straight to CelesTrak;
//! any `Fn(OrbitGroup) -> Result<String, TrackerError>` also works, which
//! is how tests inject canned data.

use std::time::Duration;

use log::info;

use crate::error::TrackerError;
use crate::regime::OrbitGroup;

pub const CELESTRAK_GP_URL: &str = "https://celestrak.org/NORAD/elements/gp.php";

pub trait TleSource: Send + Sync {
    fn fetch(&self, group: OrbitGroup) -> Result<String, TrackerError>;
}

impl<F> TleSource for F
where
    F: Fn(OrbitGroup) -> Result<String, TrackerError> + Send + Sync,
{
    fn fetch(&self, group: OrbitGroup) -> Result<String, TrackerError> {
        self(group)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// Product backend serving `GET {base_url}/satellites?group=<keyword>`.
    Backend { base_url: String },
    Celestrak,
}

impl Endpoint {
    pub fn url(&self, group: OrbitGroup) -> String {
        match self {
            Self::Backend { base_url } => format!(
                "{}/satellites?group={}",
                base_url.trim_end_matches('/'),
                group.keyword()
            ),
            Self::Celestrak => format!("{}?GROUP={}&FORMAT=tle", CELESTRAK_GP_URL, group.keyword()),
        }
    }
}

pub struct HttpTleSource {
    endpoint: Endpoint,
    agent: ureq::Agent,
}

impl HttpTleSource {
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { endpoint, agent }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl TleSource for HttpTleSource {
    fn fetch(&self, group: OrbitGroup) -> Result<String, TrackerError> {
        let url = self.endpoint.url(group);
        info!("requesting TLE group [{}] from {}", group.keyword(), url);

        let response = self.agent.get(&url).call()?;
        let body = response.into_string()?;
        if body.trim().is_empty() {
            return Err(TrackerError::EmptyResponse);
        }
        Ok(body)
    }
}
