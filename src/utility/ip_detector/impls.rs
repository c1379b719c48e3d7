// Standard library
use std::sync::{Arc, Mutex};
use std::time::Duration;

// 3rd party crates
use async_trait::async_trait;
use futures::{stream::FuturesUnordered, StreamExt};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use reqwest::{header, Client, Response, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// Current module imports
use super::constants::{
    default_parallelism, CONTENT_TYPE_TEXT_PLAIN, DEFAULT_SERVICES, MAX_BODY_BYTES,
    REQUEST_TIMEOUT_SECS,
};
use super::errors::{FetchError, IpDetectionError, IpDetectionValidationError};
use super::functions::{matches_version, usable_endpoint};
use super::traits::IpFetcher;
use super::types::{
    DetectedIp, HttpFetcher, IpDetection, IpDetector, IpService, IpTask, IpVersion,
    ServiceCatalog,
};

impl Default for IpDetection {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
        }
    }
}

impl IpDetection {
    pub fn validate(&self) -> Result<(), IpDetectionValidationError> {
        if self.parallelism == 0 {
            return Err(IpDetectionValidationError::InvalidParallelism(
                "parallelism must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

impl IpVersion {
    fn wants_v4(self) -> bool {
        matches!(self, IpVersion::V4 | IpVersion::Any)
    }

    fn wants_v6(self) -> bool {
        matches!(self, IpVersion::V6 | IpVersion::Any)
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        let services = DEFAULT_SERVICES
            .iter()
            .map(|(v4, v6)| IpService {
                v4: v4.map(str::to_string),
                v6: v6.map(str::to_string),
            })
            .collect();
        Self { services }
    }
}

impl ServiceCatalog {
    pub fn new(services: Vec<IpService>) -> Self {
        Self { services }
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn validate(&self) -> Result<(), IpDetectionValidationError> {
        for (idx, service) in self.services.iter().enumerate() {
            if usable_endpoint(&service.v4).is_none() && usable_endpoint(&service.v6).is_none() {
                return Err(IpDetectionValidationError::EmptyService(idx));
            }
        }
        Ok(())
    }

    /// Expands the catalog into one task per usable endpoint, in catalog order.
    ///
    /// A dual-stack service yields two tasks when `version` is `Any`.
    pub fn eligible(&self, version: IpVersion) -> Vec<IpTask> {
        let mut tasks = Vec::new();
        for service in &self.services {
            if version.wants_v4() {
                if let Some(endpoint) = usable_endpoint(&service.v4) {
                    tasks.push(IpTask {
                        endpoint: endpoint.to_string(),
                        version: IpVersion::V4,
                    });
                }
            }
            if version.wants_v6() {
                if let Some(endpoint) = usable_endpoint(&service.v6) {
                    tasks.push(IpTask {
                        endpoint: endpoint.to_string(),
                        version: IpVersion::V6,
                    });
                }
            }
        }
        tasks
    }
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client: Client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            max_body_bytes: MAX_BODY_BYTES,
        })
    }

    /// Reads no more than `max_body_bytes` of the body.
    async fn read_limited(&self, mut response: Response, endpoint: &str) -> Result<String, FetchError> {
        let mut body: Vec<u8> = Vec::with_capacity(self.max_body_bytes);

        while body.len() < self.max_body_bytes {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let room = self.max_body_bytes - body.len();
                    body.extend_from_slice(&chunk[..chunk.len().min(room)]);
                }
                Ok(None) => break,
                // Timeouts and resets while streaming the body.
                Err(error) => {
                    return Err(FetchError::Transport {
                        endpoint: endpoint.to_string(),
                        error,
                    })
                }
            }
        }

        String::from_utf8(body).map_err(|e| FetchError::InvalidBody {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl IpFetcher for HttpFetcher {
    async fn fetch(&self, endpoint: &str, version: IpVersion) -> Result<String, FetchError> {
        let response = self
            .client
            .get(endpoint)
            .header(header::CONTENT_TYPE, CONTENT_TYPE_TEXT_PLAIN)
            .send()
            .await
            .map_err(|error| FetchError::Transport {
                endpoint: endpoint.to_string(),
                error,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::BadStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body = self.read_limited(response, endpoint).await?;
        let ip = body.trim();

        if !matches_version(ip, version) {
            return Err(FetchError::FamilyMismatch {
                endpoint: endpoint.to_string(),
                expected: version,
                body: ip.to_string(),
            });
        }

        Ok(ip.to_string())
    }
}

impl IpDetector {
    pub fn new(config: IpDetection, catalog: ServiceCatalog, fetcher: Arc<dyn IpFetcher>) -> Self {
        Self {
            config,
            catalog,
            fetcher,
            rng: Mutex::new(StdRng::from_entropy()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Creates a detector that queries the catalog over HTTP.
    pub fn with_http(config: IpDetection, catalog: ServiceCatalog) -> Result<Self, IpDetectionError> {
        let fetcher = HttpFetcher::new()?;
        Ok(Self::new(config, catalog, Arc::new(fetcher)))
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Eligible tasks for `version` in a fresh random order.
    pub fn tasks(&self, version: IpVersion) -> Vec<IpTask> {
        let mut tasks = self.catalog.eligible(version);
        match self.rng.lock() {
            Ok(mut rng) => tasks.shuffle(&mut *rng),
            Err(poisoned) => tasks.shuffle(&mut *poisoned.into_inner()),
        }
        tasks
    }

    /// Detects the public address using the configured parallelism.
    pub async fn detect_ip(&self, version: IpVersion) -> Result<DetectedIp, IpDetectionError> {
        self.race(version, self.config.parallelism).await
    }

    /// Queries the shuffled tasks with at most `parallelism` requests in
    /// flight and returns the first validated answer.
    pub async fn race(
        &self,
        version: IpVersion,
        parallelism: usize,
    ) -> Result<DetectedIp, IpDetectionError> {
        let tasks = self.tasks(version);
        if tasks.is_empty() {
            warn!("No services available for {} detection", version);
            return Err(IpDetectionError::NoAddressFound {
                version,
                attempted: 0,
            });
        }

        debug!(
            tasks = tasks.len(),
            parallelism, "Starting {} detection race", version
        );

        let race_token = self.shutdown.child_token();
        let mut queue = tasks.into_iter();
        let mut in_flight = FuturesUnordered::new();
        let mut attempted: usize = 0;

        for task in queue.by_ref().take(parallelism.max(1)) {
            attempted += 1;
            in_flight.push(self.run_task(task, race_token.clone()));
        }

        while let Some((task, outcome)) = in_flight.next().await {
            match outcome {
                Some(Ok(address)) if matches_version(&address, task.version) => {
                    // Drop the losers.
                    race_token.cancel();
                    info!(
                        endpoint = %task.endpoint,
                        "Public {} address detected: {}", task.version, address
                    );
                    return Ok(DetectedIp {
                        address,
                        version: task.version,
                    });
                }
                Some(Ok(address)) => {
                    debug!(
                        endpoint = %task.endpoint,
                        "Discarding {:?}, not an {} literal", address, task.version
                    );
                }
                Some(Err(e)) => {
                    debug!(endpoint = %task.endpoint, "Service failed: {}", e);
                }
                None => {
                    debug!("{} detection cancelled", version);
                    return Err(IpDetectionError::Cancelled(version));
                }
            }

            if let Some(next) = queue.next() {
                attempted += 1;
                in_flight.push(self.run_task(next, race_token.clone()));
            }
        }

        warn!("All {} services failed for {} detection", attempted, version);
        Err(IpDetectionError::NoAddressFound { version, attempted })
    }

    /// Runs one fetch unless the race is cancelled first.
    async fn run_task(
        &self,
        task: IpTask,
        token: CancellationToken,
    ) -> (IpTask, Option<Result<String, FetchError>>) {
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = self.fetcher.fetch(&task.endpoint, task.version) => Some(result),
        };
        (task, outcome)
    }
}
