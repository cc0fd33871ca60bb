use crate::config::CrawlConfig;
use crate::error::{Result, ScanError};
use crate::gate::Gate;
use crate::link::PageId;
use crate::result::{DeadReason, Liveness};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = "Outlink/0.1 (+https://github.com/outlink-rs/outlink)";

/// A page body as read off the wire.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Where the request landed after redirects. Relative links in `body`
    /// resolve against this, not the requested url.
    pub final_url: PageId,
    pub status_code: u16,
    pub body: String,
}

/// HTTP client wrapper with bounded retries and linear backoff.
pub struct Fetcher {
    client: Client,
    max_attempts: usize,
    backoff_unit: Duration,
}

impl Fetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout / 2)
            .pool_max_idle_per_host(config.max_concurrency)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            max_attempts: config.max_attempts,
            backoff_unit: config.backoff_unit,
        })
    }

    /// GET a page, retrying request-level failures.
    ///
    /// Non-2xx statuses are not failures here: the body is still returned
    /// and scanned for links. A gate slot is held only while a request is
    /// outstanding, never during backoff.
    pub async fn fetch(&self, gate: &Gate, page: &PageId) -> Result<FetchedPage> {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                let wait = self.backoff_unit * (attempt as u32 - 1);
                debug!(url = %page, attempt, wait_ms = wait.as_millis() as u64, "Backing off");
                tokio::time::sleep(wait).await;
            }

            let _permit = gate.acquire().await?;
            match self.get(page).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) => {
                    warn!(url = %page, attempt, error = %e, "Failed to fetch");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(source) => Err(ScanError::FetchExhausted {
                url: page.to_string(),
                attempts: self.max_attempts,
                source,
            }),
            None => Err(ScanError::Config(
                "retry count must be at least 1".to_string(),
            )),
        }
    }

    /// One unretried GET; anything but a 2xx answer is dead.
    pub async fn probe(&self, gate: &Gate, page: &PageId) -> Result<Liveness> {
        let _permit = gate.acquire().await?;

        let liveness = match self.client.get(page.as_str()).send().await {
            Ok(response) if response.status().is_success() => {
                Liveness::Alive(response.status().as_u16())
            }
            Ok(response) => Liveness::Dead(DeadReason::Status(response.status().as_u16())),
            Err(e) => Liveness::Dead(DeadReason::Transport(e.to_string())),
        };
        Ok(liveness)
    }

    async fn get(&self, page: &PageId) -> reqwest::Result<FetchedPage> {
        let response = self.client.get(page.as_str()).send().await?;
        let final_url = PageId::from_url(response.url().clone());
        let status_code = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchedPage {
            final_url,
            status_code,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn fast_config() -> CrawlConfig {
        CrawlConfig::new("127.0.0.1")
            .with_backoff_unit(Duration::from_millis(10))
            .with_request_timeout(Duration::from_millis(300))
    }

    /// A URL on a port nothing listens on.
    fn refused_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{}/gone", port)
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<a href=\"/\">home</a>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new(&fast_config()).unwrap();
        let gate = Gate::new(2);
        let page = PageId::parse(&format!("{}/missing", mock_server.uri())).unwrap();

        let fetched = fetcher.fetch(&gate, &page).await.unwrap();
        assert_eq!(fetched.status_code, 404);
        assert!(fetched.body.contains("href"));
        assert_eq!(fetched.final_url, page);
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_fetch_reports_url_after_redirects() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blog"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("location", format!("{}/blog/", mock_server.uri())),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/blog/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("index"))
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new(&fast_config()).unwrap();
        let gate = Gate::new(1);
        let page = PageId::parse(&format!("{}/blog", mock_server.uri())).unwrap();

        let fetched = fetcher.fetch(&gate, &page).await.unwrap();
        assert_eq!(fetched.body, "index");
        assert_eq!(fetched.final_url.as_str(), format!("{}/blog/", mock_server.uri()));
    }

    #[tokio::test]
    async fn test_fetch_retries_until_success() {
        let mock_server = MockServer::start().await;

        // The first two requests outlive the client timeout.
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_body_string("finally"))
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new(&fast_config()).unwrap();
        let gate = Gate::new(1);
        let page = PageId::parse(&format!("{}/slow", mock_server.uri())).unwrap();

        let fetched = fetcher.fetch(&gate, &page).await.unwrap();
        assert_eq!(fetched.body, "finally");

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_max_attempts() {
        let fetcher = Fetcher::new(&fast_config()).unwrap();
        let gate = Gate::new(1);
        let page = PageId::parse(&refused_url()).unwrap();

        let err = fetcher.fetch(&gate, &page).await.unwrap_err();
        match err {
            ScanError::FetchExhausted { attempts, url, .. } => {
                assert_eq!(attempts, 3);
                assert_eq!(url, page.to_string());
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_backoff_grows_linearly() {
        let config = fast_config()
            .with_backoff_unit(Duration::from_millis(50))
            .with_max_attempts(3);
        let fetcher = Fetcher::new(&config).unwrap();
        let gate = Gate::new(1);
        let page = PageId::parse(&refused_url()).unwrap();

        let started = std::time::Instant::now();
        assert!(fetcher.fetch(&gate, &page).await.is_err());
        // 50ms before attempt 2, 100ms before attempt 3.
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_probe_reports_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new(&fast_config()).unwrap();
        let gate = Gate::new(4);

        let ok = PageId::parse(&format!("{}/ok", mock_server.uri())).unwrap();
        assert_eq!(fetcher.probe(&gate, &ok).await.unwrap(), Liveness::Alive(200));

        let broken = PageId::parse(&format!("{}/broken", mock_server.uri())).unwrap();
        assert_eq!(
            fetcher.probe(&gate, &broken).await.unwrap(),
            Liveness::Dead(DeadReason::Status(500))
        );
    }

    #[tokio::test]
    async fn test_probe_reports_transport_errors() {
        let fetcher = Fetcher::new(&fast_config()).unwrap();
        let gate = Gate::new(1);
        let page = PageId::parse(&refused_url()).unwrap();

        match fetcher.probe(&gate, &page).await.unwrap() {
            Liveness::Dead(DeadReason::Transport(_)) => {}
            other => panic!("expected transport failure, got {:?}", other),
        }
        assert_eq!(gate.in_flight(), 0);
    }
}
