// analyzer.rs
use crate::analyzer::page::{parse_page, powered_by};
use crate::analyzer::AnalyzerError;
use crate::domain::snapshot::{
    normalize_technologies, AnalysisReport, WebsiteQuality, WebsiteStatus,
};
use chrono::Utc;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, REFERER};
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use url::Url;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

/// Probes a website and reports its current state.
pub trait SiteAnalyzer: Send + Sync {
    fn analyze(&self, url: &str) -> Result<AnalysisReport, AnalyzerError>;
}

pub struct HttpSiteAnalyzer {
    client: Client,
    /// Used only after certificate validation failed, to read the page anyway.
    unverified: Client,
    timeout: Duration,
}

impl HttpSiteAnalyzer {
    pub fn new(timeout: Duration) -> Result<Self, AnalyzerError> {
        let build = |verify: bool| {
            Client::builder()
                .user_agent(USER_AGENT)
                .timeout(timeout)
                .redirect(reqwest::redirect::Policy::limited(10))
                .danger_accept_invalid_certs(!verify)
                .build()
                .map_err(|e| AnalyzerError::Client(e.to_string()))
        };

        Ok(Self {
            client: build(true)?,
            unverified: build(false)?,
            timeout,
        })
    }
}

impl SiteAnalyzer for HttpSiteAnalyzer {
    fn analyze(&self, raw_url: &str) -> Result<AnalysisReport, AnalyzerError> {
        let url = clean_url(raw_url)?;

        match self.probe(&self.client, &url) {
            Ok(report) => Ok(report),
            Err(e) if is_certificate_error(&e) => {
                tracing::debug!(%url, "certificate rejected, probing without verification: {e}");
                let mut report = match self.probe(&self.unverified, &url) {
                    Ok(report) => report,
                    Err(e) => self.failed_probe(e)?,
                };
                report.website_status.ssl_certificate = Some(false);
                Ok(report)
            }
            Err(e) => self.failed_probe(e),
        }
    }
}

impl HttpSiteAnalyzer {
    fn probe(&self, client: &Client, url: &Url) -> Result<AnalysisReport, reqwest::Error> {
        let start = Instant::now();

        let resp = client
            .get(url.clone())
            .header(REFERER, "https://www.google.com/")
            .send()?;

        let status = resp.status();
        let final_is_https = resp.url().scheme() == "https";
        let is_html = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("text/html"))
            .unwrap_or(false);
        let powered = resp
            .headers()
            .get("x-powered-by")
            .and_then(|v| v.to_str().ok())
            .and_then(powered_by);

        let body = resp.text()?;
        let load_time = start.elapsed().as_millis() as u64;
        let now = Utc::now();

        let accessible = status.is_success();
        // Error pages say nothing about the site's real stack.
        let signals = (accessible && is_html).then(|| parse_page(&body));
        let mobile_friendly = signals.as_ref().is_some_and(|s| s.mobile_friendly);

        let technologies = signals.as_ref().map(|s| {
            let mut names = s.technologies.clone();
            names.extend(powered);
            normalize_technologies(names)
        });

        tracing::debug!(
            %url,
            status = status.as_u16(),
            load_time,
            bytes = body.len(),
            "probed website"
        );

        Ok(AnalysisReport {
            website_status: WebsiteStatus {
                accessible,
                status_code: Some(status.as_u16()),
                error: (!accessible).then(|| format!("HTTP {}", status.as_u16())),
                load_time: Some(load_time),
                ssl_certificate: Some(final_is_https),
                mobile_friendly: signals.as_ref().map(|s| s.mobile_friendly),
                has_contact_form: signals.as_ref().map(|s| s.has_contact_form),
                has_email: signals.as_ref().map(|s| s.has_email),
                last_checked: Some(now),
            },
            website_quality: accessible
                .then(|| score_quality(load_time, body.len(), mobile_friendly)),
            technologies,
            analyzed_at: now,
        })
    }

    /// A host that cannot be reached is down, not unknown. Timeouts and other
    /// transport failures stay errors so the lead keeps its last snapshot.
    fn failed_probe(&self, e: reqwest::Error) -> Result<AnalysisReport, AnalyzerError> {
        if e.is_timeout() {
            Err(AnalyzerError::Timeout(self.timeout.as_secs()))
        } else if e.is_connect() {
            Ok(unreachable_report(error_chain(&e)))
        } else {
            Err(AnalyzerError::Network(e.to_string()))
        }
    }
}

/// Report for a site whose host refused or could not be resolved.
fn unreachable_report(error: String) -> AnalysisReport {
    let now = Utc::now();
    AnalysisReport {
        website_status: WebsiteStatus {
            accessible: false,
            status_code: None,
            error: Some(error),
            last_checked: Some(now),
            ..WebsiteStatus::default()
        },
        website_quality: None,
        technologies: None,
        analyzed_at: now,
    }
}

/// True when any error in the chain is a TLS certificate rejection.
fn is_certificate_error(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.to_string().to_ascii_lowercase().contains("certificate") {
            return true;
        }
        current = e.source();
    }
    false
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(e) = current {
        parts.push(e.to_string());
        current = e.source();
    }
    parts.join(": ")
}

/// Normalizes what users type into a probe-able URL: adds `https://` when no
/// scheme is given, drops the query string and a trailing slash.
pub fn clean_url(raw: &str) -> Result<Url, AnalyzerError> {
    let trimmed = raw.trim();
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| AnalyzerError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(AnalyzerError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing host".into(),
        });
    }

    url.set_query(None);
    url.set_fragment(None);
    if url.path().len() > 1 && url.path().ends_with('/') {
        let trimmed_path = url.path().trim_end_matches('/').to_string();
        url.set_path(&trimmed_path);
    }
    Ok(url)
}

/// Performance score out of 100: slow responses and heavy pages cost points.
pub fn score_quality(load_time_ms: u64, page_bytes: usize, mobile_friendly: bool) -> WebsiteQuality {
    let mut score: i64 = 100;
    let mut issues = Vec::new();

    if load_time_ms > 1_000 {
        // 10 points per started second beyond the first, at most 60.
        let penalty = (load_time_ms.saturating_sub(1_000).div_ceil(1_000) as i64 * 10).min(60);
        score -= penalty;
        issues.push(format!("Slow response ({load_time_ms} ms)"));
    }

    if page_bytes > 1_500_000 {
        score -= 20;
        issues.push("Very heavy page (over 1.5 MB of HTML)".to_string());
    } else if page_bytes > 500_000 {
        score -= 10;
        issues.push("Heavy page (over 500 KB of HTML)".to_string());
    }

    if !mobile_friendly {
        score -= 10;
        issues.push("No viewport meta tag".to_string());
    }

    WebsiteQuality {
        performance_score: score.clamp(0, 100),
        issues,
    }
}
