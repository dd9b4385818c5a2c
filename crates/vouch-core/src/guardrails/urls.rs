//! Hallucinated link detection.
//!
//! Each extracted URL is accepted when its host is allow-listed, or when it
//! is structurally valid and (if a verifier is configured) the verifier
//! confirms it. Everything else is flagged with a reason.
//!
//! The score is `accepted / total` over distinct URLs: a link repeated in
//! the response is checked and counted once.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::error::EvaluatorError;
use crate::evaluator::Evaluator;
use crate::types::{Category, EvaluationContext, EvaluationResult, Severity};

use super::patterns::extract_urls;
use super::UrlVerifier;

const NO_HALLUCINATED_URLS: &str = "no_hallucinated_urls";

/// Why a URL was not accepted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FlagReason {
    #[serde(rename = "malformed URL")]
    Malformed,
    #[serde(rename = "unreachable")]
    Unreachable,
    #[serde(rename = "verification failed")]
    VerificationFailed,
}

impl FlagReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagReason::Malformed => "malformed URL",
            FlagReason::Unreachable => "unreachable",
            FlagReason::VerificationFailed => "verification failed",
        }
    }
}

impl fmt::Display for FlagReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flags links that are malformed or fail verification.
#[derive(Clone)]
pub struct NoHallucinatedUrls {
    allowed_domains: Vec<String>,
    verifier: Option<Arc<dyn UrlVerifier>>,
    severity: Severity,
}

/// Check every http(s) link in the response.
pub fn no_hallucinated_urls() -> NoHallucinatedUrls {
    NoHallucinatedUrls {
        allowed_domains: Vec::new(),
        verifier: None,
        severity: Severity::Error,
    }
}

impl fmt::Debug for NoHallucinatedUrls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoHallucinatedUrls")
            .field("allowed_domains", &self.allowed_domains)
            .field("verifier", &self.verifier.is_some())
            .field("severity", &self.severity)
            .finish()
    }
}

impl NoHallucinatedUrls {
    /// Accept this domain and its subdomains without further checks.
    pub fn allow_domain(mut self, domain: impl Into<String>) -> Self {
        let domain = domain.into().trim().trim_start_matches('.').to_lowercase();
        if !domain.is_empty() {
            self.allowed_domains.push(domain);
        }
        self
    }

    pub fn allowed_domains<I, S>(self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        domains.into_iter().fold(self, |acc, d| acc.allow_domain(d))
    }

    /// Confirm structurally valid URLs with a caller-supplied check.
    pub fn verifier(mut self, verifier: impl UrlVerifier + 'static) -> Self {
        self.verifier = Some(Arc::new(verifier));
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Exact or subdomain match.
    fn is_allowed(&self, host: &str) -> bool {
        self.allowed_domains
            .iter()
            .any(|d| host == d || host.ends_with(&format!(".{}", d)))
    }

    /// Decide one URL. `None` means accepted.
    async fn check(&self, raw: &str) -> Option<FlagReason> {
        let parsed = Url::parse(raw).ok();
        let host = parsed
            .as_ref()
            .and_then(|u| u.host_str())
            .map(str::to_lowercase);

        if let Some(host) = &host {
            if self.is_allowed(host) {
                return None;
            }
        }

        let structurally_valid = host.as_deref().is_some_and(|h| h.contains('.'));
        if !structurally_valid {
            return Some(FlagReason::Malformed);
        }

        let verifier = self.verifier.as_ref()?;
        match verifier.verify(raw).await {
            Ok(true) => None,
            Ok(false) => Some(FlagReason::Unreachable),
            Err(e) => {
                tracing::warn!(url = raw, error = %e, "URL verifier failed");
                Some(FlagReason::VerificationFailed)
            }
        }
    }
}

#[async_trait]
impl Evaluator for NoHallucinatedUrls {
    fn name(&self) -> Option<&str> {
        Some(NO_HALLUCINATED_URLS)
    }

    async fn evaluate(
        &self,
        response: &str,
        _context: Option<&EvaluationContext>,
    ) -> Result<EvaluationResult, EvaluatorError> {
        let result = EvaluationResult::new(NO_HALLUCINATED_URLS, Category::Guardrail, self.severity)
            .with_threshold(1.0);

        let urls = extract_urls(response);
        if urls.is_empty() {
            return Ok(result
                .with_outcome(true, 1.0)
                .with_details("No URLs found")
                .with_entry("totalUrls", 0));
        }

        // Sequential on purpose: verifier calls never overlap.
        let mut flagged: Vec<(String, FlagReason)> = Vec::new();
        for url in &urls {
            if let Some(reason) = self.check(url).await {
                flagged.push((url.clone(), reason));
            }
        }

        let total = urls.len();
        let accepted = total - flagged.len();
        let score = accepted as f64 / total as f64;
        let pass = flagged.is_empty();

        let details = if pass {
            format!("All {} URLs accepted", total)
        } else {
            format!(
                "Flagged {} of {} URLs: {}",
                flagged.len(),
                total,
                flagged
                    .iter()
                    .map(|(url, reason)| format!("{} ({})", url, reason))
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        };

        let flagged_list: Vec<Value> = flagged
            .iter()
            .map(|(url, reason)| json!({ "url": url, "reason": reason.as_str() }))
            .collect();

        Ok(result
            .with_outcome(pass, score)
            .with_details(details)
            .with_entry("totalUrls", total)
            .with_entry("acceptedUrls", accepted)
            .with_entry("urls", urls)
            .with_entry("flagged", flagged_list))
    }
}
