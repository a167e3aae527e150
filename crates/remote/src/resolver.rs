use crate::codec::BuiltinCodec;
use crate::config::RemoteConfig;
use crate::error::{FontFetchError, ResolverBuildError};
use crate::stylesheet::{extract_font_url, stylesheet_request_url};
use fontweave_cache::FontCache;
use fontweave_retry::{RetryConfig, RetryError, RetryNotice, RetryPolicy};
use fontweave_traits::FontCodec;
use fontweave_types::{ContainerFormat, FontRequirement, SharedFontData};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Fetches fonts from the remote font-serving API into the shared cache.
pub struct RemoteFontResolver {
    client: reqwest::Client,
    stylesheet_url: Url,
    request_timeout: Duration,
    cache: Arc<FontCache>,
    codec: Arc<dyn FontCodec>,
    retry: RetryPolicy<FontFetchError>,
}

impl RemoteFontResolver {
    pub fn new(config: &RemoteConfig, retry: RetryConfig, cache: Arc<FontCache>) -> Result<Self, ResolverBuildError> {
        let stylesheet_url = Url::parse(&config.stylesheet_url)?;
        let mut builder = reqwest::Client::builder();
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        // The per-call bound lives on each request, so the policy itself
        // never needs a whole-attempt timeout.
        let retry = RetryPolicy::new(RetryConfig {
            timeout_ms: None,
            ..retry
        })
        .with_should_retry(FontFetchError::is_transient);

        Ok(Self {
            client: builder.build()?,
            stylesheet_url,
            request_timeout: Duration::from_millis(config.request_timeout_ms.max(1)),
            cache,
            codec: Arc::new(BuiltinCodec),
            retry,
        })
    }

    /// Replaces the codec used for compressed containers.
    pub fn with_codec(mut self, codec: Arc<dyn FontCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn cache(&self) -> &Arc<FontCache> {
        &self.cache
    }

    pub async fn resolve(&self, requirement: &FontRequirement) -> Result<SharedFontData, FontFetchError> {
        self.resolve_with(requirement, |_: &RetryNotice<'_, FontFetchError>| {}).await
    }

    /// Resolves one face, consulting the cache first. `on_retry` observes
    /// each scheduled retry.
    pub async fn resolve_with<N>(
        &self,
        requirement: &FontRequirement,
        on_retry: N,
    ) -> Result<SharedFontData, FontFetchError>
    where
        N: FnMut(&RetryNotice<'_, FontFetchError>) + Send,
    {
        let key = requirement.key();
        if let Some(entry) = self.cache.get_entry(&key) {
            log::debug!("Serving {} from cache (stored {})", key, entry.inserted_at.to_rfc3339());
            return Ok(entry.bytes);
        }

        log::info!("Fetching remote font {}", key);
        let bytes = self
            .retry
            .execute_with(|_| self.fetch_once(requirement), on_retry)
            .await
            .map_err(|err| match err {
                RetryError::Aborted(e) => e,
                RetryError::Exhausted { attempts, last } => FontFetchError::RetryExhausted {
                    attempts,
                    last: Box::new(last),
                },
            })?;

        let bytes: SharedFontData = Arc::new(bytes);
        self.cache.insert(key.clone(), Arc::clone(&bytes));
        log::debug!("Cached {} ({} bytes)", key, bytes.len());
        Ok(bytes)
    }

    async fn fetch_once(&self, requirement: &FontRequirement) -> Result<Vec<u8>, FontFetchError> {
        let css_url = stylesheet_request_url(
            &self.stylesheet_url,
            &requirement.family,
            requirement.weight,
            requirement.style,
        );
        let (status, body) = self.get(&css_url).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(FontFetchError::NotFound {
                family: requirement.family.clone(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(status_error(&css_url, status));
        }

        let css = String::from_utf8_lossy(&body);
        let font_url = extract_font_url(&css, &css_url).ok_or_else(|| {
            FontFetchError::Parse(format!("no src url in stylesheet for '{}'", requirement.family))
        })?;

        let (status, font) = self.get(&font_url).await?;
        if !status.is_success() {
            return Err(status_error(&font_url, status));
        }

        let format = ContainerFormat::sniff(&font);
        if format.is_compressed() {
            log::debug!("Decoding {} via {} codec", format.name(), self.codec.name());
            return Ok(self.codec.decompress(format, &font).await?);
        }
        match format {
            ContainerFormat::Unknown => Err(FontFetchError::Parse(format!(
                "unrecognised font container from {}",
                font_url
            ))),
            _ => Ok(font),
        }
    }

    /// One time-bounded GET, returning the status and full body.
    async fn get(&self, url: &Url) -> Result<(StatusCode, Vec<u8>), FontFetchError> {
        let request = async {
            let response = self.client.get(url.clone()).send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body.to_vec()))
        };

        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) if e.is_timeout() => Err(self.timeout_error(url)),
            Ok(Err(e)) => Err(FontFetchError::Network {
                url: url.to_string(),
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            }),
            Err(_) => Err(self.timeout_error(url)),
        }
    }

    fn timeout_error(&self, url: &Url) -> FontFetchError {
        FontFetchError::NetworkTimeout {
            target: url.to_string(),
            after_ms: self.request_timeout.as_millis() as u64,
        }
    }
}

fn status_error(url: &Url, status: StatusCode) -> FontFetchError {
    FontFetchError::Network {
        url: url.to_string(),
        status: Some(status.as_u16()),
        message: format!("HTTP {}", status),
    }
}

impl std::fmt::Debug for RemoteFontResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteFontResolver")
            .field("stylesheet_url", &self.stylesheet_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .field("codec", &self.codec.name())
            .field("retry", &self.retry)
            .finish()
    }
}
