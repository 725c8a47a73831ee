use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use lru::LruCache;
use parking_lot::Mutex;
use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::viewer::Prefetcher;

#[derive(Debug, Clone)]
pub struct Config {
    pub workers: usize,
    /// Number of warmed images kept in memory.
    pub capacity: usize,
    pub timeout: Duration,
    pub http_client: Option<Client>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: 2,
            capacity: 16,
            timeout: Duration::from_secs(30),
            http_client: None,
        }
    }
}

#[derive(Debug)]
pub struct Fetched {
    pub url: String,
    pub content_type: Option<String>,
    pub bytes: Arc<Vec<u8>>,
}

#[derive(Debug)]
pub struct ResultEntry {
    pub url: String,
    pub fetched: Option<Arc<Fetched>>,
    pub error: Option<anyhow::Error>,
}

struct Job {
    url: String,
    tx: Sender<ResultEntry>,
}

struct Inner {
    client: Client,
    jobs: Sender<Job>,
    stop: Sender<()>,
    warm: Mutex<LruCache<String, Arc<Fetched>>>,
    pending: Mutex<HashSet<String>>,
}

pub struct Manager {
    inner: Arc<Inner>,
    handles: Vec<thread::JoinHandle<()>>,
}

impl Manager {
    pub fn new(cfg: Config) -> Result<Self> {
        let workers = if cfg.workers == 0 { 2 } else { cfg.workers };
        let capacity = NonZeroUsize::new(cfg.capacity).unwrap_or(NonZeroUsize::MIN);

        let client = if let Some(client) = cfg.http_client.clone() {
            client
        } else {
            Client::builder()
                .timeout(cfg.timeout)
                .build()
                .context("prefetch: build http client")?
        };

        let (job_tx, job_rx) = unbounded();
        let (stop_tx, stop_rx) = unbounded();

        let inner = Arc::new(Inner {
            client,
            jobs: job_tx,
            stop: stop_tx,
            warm: Mutex::new(LruCache::new(capacity)),
            pending: Mutex::new(HashSet::new()),
        });

        let mut handles = Vec::new();
        for _ in 0..workers {
            let rx_jobs = job_rx.clone();
            let rx_stop = stop_rx.clone();
            let worker_inner = inner.clone();
            handles.push(thread::spawn(move || worker_inner.worker(rx_jobs, rx_stop)));
        }

        Ok(Self { inner, handles })
    }

    /// Queue a download. Already warm or pending URLs resolve without another
    /// request; the receiver may be dropped.
    pub fn enqueue(&self, url: &str) -> Receiver<ResultEntry> {
        let (tx, rx) = unbounded();
        let url = url.trim().to_string();

        if let Some(hit) = self.inner.warm.lock().get(&url).cloned() {
            let _ = tx.send(ResultEntry {
                url,
                fetched: Some(hit),
                error: None,
            });
            return rx;
        }
        if !self.inner.pending.lock().insert(url.clone()) {
            debug!(%url, "prefetch already pending");
            let _ = tx.send(ResultEntry {
                url,
                fetched: None,
                error: None,
            });
            return rx;
        }

        let _ = self.inner.jobs.send(Job { url, tx });
        rx
    }

    pub fn get(&self, url: &str) -> Option<Arc<Fetched>> {
        self.inner.warm.lock().get(url.trim()).cloned()
    }

    pub fn warm_len(&self) -> usize {
        self.inner.warm.lock().len()
    }

    /// Stop the workers without waiting for downloads already in progress.
    pub fn detach(mut self) {
        for _ in &self.handles {
            let _ = self.inner.stop.send(());
        }
        self.handles.clear();
    }

    fn shutdown(&mut self) {
        for _ in &self.handles {
            let _ = self.inner.stop.send(());
        }
        while let Some(handle) = self.handles.pop() {
            let _ = handle.join();
        }
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Prefetcher for Manager {
    fn prefetch(&self, url: &str) {
        drop(self.enqueue(url));
    }
}

impl Inner {
    fn worker(&self, jobs: Receiver<Job>, stop: Receiver<()>) {
        loop {
            crossbeam_channel::select! {
                recv(stop) -> _ => break,
                recv(jobs) -> msg => {
                    match msg {
                        Ok(job) => self.process(job),
                        Err(_) => break,
                    }
                }
            }
        }
    }

    fn process(&self, job: Job) {
        let result = match self.fetch(&job.url) {
            Ok(fetched) => {
                let fetched = Arc::new(fetched);
                self.warm.lock().put(job.url.clone(), fetched.clone());
                ResultEntry {
                    url: job.url.clone(),
                    fetched: Some(fetched),
                    error: None,
                }
            }
            Err(err) => {
                warn!(url = %job.url, error = %err, "prefetch failed");
                ResultEntry {
                    url: job.url.clone(),
                    fetched: None,
                    error: Some(err),
                }
            }
        };
        self.pending.lock().remove(&job.url);
        let _ = job.tx.send(result);
    }

    fn fetch(&self, url: &str) -> Result<Fetched> {
        if url.is_empty() {
            return Err(anyhow!("prefetch: url required"));
        }

        let response = self
            .client
            .get(url)
            .send()
            .context("prefetch: download")?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(anyhow!("prefetch: request failed: {}", status));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|val| val.to_str().ok())
            .map(|s| s.to_string());
        let bytes = response.bytes().context("prefetch: body")?.to_vec();
        debug!(url, size = bytes.len(), "prefetched");

        Ok(Fetched {
            url: url.to_string(),
            content_type,
            bytes: Arc::new(bytes),
        })
    }
}
