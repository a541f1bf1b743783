use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use rama::{
    Service,
    error::{BoxError, ErrorContext as _},
    http::{Body, Method, Request, Response, Uri, body::util::BodyExt as _},
    telemetry::tracing,
};

use parking_lot::Mutex;
use tokio::{
    sync::{Semaphore, mpsc},
    task::JoinSet,
    time::Instant,
};

use crate::{
    client::new_web_client,
    config::{DispatchMode, LoadTestConfig},
    outcome::RequestOutcome,
    report::LoadTestReport,
    tally::Aggregator,
};


/// Run a load test using the default web client.
///
/// Returns once every request produced an outcome.
/// Failing requests never fail the run, only an invalid config does.
pub async fn run(config: &LoadTestConfig) -> Result<LoadTestReport, BoxError> {
    config.validate()?;
    let client = new_web_client().context("create load test web client")?;
    run_with_client(config, client).await
}

/// Run a load test, sending all requests via the given client.
pub async fn run_with_client<C>(
    config: &LoadTestConfig,
    client: C,
) -> Result<LoadTestReport, BoxError>
where
    C: Service<Request, Output = Response, Error: Into<BoxError>>,
{
    config.validate()?;

    let concurrency = config.effective_concurrency();
    tracing::info!(
        url = %config.url(),
        total = %config.total(),
        %concurrency,
        mode = %config.dispatch_mode(),
        timeout = ?config.request_timeout(),
        "start load test",
    );

    let target = Target {
        client: Arc::new(client),
        url: config.url().clone(),
        timeout: config.request_timeout(),
    };

    let start = Instant::now();
    let mut aggregator = match config.dispatch_mode() {
        DispatchMode::FanOut => fan_out(target, config.total(), concurrency).await,
        DispatchMode::WorkerPool => worker_pool(target, config.total(), concurrency).await,
    };
    aggregator.account_for_lost(config.total());
    let elapsed = start.elapsed();

    let report = aggregator.into_report(config.url().clone(), config.concurrency(), elapsed);
    tracing::info!(
        total = %report.total,
        successes = %report.successes,
        errors = %report.errors,
        ?elapsed,
        "load test finished",
    );

    Ok(report)
}

struct Target<C> {
    client: Arc<C>,
    url: Uri,
    timeout: Duration,
}

impl<C> Clone for Target<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            url: self.url.clone(),
            timeout: self.timeout,
        }
    }
}

impl<C> Target<C>
where
    C: Service<Request, Output = Response, Error: Into<BoxError>>,
{
    async fn send(&self) -> RequestOutcome {
        let outcome = match tokio::time::timeout(self.timeout, self.send_inner()).await {
            Ok(outcome) => outcome,
            Err(_) => RequestOutcome::transport(format!(
                "request timed out after {}",
                humantime::format_duration(self.timeout)
            )),
        };

        if let Some((class, message)) = outcome.error() {
            tracing::debug!(url = %self.url, %class, "request failed: {message}");
        }
        outcome
    }

    async fn send_inner(&self) -> RequestOutcome {
        let req = match Request::builder()
            .method(Method::GET)
            .uri(self.url.clone())
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(err) => return RequestOutcome::transport(format!("build GET request: {err}")),
        };

        let resp = match self.client.serve(req).await {
            Ok(resp) => resp,
            Err(err) => {
                let err: BoxError = err.into();
                return RequestOutcome::transport(err);
            }
        };

        // body is always drained, 200 included, and counts towards the timeout
        let (parts, body) = resp.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => return RequestOutcome::transport(format!("read response body: {err}")),
        };

        RequestOutcome::from_status(parts.status, || {
            String::from_utf8_lossy(&body).into_owned()
        })
    }
}

/// One task per request; a permit is acquired before spawning
/// so no more than `concurrency` tasks exist at any time.
async fn fan_out<C>(target: Target<C>, total: usize, concurrency: usize) -> Aggregator
where
    C: Service<Request, Output = Response, Error: Into<BoxError>>,
{
    let (outcome_tx, outcome_rx) = mpsc::channel(concurrency * 8);

    let dispatch = async move {
        let limit = Arc::new(Semaphore::new(concurrency));
        let mut tasks = JoinSet::new();

        for index in 0..total {
            let permit = match limit.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(err) => {
                    tracing::error!(%index, "stop dispatch: failed to acquire concurrency permit: {err}");
                    break;
                }
            };

            let target = target.clone();
            let outcome_tx = outcome_tx.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let outcome = target.send().await;
                if let Err(err) = outcome_tx.send(outcome).await {
                    tracing::debug!(%index, "failed to send request outcome: {err}");
                }
            });

            while let Some(result) = tasks.try_join_next() {
                log_task_failure(result);
            }
        }

        // the aggregator stops once the last sender is gone
        drop(outcome_tx);

        while let Some(result) = tasks.join_next().await {
            log_task_failure(result);
        }
    };

    let ((), aggregator) = tokio::join!(dispatch, aggregate(outcome_rx));
    aggregator
}

async fn aggregate(mut outcome_rx: mpsc::Receiver<RequestOutcome>) -> Aggregator {
    let mut aggregator = Aggregator::default();
    while let Some(outcome) = outcome_rx.recv().await {
        aggregator.record(outcome);
    }
    aggregator
}

/// `concurrency` workers, each running one request to completion
/// before claiming the next index.
async fn worker_pool<C>(target: Target<C>, total: usize, concurrency: usize) -> Aggregator
where
    C: Service<Request, Output = Response, Error: Into<BoxError>>,
{
    let aggregator = Arc::new(Mutex::new(Aggregator::default()));
    let next_index = Arc::new(AtomicUsize::new(0));

    let mut workers = JoinSet::new();
    for _ in 0..concurrency {
        let target = target.clone();
        let aggregator = aggregator.clone();
        let next_index = next_index.clone();

        workers.spawn(async move {
            while next_index.fetch_add(1, Ordering::Relaxed) < total {
                let outcome = target.send().await;
                aggregator.lock().record(outcome);
            }
        });
    }

    while let Some(result) = workers.join_next().await {
        log_task_failure(result);
    }

    std::mem::take(&mut *aggregator.lock())
}

fn log_task_failure(result: Result<(), tokio::task::JoinError>) {
    if let Err(err) = result {
        tracing::error!("request task failed: {err}");
    }
}
