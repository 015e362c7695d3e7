use crate::decoder::decode_text;
use crate::error::{ClientError, ClientResult};
use crate::protocol::{AgentRunResponse, RunRequest};
use crate::transport::Transport;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::Method;
use reqwest::header::HeaderMap;
use std::future::Future;
use tokio::sync::watch;
use tracing::{debug, instrument, trace};

/// Lazy sequence of decoded text fragments from one streaming run.
pub type FragmentStream = BoxStream<'static, ClientResult<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Full content of a buffered run.
    Content(String),
    /// A streaming run drained to completion. The text went to the sink.
    Streamed { fragments: usize },
}

/// Fires cancellation for the paired [`AbortSignal`].
#[derive(Clone)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }
}

pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    /// Resolves once the handle fires. Never resolves if every handle is
    /// dropped without firing.
    pub async fn aborted(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

pub fn abort_pair() -> (AbortHandle, AbortSignal) {
    let (tx, rx) = watch::channel(false);
    (AbortHandle { tx }, AbortSignal { rx })
}

/// Agent endpoints, including the run coordinator. Holds no per-run state.
#[derive(Clone)]
pub struct AgentsApi {
    transport: Transport,
}

impl AgentsApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub async fn list(&self) -> ClientResult<Vec<String>> {
        self.transport
            .json::<(), _>(Method::GET, "/v1/agents", None)
            .await
    }

    /// Runs `request` in the mode it asks for.
    ///
    /// Buffered runs return the content and never touch `sink`. Streaming
    /// runs deliver every fragment to `sink` in arrival order and return
    /// only the fragment count once the body is fully drained.
    pub async fn run<F, Fut>(
        &self,
        agent_id: &str,
        request: &RunRequest,
        sink: F,
    ) -> ClientResult<RunOutcome>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = ()>,
    {
        validate(request)?;

        if request.stream {
            let fragments = self.drain(agent_id, request, sink, None).await?;
            Ok(RunOutcome::Streamed { fragments })
        } else {
            let response: AgentRunResponse = self
                .transport
                .json(Method::POST, &runs_path(agent_id), Some(request))
                .await?;
            Ok(RunOutcome::Content(response.content))
        }
    }

    /// Streams `request` into `sink`. The outgoing payload always carries
    /// `stream: true`, whatever the request says.
    pub async fn run_stream<F, Fut>(
        &self,
        agent_id: &str,
        request: &RunRequest,
        sink: F,
    ) -> ClientResult<()>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = ()>,
    {
        self.drain(agent_id, request, sink, None).await?;
        Ok(())
    }

    /// Like [`run_stream`](Self::run_stream), but stops with
    /// `ClientError::Cancelled` as soon as `abort` fires, releasing the body.
    pub async fn run_stream_with_abort<F, Fut>(
        &self,
        agent_id: &str,
        request: &RunRequest,
        sink: F,
        abort: AbortSignal,
    ) -> ClientResult<()>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = ()>,
    {
        self.drain(agent_id, request, sink, Some(abort)).await?;
        Ok(())
    }

    /// Issues a streaming run and hands back the undrained fragment stream.
    ///
    /// Dropping the stream abandons the run and releases the response body.
    pub async fn open_stream(
        &self,
        agent_id: &str,
        request: &RunRequest,
    ) -> ClientResult<FragmentStream> {
        validate(request)?;

        if !request.stream {
            debug!(agent = agent_id, "forcing stream=true on run payload");
        }
        let payload = RunRequest {
            stream: true,
            ..request.clone()
        };

        let response = self
            .transport
            .send(
                Method::POST,
                &runs_path(agent_id),
                Some(&payload),
                HeaderMap::new(),
            )
            .await?;

        Ok(decode_text(Box::pin(response.bytes_stream())).boxed())
    }

    #[instrument(skip_all, fields(agent = agent_id))]
    async fn drain<F, Fut>(
        &self,
        agent_id: &str,
        request: &RunRequest,
        mut sink: F,
        mut abort: Option<AbortSignal>,
    ) -> ClientResult<usize>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = ()>,
    {
        debug!("requesting");
        let opened = self.open_stream(agent_id, request);
        let mut fragments = match abort.as_mut() {
            Some(signal) => tokio::select! {
                biased;
                _ = signal.aborted() => {
                    debug!("cancelled before response");
                    return Err(ClientError::Cancelled);
                }
                result = opened => result?,
            },
            None => opened.await?,
        };

        debug!("draining");
        let mut count = 0;
        loop {
            let next = match abort.as_mut() {
                Some(signal) => tokio::select! {
                    biased;
                    _ = signal.aborted() => {
                        debug!(fragments = count, "cancelled while draining");
                        return Err(ClientError::Cancelled);
                    }
                    next = fragments.next() => next,
                },
                None => fragments.next().await,
            };

            let Some(fragment) = next else {
                break;
            };
            let fragment = fragment?;
            trace!(len = fragment.len(), "fragment");
            count += 1;
            sink(fragment).await;
        }

        debug!(fragments = count, "completed");
        Ok(count)
    }
}

fn validate(request: &RunRequest) -> ClientResult<()> {
    if request.message.trim().is_empty() {
        return Err(ClientError::Validation("message must not be empty".into()));
    }
    Ok(())
}

fn runs_path(agent_id: &str) -> String {
    format!("/v1/agents/{}/runs", agent_id)
}
