//! Async client for the schema worker process.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

use super::error::{WorkerError, WorkerResult};
use super::protocol::{
    methods, ConnectionParams, ErrorInfo, GetIndexesResponse, GetTableResponse,
    ListTablesParams, ListTablesResponse, RequestEnvelope, ResponseEnvelope, TableParams,
};
use crate::config::WorkerSettings;

/// Default timeout for requests (30 seconds).
const DEFAULT_TIMEOUT_SECS: u64 = 30;

type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<ResponseEnvelope>>>>;

/// Async client for the schema worker.
///
/// The client spawns the worker as a child process and communicates via
/// NDJSON (newline-delimited JSON) over stdin/stdout. Each request has a
/// unique ID for correlation with responses, enabling concurrent requests.
///
/// # Example
///
/// ```ignore
/// use dynapi::worker::WorkerClient;
///
/// let client = WorkerClient::spawn("./schema-worker").await?;
/// let tables = client.list_tables(&connection, Some("public")).await?;
/// ```
pub struct WorkerClient {
    /// Writer for sending requests to worker stdin.
    stdin: Arc<Mutex<BufWriter<ChildStdin>>>,

    /// Map of pending request IDs to response channels.
    pending: PendingMap,

    /// Handle to the worker child process (killed on drop).
    _child: Child,

    /// Handle to the background reader task.
    reader_task: tokio::task::JoinHandle<()>,

    /// Request timeout duration.
    timeout: Duration,
}

impl WorkerClient {
    /// Spawn a worker with the default timeout.
    pub async fn spawn<P: AsRef<Path>>(worker_path: P) -> WorkerResult<Self> {
        Self::spawn_with_args(worker_path, &[], Duration::from_secs(DEFAULT_TIMEOUT_SECS)).await
    }

    /// Spawn the worker described by the `[provider.worker]` settings.
    pub async fn spawn_with_settings(settings: &WorkerSettings) -> WorkerResult<Self> {
        let path = settings.resolved_path().map_err(|e| {
            WorkerError::SpawnFailed(io::Error::new(io::ErrorKind::NotFound, e.to_string()))
        })?;
        Self::spawn_with_args(
            path,
            &settings.args,
            Duration::from_secs(settings.timeout_seconds),
        )
        .await
    }

    /// Spawn a worker with command-line arguments and a request timeout.
    pub async fn spawn_with_args<P: AsRef<Path>>(
        worker_path: P,
        args: &[String],
        timeout: Duration,
    ) -> WorkerResult<Self> {
        let mut child = Command::new(worker_path.as_ref())
            .args(args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(WorkerError::SpawnFailed)?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                return Err(WorkerError::SpawnFailed(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "worker stdio was not captured",
                )))
            }
        };

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let reader_task = Self::spawn_reader_task(stdout, pending.clone());

        debug!(path = %worker_path.as_ref().display(), "spawned schema worker");

        Ok(Self {
            stdin: Arc::new(Mutex::new(BufWriter::new(stdin))),
            pending,
            _child: child,
            reader_task,
            timeout,
        })
    }

    /// Spawn the background task that reads responses from the worker.
    fn spawn_reader_task(stdout: ChildStdout, pending: PendingMap) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break,
                    Ok(_) => match serde_json::from_str::<ResponseEnvelope>(&line) {
                        Ok(resp) => {
                            if let Some(tx) = pending.lock().await.remove(&resp.id) {
                                let _ = tx.send(resp);
                            }
                        }
                        Err(e) => warn!(error = %e, "worker: failed to parse response"),
                    },
                    Err(e) => {
                        warn!(error = %e, "worker: read error");
                        break;
                    }
                }
            }

            // Worker exited - fail every request still waiting
            let mut pending = pending.lock().await;
            for (id, tx) in pending.drain() {
                let _ = tx.send(ResponseEnvelope {
                    id,
                    success: false,
                    result: None,
                    error: Some(ErrorInfo {
                        code: "WORKER_EXITED".to_string(),
                        message: "Worker process exited unexpectedly".to_string(),
                    }),
                });
            }
        })
    }

    /// Send a request to the worker and wait for a response.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails, the write fails, the request
    /// times out, the worker answers with an error, or the result cannot be
    /// deserialized into `R`.
    pub async fn request<P, R>(&self, method: &str, params: P) -> WorkerResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = uuid::Uuid::new_v4().to_string();

        let request = RequestEnvelope {
            id: id.clone(),
            method: method.to_string(),
            params: serde_json::to_value(params).map_err(WorkerError::SerializeFailed)?,
        };

        let line = serde_json::to_string(&request).map_err(WorkerError::SerializeFailed)? + "\n";

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        if let Err(e) = self.write_line(&line).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(resp) => resp?,
            Err(_) => {
                // drop the pending slot so it does not leak
                self.pending.lock().await.remove(&id);
                return Err(WorkerError::Timeout(self.timeout.as_secs()));
            }
        };

        if response.success {
            let result = response.result.unwrap_or(serde_json::Value::Null);
            serde_json::from_value(result).map_err(WorkerError::DeserializeFailed)
        } else {
            let error = response.error.unwrap_or_else(|| ErrorInfo {
                code: "UNKNOWN".to_string(),
                message: "Unknown error".to_string(),
            });
            Err(Self::classify_error(&error.code, &error.message))
        }
    }

    async fn write_line(&self, line: &str) -> WorkerResult<()> {
        let mut stdin = self.stdin.lock().await;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(WorkerError::WriteFailed)?;
        stdin.flush().await.map_err(WorkerError::WriteFailed)
    }

    /// Classify a worker error code into a specific error variant.
    fn classify_error(code: &str, message: &str) -> WorkerError {
        match code {
            "CONNECTION_FAILED" => WorkerError::ConnectionFailed(message.to_string()),
            "METHOD_NOT_FOUND" => WorkerError::MethodNotFound(message.to_string()),
            "WORKER_EXITED" => WorkerError::ChannelClosed,
            _ => WorkerError::remote(code, message),
        }
    }

    /// Whether the worker still appears to be running.
    pub fn is_alive(&self) -> bool {
        !self.reader_task.is_finished()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// List tables in a schema (worker default schema when `None`).
    pub async fn list_tables(
        &self,
        connection: &ConnectionParams,
        schema: Option<&str>,
    ) -> WorkerResult<ListTablesResponse> {
        self.request(
            methods::LIST_TABLES,
            ListTablesParams {
                connection: connection.clone(),
                schema: schema.map(str::to_string),
            },
        )
        .await
    }

    /// Get columns, keys and foreign keys of one table.
    pub async fn get_table(
        &self,
        connection: &ConnectionParams,
        schema: &str,
        table: &str,
    ) -> WorkerResult<GetTableResponse> {
        self.request(
            methods::GET_TABLE,
            TableParams {
                connection: connection.clone(),
                schema: schema.to_string(),
                table: table.to_string(),
            },
        )
        .await
    }

    /// Get the indexes of one table.
    pub async fn get_indexes(
        &self,
        connection: &ConnectionParams,
        schema: &str,
        table: &str,
    ) -> WorkerResult<GetIndexesResponse> {
        self.request(
            methods::GET_INDEXES,
            TableParams {
                connection: connection.clone(),
                schema: schema.to_string(),
                table: table.to_string(),
            },
        )
        .await
    }
}
