use crate::config::NetConfig;
use crate::error::SessionError;
use crate::network::protocol::{Message, Packet};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

/// Invoked exactly once with the reply, or with the reason none will come.
pub type ReplyCallback = Box<dyn FnOnce(Result<Packet, SessionError>) + Send + 'static>;

struct Waiting {
    callback: ReplyCallback,
    timer: Option<AbortHandle>,
}

impl Waiting {
    fn into_callback(self) -> ReplyCallback {
        if let Some(timer) = self.timer {
            timer.abort();
        }
        self.callback
    }
}

struct Pending {
    next_id: u64,
    // Ordered by id, so the first entry is the oldest request.
    callbacks: BTreeMap<u64, Waiting>,
    // None once the connection is gone.
    outbound: Option<mpsc::UnboundedSender<String>>,
    reader: Option<AbortHandle>,
}

struct Shared {
    pending: Mutex<Pending>,
    reply_timeout: Option<Duration>,
    runtime: Handle,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take(&self, id: u64) -> Option<ReplyCallback> {
        self.lock().callbacks.remove(&id).map(Waiting::into_callback)
    }

    fn take_oldest(&self) -> Option<(u64, ReplyCallback)> {
        let (id, waiting) = self.lock().callbacks.pop_first()?;
        Some((id, waiting.into_callback()))
    }

    /// Route one inbound line to the request it answers.
    fn dispatch(&self, inbound: Result<Packet, SessionError>) {
        match inbound {
            Ok(packet) => {
                let waiting = match packet.reply_to {
                    Some(id) => self.take(id).map(|cb| (id, cb)),
                    // no correlation id: the peer answers in request order
                    None => self.take_oldest(),
                };
                match waiting {
                    Some((id, callback)) => {
                        debug!(id, kind = ?packet.message_type(), "reply received");
                        callback(Ok(packet));
                    }
                    None => warn!(packet = %packet, "dropping unsolicited packet"),
                }
            }
            Err(err) => match self.take_oldest() {
                Some((id, callback)) => {
                    warn!(id, error = %err, "malformed reply");
                    callback(Err(err));
                }
                None => warn!(error = %err, "malformed packet with nothing pending"),
            },
        }
    }

    /// Mark the connection dead and fail everything still waiting.
    fn shutdown(&self) {
        let drained = {
            let mut pending = self.lock();
            pending.outbound = None;
            if let Some(reader) = pending.reader.take() {
                reader.abort();
            }
            std::mem::take(&mut pending.callbacks)
        };
        if !drained.is_empty() {
            info!(count = drained.len(), "failing pending requests");
        }
        for (_, waiting) in drained {
            (waiting.into_callback())(Err(SessionError::Closed));
        }
    }
}

/// One connection to the server.
///
/// [`ClientSession::send`] never blocks on the network: the request is queued
/// for a writer task and the callback runs later on the reader task. Replies
/// are matched by `reply_to`, falling back to request order for peers that do
/// not echo ids. Clones share the same connection, which is closed when the
/// last clone is dropped.
#[derive(Clone)]
pub struct ClientSession {
    handle: Arc<SessionHandle>,
}

// Background tasks hold `Shared` too; only user-facing handles keep the session open.
struct SessionHandle {
    shared: Arc<Shared>,
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}

impl ClientSession {
    pub async fn connect(addr: &str, config: &NetConfig) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        info!(addr, "connected");
        Ok(Self::from_stream(stream, config))
    }

    /// Wrap an established transport. Must be called inside a tokio runtime.
    pub fn from_stream<S>(stream: S, config: &NetConfig) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let (tx, rx) = mpsc::unbounded_channel::<String>();

        let shared = Arc::new(Shared {
            pending: Mutex::new(Pending {
                next_id: 1,
                callbacks: BTreeMap::new(),
                outbound: Some(tx),
                reader: None,
            }),
            reply_timeout: config.reply_timeout(),
            runtime: Handle::current(),
        });

        tokio::spawn(write_loop(writer, rx, Arc::clone(&shared)));
        let read_task = tokio::spawn(read_loop(reader, Arc::clone(&shared)));
        shared.lock().reader = Some(read_task.abort_handle());

        ClientSession {
            handle: Arc::new(SessionHandle { shared }),
        }
    }

    fn shared(&self) -> &Arc<Shared> {
        &self.handle.shared
    }

    /// Queue `message` and register `on_reply` for its answer. Returns the request id.
    pub fn send<F>(&self, message: Message, on_reply: F) -> Result<u64, SessionError>
    where
        F: FnOnce(Result<Packet, SessionError>) + Send + 'static,
    {
        let kind = message.message_type();
        let shared = self.shared();
        let mut pending = shared.lock();
        let Some(outbound) = pending.outbound.clone() else {
            return Err(SessionError::Closed);
        };
        let id = pending.next_id;
        let line = Packet::request(id, message).to_json();
        let timer = shared.reply_timeout.map(|timeout| {
            shared
                .runtime
                .spawn(expire(Arc::downgrade(shared), id, timeout))
                .abort_handle()
        });
        // registered before the line can reach the peer
        pending.callbacks.insert(
            id,
            Waiting {
                callback: Box::new(on_reply),
                timer,
            },
        );
        if outbound.send(line).is_err() {
            if let Some(waiting) = pending.callbacks.remove(&id) {
                drop(waiting.into_callback());
            }
            pending.outbound = None;
            return Err(SessionError::Closed);
        }
        pending.next_id += 1;
        drop(pending);

        debug!(id, ?kind, "request queued");
        Ok(id)
    }

    /// Async form of [`ClientSession::send`].
    pub async fn request(&self, message: Message) -> Result<Packet, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(message, move |reply| {
            let _ = tx.send(reply);
        })?;
        rx.await.unwrap_or(Err(SessionError::Closed))
    }

    /// Requests still waiting for a reply.
    pub fn pending(&self) -> usize {
        self.shared().lock().callbacks.len()
    }

    pub fn is_closed(&self) -> bool {
        self.shared().lock().outbound.is_none()
    }

    /// Stop the session. Waiting callbacks get [`SessionError::Closed`].
    pub fn close(&self) {
        self.shared().shutdown();
    }
}

async fn expire(shared: Weak<Shared>, id: u64, timeout: Duration) {
    tokio::time::sleep(timeout).await;
    let Some(shared) = shared.upgrade() else {
        return;
    };
    if let Some(callback) = shared.take(id) {
        warn!(id, ?timeout, "request timed out");
        callback(Err(SessionError::Timeout(timeout)));
    }
}

async fn read_loop<R>(reader: R, shared: Arc<Shared>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                shared.dispatch(Packet::from_json(&line));
            }
            Ok(None) => {
                info!("server closed the connection");
                break;
            }
            Err(e) => {
                warn!(error = %e, "read failed");
                break;
            }
        }
    }
    shared.shutdown();
}

async fn write_loop<W>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<String>,
    shared: Arc<Shared>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        let framed = line + "\n";
        if let Err(e) = writer.write_all(framed.as_bytes()).await {
            warn!(error = %e, "write failed");
            shared.shutdown();
            return;
        }
    }
    let _ = writer.shutdown().await;
}
