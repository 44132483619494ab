//! Shared doubles for the scenario tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use jobtracker::protocol::{CommandBody, JobPullRequest, Payload};
use jobtracker::{
    Channel, ChannelId, JobTracker, NodeType, RemotingCommand, RemotingSendError,
    RemotingServer, RequestCode, ResponseCallback, ResponseCode, TrackerConfig,
};

/// In-process connection
#[derive(Debug)]
pub struct TestChannel {
    id: ChannelId,
    closed: AtomicBool,
}

impl TestChannel {
    pub fn open(id: ChannelId) -> Arc<Self> {
        Arc::new(Self {
            id,
            closed: AtomicBool::new(false),
        })
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl Channel for TestChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn remote_addr(&self) -> String {
        format!("10.0.0.{}:3502", self.id)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// How the scripted transport answers one push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Worker answers JobPushSuccess
    Accept,
    /// Worker answers with a non-success code
    Reject,
    /// No answer ever arrives; the callback is parked
    Silent,
    /// Transport drops the callback without calling it
    DropCallback,
    /// Send fails synchronously
    FailSend,
}

type SendHook = Box<dyn Fn(&RemotingCommand) + Send + Sync>;

/// Delivery channel that answers from a script, then from a default reply
pub struct ScriptedRemoting {
    default: Mutex<Reply>,
    script: Mutex<VecDeque<Reply>>,
    sent: Mutex<Vec<RemotingCommand>>,
    parked: Mutex<Vec<ResponseCallback>>,
    hook: Mutex<Option<SendHook>>,
}

impl ScriptedRemoting {
    pub fn new(default: Reply) -> Arc<Self> {
        Arc::new(Self {
            default: Mutex::new(default),
            script: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            parked: Mutex::new(Vec::new()),
            hook: Mutex::new(None),
        })
    }

    /// Answer the next pushes with `replies`, in order
    pub fn script(&self, replies: impl IntoIterator<Item = Reply>) {
        self.script.lock().extend(replies);
    }

    /// Run `hook` on every push before answering it
    pub fn on_send(&self, hook: impl Fn(&RemotingCommand) + Send + Sync + 'static) {
        *self.hook.lock() = Some(Box::new(hook));
    }

    /// Every push attempted, failed sends included
    pub fn sent(&self) -> Vec<RemotingCommand> {
        self.sent.lock().clone()
    }

    pub fn attempts(&self) -> usize {
        self.sent.lock().len()
    }

    /// Job ids of all attempted pushes
    pub fn pushed_job_ids(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|command| match command.body.as_ref().map(|b| &b.payload) {
                Some(Payload::JobPush(push)) => Some(push.job.job_id.clone()),
                _ => None,
            })
            .collect()
    }
}

impl RemotingServer for ScriptedRemoting {
    fn invoke_async(
        &self,
        channel: &Arc<dyn Channel>,
        request: RemotingCommand,
        _timeout: Duration,
        callback: ResponseCallback,
    ) -> Result<(), RemotingSendError> {
        if let Some(hook) = self.hook.lock().as_ref() {
            hook(&request);
        }
        self.sent.lock().push(request);

        let reply = self
            .script
            .lock()
            .pop_front()
            .unwrap_or(*self.default.lock());

        match reply {
            Reply::Accept => callback(Some(RemotingCommand::response(
                ResponseCode::JobPushSuccess,
                "",
            ))),
            Reply::Reject => callback(Some(RemotingCommand::response(
                ResponseCode::SystemError,
                "worker busy",
            ))),
            Reply::Silent => self.parked.lock().push(callback),
            Reply::DropCallback => drop(callback),
            Reply::FailSend => {
                return Err(RemotingSendError::new(
                    channel.remote_addr(),
                    "connection closed",
                ))
            }
        }
        Ok(())
    }
}

pub fn tracker(remoting: Arc<ScriptedRemoting>) -> JobTracker {
    jobtracker::core::telemetry::init_tracing("jobtracker=debug");
    JobTracker::builder()
        .with_config(TrackerConfig::development())
        .with_remoting(remoting)
        .build()
        .unwrap()
}

pub fn envelope(code: RequestCode, group: &str, identity: &str, payload: Payload) -> RemotingCommand {
    RemotingCommand::request(
        code,
        CommandBody::new(NodeType::TaskTracker, group, identity).with_payload(payload),
    )
}

pub fn heartbeat(group: &str, identity: &str) -> RemotingCommand {
    envelope(RequestCode::Heartbeat, group, identity, Payload::Empty)
}

pub fn pull(group: &str, identity: &str, available_threads: i32, timestamp: i64) -> RemotingCommand {
    envelope(
        RequestCode::JobPull,
        group,
        identity,
        Payload::JobPull(JobPullRequest {
            available_threads,
            timestamp,
        }),
    )
}

/// Register a worker through a heartbeat and return its connection
pub async fn register(tracker: &JobTracker, channel_id: ChannelId, group: &str, identity: &str) -> Arc<dyn Channel> {
    let channel: Arc<dyn Channel> = TestChannel::open(channel_id);
    let response = tracker.handle(&channel, heartbeat(group, identity)).await;
    assert!(response.is(ResponseCode::HeartbeatSuccess));
    channel
}

/// Poll `condition` until it holds or `within` elapses
pub async fn eventually(within: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + within;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
