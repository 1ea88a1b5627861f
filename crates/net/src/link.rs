//! Live connection to a room
//!
//! `RoomLink` owns a background task that reads inbound envelopes into the
//! shared [`RoomSession`], wakes the timer at its deadlines, and writes
//! pushes back to the server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use timeroom_core::{Clock, InputSource, TimerEvent, TimerState};

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::{Inbound, Push};
use crate::room::RoomSession;

const CHANNEL_CAPACITY: usize = 64;

/// What happened on the link, in order. Updates are dropped rather than
/// waited on when the receiver falls behind; room state is always current
/// through [`RoomLink::room`].
#[derive(Debug, Clone, PartialEq)]
pub enum LinkUpdate {
    /// An inbound event was applied to the room
    Applied { event: &'static str },
    /// An inbound event was rejected; room state is unchanged
    Rejected { event: &'static str, error: String },
    /// The timer moved after local input
    Timer(TimerState),
    /// A push was written to the server
    Pushed(Push),
    Disconnected,
}

enum LinkCommand {
    Input(InputSource, TimerEvent),
    Push(Push),
    SetInputFocused(bool),
    Disconnect,
}

/// Handle to a running room connection
pub struct RoomLink<C: Clock> {
    room: Arc<RwLock<RoomSession<C>>>,
    cmd_tx: mpsc::Sender<LinkCommand>,
    update_rx: mpsc::Receiver<LinkUpdate>,
}

impl<C> RoomLink<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Connect to a room server over TCP
    pub async fn connect(addr: SocketAddr, room: RoomSession<C>) -> Result<Self> {
        info!(addr = %addr, user_id = %room.user_id(), "Connecting to room");
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::spawn(stream, room))
    }

    /// Run the link over an already open stream
    pub fn spawn<S>(stream: S, room: RoomSession<C>) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let room = Arc::new(RwLock::new(room));
        let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (update_tx, update_rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(link_task(stream, room.clone(), update_tx, cmd_rx));

        Self {
            room,
            cmd_tx,
            update_rx,
        }
    }

    pub fn room(&self) -> Arc<RwLock<RoomSession<C>>> {
        self.room.clone()
    }

    pub async fn next_update(&mut self) -> Option<LinkUpdate> {
        self.update_rx.recv().await
    }

    /// Feed a timer event from the manual or hardware adapter
    pub async fn input(&self, source: InputSource, event: TimerEvent) -> Result<()> {
        self.send(LinkCommand::Input(source, event)).await
    }

    pub async fn push(&self, push: Push) -> Result<()> {
        self.send(LinkCommand::Push(push)).await
    }

    pub async fn set_input_focused(&self, focused: bool) -> Result<()> {
        self.send(LinkCommand::SetInputFocused(focused)).await
    }

    pub async fn disconnect(&self) {
        let _ = self.cmd_tx.send(LinkCommand::Disconnect).await;
    }

    async fn send(&self, cmd: LinkCommand) -> Result<()> {
        self.cmd_tx.send(cmd).await.map_err(|_| Error::NotConnected)
    }
}

/// Reads frames on their own task so a half-read frame is never dropped
/// by the select loop.
fn spawn_reader<R>(mut reader: R) -> (mpsc::Receiver<Result<Inbound>>, JoinHandle<()>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let handle = tokio::spawn(async move {
        loop {
            let result = read_frame::<_, Inbound>(&mut reader).await;
            let fatal = matches!(result, Err(Error::ConnectionClosed | Error::Io(_)));
            if tx.send(result).await.is_err() || fatal {
                break;
            }
        }
    });
    (rx, handle)
}

async fn link_task<S, C>(
    stream: S,
    room: Arc<RwLock<RoomSession<C>>>,
    update_tx: mpsc::Sender<LinkUpdate>,
    mut cmd_rx: mpsc::Receiver<LinkCommand>,
) where
    S: AsyncRead + AsyncWrite + Send + 'static,
    C: Clock + Send + Sync + 'static,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let (mut inbound_rx, reader_handle) = spawn_reader(reader);

    loop {
        let wait = room.read().await.time_until_deadline();

        tokio::select! {
            inbound = inbound_rx.recv() => {
                match inbound {
                    Some(Ok(event)) => {
                        let name = event.name();
                        let applied = room.write().await.handle_inbound(event);
                        let update = match applied {
                            Ok(()) => LinkUpdate::Applied { event: name },
                            Err(e) => {
                                warn!(event = name, error = %e, "Rejected room event");
                                LinkUpdate::Rejected { event: name, error: e.to_string() }
                            }
                        };
                        notify(&update_tx, update);
                    }
                    Some(Err(Error::Protocol(reason))) => {
                        warn!(reason = %reason, "Skipping malformed frame");
                    }
                    Some(Err(Error::ConnectionClosed)) | None => {
                        debug!("Server closed connection");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Read error");
                        break;
                    }
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(LinkCommand::Input(source, event)) => {
                        let (push, state) = {
                            let mut room = room.write().await;
                            let push = room.handle_input(source, event);
                            (push, room.timer().state())
                        };
                        notify(&update_tx, LinkUpdate::Timer(state));
                        if let Some(push) = push {
                            if !send_push(&mut writer, push, &update_tx).await {
                                break;
                            }
                        }
                    }
                    Some(LinkCommand::Push(push)) => {
                        if !send_push(&mut writer, push, &update_tx).await {
                            break;
                        }
                    }
                    Some(LinkCommand::SetInputFocused(focused)) => {
                        room.write().await.set_input_focused(focused);
                    }
                    Some(LinkCommand::Disconnect) | None => {
                        debug!("Disconnect requested");
                        break;
                    }
                }
            }

            _ = tokio::time::sleep(Duration::from_millis(wait.unwrap_or(0))), if wait.is_some() => {
                room.write().await.poll_timer();
            }
        }
    }

    reader_handle.abort();
    drop(cmd_rx);
    notify(&update_tx, LinkUpdate::Disconnected);
    info!("Disconnected from room");
}

async fn send_push<S: AsyncWrite>(
    writer: &mut WriteHalf<S>,
    push: Push,
    update_tx: &mpsc::Sender<LinkUpdate>,
) -> bool {
    if let Err(e) = write_frame(writer, &push).await {
        warn!(error = %e, "Write error");
        return false;
    }
    debug!(?push, "Sent push");
    notify(update_tx, LinkUpdate::Pushed(push));
    true
}

fn notify(update_tx: &mpsc::Sender<LinkUpdate>, update: LinkUpdate) {
    match update_tx.try_send(update) {
        Ok(()) => {}
        Err(TrySendError::Full(update)) => debug!(?update, "Update channel full; dropping"),
        Err(TrySendError::Closed(_)) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeroom_core::{
        ManualClock, MessagePayload, PenaltyName, PenaltyPayload, PuzzleTypeId, PuzzleTypePayload,
        RoomConfig, RoundId, RoundPayload, SessionId, SessionPayload, SolvePayload, UserId,
        UserPayload,
    };
    use tokio::io::DuplexStream;

    fn snapshot() -> SessionPayload {
        SessionPayload {
            id: Some(SessionId(9)),
            name: "test room".to_string(),
            cube_type: Some(PuzzleTypePayload {
                id: Some(PuzzleTypeId(1)),
                name: "2x2".to_string(),
            }),
            room_messages: Vec::new(),
            rounds: vec![RoundPayload::new(181, "R U R'")],
        }
    }

    async fn joined() -> (RoomLink<ManualClock>, DuplexStream, ManualClock) {
        let (client, mut server) = tokio::io::duplex(4096);
        let clock = ManualClock::new(0);
        let room = RoomSession::new(UserId(2), clock.clone(), &RoomConfig::default());
        let mut link = RoomLink::spawn(client, room);

        write_frame(&mut server, &Inbound::Snapshot(snapshot()))
            .await
            .unwrap();
        assert_eq!(
            link.next_update().await,
            Some(LinkUpdate::Applied { event: "snapshot" })
        );
        (link, server, clock)
    }

    #[tokio::test]
    async fn test_inbound_events_reach_the_store() {
        let (mut link, mut server, _clock) = joined().await;

        write_frame(&mut server, &Inbound::RoundCreated(RoundPayload::new(182, "F")))
            .await
            .unwrap();
        assert_eq!(
            link.next_update().await,
            Some(LinkUpdate::Applied {
                event: "round_created"
            })
        );

        let room = link.room();
        let room = room.read().await;
        assert_eq!(
            room.store().session().unwrap().round_ids,
            vec![RoundId(182), RoundId(181)]
        );
    }

    #[tokio::test]
    async fn test_rejected_event_is_reported() {
        let (mut link, mut server, _clock) = joined().await;
        let bad = SolvePayload {
            id: None,
            ..SolvePayload::new(1, 2, 100, PenaltyPayload::new(1, PenaltyName::Ok))
        };
        write_frame(&mut server, &Inbound::SolveCreated(bad))
            .await
            .unwrap();

        match link.next_update().await {
            Some(LinkUpdate::Rejected { event, .. }) => assert_eq!(event, "solve_created"),
            other => panic!("Expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_local_solve_is_pushed() {
        let (mut link, mut server, clock) = joined().await;

        link.input(InputSource::Manual, TimerEvent::Engage).await.unwrap();
        assert_eq!(
            link.next_update().await,
            Some(LinkUpdate::Timer(TimerState::Preparing))
        );

        clock.advance(500);
        link.input(InputSource::Manual, TimerEvent::Release).await.unwrap();
        assert_eq!(
            link.next_update().await,
            Some(LinkUpdate::Timer(TimerState::Solving))
        );

        clock.advance(1_000);
        link.input(InputSource::Manual, TimerEvent::Engage).await.unwrap();
        assert_eq!(
            link.next_update().await,
            Some(LinkUpdate::Timer(TimerState::Solved))
        );
        assert_eq!(
            link.next_update().await,
            Some(LinkUpdate::Pushed(Push::NewSolve { time: 1_000 }))
        );

        let push: Push = read_frame(&mut server).await.unwrap();
        assert_eq!(push, Push::NewSolve { time: 1_000 });
    }

    #[tokio::test]
    async fn test_undrained_updates_do_not_stall_the_room() {
        let (link, mut server, _clock) = joined().await;
        let total = CHANNEL_CAPACITY + 16;
        for id in 0..total {
            let message = MessagePayload::new(id as i64 + 1, "gg", UserPayload::new(2, "a", ""));
            write_frame(&mut server, &Inbound::MessageCreated(message))
                .await
                .unwrap();
        }

        let room = link.room();
        let applied = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if room.read().await.store().chat_lines().len() == total {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(applied.is_ok(), "Inbound events stalled behind undrained updates");
    }

    #[tokio::test]
    async fn test_push_and_disconnect() {
        let (mut link, mut server, _clock) = joined().await;
        link.push(Push::NewRound).await.unwrap();
        let push: Push = read_frame(&mut server).await.unwrap();
        assert_eq!(push, Push::NewRound);
        assert_eq!(
            link.next_update().await,
            Some(LinkUpdate::Pushed(Push::NewRound))
        );

        drop(server);
        assert_eq!(link.next_update().await, Some(LinkUpdate::Disconnected));
        assert!(link.push(Push::NewRound).await.is_err());
    }
}
