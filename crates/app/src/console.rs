//! Live room driven from stdin
//!
//! Plain lines are chat. Slash commands: `/round`, `/penalty <OK|+2|DNF>`,
//! `/entry`, `/time <entry>`, `/report`, `/quit`.

use std::path::Path;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::{debug, info, warn};

use timeroom_core::{
    Clock, InputSource, PenaltyName, RoomConfig, StackmatAdapter, SystemClock, TimeEntry,
};
use timeroom_net::{LinkUpdate, Push, Result, RoomLink};

use crate::report;

const SIGNAL_CHECK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    NewRound,
    Penalty(PenaltyName),
    /// Switch to the next time entry method
    CycleEntry,
    Time(String),
    Report,
    Quit,
    Chat(String),
}

/// Parse one stdin line; `None` for blank lines
pub fn parse_command(line: &str) -> timeroom_core::Result<Option<ConsoleCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(ConsoleCommand::Chat(line.to_string())));
    };

    let (name, arg) = rest.split_once(' ').unwrap_or((rest, ""));
    let command = match name {
        "round" => ConsoleCommand::NewRound,
        "penalty" => ConsoleCommand::Penalty(arg.parse()?),
        "entry" => ConsoleCommand::CycleEntry,
        "time" => ConsoleCommand::Time(arg.trim().to_string()),
        "report" => ConsoleCommand::Report,
        "quit" => ConsoleCommand::Quit,
        _ => return Ok(Some(ConsoleCommand::Chat(line.to_string()))),
    };
    Ok(Some(command))
}

pub async fn run<C>(
    mut link: RoomLink<C>,
    config: &RoomConfig,
    stackmat: Option<&Path>,
) -> Result<()>
where
    C: Clock + Send + Sync + 'static,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut device = match stackmat {
        Some(path) => {
            info!(path = %path.display(), "Reading Stackmat packets");
            Some(File::open(path).await?)
        }
        None => None,
    };
    let mut adapter = StackmatAdapter::new(config.signal_timeout_ms);
    let device_clock = SystemClock::new();
    let mut buf = [0u8; 256];
    let mut signal_check = tokio::time::interval(SIGNAL_CHECK_INTERVAL);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                match parse_command(&line) {
                    Ok(Some(ConsoleCommand::Quit)) => break,
                    Ok(Some(command)) => {
                        if let Some(push) = to_push(&link, command, config).await {
                            link.push(push).await?;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                }
            }

            update = link.next_update() => {
                match update {
                    Some(LinkUpdate::Applied { event }) => {
                        debug!(event, "Room updated");
                        if event == "snapshot" || event == "round_created" {
                            print_report(&link, config).await;
                        }
                    }
                    Some(LinkUpdate::Rejected { event, error }) => {
                        println!("! {event} rejected: {error}");
                    }
                    Some(LinkUpdate::Pushed(push)) => debug!(?push, "Pushed"),
                    Some(LinkUpdate::Timer(state)) => debug!(?state, "Timer"),
                    Some(LinkUpdate::Disconnected) | None => break,
                }
            }

            read = read_device(&mut device, &mut buf), if device.is_some() => {
                match read {
                    Ok(0) => {
                        warn!("Stackmat device closed");
                        device = None;
                    }
                    Ok(n) => {
                        let now = device_clock.now_ms().unwrap_or(0);
                        for event in adapter.feed(&buf[..n], now) {
                            link.input(InputSource::Stackmat, event).await?;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Stackmat read failed");
                        device = None;
                    }
                }
            }

            _ = signal_check.tick(), if device.is_some() => {
                if let Some(event) = device_clock.now_ms().and_then(|now| adapter.check_signal(now)) {
                    link.input(InputSource::Stackmat, event).await?;
                }
            }
        }
    }

    link.disconnect().await;
    print_report(&link, config).await;
    Ok(())
}

async fn read_device(device: &mut Option<File>, buf: &mut [u8]) -> std::io::Result<usize> {
    match device {
        Some(file) => file.read(buf).await,
        None => Ok(0),
    }
}

async fn to_push<C>(
    link: &RoomLink<C>,
    command: ConsoleCommand,
    config: &RoomConfig,
) -> Option<Push>
where
    C: Clock + Send + Sync + 'static,
{
    let room = link.room();
    if command == ConsoleCommand::CycleEntry {
        let entry = room.write().await.cycle_time_entry();
        println!("Time entry: {entry}");
        return None;
    }
    let room = room.read().await;
    match command {
        ConsoleCommand::NewRound => Some(room.new_round()),
        ConsoleCommand::Penalty(penalty) => {
            let push = room.change_penalty(penalty);
            if push.is_none() {
                println!("No solve to penalize in this round");
            }
            push
        }
        ConsoleCommand::Time(_) if room.time_entry() != TimeEntry::Keyboard => {
            println!("Typed times need keyboard entry; switch with /entry");
            None
        }
        ConsoleCommand::Time(text) => match room.submit_keyboard_time(&text) {
            Ok(push) => push,
            Err(e) => {
                println!("{e}");
                None
            }
        },
        ConsoleCommand::Chat(text) => room.send_message(&text),
        ConsoleCommand::Report => {
            print!("{}", report::render(&room, &config.stats_windows));
            None
        }
        ConsoleCommand::CycleEntry | ConsoleCommand::Quit => None,
    }
}

async fn print_report<C>(link: &RoomLink<C>, config: &RoomConfig)
where
    C: Clock + Send + Sync + 'static,
{
    let room = link.room();
    let room = room.read().await;
    print!("{}", report::render(&room, &config.stats_windows));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_chat() {
        assert_eq!(
            parse_command("  good luck ").unwrap(),
            Some(ConsoleCommand::Chat("good luck".to_string()))
        );
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(parse_command("/round").unwrap(), Some(ConsoleCommand::NewRound));
        assert_eq!(
            parse_command("/penalty +2").unwrap(),
            Some(ConsoleCommand::Penalty(PenaltyName::PlusTwo))
        );
        assert_eq!(
            parse_command("/time 1:02.345").unwrap(),
            Some(ConsoleCommand::Time("1:02.345".to_string()))
        );
        assert_eq!(parse_command("/entry").unwrap(), Some(ConsoleCommand::CycleEntry));
        assert_eq!(parse_command("/quit").unwrap(), Some(ConsoleCommand::Quit));
    }

    #[test]
    fn test_bad_penalty_is_an_error() {
        assert!(parse_command("/penalty +3").is_err());
    }

    #[test]
    fn test_unknown_slash_is_chat() {
        assert_eq!(
            parse_command("/shrug").unwrap(),
            Some(ConsoleCommand::Chat("/shrug".to_string()))
        );
    }
}
