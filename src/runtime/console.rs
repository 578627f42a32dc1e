use std::io::{self, BufRead};
use std::str::FromStr;
use std::sync::mpsc::Sender;
use std::thread;

use thiserror::Error;
use tracing::{info, warn};

/// One line typed on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCmd {
    List,
    /// 1-based position in the playlist, as printed by `list`.
    Play(usize),
    Pause,
    Resume,
    Toggle,
    Next,
    Prev,
    /// Absolute position in seconds.
    Seek(u64),
    Rescan,
    Status,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("unknown command `{0}` (try: list, play <n>, pause, resume, toggle, next, prev, seek <secs>, rescan, status, quit)")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("`{cmd}`: invalid argument `{arg}`")]
    BadArgument { cmd: &'static str, arg: String },
}

/// Parse a console line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<Result<ConsoleCmd, ConsoleError>> {
    let mut words = line.split_whitespace();
    let head = words.next()?;
    let arg = words.next();

    let cmd = match head.to_ascii_lowercase().as_str() {
        "list" | "ls" => Ok(ConsoleCmd::List),
        "play" => match number::<usize>("play", arg) {
            Ok(0) => Err(ConsoleError::BadArgument {
                cmd: "play",
                arg: "0".into(),
            }),
            other => other.map(ConsoleCmd::Play),
        },
        "pause" => Ok(ConsoleCmd::Pause),
        "resume" => Ok(ConsoleCmd::Resume),
        "toggle" | "p" => Ok(ConsoleCmd::Toggle),
        "next" | "n" => Ok(ConsoleCmd::Next),
        "prev" | "previous" => Ok(ConsoleCmd::Prev),
        "seek" => number("seek", arg).map(ConsoleCmd::Seek),
        "rescan" => Ok(ConsoleCmd::Rescan),
        "status" | "st" => Ok(ConsoleCmd::Status),
        "quit" | "q" | "exit" => Ok(ConsoleCmd::Quit),
        other => Err(ConsoleError::Unknown(other.to_string())),
    };
    Some(cmd)
}

fn number<T: FromStr>(cmd: &'static str, arg: Option<&str>) -> Result<T, ConsoleError> {
    let arg = arg.ok_or(ConsoleError::MissingArgument(cmd))?;
    arg.parse().map_err(|_| ConsoleError::BadArgument {
        cmd,
        arg: arg.to_string(),
    })
}

/// Forward parsed lines to `tx` until input ends or the receiver is gone.
/// End of input sends nothing, so a closed stdin does not stop the player.
pub fn read_commands(input: impl BufRead, tx: &Sender<ConsoleCmd>) {
    for line in input.lines() {
        let Ok(line) = line else { break };
        match parse_line(&line) {
            Some(Ok(cmd)) => {
                if tx.send(cmd).is_err() {
                    return;
                }
            }
            Some(Err(e)) => eprintln!("{e}"),
            None => {}
        }
    }
    info!("stdin closed; console disabled");
}

/// Read stdin on a background thread.
pub fn spawn_console(tx: Sender<ConsoleCmd>) {
    let spawned = thread::Builder::new()
        .name("musico-console".into())
        .spawn(move || read_commands(io::stdin().lock(), &tx));
    if let Err(e) = spawned {
        warn!(error = %e, "failed to start console thread");
    }
}
