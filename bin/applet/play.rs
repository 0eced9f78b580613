use crate::build::Build;
use crate::engine::{Engine, EngineConfig};
use crate::io::{Io, Pipe};
use crate::terminal::{Input, Terminal};
use anyhow::{Context, Error as Anyhow};
use clap::Parser;
use lib::chess::Position;
use lib::opponent::{Difficulty, Opponent};
use lib::session::{Command, Config, Flow, Session};
use std::{io, time::Duration, time::Instant};
use tokio::io::{stdin, stdout};
use tokio::{runtime::Handle, select, time::interval, time::MissedTickBehavior};
use tracing::{error, info, instrument, warn};

/// How often the session is advanced when there's no input.
const TICK: Duration = Duration::from_millis(33);

/// Play against a chess engine on the terminal.
#[derive(Debug, Default, Parser)]
#[clap(disable_help_flag = true, disable_version_flag = true)]
pub struct Play {
    /// The opponent, e.g. `uci("stockfish")`.
    #[clap(short, long, default_value_t)]
    engine: EngineConfig,

    /// Skip the menu and start right away at this difficulty.
    #[clap(short, long)]
    difficulty: Option<Difficulty>,

    /// Session settings, e.g. `(budget: "2s", animation: "150ms")`.
    #[clap(short, long, default_value_t)]
    config: Config,

    /// Start games from this position instead of the standard one.
    #[clap(long)]
    fen: Option<Position>,
}

impl Play {
    #[instrument(level = "trace", skip(self), err)]
    pub async fn execute(self) -> Result<(), Anyhow> {
        let engine = match self.engine.build() {
            Ok(e) => Some(e),
            Err(e) => {
                let e = Anyhow::new(e).context("failed to start the engine");
                error!("{:?}", e);
                None
            }
        };

        let terminal = Terminal::new(self.config.layout);
        let mut session: Session<Engine> = Session::new(self.config, engine, Handle::current());

        if let Some(pos) = self.fen {
            session = session.with_setup(pos);
        }

        if let Some(d) = self.difficulty {
            session.command(Command::Start(d), Instant::now());
        }

        let mut io = Pipe::new(stdout(), stdin());
        run(&mut session, &terminal, &mut io).await
    }
}

/// Feeds lines from [`Io`] to the [`Session`] and draws it back whenever it changes.
async fn run<O, T>(session: &mut Session<O>, terminal: &Terminal, io: &mut T) -> Result<(), Anyhow>
where
    O: Opponent + 'static,
    T: Io + Send,
{
    let mut ticks = interval(TICK);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut frame = String::new();

    loop {
        select! {
            line = io.recv() => {
                let line = match line {
                    Ok(line) => line,
                    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                    Err(e) => return Err(e).context("failed to read input"),
                };

                match terminal.parse(&line) {
                    Err(e) => {
                        warn!(%e);
                        io.send(&e.to_string()).await?;
                        io.flush().await?;
                    }

                    Ok(inputs) => {
                        for input in inputs {
                            let now = Instant::now();
                            let flow = match input {
                                Input::Click(p) => session.click(p, now),
                                Input::Command(cmd) => session.command(cmd, now),
                            };

                            if flow == Flow::Quit {
                                info!("quitting");
                                return Ok(());
                            }
                        }
                    }
                }
            }

            _ = ticks.tick() => {}
        }

        let now = Instant::now();
        session.tick(now);

        let next = terminal.render(&session.scene(now));
        if next != frame {
            io.send(next.trim_end()).await?;
            io.send("").await?;
            io.flush().await?;
            frame = next;
        }
    }

    Ok(())
}
