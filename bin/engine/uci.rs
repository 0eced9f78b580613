use crate::io::Io;
use anyhow::{Context, Error as Anyhow};
use async_trait::async_trait;
use derive_more::{DebugCustom, Display, Error, From};
use lib::chess::{Move, Position};
use lib::opponent::{Difficulty, Opponent, OpponentError};
use std::{collections::HashMap, fmt::Debug, future::Future, io, mem, pin::Pin, time::Duration};
use tokio::{runtime, task::block_in_place};
use tracing::{debug, error, info, instrument};
use vampirc_uci::{self as uci, UciFen, UciMessage};

pub type UciOptions = HashMap<String, Option<String>>;

/// The name of the option that controls how well UCI engines play.
const SKILL_LEVEL: &str = "Skill Level";

#[derive(DebugCustom)]
#[debug(bound = "T: Debug")]
enum Lazy<T> {
    #[debug(fmt = "{:?}", _0)]
    Initialized(T),
    #[debug(fmt = "?")]
    Uninitialized(Pin<Box<dyn Future<Output = Result<T, UciError>> + Send + 'static>>),
    #[debug(fmt = "!")]
    Poisoned,
}

impl<T> Lazy<T> {
    async fn get_or_init(&mut self) -> Result<&mut T, UciError> {
        *self = match mem::replace(self, Lazy::Poisoned) {
            Lazy::Initialized(v) => Lazy::Initialized(v),
            Lazy::Uninitialized(f) => Lazy::Initialized(f.await?),
            Lazy::Poisoned => return Err(io::Error::from(io::ErrorKind::BrokenPipe).into()),
        };

        match self {
            Lazy::Initialized(v) => Ok(v),
            _ => unreachable!(),
        }
    }
}

/// The reason why the UCI server failed to reply.
#[derive(Debug, Display, Error, From)]
#[display(fmt = "the UCI server encountered an error")]
pub struct UciError(#[from(forward)] io::Error);

impl From<UciError> for OpponentError {
    fn from(UciError(e): UciError) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof | io::ErrorKind::BrokenPipe => OpponentError::Terminated,
            _ => OpponentError::Protocol(e.to_string()),
        }
    }
}

/// A Universal Chess Interface client for a chess engine.
#[derive(Debug)]
pub struct Uci<T: Io> {
    io: Lazy<T>,
}

impl<T: Io + Send + 'static> Uci<T> {
    /// Constructs [`Uci`] with the given [`UciOptions`].
    ///
    /// The engine is only initialized once it is first needed.
    pub fn new(mut io: T, options: UciOptions) -> Self {
        Uci {
            io: Lazy::Uninitialized(Box::pin(async move {
                io.send(&UciMessage::Uci.to_string()).await?;
                io.flush().await?;

                loop {
                    match uci::parse_one(io.recv().await?.trim()) {
                        UciMessage::UciOk => break,
                        UciMessage::Id {
                            name: Some(engine), ..
                        } => info!(%engine),
                        msg => debug!(%msg, "ignoring"),
                    }
                }

                for (name, value) in options {
                    let set_option = UciMessage::SetOption { name, value };
                    io.send(&set_option.to_string()).await?;
                }

                Ok(io)
            })),
        }
    }
}

impl<T: Io> Drop for Uci<T> {
    #[instrument(level = "trace", skip(self))]
    fn drop(&mut self) {
        let io = match &mut self.io {
            Lazy::Initialized(io) => io,
            _ => return,
        };

        let result: Result<(), Anyhow> = block_in_place(|| {
            runtime::Handle::try_current()?.block_on(async {
                io.send(&UciMessage::Stop.to_string()).await?;
                io.send(&UciMessage::Quit.to_string()).await?;
                io.flush().await?;
                Ok(())
            })
        });

        if let Err(e) = result.context("failed to gracefully shutdown the uci engine") {
            error!("{:?}", e);
        }
    }
}

#[async_trait]
impl<T: Io + Send + 'static> Opponent for Uci<T> {
    #[instrument(level = "debug", skip(self), err)]
    async fn configure(&mut self, difficulty: Difficulty) -> Result<(), OpponentError> {
        let io = self.io.get_or_init().await?;

        let skill = UciMessage::SetOption {
            name: SKILL_LEVEL.into(),
            value: Some(difficulty.get().to_string()),
        };

        io.send(&UciMessage::Stop.to_string()).await.map_err(UciError)?;
        io.send(&skill.to_string()).await.map_err(UciError)?;
        io.send(&UciMessage::UciNewGame.to_string()).await.map_err(UciError)?;
        io.send(&UciMessage::IsReady.to_string()).await.map_err(UciError)?;
        io.flush().await.map_err(UciError)?;

        loop {
            match uci::parse_one(io.recv().await.map_err(UciError)?.trim()) {
                UciMessage::ReadyOk => break Ok(()),
                msg => debug!(%msg, "ignoring"),
            }
        }
    }

    #[instrument(level = "debug", skip(self, pos), ret(Display), err, fields(%pos))]
    async fn play(&mut self, pos: Position, budget: Duration) -> Result<Move, OpponentError> {
        let io = self.io.get_or_init().await?;

        let position = UciMessage::Position {
            startpos: false,
            fen: Some(UciFen(pos.to_string())),
            moves: Vec::new(),
        };

        let go = UciMessage::go_movetime(
            uci::Duration::from_std(budget).unwrap_or_else(|_| uci::Duration::max_value()),
        );

        io.send(&position.to_string()).await.map_err(UciError)?;
        io.send(&go.to_string()).await.map_err(UciError)?;
        io.flush().await.map_err(UciError)?;

        loop {
            let line = io.recv().await.map_err(UciError)?;
            let line = line.trim();

            if let Some(args) = line.strip_prefix("bestmove") {
                if matches!(args.split_whitespace().next(), None | Some("(none)" | "0000")) {
                    break Err(OpponentError::NoMove);
                }
            }

            match uci::parse_one(line) {
                UciMessage::BestMove { best_move, .. } => {
                    break Move::try_from(best_move).map_err(|e| {
                        OpponentError::Protocol(format!("{} in `{}`", e, line))
                    });
                }

                msg => debug!(%msg, "ignoring"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MockIo;
    use mockall::Sequence;
    use proptest::{prelude::*, sample::Selector};
    use std::future::ready;
    use test_strategy::proptest;
    use tokio::runtime;

    fn any_uci_message() -> impl Strategy<Value = UciMessage> {
        prop_oneof![
            Just(UciMessage::Uci),
            Just(UciMessage::UciOk),
            Just(UciMessage::UciNewGame),
            Just(UciMessage::IsReady),
            Just(UciMessage::ReadyOk),
            Just(UciMessage::Stop),
            Just(UciMessage::Quit),
            Just(UciMessage::PonderHit),
            any::<(Option<String>, Option<String>)>()
                .prop_map(|(name, author)| UciMessage::Id { name, author }),
            any::<(String, Option<String>)>()
                .prop_map(|(name, value)| UciMessage::SetOption { name, value }),
            any::<bool>().prop_map(UciMessage::Debug),
        ]
    }

    fn ok() -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'static>> {
        Box::pin(ready(Ok(())))
    }

    fn reply(msg: impl ToString) -> Pin<Box<dyn Future<Output = io::Result<String>> + Send + 'static>> {
        Box::pin(ready(Ok(msg.to_string())))
    }

    fn initialized(io: MockIo) -> Uci<MockIo> {
        Uci {
            io: Lazy::Initialized(io),
        }
    }

    #[proptest]
    fn new_schedules_engine_for_lazy_initialization(o: UciOptions) {
        assert!(matches!(
            Uci::new(MockIo::new(), o),
            Uci {
                io: Lazy::Uninitialized(_),
            }
        ));
    }

    #[proptest]
    fn engine_is_lazily_initialized_with_the_options_configured(o: UciOptions, d: Difficulty) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();
        let mut seq = Sequence::new();

        io.expect_send()
            .once()
            .in_sequence(&mut seq)
            .withf(|msg| msg == UciMessage::Uci.to_string())
            .returning(|_| ok());

        io.expect_flush().once().in_sequence(&mut seq).returning(ok);

        io.expect_recv()
            .once()
            .in_sequence(&mut seq)
            .returning(|| reply(UciMessage::UciOk));

        for (name, value) in o.clone() {
            let set_option = UciMessage::SetOption { name, value };
            io.expect_send()
                .once()
                .in_sequence(&mut seq)
                .withf(move |msg| msg == set_option.to_string())
                .returning(|_| ok());
        }

        io.expect_send().times(4).in_sequence(&mut seq).returning(|_| ok());
        io.expect_flush().once().in_sequence(&mut seq).returning(ok);
        io.expect_recv()
            .once()
            .in_sequence(&mut seq)
            .returning(|| reply(UciMessage::ReadyOk));

        io.expect_send().returning(|_| ok());
        io.expect_flush().returning(ok);

        let mut uci = Uci::new(io, o);
        assert_eq!(rt.block_on(uci.configure(d)), Ok(()));
        assert!(matches!(uci.io, Lazy::Initialized(_)));
    }

    #[proptest]
    fn initialization_ignores_unexpected_uci_messages(
        d: Difficulty,
        #[by_ref]
        #[filter(!matches!(#msg, UciMessage::UciOk))]
        #[strategy(any_uci_message())]
        msg: UciMessage,
    ) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();

        io.expect_send().returning(|_| ok());
        io.expect_flush().returning(ok);

        let mut seq = Sequence::new();
        io.expect_recv()
            .once()
            .in_sequence(&mut seq)
            .return_once(move || reply(msg));

        io.expect_recv()
            .once()
            .in_sequence(&mut seq)
            .returning(|| reply(UciMessage::UciOk));

        io.expect_recv()
            .once()
            .in_sequence(&mut seq)
            .returning(|| reply(UciMessage::ReadyOk));

        let mut uci = Uci::new(io, UciOptions::default());
        assert_eq!(rt.block_on(uci.configure(d)), Ok(()));
    }

    #[proptest]
    fn failed_initialization_is_not_retried(d: Difficulty, pos: Position, b: Duration) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();

        io.expect_send()
            .once()
            .return_once(|_| Box::pin(ready(Err(io::ErrorKind::BrokenPipe.into()))));

        let mut uci = Uci::new(io, UciOptions::default());
        assert_eq!(rt.block_on(uci.configure(d)), Err(OpponentError::Terminated));
        assert_eq!(rt.block_on(uci.play(pos, b)), Err(OpponentError::Terminated));
    }

    #[proptest]
    fn configure_sets_the_skill_level_and_starts_a_new_game(d: Difficulty) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();
        let mut seq = Sequence::new();

        let skill = UciMessage::SetOption {
            name: "Skill Level".into(),
            value: Some(d.get().to_string()),
        };

        for msg in [
            UciMessage::Stop,
            skill,
            UciMessage::UciNewGame,
            UciMessage::IsReady,
        ] {
            io.expect_send()
                .once()
                .in_sequence(&mut seq)
                .withf(move |m| m == msg.to_string())
                .returning(|_| ok());
        }

        io.expect_flush().once().in_sequence(&mut seq).returning(ok);
        io.expect_recv()
            .once()
            .in_sequence(&mut seq)
            .returning(|| reply(UciMessage::ReadyOk));

        let mut uci = initialized(io);
        assert_eq!(rt.block_on(uci.configure(d)), Ok(()));
    }

    #[proptest]
    fn configure_discards_messages_until_the_engine_is_ready(
        d: Difficulty,
        m: Move,
        #[by_ref]
        #[filter(!matches!(#msg, UciMessage::ReadyOk))]
        #[strategy(any_uci_message())]
        msg: UciMessage,
    ) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();

        io.expect_send().returning(|_| ok());
        io.expect_flush().returning(ok);

        let mut seq = Sequence::new();
        io.expect_recv()
            .once()
            .in_sequence(&mut seq)
            .return_once(move || reply(UciMessage::best_move(m.into())));

        io.expect_recv()
            .once()
            .in_sequence(&mut seq)
            .return_once(move || reply(msg));

        io.expect_recv()
            .once()
            .in_sequence(&mut seq)
            .returning(|| reply(UciMessage::ReadyOk));

        let mut uci = initialized(io);
        assert_eq!(rt.block_on(uci.configure(d)), Ok(()));
    }

    #[proptest]
    fn play_sends_the_position_and_the_time_budget(
        pos: Position,
        #[strategy(0u64..3_600_000)] ms: u64,
        s: Selector,
    ) {
        let m = match s.try_select(pos.moves()) {
            Some(m) => m,
            None => return Ok(()),
        };

        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();
        let mut seq = Sequence::new();

        let position = UciMessage::Position {
            startpos: false,
            fen: Some(UciFen(pos.to_string())),
            moves: Vec::new(),
        };

        let go = UciMessage::go_movetime(uci::Duration::milliseconds(ms as i64));

        io.expect_send()
            .once()
            .in_sequence(&mut seq)
            .withf(move |msg| msg == position.to_string())
            .returning(|_| ok());

        io.expect_send()
            .once()
            .in_sequence(&mut seq)
            .withf(move |msg| msg == go.to_string())
            .returning(|_| ok());

        io.expect_flush().once().in_sequence(&mut seq).returning(ok);

        io.expect_recv()
            .once()
            .in_sequence(&mut seq)
            .returning(move || reply(UciMessage::best_move(m.into())));

        let mut uci = initialized(io);
        assert_eq!(
            rt.block_on(uci.play(pos, Duration::from_millis(ms))),
            Ok(m)
        );
    }

    #[proptest]
    fn play_ignores_unexpected_uci_messages(
        pos: Position,
        b: Duration,
        m: Move,
        #[strategy(any_uci_message())] msg: UciMessage,
    ) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();

        io.expect_send().returning(|_| ok());
        io.expect_flush().returning(ok);

        let mut seq = Sequence::new();
        io.expect_recv()
            .once()
            .in_sequence(&mut seq)
            .return_once(move || reply(msg));

        io.expect_recv()
            .once()
            .in_sequence(&mut seq)
            .returning(move || reply(UciMessage::best_move(m.into())));

        let mut uci = initialized(io);
        assert_eq!(rt.block_on(uci.play(pos, b)), Ok(m));
    }

    #[proptest]
    fn play_ignores_invalid_uci_messages(
        pos: Position,
        b: Duration,
        m: Move,
        #[by_ref]
        #[filter(!#msg.trim().starts_with("bestmove"))]
        #[filter(matches!(uci::parse_one(#msg.trim()), UciMessage::Unknown(_, _)))]
        msg: String,
    ) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();

        io.expect_send().returning(|_| ok());
        io.expect_flush().returning(ok);

        let mut seq = Sequence::new();
        io.expect_recv()
            .once()
            .in_sequence(&mut seq)
            .return_once(move || reply(msg));

        io.expect_recv()
            .once()
            .in_sequence(&mut seq)
            .returning(move || reply(UciMessage::best_move(m.into())));

        let mut uci = initialized(io);
        assert_eq!(rt.block_on(uci.play(pos, b)), Ok(m));
    }

    #[proptest]
    fn play_reports_engines_without_moves(
        pos: Position,
        b: Duration,
        #[strategy(prop_oneof![Just("bestmove (none)"), Just("bestmove 0000"), Just("bestmove")])]
        line: &'static str,
    ) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();

        io.expect_send().returning(|_| ok());
        io.expect_flush().returning(ok);
        io.expect_recv().once().returning(move || reply(line));

        let mut uci = initialized(io);
        assert_eq!(rt.block_on(uci.play(pos, b)), Err(OpponentError::NoMove));
    }

    #[proptest]
    fn play_reports_terminated_engines(pos: Position, b: Duration) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();

        io.expect_send().returning(|_| ok());
        io.expect_flush().returning(ok);
        io.expect_recv()
            .once()
            .returning(|| Box::pin(ready(Err(io::ErrorKind::UnexpectedEof.into()))));

        let mut uci = initialized(io);
        assert_eq!(rt.block_on(uci.play(pos, b)), Err(OpponentError::Terminated));
    }

    #[proptest]
    fn play_reports_io_failures_as_protocol_errors(
        pos: Position,
        b: Duration,
        #[by_ref]
        #[filter(!matches!(#e.kind(), io::ErrorKind::UnexpectedEof | io::ErrorKind::BrokenPipe))]
        e: io::Error,
    ) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();

        io.expect_send()
            .once()
            .return_once(move |_| Box::pin(ready(Err(e))));

        let mut uci = initialized(io);
        assert!(matches!(
            rt.block_on(uci.play(pos, b)),
            Err(OpponentError::Protocol(_))
        ));
    }

    #[proptest]
    fn drop_gracefully_quits_initialized_engine() {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();
        let mut seq = Sequence::new();

        io.expect_send()
            .once()
            .in_sequence(&mut seq)
            .withf(|msg| msg == UciMessage::Stop.to_string())
            .returning(|_| ok());

        io.expect_send()
            .once()
            .in_sequence(&mut seq)
            .withf(|msg| msg == UciMessage::Quit.to_string())
            .returning(|_| ok());

        io.expect_flush().once().in_sequence(&mut seq).returning(ok);

        rt.block_on(async move {
            drop(initialized(io));
        })
    }

    #[proptest]
    fn drop_does_not_initialize_the_engine(o: UciOptions) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();
        io.expect_send().never();
        io.expect_flush().never();
        io.expect_recv().never();

        rt.block_on(async move {
            drop(Uci::new(io, o));
        })
    }

    #[proptest]
    fn drop_recovers_from_errors(e: io::Error) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();
        io.expect_send()
            .once()
            .return_once(move |_| Box::pin(ready(Err(e))));

        rt.block_on(async move {
            drop(initialized(io));
        })
    }

    #[proptest]
    fn drop_recovers_from_missing_runtime() {
        drop(initialized(MockIo::new()));
    }
}
