use crate::animation::Animator;
use crate::chess::{Color, IllegalMove, Move, Outcome, Position};
use crate::geometry::{Button, Layout, Point};
use crate::opponent::{Coordinator, Difficulty, Opponent, OpponentError, SubmitError};
use derive_more::Display;
use std::{ops::Not, time::Instant};
use tokio::runtime::Handle;
use tracing::{debug, info, instrument, warn};

mod config;
mod promotion;
mod scene;
mod selection;

pub use config::*;
pub use promotion::*;
pub use scene::*;
pub use selection::*;

/// The side played by the human.
const HUMAN: Color = Color::White;

/// Whose move it is.
#[derive(Debug, Display, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Turn {
    #[default]
    #[display(fmt = "White (You)")]
    Human,
    #[display(fmt = "Black (Engine)")]
    Opponent,
}

impl Not for Turn {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Turn::Human => Turn::Opponent,
            Turn::Opponent => Turn::Human,
        }
    }
}

impl From<Color> for Turn {
    fn from(c: Color) -> Self {
        if c == HUMAN {
            Turn::Human
        } else {
            Turn::Opponent
        }
    }
}

/// Why a game ended.
#[derive(Debug, Display, Clone, Eq, PartialEq, Hash)]
pub enum Conclusion {
    #[display(fmt = "{}", _0)]
    Outcome(Outcome),
    /// The opponent replied without a move, which UCI engines do to resign or to offer a draw.
    #[display(fmt = "the opponent resigned or offered a draw")]
    Forfeit,
    #[display(fmt = "engine failure: {}", _0)]
    EngineFailure(OpponentError),
}

/// The stage of the session.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash)]
pub enum Phase {
    /// Waiting for a difficulty to be chosen.
    #[default]
    Menu,
    Playing,
    /// The game is over, only restarting or going back to the menu are possible.
    Concluded(Conclusion),
}

/// A request issued outside of the board.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Command {
    /// Starts a new game at the given difficulty.
    #[display(fmt = "start {}", _0)]
    Start(Difficulty),
    /// Starts a new game at the current difficulty.
    #[display(fmt = "restart")]
    Restart,
    /// Goes back to the difficulty menu.
    #[display(fmt = "menu")]
    Menu,
    #[display(fmt = "quit")]
    Quit,
}

/// Whether the host should keep running the session.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Flow {
    Continue,
    Quit,
}

/// A persistent message about the state of the session.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Notice {
    #[display(fmt = "Engine: not found or failed to start")]
    EngineUnavailable,
}

/// Everything about the game in progress.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Context {
    position: Position,
    selection: Selection,
    promotion: Option<PendingPromotion>,
    animator: Animator,
    turn: Turn,
    phase: Phase,
    last: Option<Move>,
}

impl Context {
    fn new(position: Position) -> Self {
        Context {
            turn: position.turn().into(),
            position,
            phase: Phase::Playing,
            ..Context::default()
        }
    }

    /// The current [`Position`].
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// The piece the human is about to move.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The pawn move awaiting a promotion choice, if any.
    pub fn promotion(&self) -> Option<&PendingPromotion> {
        self.promotion.as_ref()
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The last move played by either side.
    pub fn last_move(&self) -> Option<Move> {
        self.last
    }
}

/// A game between the human and an [`Opponent`].
///
/// The session never blocks: clicks and commands are handled immediately,
/// the opponent thinks in the background, and [`Session::tick`] advances
/// whatever is waiting on time.
#[derive(Debug)]
pub struct Session<O> {
    config: Config,
    setup: Position,
    context: Context,
    difficulty: Option<Difficulty>,
    generation: u64,
    coordinator: Coordinator<O>,
    notice: Option<Notice>,
}

impl<O: Opponent + 'static> Session<O> {
    /// Constructs [`Session`] on the difficulty menu.
    ///
    /// Requests to the opponent are served on the given runtime.
    pub fn new(config: Config, engine: Option<O>, runtime: Handle) -> Self {
        let coordinator = Coordinator::new(engine, config.budget, config.grace, runtime);
        let notice = (!coordinator.is_available()).then_some(Notice::EngineUnavailable);

        Session {
            config,
            setup: Position::default(),
            context: Context::default(),
            difficulty: None,
            generation: 0,
            coordinator,
            notice,
        }
    }

    /// Games start from the given position rather than the standard one.
    pub fn with_setup(mut self, setup: Position) -> Self {
        self.setup = setup;
        self
    }

    /// The state of the game.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Where things are on the screen.
    pub fn layout(&self) -> &Layout {
        &self.config.layout
    }

    /// The difficulty chosen for the current game.
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice
    }

    fn reset(&mut self, difficulty: Difficulty) {
        self.generation = self.generation.wrapping_add(1);
        self.difficulty = Some(difficulty);
        self.context = Context::new(self.setup.clone());
        info!(generation = self.generation, %difficulty, "new game");
    }

    /// Handles a [`Command`].
    #[instrument(level = "debug", skip(self, _now))]
    pub fn command(&mut self, cmd: Command, _now: Instant) -> Flow {
        match cmd {
            Command::Start(d) => self.reset(d),

            Command::Restart => match (&self.context.phase, self.difficulty) {
                (Phase::Menu, _) | (_, None) => debug!("nothing to restart"),
                (_, Some(d)) => self.reset(d),
            },

            Command::Menu => {
                self.generation = self.generation.wrapping_add(1);
                self.difficulty = None;
                self.context = Context::default();
            }

            Command::Quit => return Flow::Quit,
        }

        Flow::Continue
    }

    /// Handles a click at the point on the screen.
    #[instrument(level = "debug", skip(self, now))]
    pub fn click(&mut self, p: Point, now: Instant) -> Flow {
        let layout = self.config.layout;
        let menu = matches!(self.context.phase, Phase::Menu);

        match layout.button_at(p, menu) {
            Some(Button::Difficulty(d)) => return self.command(Command::Start(d), now),
            Some(Button::Restart) => return self.command(Command::Restart, now),
            Some(Button::Quit) => return self.command(Command::Quit, now),
            None => {}
        }

        let ctx = &mut self.context;
        if ctx.phase != Phase::Playing || ctx.turn != Turn::Human || ctx.animator.is_active(now) {
            return Flow::Continue;
        }

        if let Some(pending) = ctx.promotion {
            if let Some(choice) = layout.promotion_at(p) {
                ctx.promotion = None;
                match pending.choose(&ctx.position, choice) {
                    Ok(m) => self.play(m, now),
                    Err(e) => {
                        warn!("discarding pending promotion: {}", e);
                        ctx.selection.clear();
                    }
                }
            }

            return Flow::Continue;
        }

        match ctx.selection.click(&ctx.position, HUMAN, layout.square_at(p)) {
            Transition::Commit(m) => self.play(m, now),
            Transition::Promote(whence, whither) => {
                ctx.promotion = Some(PendingPromotion::new(whence, whither));
            }
            t => debug!(?t),
        }

        Flow::Continue
    }

    fn apply(&mut self, m: Move, now: Instant) -> Result<(), IllegalMove> {
        let layout = self.config.layout;
        let ctx = &mut self.context;
        ctx.position.play(m)?;

        if let Some(piece) = ctx.position.piece_on(m.whither()) {
            let whence = layout.square_rect(m.whence()).center();
            let whither = layout.square_rect(m.whither()).center();
            let duration = self.config.animation;
            ctx.animator.start(m.whither(), piece, whence, whither, now, duration);
        }

        ctx.selection.clear();
        ctx.promotion = None;
        ctx.last = Some(m);
        ctx.turn = !ctx.turn;

        Ok(())
    }

    fn play(&mut self, m: Move, now: Instant) {
        match self.apply(m, now) {
            Ok(()) => debug!(%m, "played"),
            Err(e) => warn!("{}", e),
        }
    }

    fn conclude(&mut self, conclusion: Conclusion) {
        info!(%conclusion, "game over");
        self.context.phase = Phase::Concluded(conclusion);
    }

    /// Advances the animation and the exchange with the opponent.
    pub fn tick(&mut self, now: Instant) {
        if self.context.phase == Phase::Playing && !self.context.animator.is_active(now) {
            self.context.animator.settle(now);

            if let Some(outcome) = self.context.position.outcome() {
                self.conclude(Conclusion::Outcome(outcome));
            } else if self.context.turn == Turn::Opponent {
                return self.await_opponent(now);
            }
        }

        if let Some(reply) = self.coordinator.poll(self.generation) {
            warn!(?reply, "ignoring unexpected reply");
        }
    }

    fn await_opponent(&mut self, now: Instant) {
        match self.coordinator.poll(self.generation) {
            Some(Ok(m)) => {
                if let Err(e) = self.apply(m, now) {
                    self.conclude(Conclusion::EngineFailure(OpponentError::Protocol(e.to_string())));
                }
            }

            Some(Err(OpponentError::NoMove)) => self.conclude(Conclusion::Forfeit),
            Some(Err(e)) => self.conclude(Conclusion::EngineFailure(e)),

            None if self.coordinator.is_pending() => {}

            None => {
                let difficulty = match self.difficulty {
                    Some(d) => d,
                    None => {
                        warn!("no difficulty chosen");
                        return;
                    }
                };

                let pos = self.context.position.clone();
                match self.coordinator.submit(self.generation, pos, difficulty) {
                    Ok(()) => self.notice = None,
                    Err(SubmitError::Busy) => {}
                    Err(SubmitError::Unavailable) => {
                        if self.notice.replace(Notice::EngineUnavailable).is_none() {
                            warn!("the opponent is unavailable");
                        }
                    }
                }
            }
        }
    }

    /// What to draw.
    pub fn scene(&self, now: Instant) -> Scene {
        let layout = self.config.layout;
        let ctx = &self.context;

        if ctx.phase == Phase::Menu {
            return Scene::Menu(MenuView {
                buttons: layout.buttons(true),
                ready: self.coordinator.is_available(),
            });
        }

        let moving = ctx.animator.current().map(|a| (a.square(), a.piece(), a.sample(now)));

        let mut sprites: Vec<_> = ctx
            .position
            .iter()
            .filter(|(_, s)| moving.map_or(true, |(m, _, _)| m != *s))
            .map(|(piece, s)| Sprite {
                piece,
                center: layout.square_rect(s).center(),
                moving: false,
            })
            .collect();

        if let Some((_, piece, center)) = moving {
            sprites.push(Sprite {
                piece,
                center,
                moving: true,
            });
        }

        let conclusion = match &ctx.phase {
            Phase::Concluded(c) => Some(c.clone()),
            _ => None,
        };

        let promotion = match ctx.promotion {
            Some(_) => layout.promotion_buttons().collect(),
            None => Vec::new(),
        };

        Scene::Board(BoardView {
            layout,
            sprites,
            selected: ctx.selection.square(),
            destinations: ctx.selection.destinations().to_vec(),
            last: ctx.last,
            promotion,
            turn: ctx.turn,
            conclusion,
            notice: self.notice,
            buttons: layout.buttons(false),
        })
    }
}
