use derive_more::{Display, Error};
use lib::chess::{Promotion, Square};
use lib::geometry::{Button, Layout, Point};
use lib::opponent::Difficulty;
use lib::session::{BoardView, Command, MenuView, Scene};
use std::fmt::Write;

/// What the player typed, as pointer clicks or as commands.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Input {
    #[display(fmt = "click {}", _0)]
    Click(Point),
    #[display(fmt = "{}", _0)]
    Command(Command),
}

/// The reason why parsing [`Input`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "unrecognized input `{}`", _0)]
pub struct ParseInputError(#[error(not(source))] String);

/// Renders scenes as text and translates typed words into clicks on the [`Layout`].
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Terminal {
    layout: Layout,
}

fn promotion_name(p: Promotion) -> &'static str {
    match p {
        Promotion::None => "",
        Promotion::Knight => "Knight",
        Promotion::Bishop => "Bishop",
        Promotion::Rook => "Rook",
        Promotion::Queen => "Queen",
    }
}

impl Terminal {
    /// Constructs [`Terminal`] for the given [`Layout`].
    pub fn new(layout: Layout) -> Self {
        Terminal { layout }
    }

    fn square(&self, s: Square) -> Input {
        Input::Click(self.layout.square_rect(s).center())
    }

    fn promotion(&self, word: &str) -> Option<Input> {
        self.layout
            .promotion_buttons()
            .find(|(p, _)| {
                word.eq_ignore_ascii_case(&p.to_string())
                    || word.eq_ignore_ascii_case(promotion_name(*p))
            })
            .map(|(_, r)| Input::Click(r.center()))
    }

    /// Parses a line of input.
    ///
    /// Square names become clicks on the board, so `e2e4` is the same as `e2` followed by `e4`,
    /// and a trailing promotion letter clicks on the promotion panel.
    pub fn parse(&self, line: &str) -> Result<Vec<Input>, ParseInputError> {
        let mut inputs = Vec::new();

        for word in line.split_whitespace() {
            let lowercase = word.to_ascii_lowercase();

            let command = match lowercase.as_str() {
                "quit" | "exit" => Some(Command::Quit),
                "restart" => Some(Command::Restart),
                "menu" => Some(Command::Menu),
                _ => None,
            };

            if let Some(cmd) = command {
                inputs.push(Input::Command(cmd));
            } else if let Some(click) = self.promotion(word) {
                inputs.push(click);
            } else if let Ok(d) = word.parse::<Difficulty>() {
                inputs.push(Input::Command(Command::Start(d)));
            } else {
                inputs.extend(self.coordinates(&lowercase).ok_or_else(|| {
                    ParseInputError(word.into())
                })?);
            }
        }

        Ok(inputs)
    }

    fn coordinates(&self, word: &str) -> Option<Vec<Input>> {
        let mut inputs = Vec::new();
        let mut rest = word;

        while rest.len() >= 2 && rest.is_char_boundary(2) {
            let (head, tail) = rest.split_at(2);
            inputs.push(self.square(head.parse().ok()?));
            rest = tail;
        }

        if !rest.is_empty() {
            if inputs.is_empty() {
                return None;
            }

            inputs.push(self.promotion(rest)?);
        }

        (!inputs.is_empty()).then_some(inputs)
    }

    /// Draws the [`Scene`] as text.
    pub fn render(&self, scene: &Scene) -> String {
        match scene {
            Scene::Menu(view) => self.render_menu(view),
            Scene::Board(view) => self.render_board(view),
        }
    }

    fn render_menu(&self, view: &MenuView) -> String {
        let mut out = String::from("Choose the engine's difficulty:\n");

        for (b, _) in &view.buttons {
            let line = match b {
                Button::Difficulty(d) => format!("{:<8} {}", b.to_string(), d),
                _ => b.to_string().to_lowercase(),
            };

            writeln!(out, "  {}", line).ok();
        }

        if view.ready {
            out.push_str("Engine: Ready\n");
        } else {
            out.push_str("Engine: Not Found/Error\n");
        }

        out.push_str("Type a difficulty (or a skill level from 0 to 20), or quit.\n");
        out
    }

    fn render_board(&self, view: &BoardView) -> String {
        let mut out = String::new();

        for rank in (0..8).rev() {
            write!(out, "{} ", rank + 1).ok();

            for file in 0..8 {
                let s = match Square::new(file, rank) {
                    Some(s) => s,
                    None => continue,
                };

                let piece = view
                    .sprite_on(s)
                    .map_or_else(|| ".".to_string(), |x| x.piece.to_string());

                let (l, r) = if view.selected == Some(s) {
                    ('[', ']')
                } else if view.destinations.contains(&s) {
                    ('(', ')')
                } else if view.last.map_or(false, |m| m.whence() == s || m.whither() == s) {
                    ('<', '>')
                } else {
                    (' ', ' ')
                };

                write!(out, "{}{}{}", l, piece, r).ok();
            }

            out.push('\n');
        }

        out.push_str("   a  b  c  d  e  f  g  h\n");

        if !view.promotion.is_empty() {
            out.push_str("Promote to:");
            for (p, _) in &view.promotion {
                write!(out, " {} ({})", promotion_name(*p), p).ok();
            }
            out.push('\n');
        }

        writeln!(out, "{}", view.status()).ok();

        if let Some(n) = view.notice {
            writeln!(out, "{}", n).ok();
        }

        let buttons: Vec<_> = view
            .buttons
            .iter()
            .map(|(b, _)| b.to_string().to_lowercase())
            .chain(["menu".to_string()])
            .collect();

        writeln!(out, "[{}]", buttons.join(" | ")).ok();
        out
    }
}
