use crate::games::mr_white::scores::Scoreboard;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

pub const MIN_PLAYERS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    CardReveal,
    Discussion,
    Voting,
    MrWhiteGuess,
    GameOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Setup => "setup",
            Phase::CardReveal => "card reveal",
            Phase::Discussion => "discussion",
            Phase::Voting => "voting",
            Phase::MrWhiteGuess => "Mr. White's guess",
            Phase::GameOver => "game over",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("player name cannot be empty")]
    EmptyName,
    #[error("'{0}' is already playing")]
    DuplicatePlayer(String),
    #[error("need at least {} players to start, have {have}", MIN_PLAYERS)]
    NotEnoughPlayers { have: usize },
    #[error("there is no player number {}", .0 + 1)]
    NoSuchPlayer(usize),
    #[error("{0} has already been eliminated")]
    AlreadyEliminated(String),
    #[error("cannot {action} during {phase}")]
    WrongPhase { action: &'static str, phase: Phase },
    #[error("the secret word cannot be empty")]
    EmptyWord,
}

/// What a single player sees when it is their turn with the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Card {
    MrWhite,
    Word(String),
}

/// How a finished game was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Mr. White outlasted everyone else.
    Survived,
    /// Mr. White was voted out but named the word.
    GuessedWord,
    /// Mr. White was voted out and missed the word; the group wins.
    Caught,
}

impl Outcome {
    pub fn mr_white_won(self) -> bool {
        !matches!(self, Outcome::Caught)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elimination {
    /// The eliminated player was Mr. White; they get one guess.
    MrWhiteCaught,
    /// An innocent went out and the game continues with this round number.
    NextRound(u32),
    /// An innocent went out and Mr. White is the last one standing.
    MrWhiteSurvived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub word: String,
    pub mr_white: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
struct ActiveGame {
    word: String,
    mr_white: usize,
    /// Indices into the roster, in elimination order. Never holds duplicates.
    eliminated: Vec<usize>,
    round: u32,
    outcome: Option<Outcome>,
}

/// The Mr. White state machine: roster, phases, eliminations and scoring.
///
/// Pure game rules. Words come in as plain strings and randomness through the
/// `Rng` handed to [`GameSession::start_game`], so every transition can be driven
/// deterministically.
#[derive(Debug, Clone)]
pub struct GameSession {
    players: Vec<String>,
    phase: Phase,
    game: Option<ActiveGame>,
    scores: Scoreboard,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            phase: Phase::Setup,
            game: None,
            scores: Scoreboard::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn round(&self) -> u32 {
        self.game.as_ref().map_or(1, |g| g.round)
    }

    pub fn scores(&self) -> &Scoreboard {
        &self.scores
    }

    pub fn is_eliminated(&self, index: usize) -> bool {
        self.game.as_ref().is_some_and(|g| g.eliminated.contains(&index))
    }

    /// Eliminated players, in the order they went out.
    pub fn eliminated(&self) -> Vec<&str> {
        self.game
            .as_ref()
            .map(|g| g.eliminated.iter().map(|&i| self.players[i].as_str()).collect())
            .unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.players.len() - self.game.as_ref().map_or(0, |g| g.eliminated.len())
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.game.as_ref().and_then(|g| g.outcome)
    }

    pub fn mr_white_won_last_game(&self) -> bool {
        self.outcome().is_some_and(Outcome::mr_white_won)
    }

    /// Word, Mr. White and outcome. Only available once the game is over.
    pub fn summary(&self) -> Option<GameSummary> {
        let game = self.game.as_ref()?;
        Some(GameSummary {
            word: game.word.clone(),
            mr_white: self.players[game.mr_white].clone(),
            outcome: game.outcome?,
        })
    }

    pub fn add_player(&mut self, name: &str) -> Result<(), GameError> {
        self.expect_phase(Phase::Setup, "add players")?;
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::EmptyName);
        }
        if self.players.iter().any(|p| p == name) {
            return Err(GameError::DuplicatePlayer(name.to_string()));
        }
        self.players.push(name.to_string());
        Ok(())
    }

    pub fn remove_player(&mut self, index: usize) -> Result<String, GameError> {
        self.expect_phase(Phase::Setup, "remove players")?;
        if index >= self.players.len() {
            return Err(GameError::NoSuchPlayer(index));
        }
        Ok(self.players.remove(index))
    }

    /// Checks everything [`GameSession::start_game`] checks, without needing a word.
    pub fn ensure_can_start(&self) -> Result<(), GameError> {
        self.expect_phase(Phase::Setup, "start a game")?;
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers { have: self.players.len() });
        }
        Ok(())
    }

    pub fn start_game<R: Rng>(&mut self, word: String, rng: &mut R) -> Result<(), GameError> {
        self.ensure_can_start()?;
        if word.trim().is_empty() {
            return Err(GameError::EmptyWord);
        }

        let mr_white = rng.random_range(0..self.players.len());
        debug!(%word, mr_white = %self.players[mr_white], "secret roles assigned");
        self.game = Some(ActiveGame {
            word,
            mr_white,
            eliminated: Vec::new(),
            round: 1,
            outcome: None,
        });
        self.phase = Phase::CardReveal;
        info!(players = self.players.len(), "game started");
        Ok(())
    }

    /// The card for the player at `index`. Viewing never changes the game.
    pub fn card(&self, index: usize) -> Result<Card, GameError> {
        self.expect_phase(Phase::CardReveal, "view cards")?;
        let game = self.active("view cards")?;
        let name = self.players.get(index).ok_or(GameError::NoSuchPlayer(index))?;
        if game.eliminated.contains(&index) {
            return Err(GameError::AlreadyEliminated(name.clone()));
        }
        Ok(if index == game.mr_white {
            Card::MrWhite
        } else {
            Card::Word(game.word.clone())
        })
    }

    /// Card reveal → discussion → voting. Both steps are the facilitator's call.
    pub fn advance_phase(&mut self) -> Result<Phase, GameError> {
        self.phase = match self.phase {
            Phase::CardReveal => Phase::Discussion,
            Phase::Discussion => Phase::Voting,
            phase => return Err(GameError::WrongPhase { action: "move to the next phase", phase }),
        };
        Ok(self.phase)
    }

    pub fn eliminate(&mut self, index: usize) -> Result<Elimination, GameError> {
        self.expect_phase(Phase::Voting, "eliminate players")?;
        let phase = self.phase;
        let game = self
            .game
            .as_mut()
            .ok_or(GameError::WrongPhase { action: "eliminate players", phase })?;
        let name = self.players.get(index).ok_or(GameError::NoSuchPlayer(index))?;
        if game.eliminated.contains(&index) {
            return Err(GameError::AlreadyEliminated(name.clone()));
        }

        game.eliminated.push(index);
        info!(player = %name, round = game.round, "player eliminated");

        if index == game.mr_white {
            self.phase = Phase::MrWhiteGuess;
            return Ok(Elimination::MrWhiteCaught);
        }

        let remaining = self.players.len() - game.eliminated.len();
        if remaining > 1 {
            game.round += 1;
            self.phase = Phase::CardReveal;
            return Ok(Elimination::NextRound(game.round));
        }

        game.outcome = Some(Outcome::Survived);
        self.scores.credit(&self.players[game.mr_white]);
        self.phase = Phase::GameOver;
        info!(mr_white = %self.players[game.mr_white], "Mr. White survived");
        Ok(Elimination::MrWhiteSurvived)
    }

    /// Mr. White's single guess. Case and surrounding whitespace are ignored.
    pub fn submit_guess(&mut self, guess: &str) -> Result<Outcome, GameError> {
        self.expect_phase(Phase::MrWhiteGuess, "guess the word")?;
        let phase = self.phase;
        let game = self
            .game
            .as_mut()
            .ok_or(GameError::WrongPhase { action: "guess the word", phase })?;

        let outcome = if normalize(guess) == normalize(&game.word) {
            self.scores.credit(&self.players[game.mr_white]);
            Outcome::GuessedWord
        } else {
            for (i, player) in self.players.iter().enumerate() {
                if i != game.mr_white {
                    self.scores.credit(player);
                }
            }
            Outcome::Caught
        };

        game.outcome = Some(outcome);
        self.phase = Phase::GameOver;
        info!(?outcome, "game over");
        Ok(outcome)
    }

    /// Back to setup for another game with the same players and scores.
    pub fn soft_reset(&mut self) -> Result<(), GameError> {
        self.expect_phase(Phase::GameOver, "start a new game")?;
        self.game = None;
        self.phase = Phase::Setup;
        Ok(())
    }

    /// Wipe the game, the roster and the scoreboard. Allowed in any phase.
    pub fn hard_reset(&mut self) {
        self.game = None;
        self.players.clear();
        self.scores.clear();
        self.phase = Phase::Setup;
        info!("session reset");
    }

    fn expect_phase(&self, expected: Phase, action: &'static str) -> Result<(), GameError> {
        if self.phase != expected {
            return Err(GameError::WrongPhase { action, phase: self.phase });
        }
        Ok(())
    }

    fn active(&self, action: &'static str) -> Result<&ActiveGame, GameError> {
        self.game
            .as_ref()
            .ok_or(GameError::WrongPhase { action, phase: self.phase })
    }
}

fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}
