use crate::core::game::{Context, Game};
use crate::games::mr_white::command::{Command, ParseError, HELP};
use crate::games::mr_white::generator::GenerateError;
use crate::games::mr_white::renderer;
use crate::games::mr_white::session::{Card, Elimination, GameError, GameSession, GameSummary, Outcome, Phase};
use crate::games::mr_white::words::{WordOrigin, WordSupplier};
use async_trait::async_trait;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::debug;

#[derive(Debug)]
pub enum MrWhiteEvent {
    /// A background top-up fetch finished. `generation` is the supplier's at spawn time.
    WordFetched {
        generation: u64,
        result: Result<String, GenerateError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub number: usize,
    pub name: String,
    pub eliminated: bool,
}

/// Everything that may be on screen for the whole table.
///
/// Holds no card contents: the secret word and Mr. White only appear in
/// `summary`, once the game is over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub phase: Phase,
    pub round: u32,
    pub players: Vec<PlayerView>,
    /// Names in the order they were voted out.
    pub eliminated: Vec<String>,
    pub scores: Vec<(String, u32)>,
    pub queued_words: usize,
    pub mr_white_won_last_game: bool,
    pub summary: Option<GameSummary>,
    pub message: String,
}

/// Process-wide game host: the session (roster, scores) plus the word queue.
///
/// Created once at startup and owned by the engine loop; a hard reset clears the
/// session but the word queue lives until the process exits.
pub struct MrWhiteGame {
    session: GameSession,
    words: WordSupplier,
    rng: StdRng,
    revealed: Option<(usize, Card)>,
    status: String,
}

impl MrWhiteGame {
    pub fn new(words: WordSupplier, rng: StdRng) -> Self {
        Self {
            session: GameSession::new(),
            words,
            rng,
            revealed: None,
            status: "Add at least 3 players, then type 'start'. Type 'help' for commands.".into(),
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn words(&self) -> &WordSupplier {
        &self.words
    }

    pub fn words_mut(&mut self) -> &mut WordSupplier {
        &mut self.words
    }

    /// The card currently on screen, if a player just asked to see theirs.
    pub fn revealed(&self) -> Option<(&str, &Card)> {
        self.revealed
            .as_ref()
            .map(|(i, card)| (self.session.players()[*i].as_str(), card))
    }

    async fn apply(&mut self, command: Command, ctx: &Context<MrWhiteEvent>) -> Result<String, GameError> {
        let message = match command {
            Command::Add(name) => {
                self.session.add_player(&name)?;
                format!("Added {}.", name.trim())
            }
            Command::Remove(index) => format!("Removed {}.", self.session.remove_player(index)?),
            Command::Start => self.start().await?,
            Command::View(index) => {
                let card = self.session.card(index)?;
                let name = self.session.players()[index].clone();
                self.revealed = Some((index, card));
                format!("Only {name} should look! Enter any command to hide the card.")
            }
            Command::Next => match self.session.advance_phase()? {
                Phase::Discussion => "Discuss the word without saying it. Mr. White, blend in!".into(),
                _ => "Vote: eliminate the player you think is Mr. White.".into(),
            },
            Command::Eliminate(index) => self.eliminate(index, ctx)?,
            Command::Guess(text) => {
                self.session.submit_guess(&text)?;
                self.top_up(ctx);
                self.game_over_message()
            }
            Command::NewGame => {
                self.session.soft_reset()?;
                "New game: same players, scores kept. Type 'start' when ready.".into()
            }
            Command::Reset => {
                self.session.hard_reset();
                "Game reset: players and scores cleared.".into()
            }
            Command::Prefetch(count) => {
                let report = self.words.prefetch(count).await;
                if report.fallback == 0 {
                    format!("Generated {} words for upcoming games.", report.generated)
                } else {
                    format!(
                        "Queued {} words ({} from the fallback list, word service unavailable).",
                        report.total(),
                        report.fallback
                    )
                }
            }
            Command::Fallback(count) => {
                self.words.add_fallback_words(count);
                format!("Added {count} fallback words.")
            }
            Command::TestGenerator => match self.words.source().fetch().await {
                Ok(word) => format!("Word service working! Generated: {word}"),
                Err(e) => format!("Word service failed ({e}). Fallback words will be used."),
            },
            Command::Credential(key) => {
                if self.words.set_credential(key) {
                    "Credential updated, queued words discarded.".into()
                } else {
                    "Credential unchanged.".into()
                }
            }
            Command::Help => HELP.to_string(),
        };
        Ok(message)
    }

    async fn start(&mut self) -> Result<String, GameError> {
        // Validate first so a rejected start does not use up a queued word.
        self.session.ensure_can_start()?;
        let supplied = self.words.supply_word().await;
        self.session.start_game(supplied.word, &mut self.rng)?;

        let mut message = String::from("Round 1. Pass the device: each player types 'view <n>' to see their card.");
        if supplied.origin == WordOrigin::Fallback {
            message.push_str(" (Word service unavailable, using a fallback word.)");
        }
        Ok(message)
    }

    fn eliminate(&mut self, index: usize, ctx: &Context<MrWhiteEvent>) -> Result<String, GameError> {
        let result = self.session.eliminate(index)?;
        let name = &self.session.players()[index];
        let message = match result {
            Elimination::MrWhiteCaught => format!("{name} was Mr. White! One chance to guess the word: 'guess <word>'."),
            Elimination::NextRound(round) => format!("{name} was not Mr. White. Round {round}: check your cards again."),
            Elimination::MrWhiteSurvived => {
                let line = format!("{name} was not Mr. White. {}", self.game_over_message());
                self.top_up(ctx);
                line
            }
        };
        Ok(message)
    }

    fn game_over_message(&self) -> String {
        let Some(summary) = self.session.summary() else {
            return "Game over.".into();
        };
        match summary.outcome {
            Outcome::Survived => format!(
                "Mr. White ({}) avoided being caught and wins! The word was '{}'.",
                summary.mr_white, summary.word
            ),
            Outcome::GuessedWord => format!(
                "Mr. White ({}) guessed the word '{}' and wins!",
                summary.mr_white, summary.word
            ),
            Outcome::Caught => format!(
                "The group wins! The word was '{}', Mr. White was {}.",
                summary.word, summary.mr_white
            ),
        }
    }

    /// Queue one more word in the background when the queue is running low.
    fn top_up(&self, ctx: &Context<MrWhiteEvent>) {
        if !self.words.needs_top_up() {
            return;
        }
        let source = self.words.source().clone();
        let generation = self.words.generation();
        ctx.spawn(async move {
            MrWhiteEvent::WordFetched { generation, result: source.fetch().await }
        });
    }
}

#[async_trait]
impl Game for MrWhiteGame {
    type Command = Command;
    type Event = MrWhiteEvent;
    type State = TableView;

    fn parse_command(line: &str) -> Result<Self::Command, String> {
        line.parse().map_err(|e: ParseError| e.to_string())
    }

    async fn handle_command(&mut self, command: Self::Command, ctx: &Context<Self::Event>) {
        self.revealed = None;
        self.status = match self.apply(command, ctx).await {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "action rejected");
                format!("⚠ {e}")
            }
        };
    }

    fn handle_event(&mut self, event: Self::Event, _ctx: &Context<Self::Event>) {
        match event {
            MrWhiteEvent::WordFetched { generation, result } => {
                if let Some(origin) = self.words.accept_from(generation, result) {
                    debug!(?origin, queued = self.words.queued(), "word queue topped up");
                }
            }
        }
    }

    fn report(&mut self, message: String) {
        self.status = format!("⚠ {message}");
    }

    fn status(&self) -> &str {
        &self.status
    }

    fn state(&self) -> Self::State {
        let session = &self.session;
        TableView {
            phase: session.phase(),
            round: session.round(),
            players: session
                .players()
                .iter()
                .enumerate()
                .map(|(i, name)| PlayerView {
                    number: i + 1,
                    name: name.clone(),
                    eliminated: session.is_eliminated(i),
                })
                .collect(),
            eliminated: session.eliminated().into_iter().map(str::to_string).collect(),
            scores: session
                .scores()
                .ranking()
                .into_iter()
                .map(|(name, wins)| (name.to_string(), wins))
                .collect(),
            queued_words: self.words.queued(),
            mr_white_won_last_game: session.mr_white_won_last_game(),
            summary: session.summary(),
            message: self.status.clone(),
        }
    }

    fn render(&self, frame: &mut ratatui::Frame, input: &str) -> Option<(u16, u16)> {
        renderer::draw(frame, &self.state(), self.revealed(), input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::mr_white::generator::WordGenerator;
    use crate::games::mr_white::words::tests::{supplier, Scripted};
    use crate::games::mr_white::words::FALLBACK_WORDS;
    use rand::SeedableRng;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn game(generator: Arc<dyn WordGenerator>, credential: Option<&str>) -> MrWhiteGame {
        MrWhiteGame::new(supplier(generator, credential), StdRng::seed_from_u64(3))
    }

    async fn run(game: &mut MrWhiteGame, ctx: &Context<MrWhiteEvent>, line: &str) {
        let command = MrWhiteGame::parse_command(line).unwrap();
        game.handle_command(command, ctx).await;
    }

    fn mr_white_index(game: &MrWhiteGame) -> usize {
        (0..game.session.players().len())
            .find(|&i| game.session.card(i) == Ok(Card::MrWhite))
            .unwrap()
    }

    #[tokio::test]
    async fn start_uses_generated_word_and_hides_it_from_the_table() {
        let mut game = game(Arc::new(Scripted::new(vec![Ok("Lighthouse.")])), Some("key"));
        let (tx, _rx) = mpsc::unbounded_channel();
        let ctx = Context::new(tx);

        for name in ["Ana", "Ben", "Cleo"] {
            run(&mut game, &ctx, &format!("add {name}")).await;
        }
        run(&mut game, &ctx, "start").await;

        assert_eq!(game.session.phase(), Phase::CardReveal);
        let state = game.state();
        assert!(state.summary.is_none());
        assert!(!serde_json::to_string(&state).unwrap().contains("Lighthouse"));

        let innocent = (mr_white_index(&game) + 1) % 3;
        run(&mut game, &ctx, &format!("view {}", innocent + 1)).await;
        assert_eq!(game.revealed().map(|(_, c)| c.clone()), Some(Card::Word("Lighthouse".into())));

        run(&mut game, &ctx, "next").await;
        assert!(game.revealed().is_none());
    }

    #[tokio::test]
    async fn rejected_start_keeps_queued_words() {
        let mut game = game(Arc::new(Scripted::default()), None);
        let (tx, _rx) = mpsc::unbounded_channel();
        let ctx = Context::new(tx);
        game.words_mut().add_fallback_words(1);

        run(&mut game, &ctx, "add Ana").await;
        run(&mut game, &ctx, "start").await;

        assert!(game.status().starts_with('⚠'));
        assert_eq!(game.session.phase(), Phase::Setup);
        assert_eq!(game.words().queued(), 1);
    }

    #[tokio::test]
    async fn failed_generator_still_starts_with_fallback_word() {
        let mut game = game(Arc::new(Scripted::default()), Some("key"));
        let (tx, _rx) = mpsc::unbounded_channel();
        let ctx = Context::new(tx);

        for name in ["Ana", "Ben", "Cleo"] {
            run(&mut game, &ctx, &format!("add {name}")).await;
        }
        run(&mut game, &ctx, "start").await;

        assert_eq!(game.session.phase(), Phase::CardReveal);
        assert!(game.status().contains("fallback"));
        let innocent = (mr_white_index(&game) + 1) % 3;
        match game.session.card(innocent).unwrap() {
            Card::Word(word) => assert!(FALLBACK_WORDS.contains(&word.as_str())),
            Card::MrWhite => panic!("expected a word card"),
        }
    }

    #[tokio::test]
    async fn game_over_tops_up_the_queue_in_the_background() {
        let mut game = game(Arc::new(Scripted::new(vec![Ok("Harbor"), Ok("Castle")])), Some("key"));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx = Context::new(tx);

        for name in ["Ana", "Ben", "Cleo"] {
            run(&mut game, &ctx, &format!("add {name}")).await;
        }
        run(&mut game, &ctx, "start").await;
        let mr_white = mr_white_index(&game);
        run(&mut game, &ctx, "next").await;
        run(&mut game, &ctx, "next").await;
        run(&mut game, &ctx, &format!("eliminate {}", mr_white + 1)).await;
        assert_eq!(game.session.phase(), Phase::MrWhiteGuess);
        assert_eq!(ctx.in_flight(), 0);

        run(&mut game, &ctx, "guess harbor").await;
        assert_eq!(game.session.phase(), Phase::GameOver);
        assert!(game.status().contains("guessed the word"));
        assert_eq!(ctx.in_flight(), 1);

        let event = rx.recv().await.unwrap();
        ctx.settle();
        game.handle_event(event, &ctx);

        assert_eq!(ctx.in_flight(), 0);
        assert_eq!(game.words().queued(), 1);
        run(&mut game, &ctx, "new").await;
        for name in ["Ana", "Ben", "Cleo"] {
            assert_eq!(game.state().players.iter().filter(|p| p.name == name).count(), 1);
        }
        run(&mut game, &ctx, "start").await;
        let innocent = (mr_white_index(&game) + 1) % 3;
        assert_eq!(game.session.card(innocent), Ok(Card::Word("Castle".into())));
    }

    #[tokio::test]
    async fn full_queue_is_not_topped_up() {
        let mut game = game(Arc::new(Scripted::default()), None);
        let (tx, _rx) = mpsc::unbounded_channel();
        let ctx = Context::new(tx);
        game.words_mut().add_fallback_words(5);

        for name in ["Ana", "Ben", "Cleo"] {
            run(&mut game, &ctx, &format!("add {name}")).await;
        }
        run(&mut game, &ctx, "start").await;
        let mr_white = mr_white_index(&game);
        run(&mut game, &ctx, "next").await;
        run(&mut game, &ctx, "next").await;
        run(&mut game, &ctx, &format!("vote {}", mr_white + 1)).await;
        run(&mut game, &ctx, "guess definitely-wrong").await;

        assert_eq!(game.session.outcome(), Some(Outcome::Caught));
        assert_eq!(game.words().queued(), 4);
        assert_eq!(ctx.in_flight(), 0);
    }

    #[tokio::test]
    async fn credential_change_discards_queue() {
        let mut game = game(Arc::new(Scripted::default()), Some("old"));
        let (tx, _rx) = mpsc::unbounded_channel();
        let ctx = Context::new(tx);

        run(&mut game, &ctx, "fallback 3").await;
        assert_eq!(game.words().queued(), 3);
        run(&mut game, &ctx, "key new").await;
        assert_eq!(game.words().queued(), 0);
        assert_eq!(game.words().source().credential(), Some("new"));
    }

    #[tokio::test]
    async fn credential_change_drops_a_pending_top_up() {
        let mut game = game(Arc::new(Scripted::new(vec![Ok("Harbor"), Ok("Castle")])), Some("old"));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx = Context::new(tx);

        for name in ["Ana", "Ben", "Cleo"] {
            run(&mut game, &ctx, &format!("add {name}")).await;
        }
        run(&mut game, &ctx, "start").await;
        let mr_white = mr_white_index(&game);
        run(&mut game, &ctx, "next").await;
        run(&mut game, &ctx, "next").await;
        run(&mut game, &ctx, &format!("vote {}", mr_white + 1)).await;
        run(&mut game, &ctx, "guess nope").await;
        assert_eq!(ctx.in_flight(), 1);

        run(&mut game, &ctx, "key new").await;
        let event = rx.recv().await.unwrap();
        ctx.settle();
        game.handle_event(event, &ctx);

        assert_eq!(game.words().queued(), 0);
        assert_eq!(ctx.in_flight(), 0);
    }

    #[tokio::test]
    async fn hard_reset_clears_scores_but_not_queue() {
        let mut game = game(Arc::new(Scripted::default()), None);
        let (tx, _rx) = mpsc::unbounded_channel();
        let ctx = Context::new(tx);
        game.words_mut().add_fallback_words(4);

        for name in ["Ana", "Ben", "Cleo"] {
            run(&mut game, &ctx, &format!("add {name}")).await;
        }
        run(&mut game, &ctx, "start").await;
        let mr_white = mr_white_index(&game);
        run(&mut game, &ctx, "next").await;
        run(&mut game, &ctx, "next").await;
        run(&mut game, &ctx, &format!("vote {}", mr_white + 1)).await;
        run(&mut game, &ctx, "guess nope").await;
        assert_eq!(game.state().scores.len(), 2);

        run(&mut game, &ctx, "reset").await;

        let state = game.state();
        assert!(state.scores.is_empty());
        assert!(state.players.is_empty());
        assert_eq!(state.phase, Phase::Setup);
        assert_eq!(state.queued_words, 3);
    }
}
