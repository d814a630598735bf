use mrwhite::games::mr_white::{Card, Elimination, GameError, GameSession, Outcome, Phase};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn roster(names: &[&str]) -> GameSession {
    let mut session = GameSession::new();
    for name in names {
        session.add_player(name).unwrap();
    }
    session
}

fn mr_white(session: &GameSession) -> usize {
    (0..session.players().len())
        .find(|&i| session.card(i) == Ok(Card::MrWhite))
        .expect("someone is Mr. White")
}

/// Start a game whose Mr. White is the player at `wanted`.
fn start_with(session: &mut GameSession, word: &str, wanted: usize) {
    for seed in 0..10_000 {
        let mut candidate = session.clone();
        candidate
            .start_game(word.to_string(), &mut StdRng::seed_from_u64(seed))
            .unwrap();
        if mr_white(&candidate) == wanted {
            *session = candidate;
            return;
        }
    }
    panic!("no seed picks player {wanted}");
}

fn vote(session: &mut GameSession, index: usize) -> Elimination {
    session.advance_phase().unwrap();
    session.advance_phase().unwrap();
    session.eliminate(index).unwrap()
}

#[test]
fn mr_white_caught_and_guesses_airport() {
    let mut session = roster(&["A", "B", "C"]);
    start_with(&mut session, "Airport", 1);

    assert_eq!(vote(&mut session, 0), Elimination::NextRound(2));
    assert_eq!(session.phase(), Phase::CardReveal);

    assert_eq!(vote(&mut session, 1), Elimination::MrWhiteCaught);
    assert_eq!(session.phase(), Phase::MrWhiteGuess);

    assert_eq!(session.submit_guess("Airport"), Ok(Outcome::GuessedWord));
    assert_eq!(session.phase(), Phase::GameOver);
    assert_eq!(session.scores().ranking(), vec![("B", 1)]);
}

#[test]
fn mr_white_outlasts_the_group() {
    let mut session = roster(&["A", "B", "C"]);
    start_with(&mut session, "Airport", 2);

    assert_eq!(vote(&mut session, 0), Elimination::NextRound(2));
    assert_eq!(vote(&mut session, 1), Elimination::MrWhiteSurvived);

    assert_eq!(session.phase(), Phase::GameOver);
    assert!(session.mr_white_won_last_game());
    assert_eq!(session.scores().ranking(), vec![("C", 1)]);
}

#[test]
fn eliminated_set_only_grows_and_has_no_duplicates() {
    let names = ["A", "B", "C", "D", "E", "F"];
    for seed in 0..20 {
        let mut session = roster(&names);
        session
            .start_game("Circus".into(), &mut StdRng::seed_from_u64(seed))
            .unwrap();
        let impostor = mr_white(&session);

        let mut seen = 0;
        for target in (0..names.len()).filter(|&i| i != impostor) {
            if session.phase() == Phase::GameOver {
                break;
            }
            let before = session.eliminated().len();
            vote(&mut session, target);
            let after = session.eliminated();
            assert_eq!(after.len(), before + 1);
            let mut unique = after.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), after.len());
            seen += 1;
        }

        // Everyone but Mr. White is out.
        assert_eq!(seen, names.len() - 1);
        assert_eq!(session.outcome(), Some(Outcome::Survived));
        assert_eq!(session.round() as usize, names.len() - 1);
    }
}

#[test]
fn soft_reset_then_hard_reset() {
    let mut session = roster(&["A", "B", "C"]);
    start_with(&mut session, "Hotel", 0);
    vote(&mut session, 0);
    session.submit_guess("motel").unwrap();
    let scores = session.scores().clone();
    assert_eq!(scores.wins("B"), 1);
    assert_eq!(scores.wins("C"), 1);

    session.soft_reset().unwrap();
    assert_eq!(session.scores(), &scores);
    assert_eq!(session.players().len(), 3);

    session.hard_reset();
    assert!(session.scores().is_empty());
    assert_eq!(
        session.start_game("Hotel".into(), &mut StdRng::seed_from_u64(0)),
        Err(GameError::NotEnoughPlayers { have: 0 })
    );
}

#[test]
fn hard_reset_works_mid_game() {
    let mut session = roster(&["A", "B", "C"]);
    start_with(&mut session, "Hotel", 0);
    session.advance_phase().unwrap();

    session.hard_reset();

    assert_eq!(session.phase(), Phase::Setup);
    assert!(session.players().is_empty());
    assert_eq!(session.round(), 1);
}
