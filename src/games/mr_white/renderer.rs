/// Mr. White screen layout - pure rendering, no game logic
use crate::games::mr_white::game::TableView;
use crate::games::mr_white::session::{Card, Outcome, Phase};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Draw the table. Returns the cursor position inside the input box.
pub fn draw(frame: &mut Frame, view: &TableView, card: Option<(&str, &Card)>, input: &str) -> Option<(u16, u16)> {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(8),    // Table + sidebar
            Constraint::Length(3), // Status
            Constraint::Length(3), // Input
        ])
        .split(frame.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(chunks[1]);

    // 1. Header
    let header = if view.phase == Phase::Setup {
        format!(" MR. WHITE | {} ", view.phase)
    } else {
        format!(" MR. WHITE | Round {} | {} ", view.round, view.phase)
    };
    frame.render_widget(
        Paragraph::new(header)
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        chunks[0],
    );

    // 2. Main panel, or the private card when one is showing
    match card {
        Some((player, card)) => {
            let lines = match card {
                Card::MrWhite => vec![
                    Line::from(Span::styled(
                        "You are Mr. White!",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(""),
                    Line::from("You do not know the word. Listen to the others and blend in."),
                ],
                Card::Word(word) => vec![
                    Line::from(vec![
                        Span::raw("Your word is: "),
                        Span::styled(word.clone(), Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                    ]),
                    Line::from(""),
                    Line::from("Remember it, but do not say it out loud!"),
                ],
            };
            frame.render_widget(
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title(format!(" {player}'s card - ONLY {player} SHOULD LOOK "))
                            .border_style(Style::default().fg(Color::Yellow)),
                    ),
                body[0],
            );
        }
        None => {
            frame.render_widget(
                Paragraph::new(table_lines(view))
                    .wrap(Wrap { trim: false })
                    .block(Block::default().borders(Borders::ALL).title(" Table ")),
                body[0],
            );
        }
    }

    // 3. Sidebar
    frame.render_widget(
        Paragraph::new(sidebar_lines(view)).block(Block::default().borders(Borders::ALL).title(" Scoreboard ")),
        body[1],
    );

    // 4. Status
    let status_style = if view.message.starts_with('⚠') {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    frame.render_widget(
        Paragraph::new(view.message.as_str())
            .style(status_style)
            .block(Block::default().borders(Borders::ALL).title(" Status ")),
        chunks[2],
    );

    // 5. Input
    frame.render_widget(
        Paragraph::new(format!("> {}", masked_input(input)))
            .block(Block::default().borders(Borders::ALL).title(" Command (Enter to send, Esc to quit) ")),
        chunks[3],
    );

    let x = chunks[3].x + 3 + input.chars().count() as u16;
    Some((x.min(chunks[3].right().saturating_sub(2)), chunks[3].y + 1))
}

fn table_lines(view: &TableView) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    match view.phase {
        Phase::Setup => {
            lines.push(Line::from("Players:"));
            if view.players.is_empty() {
                lines.push(Line::from("  (nobody yet)"));
            }
            for p in &view.players {
                lines.push(Line::from(format!("  {}. {}", p.number, p.name)));
            }
            lines.push(Line::from(""));
            lines.push(Line::from("'add <name>' / 'remove <n>', then 'start' (3+ players)."));
        }
        Phase::CardReveal => {
            lines.push(Line::from("Pass the device around. Each player looks at their card alone:"));
            push_active_players(&mut lines, view, "view");
            lines.push(Line::from(""));
            lines.push(Line::from("'next' once everyone has seen their card."));
        }
        Phase::Discussion => {
            lines.push(Line::from("Discuss the secret word without saying it."));
            lines.push(Line::from("Mr. White tries to blend in without knowing it."));
            lines.push(Line::from(""));
            lines.push(Line::from("'next' to proceed to voting."));
        }
        Phase::Voting => {
            lines.push(Line::from("Vote for who you think is Mr. White:"));
            push_active_players(&mut lines, view, "eliminate");
        }
        Phase::MrWhiteGuess => {
            let name = view.eliminated.last().map_or("Mr. White", String::as_str);
            lines.push(Line::from(Span::styled(
                format!("{name} was Mr. White!"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from("One chance to guess the word and win: 'guess <word>'."));
        }
        Phase::GameOver => {
            if let Some(summary) = &view.summary {
                let headline = match summary.outcome {
                    Outcome::Survived | Outcome::GuessedWord => format!("Mr. White ({}) wins!", summary.mr_white),
                    Outcome::Caught => "The group wins!".to_string(),
                };
                lines.push(Line::from(Span::styled(
                    headline,
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )));
                match summary.outcome {
                    Outcome::Survived => lines.push(Line::from("They successfully avoided being caught!")),
                    Outcome::GuessedWord => {
                        lines.push(Line::from(format!("They correctly guessed the word: {}", summary.word)))
                    }
                    Outcome::Caught => {
                        lines.push(Line::from(format!("The word was: {}", summary.word)));
                        lines.push(Line::from(format!("Mr. White was: {}", summary.mr_white)));
                    }
                }
            }
            lines.push(Line::from(""));
            lines.push(Line::from("'new' for another game with the same players, 'reset' to start over."));
        }
    }
    lines
}

fn push_active_players(lines: &mut Vec<Line<'static>>, view: &TableView, verb: &str) {
    for p in view.players.iter().filter(|p| !p.eliminated) {
        lines.push(Line::from(format!("  {verb} {}  ->  {}", p.number, p.name)));
    }
}

fn sidebar_lines(view: &TableView) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if view.scores.is_empty() {
        lines.push(Line::from("No scores yet."));
    }
    for (name, wins) in &view.scores {
        lines.push(Line::from(format!("{name}: {wins} wins")));
    }
    lines.push(Line::from(""));
    if !view.eliminated.is_empty() {
        lines.push(Line::from(Span::styled("Eliminated:", Style::default().fg(Color::DarkGray))));
        for name in &view.eliminated {
            lines.push(Line::from(Span::styled(format!("  {name}"), Style::default().fg(Color::DarkGray))));
        }
        lines.push(Line::from(""));
    }
    lines.push(Line::from(format!("Words queued: {}", view.queued_words)));
    lines
}

/// Hides whatever follows `key` so a credential never shows on the shared screen.
/// Keeps the character count, so the cursor still lines up.
fn masked_input(input: &str) -> String {
    let trimmed = input.trim_start();
    let verb = trimmed.split(char::is_whitespace).next().unwrap_or("");
    if !verb.eq_ignore_ascii_case("key") || trimmed.len() == verb.len() {
        return input.to_string();
    }
    let (head, tail) = input.split_at(input.len() - trimmed.len() + verb.len());
    let hidden: String = tail.chars().map(|c| if c.is_whitespace() { c } else { '*' }).collect();
    format!("{head}{hidden}")
}
