//! Line-oriented front end: one command per line on stdin, plain text on
//! stdout.

use std::fmt;

use quiz_core::model::{FilterTag, FilterTagError};
use services::{AnswerFeedback, QuizSession, SyncStatus};
use tokio::io::{AsyncBufReadExt, BufReader};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Answer(Vec<usize>),
    Retry,
    Next,
    Prev,
    Mark,
    Jump(usize),
    Filter(Vec<FilterTag>),
    ResetFilters,
    ToggleShuffle,
    ClearHistory,
    ClearMarks,
    Marked,
    Stats,
    Link,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
enum InputError {
    Unknown(String),
    MissingNumber(&'static str),
    BadNumber(String),
    BadTag(FilterTagError),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Unknown(cmd) => write!(f, "unknown command: {cmd} (try `help`)"),
            InputError::MissingNumber(cmd) => write!(f, "{cmd} needs at least one number"),
            InputError::BadNumber(raw) => write!(f, "not a positive number: {raw}"),
            InputError::BadTag(err) => write!(f, "{err}"),
        }
    }
}

// User-facing numbers are 1-based.
fn one_based(raw: &str) -> Result<usize, InputError> {
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(InputError::BadNumber(raw.to_owned())),
    }
}

fn parse_input(line: &str) -> Result<Option<Input>, InputError> {
    let mut words = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty());
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let input = match head.to_ascii_lowercase().as_str() {
        "a" | "answer" => {
            if rest.is_empty() {
                return Err(InputError::MissingNumber("answer"));
            }
            Input::Answer(rest.iter().map(|w| one_based(w)).collect::<Result<_, _>>()?)
        }
        "r" | "retry" => Input::Retry,
        "n" | "next" => Input::Next,
        "p" | "prev" => Input::Prev,
        "m" | "mark" => Input::Mark,
        "j" | "jump" => {
            let raw = rest.first().ok_or(InputError::MissingNumber("jump"))?;
            Input::Jump(one_based(raw)?)
        }
        "f" | "filter" => Input::Filter(
            rest.iter()
                .map(|w| w.parse::<FilterTag>().map_err(InputError::BadTag))
                .collect::<Result<_, _>>()?,
        ),
        "reset" => Input::ResetFilters,
        "shuffle" => Input::ToggleShuffle,
        "clear-history" => Input::ClearHistory,
        "clear-marks" => Input::ClearMarks,
        "marked" => Input::Marked,
        "stats" => Input::Stats,
        "link" => Input::Link,
        "h" | "help" | "?" => Input::Help,
        "q" | "quit" | "exit" => Input::Quit,
        _ => return Err(InputError::Unknown(head.to_owned())),
    };
    Ok(Some(input))
}

fn print_help() {
    println!("commands:");
    println!("  a <n> [n..]     answer with option numbers (commas or spaces)");
    println!("  r               try again (after answering)");
    println!("  n / p           next / previous question");
    println!("  m               mark or unmark the current question");
    println!("  j <n>           jump to question number n");
    println!("  f <tags..>      filter: all, marked, incorrect, unanswered");
    println!("  reset           show all questions again");
    println!("  shuffle         toggle question order shuffling");
    println!("  clear-history   forget every answer");
    println!("  clear-marks     remove every mark");
    println!("  marked | stats | link | help | quit");
}

fn percent(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "-".to_owned(), |r| format!("{:.1}%", r * 100.0))
}

fn render(session: &QuizSession) {
    if let SyncStatus::LocalOnly { reason } = session.sync_status() {
        println!("(!) progress is not being saved: {reason}");
    }

    let Some(view) = session.current_question() else {
        println!();
        println!("No questions match the current filters ({}).", session.filters());
        println!("Use `reset` to show all questions or `f` to pick other filters.");
        return;
    };

    let stats = session.stats();
    println!();
    if let Some(progress) = session.progress() {
        let star = if view.marked { " *" } else { "" };
        print!(
            "Q{} ({}/{}){star}",
            view.id.index() + 1,
            progress.position + 1,
            progress.view_len
        );
    }
    if stats.total() > 0 {
        print!("   session {}/{} ({})", stats.correct(), stats.total(), percent(stats.accuracy()));
    }
    println!();
    if view.multi_select {
        println!("[{} correct answers]", view.correct_count);
    }
    println!("{}", view.text);

    match &view.feedback {
        None => {
            for option in &view.options {
                println!("  {}. {}", option.position + 1, option.text);
            }
        }
        Some(feedback) => {
            for line in feedback_lines(feedback) {
                println!("{line}");
            }
        }
    }
}

fn feedback_lines(feedback: &AnswerFeedback) -> Vec<String> {
    let verdict = if feedback.correct { "Correct!" } else { "Incorrect." };
    let mut lines = vec![verdict.to_owned()];
    for option in &feedback.options {
        let sign = match (option.is_correct, option.selected) {
            (true, _) => "+",
            (false, true) => "x",
            (false, false) => " ",
        };
        let chosen = if option.selected { "  <- your answer" } else { "" };
        lines.push(format!("  {sign} {}. {}{chosen}", option.position + 1, option.text));
    }
    if let Some(explanation) = &feedback.explanation {
        lines.push(format!("Explanation: {explanation}"));
    }
    lines
}

// False once the answered question has left the filtered view, e.g. under
// `unanswered`; the returned feedback is then the only copy.
fn feedback_on_screen(session: &QuizSession, feedback: &AnswerFeedback) -> bool {
    session
        .current_question()
        .is_some_and(|view| view.id == feedback.question && view.feedback.is_some())
}

fn render_marked(session: &QuizSession) {
    let items = session.marked_list();
    if items.is_empty() {
        println!("No marked questions.");
        return;
    }
    println!("Marked ({}):", items.len());
    for item in items {
        println!("  Q{}: {}", item.id.index() + 1, item.preview);
    }
}

fn render_stats(session: &QuizSession) {
    let overview = session.overview();
    let counts = session.filter_counts();
    println!(
        "questions {}  answered {}  correct {}  marked {}",
        overview.bank_size, overview.answered, overview.answered_correct, overview.marked
    );
    println!("overall accuracy {}", percent(overview.overall_accuracy()));
    println!(
        "this session {} answered, {} correct ({})",
        overview.session.total(),
        overview.session.correct(),
        percent(overview.session_accuracy())
    );
    println!(
        "filters [{}]  all {}  marked {}  incorrect {}  unanswered {}  shuffled {}",
        session.filters(),
        counts.all,
        counts.marked,
        counts.incorrect,
        counts.unanswered,
        session.is_bank_shuffled()
    );
}

/// Drive `session` from stdin until EOF or `quit`.
///
/// # Errors
///
/// Returns an error only if stdin cannot be read.
pub async fn run(mut session: QuizSession, share_base: Option<&Url>) -> std::io::Result<()> {
    println!("user id: {}", session.user_id());
    if let Some(base) = share_base {
        println!("resume link: {}", session.user_id().share_url(base));
    }
    render(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match parse_input(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        match input {
            Input::Answer(positions) => match session.submit_answer(positions).await {
                Ok(feedback) => {
                    if !feedback_on_screen(&session, &feedback) {
                        println!();
                        println!("Q{}:", feedback.question.index() + 1);
                        for line in feedback_lines(&feedback) {
                            println!("{line}");
                        }
                    }
                }
                Err(err) => {
                    println!("{err}");
                    continue;
                }
            },
            Input::Retry => {
                if let Err(err) = session.retry() {
                    println!("{err}");
                    continue;
                }
            }
            Input::Next => {
                session.next().await;
            }
            Input::Prev => {
                session.prev().await;
            }
            Input::Mark => match session.toggle_mark().await {
                Ok(true) => println!("marked"),
                Ok(false) => println!("unmarked"),
                Err(err) => {
                    println!("{err}");
                    continue;
                }
            },
            Input::Jump(index) => {
                session.jump_to(index).await;
            }
            Input::Filter(tags) => {
                session.set_filters(tags).await;
            }
            Input::ResetFilters => {
                session.reset_filters().await;
            }
            Input::ToggleShuffle => {
                let on = session.toggle_bank_shuffle().await;
                println!("question shuffle {}", if on { "on" } else { "off" });
            }
            Input::ClearHistory => session.clear_history().await,
            Input::ClearMarks => session.clear_marks().await,
            Input::Marked => {
                render_marked(&session);
                continue;
            }
            Input::Stats => {
                render_stats(&session);
                continue;
            }
            Input::Link => {
                match share_base {
                    Some(base) => println!("{}", session.user_id().share_url(base)),
                    None => println!("user id: {} (pass --share-base for a link)", session.user_id()),
                }
                continue;
            }
            Input::Help => {
                print_help();
                continue;
            }
            Input::Quit => break,
        }
        render(&session);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::bank::QuestionBank;
    use quiz_core::model::UserId;
    use quiz_core::time::fixed_now;
    use services::{Clock, SessionState};
    use storage::Storage;

    const BANK: &str = r#"[
        {"question": "First", "options": [
            {"text": "1 yes", "status": "correct"},
            {"text": "1 no", "status": "incorrect"}],
         "explanation": "why first"},
        {"question": "Second", "options": [
            {"text": "2 yes", "status": "correct"},
            {"text": "2 no", "status": "incorrect"}]}
    ]"#;

    async fn session() -> QuizSession {
        let state = SessionState::with_seed(QuestionBank::from_json_str(BANK).unwrap(), 11);
        let user = UserId::parse("0123456789ab").unwrap();
        QuizSession::start(state, user, Storage::in_memory().progress, Clock::fixed(fixed_now())).await
    }

    fn wrong_position(session: &QuizSession) -> usize {
        let view = session.current_question().unwrap();
        view.options.iter().find(|o| o.text.ends_with("no")).unwrap().position
    }

    #[tokio::test]
    async fn feedback_survives_leaving_the_unanswered_view() {
        let mut session = session().await;
        session.set_filters([FilterTag::Unanswered]).await;

        let pos = wrong_position(&session);
        let feedback = session.submit_answer([pos]).await.unwrap();

        assert_eq!(feedback.question.index(), 0);
        assert_eq!(session.current_question().unwrap().id.index(), 1);
        assert!(!feedback_on_screen(&session, &feedback));

        let lines = feedback_lines(&feedback);
        assert_eq!(lines[0], "Incorrect.");
        assert!(lines.iter().any(|l| l.starts_with("  + ") && l.contains("1 yes")));
        assert!(lines.iter().any(|l| l.starts_with("  x ") && l.ends_with("<- your answer")));
        assert_eq!(lines.last().unwrap(), "Explanation: why first");
    }

    #[tokio::test]
    async fn feedback_stays_on_screen_without_filters() {
        let mut session = session().await;
        let pos = wrong_position(&session);
        let feedback = session.submit_answer([pos]).await.unwrap();
        assert!(feedback_on_screen(&session, &feedback));
    }

    #[test]
    fn answers_are_one_based_and_comma_tolerant() {
        assert_eq!(parse_input("a 1,3"), Ok(Some(Input::Answer(vec![0, 2]))));
        assert_eq!(parse_input("answer 2"), Ok(Some(Input::Answer(vec![1]))));
        assert_eq!(parse_input("a"), Err(InputError::MissingNumber("answer")));
        assert_eq!(parse_input("a 0"), Err(InputError::BadNumber("0".into())));
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse_input("   "), Ok(None));
    }

    #[test]
    fn filters_and_jumps() {
        assert_eq!(
            parse_input("f marked INCORRECT"),
            Ok(Some(Input::Filter(vec![FilterTag::Marked, FilterTag::Incorrect])))
        );
        assert_eq!(parse_input("f"), Ok(Some(Input::Filter(vec![]))));
        assert!(matches!(parse_input("f starred"), Err(InputError::BadTag(_))));
        assert_eq!(parse_input("j 12"), Ok(Some(Input::Jump(11))));
        assert_eq!(parse_input("jump"), Err(InputError::MissingNumber("jump")));
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(parse_input("dance"), Err(InputError::Unknown("dance".into())));
        assert_eq!(parse_input("Q"), Ok(Some(Input::Quit)));
    }
}
