use std::fmt;
use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{
    Difficulty, OptionLabel, ParseKindError, Question, QuestionError, QuestionId, QuestionKind,
    QuizOption, ScoreCard,
};
use services::{
    GenerationForm, InputEvent, Key, NavPosition, QuizEvent, QuizLoopService, QuizNotice,
    QuizPhase, QuizRunner, QuizSession, QuizSettings,
};
use storage::http::QuizApiConfig;
use storage::{InMemoryQuizApi, QuizApi, UserContext};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidValue(quiz_core::Error),
    MissingApiUrl,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidValue(err) => write!(f, "{err}"),
            ArgsError::MissingApiUrl => {
                write!(f, "no API url: pass --api-url, set STUDYMATE_API_URL, or use --offline")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<u32, ArgsError> {
    let raw = require_value(args, flag)?;
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--topic <text>] [--kind short|mcq|truefalse]");
    eprintln!("                      [--difficulty easy|medium|hard] [--count <n>]");
    eprintln!("                      [--language <code>] [--timer <secs>]");
    eprintln!("                      [--api-url <url> | --offline]");
    eprintln!();
    eprintln!("Keys while a quiz runs:");
    eprintln!("  A-D / 1-4   pick an option        T/F / 1-2   answer true/false");
    eprintln!("  <enter> n   next                  p           previous");
    eprintln!("  r           reveal answer         :gen <topic> generate a new set");
    eprintln!("  :kind <k>   switch kind, dropping the current set");
    eprintln!("  :new        start over            :save       retry saving the result");
    eprintln!("  q           quit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDYMATE_API_URL, STUDYMATE_ACCESS_TOKEN, STUDYMATE_USER_ID,");
    eprintln!("  STUDYMATE_TIMER_SECS, STUDYMATE_QUESTION_COUNT, STUDYMATE_LANGUAGE, RUST_LOG");
}

struct Args {
    api_url: Option<String>,
    topic: Option<String>,
    kind: QuestionKind,
    difficulty: Difficulty,
    count: Option<u32>,
    language: Option<String>,
    timer: Option<u32>,
    offline: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            api_url: None,
            topic: None,
            kind: QuestionKind::default(),
            difficulty: Difficulty::default(),
            count: None,
            language: None,
            timer: None,
            offline: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api-url" => parsed.api_url = Some(require_value(args, "--api-url")?),
                "--topic" => parsed.topic = Some(require_value(args, "--topic")?),
                "--kind" => {
                    let value = require_value(args, "--kind")?;
                    parsed.kind = value
                        .parse()
                        .map_err(|e| ArgsError::InvalidValue(quiz_core::Error::from(e)))?;
                }
                "--difficulty" => {
                    let value = require_value(args, "--difficulty")?;
                    parsed.difficulty = value
                        .parse()
                        .map_err(|e| ArgsError::InvalidValue(quiz_core::Error::from(e)))?;
                }
                "--count" => parsed.count = Some(parse_number(args, "--count")?),
                "--language" => parsed.language = Some(require_value(args, "--language")?),
                "--timer" => parsed.timer = Some(parse_number(args, "--timer")?),
                "--offline" => parsed.offline = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn settings(&self) -> QuizSettings {
        let mut settings = QuizSettings::from_env();
        if let Some(count) = self.count {
            settings = settings.with_question_count(count);
        }
        if let Some(secs) = self.timer {
            settings = settings.with_timer_secs(secs);
        }
        if let Some(language) = &self.language {
            settings = settings.with_language(language.clone());
        }
        settings
    }

    fn api(&self) -> Result<QuizApi, Box<dyn std::error::Error>> {
        if self.offline {
            let mut samples = Vec::new();
            for kind in [QuestionKind::Short, QuestionKind::MultipleChoice, QuestionKind::TrueFalse] {
                samples.extend(sample_questions(kind)?);
            }
            let demo = InMemoryQuizApi::new().with_default_questions(samples);
            return Ok(QuizApi::in_memory(demo));
        }
        let config = match &self.api_url {
            Some(url) => QuizApiConfig::new(url.clone()),
            None => QuizApiConfig::from_env().ok_or(ArgsError::MissingApiUrl)?,
        };
        Ok(QuizApi::http(config)?)
    }

    fn form(&self, topic: impl Into<String>) -> GenerationForm {
        GenerationForm::new(topic, self.difficulty, self.kind)
    }
}

/// Canned set served by `--offline`.
fn sample_questions(kind: QuestionKind) -> Result<Vec<Question>, QuestionError> {
    let id = QuestionId::generate;
    match kind {
        QuestionKind::MultipleChoice => {
            let options = |texts: [&str; 4]| -> Vec<QuizOption> {
                OptionLabel::ALL
                    .iter()
                    .zip(texts)
                    .map(|(label, text)| QuizOption::new(*label, text))
                    .collect()
            };
            Ok(vec![
                Question::multiple_choice(
                    id(),
                    "Which planet is closest to the Sun?",
                    options(["Venus", "Mercury", "Mars", "Earth"]),
                    "B",
                )?,
                Question::multiple_choice(
                    id(),
                    "What gas do plants absorb for photosynthesis?",
                    options(["Carbon dioxide", "Oxygen", "Nitrogen", "Helium"]),
                    "A",
                )?
                .with_explanation(Some("Plants fix CO2 into sugars using light.".into())),
                Question::multiple_choice(
                    id(),
                    "Which year did World War II end?",
                    options(["1943", "1944", "1945", "1946"]),
                    "C",
                )?,
            ])
        }
        QuestionKind::TrueFalse => Ok(vec![
            Question::true_false(id(), "Sound travels faster in water than in air.", "true")?,
            Question::true_false(id(), "The Great Wall of China is visible from the Moon.", "false")?,
            Question::true_false(id(), "Electrons carry a negative charge.", "true")?,
        ]),
        QuestionKind::Short => Ok(vec![
            Question::short(id(), "Define osmosis.", "Diffusion of water across a membrane.")?,
            Question::short(
                id(),
                "What is Newton's first law?",
                "A body keeps its state of motion unless acted on.",
            )?,
        ]),
    }
}

//
// ─── TERMINAL INPUT ────────────────────────────────────────────────────────────
//

/// Maps terminal lines to events, remembering the kind picked with `:kind`.
struct LineParser {
    kind: QuestionKind,
    difficulty: Difficulty,
}

impl LineParser {
    fn new(args: &Args) -> Self {
        Self {
            kind: args.kind,
            difficulty: args.difficulty,
        }
    }

    fn parse(&mut self, line: &str) -> Result<QuizEvent, ParseKindError> {
        let trimmed = line.trim();
        if let Some(topic) = trimmed.strip_prefix(":gen") {
            let form = GenerationForm::new(topic.trim(), self.difficulty, self.kind);
            return Ok(QuizEvent::Generate(form));
        }
        if let Some(kind) = trimmed.strip_prefix(":kind") {
            self.kind = kind.parse()?;
            return Ok(QuizEvent::SetKind(self.kind));
        }
        Ok(key_event(trimmed))
    }
}

fn key_event(trimmed: &str) -> QuizEvent {
    match trimmed {
        "q" | ":quit" => QuizEvent::Shutdown,
        ":new" => QuizEvent::StartNewQuiz,
        ":save" => QuizEvent::RetrySave,
        "" | "n" => QuizEvent::Input(InputEvent::Key(Key::Enter)),
        "p" => QuizEvent::Input(InputEvent::Key(Key::ArrowLeft)),
        "r" => QuizEvent::Input(InputEvent::ClickReveal),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => QuizEvent::Input(InputEvent::Key(Key::Char(c))),
                _ => QuizEvent::Input(InputEvent::Key(Key::Other)),
            }
        }
    }
}

fn spawn_stdin_reader(events: UnboundedSender<QuizEvent>, mut parser: LineParser) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let event = match lines.next_line().await {
                Ok(Some(line)) => match parser.parse(&line) {
                    Ok(event) => event,
                    Err(err) => {
                        println!("{err} (try short, mcq or truefalse)");
                        continue;
                    }
                },
                Ok(None) => QuizEvent::Shutdown,
                Err(err) => {
                    tracing::warn!(error = %err, "stdin closed");
                    QuizEvent::Shutdown
                }
            };
            let stop = matches!(event, QuizEvent::Shutdown);
            if events.send(event).is_err() || stop {
                break;
            }
        }
    });
}

//
// ─── RENDERING ─────────────────────────────────────────────────────────────────
//

fn render_question(session: &QuizSession) {
    let Some(question) = session.current_question() else {
        return;
    };
    let progress = session.progress();
    match progress.remaining_secs {
        Some(secs) => println!("\nQuestion {}/{}  ({secs}s)", progress.position, progress.total),
        None => println!("\nQuestion {}/{}", progress.position, progress.total),
    }
    println!("{}", question.prompt());

    match question.kind() {
        QuestionKind::MultipleChoice => {
            for option in question.options() {
                let marker = if session.current_answer() == Some(option.label.as_str()) {
                    '*'
                } else {
                    ' '
                };
                println!(" {marker} {}) {}", option.label, option.text);
            }
        }
        QuestionKind::TrueFalse => {
            let picked = session.current_answer().unwrap_or("-");
            println!("   T) True   F) False   [answer: {picked}]");
        }
        QuestionKind::Short => {}
    }

    if session.is_revealed() {
        println!("   Answer: {}", question.correct_answer());
        if let Some(explanation) = question.explanation() {
            println!("   {explanation}");
        }
    }
    println!(
        "   [{}]{}",
        session.advance_label(),
        previous_hint(session.position())
    );
}

fn previous_hint(position: Option<NavPosition>) -> &'static str {
    match position {
        Some(NavPosition::OnMiddle | NavPosition::OnLast) => "   p) Previous",
        _ => "",
    }
}

fn review_lines(card: &ScoreCard) -> Vec<String> {
    card.outcomes()
        .iter()
        .map(|outcome| {
            let mark = if outcome.is_correct { '+' } else { '-' };
            let given = outcome.given.as_deref().unwrap_or("no answer");
            format!(
                "   {mark} Q{}: {given} (correct: {})",
                outcome.index + 1,
                outcome.expected
            )
        })
        .collect()
}

fn render(session: &QuizSession, notices: &[QuizNotice]) {
    let mut redraw = false;
    for notice in notices {
        match notice {
            QuizNotice::GenerationStarted => println!("Generating questions..."),
            QuizNotice::QuestionsReady { count } => {
                println!("{count} questions ready.");
                redraw = true;
            }
            QuizNotice::GenerationFailed(message) => {
                println!("Could not generate questions: {message}");
            }
            QuizNotice::GenerationDiscarded => {
                tracing::debug!("ignored a late generation response");
            }
            QuizNotice::AnswerRecorded { .. }
            | QuizNotice::Moved { .. }
            | QuizNotice::RevealToggled { .. } => redraw = true,
            QuizNotice::Countdown { remaining } => {
                if *remaining <= 5 || remaining % 10 == 0 {
                    println!("   {remaining}s left");
                }
            }
            QuizNotice::TimeExpired => println!("Time's up!"),
            QuizNotice::ShortSetFinished => {
                println!("You've completed this set of short questions! Starting over.");
            }
            QuizNotice::Completed(result) => {
                println!(
                    "\nQuiz complete: {}/{} correct ({}%)",
                    result.score, result.total_questions, result.percentage
                );
                if let Some(card) = session.score_card() {
                    for line in review_lines(card) {
                        println!("{line}");
                    }
                }
                if result.passed() {
                    println!("Great job!");
                }
            }
            QuizNotice::ResultSaved => println!("Result saved."),
            QuizNotice::PersistenceFailed(message) => {
                println!("Could not save the result ({message}). Type :save to retry.");
            }
            QuizNotice::Reset => {
                println!("Type :gen <topic> to start a new {} quiz.", session.kind());
            }
        }
    }
    if redraw && session.phase() == QuizPhase::InProgress {
        render_question(session);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let settings = args.settings();
    let api = args.api()?;
    let user = UserContext::from_env();
    tracing::info!(
        kind = %args.kind,
        difficulty = %args.difficulty,
        count = settings.question_count(),
        offline = args.offline,
        "starting quiz"
    );

    let service = QuizLoopService::new(settings, Clock::system(), user, api);
    let mut runner = QuizRunner::new(Arc::new(service));

    match &args.topic {
        Some(topic) => {
            let notices = runner.handle(QuizEvent::Generate(args.form(topic.clone()))).await;
            render(runner.session(), &notices);
        }
        None => println!("Type :gen <topic> to generate a quiz (q to quit)."),
    }

    spawn_stdin_reader(runner.sender(), LineParser::new(&args));
    while let Some(notices) = runner.process_next().await {
        render(runner.session(), &notices);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::QuestionGenerator;

    fn args(flags: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = flags.iter().map(|s| (*s).to_string());
        Args::parse(&mut iter)
    }

    #[test]
    fn parses_all_flags() {
        let parsed = args(&[
            "--topic", "Cells", "--kind", "truefalse", "--difficulty", "hard", "--count", "3",
            "--timer", "10", "--offline",
        ])
        .unwrap();
        assert_eq!(parsed.topic.as_deref(), Some("Cells"));
        assert_eq!(parsed.kind, QuestionKind::TrueFalse);
        assert_eq!(parsed.difficulty, Difficulty::Hard);
        assert_eq!(parsed.count, Some(3));
        assert_eq!(parsed.timer, Some(10));
        assert!(parsed.offline);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(args(&["--count"]), Err(ArgsError::MissingValue { .. })));
        assert!(matches!(args(&["--count", "x"]), Err(ArgsError::InvalidNumber { .. })));
        assert!(matches!(args(&["--kind", "essay"]), Err(ArgsError::InvalidValue(_))));
        assert!(matches!(args(&["--verbose"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn offline_samples_cover_every_kind() {
        for kind in [QuestionKind::Short, QuestionKind::MultipleChoice, QuestionKind::TrueFalse] {
            let questions = sample_questions(kind).unwrap();
            assert!(!questions.is_empty());
            assert!(questions.iter().all(|q| q.kind() == kind));
        }
    }

    #[test]
    fn terminal_lines_map_to_events() {
        let mut parser = LineParser::new(&args(&[]).unwrap());
        assert!(matches!(
            parser.parse("").unwrap(),
            QuizEvent::Input(InputEvent::Key(Key::Enter))
        ));
        assert!(matches!(
            parser.parse("b").unwrap(),
            QuizEvent::Input(InputEvent::Key(Key::Char('b')))
        ));
        assert!(matches!(parser.parse("q").unwrap(), QuizEvent::Shutdown));
        match parser.parse(":gen  Volcanoes ").unwrap() {
            QuizEvent::Generate(form) => assert_eq!(form.topic, "Volcanoes"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn kind_command_switches_the_kind_used_by_gen() {
        let mut parser = LineParser::new(&args(&["--kind", "short"]).unwrap());
        assert!(matches!(
            parser.parse(":kind mcq").unwrap(),
            QuizEvent::SetKind(QuestionKind::MultipleChoice)
        ));
        match parser.parse(":gen Tides").unwrap() {
            QuizEvent::Generate(form) => assert_eq!(form.kind, QuestionKind::MultipleChoice),
            other => panic!("unexpected event: {other:?}"),
        }

        assert!(parser.parse(":kind essay").is_err());
        match parser.parse(":gen Tides").unwrap() {
            QuizEvent::Generate(form) => assert_eq!(form.kind, QuestionKind::MultipleChoice),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn offline_api_serves_the_requested_kind() {
        let api = args(&["--offline"]).unwrap().api().unwrap();
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        for kind in [QuestionKind::Short, QuestionKind::MultipleChoice, QuestionKind::TrueFalse] {
            let request = storage::GenerationRequest {
                topic: "Anything".into(),
                difficulty: Difficulty::Easy,
                kind,
                count: 3,
                language: "en".into(),
            };
            let questions = rt
                .block_on(api.generator.generate(&UserContext::anonymous(), &request))
                .unwrap();
            assert!(questions.iter().all(|q| q.kind() == kind));
        }
    }

    #[test]
    fn previous_hint_hides_on_the_first_question() {
        assert_eq!(previous_hint(Some(NavPosition::OnFirst)), "");
        assert_eq!(previous_hint(None), "");
        assert!(previous_hint(Some(NavPosition::OnLast)).contains("Previous"));
    }

    #[test]
    fn review_lists_each_question_outcome() {
        let questions = sample_questions(QuestionKind::TrueFalse).unwrap();
        let mut answers = quiz_core::model::AnswerSheet::new();
        answers.record(0, "true");
        answers.record(1, "true");
        let card = ScoreCard::grade(&questions, &answers);

        let lines = review_lines(&card);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "   + Q1: true (correct: true)");
        assert_eq!(lines[1], "   - Q2: true (correct: false)");
        assert_eq!(lines[2], "   - Q3: no answer (correct: true)");
    }
}
