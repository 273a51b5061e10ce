use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use interview_core::model::{
    Language, Question, RoundId, RoundPlan, SessionConfigDraft, UserId,
};
use services::{
    Advance, AnswerEvaluator, ApiConfig, ChannelTranscriptSource, LogSpeechSink,
    PracticeApiClient, QuestionProvider, ReportExporter, ScriptedProvider, SessionController,
    SessionError, SessionHandle, SessionState, TranscriptEvent, VoiceInputAdapter,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidLanguage { raw: String },
    InvalidThreshold { raw: String },
    InvalidUserId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLanguage { raw } => write!(f, "invalid --lang value: {raw}"),
            ArgsError::InvalidThreshold { raw } => {
                write!(f, "invalid --threshold value (expected <round>=<0-100>): {raw}")
            }
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --role <role>            target role (default: Software Engineer)");
    eprintln!("  --level <level>          seniority (default: Junior)");
    eprintln!("  --stack <stack>          tech stack, repeatable (Golang, Python, NodeJS, ...)");
    eprintln!("  --round <id>             start at this round instead of the first");
    eprintln!("  --lang <en|vi>           interview language (default: en)");
    eprintln!("  --threshold <id>=<n>     override a round's pass threshold, repeatable");
    eprintln!("  --user <uuid>            user id (default: random)");
    eprintln!("  --no-ai                  disable AI evaluation feedback");
    eprintln!("  --voice                  read questions aloud; lines starting with '~' are dictation");
    eprintln!("  --out <dir>              directory for the exported summary (default: .)");
    eprintln!("  --offline                use the built-in scripted provider");
    eprintln!("  --verbose                debug logging");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  INTERVIEW_API_BASE_URL, INTERVIEW_API_TIMEOUT_SECS, RUST_LOG");
}

struct Args {
    draft: SessionConfigDraft,
    round: Option<RoundId>,
    out_dir: PathBuf,
    offline: bool,
    verbose: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut draft = SessionConfigDraft {
            role: "Software Engineer".into(),
            level: "Junior".into(),
            ..SessionConfigDraft::default()
        };
        let mut round = None;
        let mut out_dir = PathBuf::from(".");
        let mut offline = false;
        let mut verbose = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--role" => draft.role = require_value(args, "--role")?,
                "--level" => draft.level = require_value(args, "--level")?,
                "--stack" => draft.stacks.push(require_value(args, "--stack")?),
                "--round" => round = Some(RoundId::new(require_value(args, "--round")?)),
                "--lang" => {
                    let value = require_value(args, "--lang")?;
                    draft.language = value
                        .parse::<Language>()
                        .map_err(|_| ArgsError::InvalidLanguage { raw: value.clone() })?;
                }
                "--threshold" => {
                    let value = require_value(args, "--threshold")?;
                    let (id, threshold) = parse_threshold(&value)
                        .ok_or_else(|| ArgsError::InvalidThreshold { raw: value.clone() })?;
                    draft.threshold_overrides.insert(id, threshold);
                }
                "--user" => {
                    let value = require_value(args, "--user")?;
                    let id = value
                        .parse::<UserId>()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                    draft.user_id = Some(id);
                }
                "--no-ai" => draft.ai_enabled = false,
                "--voice" => draft.voice_enabled = true,
                "--out" => out_dir = PathBuf::from(require_value(args, "--out")?),
                "--offline" => offline = true,
                "--verbose" | "-v" => verbose = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if draft.user_id.is_none() {
            draft.user_id = Some(UserId::random());
        }

        Ok(Self {
            draft,
            round,
            out_dir,
            offline,
            verbose,
        })
    }
}

fn parse_threshold(raw: &str) -> Option<(RoundId, f64)> {
    let (id, value) = raw.split_once('=')?;
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    let value: f64 = value.trim().parse().ok()?;
    Some((RoundId::new(id), value))
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

type Input = Lines<BufReader<Stdin>>;

/// Terminal front end for one interview.
struct Terminal {
    handle: SessionHandle,
    input: Input,
    voice: Option<(VoiceInputAdapter, UnboundedSender<TranscriptEvent>)>,
}

impl Terminal {
    async fn read_line(&mut self) -> Result<Option<String>, std::io::Error> {
        self.input.next_line().await
    }

    fn show_question(&self, question: &Question) {
        if let Some(progress) = self.handle.snapshot().ok().and_then(|s| s.progress) {
            println!();
            println!(
                "[round {}/{}: {} | question {}/{}]",
                progress.round_number,
                progress.round_count,
                progress.round_id,
                progress.question_number,
                progress.question_count
            );
        }
        println!("{}", question.content);
        if let Some(hint) = &question.hint {
            println!("  hint: {hint}");
        }
        if let Some((voice, _)) = &self.voice {
            voice.speak_question(question);
        }
    }

    /// Collect input until an answer is scored. `false` on end of input.
    async fn answer(&mut self) -> Result<bool, Box<dyn std::error::Error>> {
        loop {
            print_prompt("answer> ");
            let Some(line) = self.read_line().await? else {
                return Ok(false);
            };

            if let (Some(dictated), Some((voice, tx))) =
                (line.strip_prefix('~'), self.voice.as_mut())
            {
                let _ = tx.send(TranscriptEvent::Final(dictated.to_owned()));
                voice.pump()?;
                println!("  (draft) {}", self.handle.answer_text());
                continue;
            }
            if !line.trim().is_empty() {
                self.handle.set_answer(line);
            }

            match self.handle.submit_draft().await {
                Ok(Some(attempt)) => {
                    println!("  score: {}", attempt.score);
                    println!("  feedback: {}", attempt.feedback);
                    if let Some(better) = &attempt.suggested_answer {
                        println!("  suggested answer: {better}");
                    }
                    for suggestion in &attempt.suggestions {
                        println!("  - {suggestion}");
                    }
                    if let Some((voice, _)) = &self.voice {
                        voice.speak_feedback(&attempt);
                    }
                    return Ok(true);
                }
                Ok(None) => println!("  (type an answer first)"),
                Err(e) => println!("  error: {} (press Enter to resubmit)", e.user_message()),
            }
        }
    }

    /// Advance, retrying on Enter after recoverable failures.
    async fn advance(&mut self) -> Result<Option<Advance>, Box<dyn std::error::Error>> {
        let mut at_boundary = false;
        loop {
            let result = if at_boundary {
                self.handle.resolve_boundary().await
            } else {
                self.handle.advance().await
            };
            match result {
                Ok(advance) => return Ok(Some(advance)),
                Err(e) if e.is_retryable() => {
                    println!("  error: {} (press Enter to retry)", e.user_message());
                    at_boundary = matches!(
                        self.handle.snapshot()?.state,
                        SessionState::RoundBoundary { .. }
                    );
                    if self.read_line().await?.is_none() {
                        return Ok(None);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn current_question(&mut self) -> Result<Option<Question>, Box<dyn std::error::Error>> {
        loop {
            match self.handle.retry_fetch().await {
                Ok(question) => return Ok(Some(question)),
                Err(e @ SessionError::Fetch { .. }) => {
                    println!("  error: {} (press Enter to retry)", e.user_message());
                    if self.read_line().await?.is_none() {
                        return Ok(None);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn print_prompt(prompt: &str) {
    use std::io::Write as _;
    print!("{prompt}");
    let _ = std::io::stdout().flush();
}

fn providers(
    offline: bool,
) -> Result<(Arc<dyn QuestionProvider>, Arc<dyn AnswerEvaluator>), Box<dyn std::error::Error>> {
    if offline {
        info!("using scripted provider");
        let scripted = ScriptedProvider::new();
        let provider: Arc<dyn QuestionProvider> = Arc::new(scripted.clone());
        let evaluator: Arc<dyn AnswerEvaluator> = Arc::new(scripted);
        return Ok((provider, evaluator));
    }
    let config = ApiConfig::from_env()?;
    let client = Arc::new(PracticeApiClient::new(&config)?);
    info!(base_url = client.base_url(), "using practice API");
    let provider: Arc<dyn QuestionProvider> = client.clone();
    let evaluator: Arc<dyn AnswerEvaluator> = client;
    Ok((provider, evaluator))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    init_tracing(args.verbose);

    let plan = RoundPlan::standard();
    debug!(overrides = ?args.draft.threshold_overrides, "threshold overrides");

    let (provider, evaluator) = providers(args.offline)?;
    let handle = SessionHandle::new(SessionController::new(plan, provider, evaluator));

    let language = args.draft.language;
    let voice = args.draft.voice_enabled.then(|| {
        let (tx, source) = ChannelTranscriptSource::channel();
        let adapter = VoiceInputAdapter::new(
            Box::new(source),
            Arc::new(LogSpeechSink),
            handle.draft(),
            language,
        );
        (adapter, tx)
    });

    let mut terminal = Terminal {
        handle: handle.clone(),
        input: BufReader::new(tokio::io::stdin()).lines(),
        voice,
    };
    if let Some((adapter, _)) = terminal.voice.as_mut() {
        adapter.start()?;
    }

    match handle.start_draft(args.draft, args.round).await {
        Ok(_) => {}
        Err(e @ SessionError::Fetch { .. }) => {
            println!("  error: {}", e.user_message());
        }
        Err(e) => return Err(e.user_message().into()),
    }

    loop {
        let Some(question) = terminal.current_question().await? else {
            return Ok(());
        };
        terminal.show_question(&question);
        if !terminal.answer().await? {
            return Ok(());
        }
        match terminal.advance().await? {
            None => return Ok(()),
            Some(Advance::NextQuestion { .. }) => {}
            Some(Advance::NextRound { round_id }) => println!("\n=== next round: {round_id} ==="),
            Some(Advance::Complete { overall_pass }) => {
                println!();
                println!(
                    "{}",
                    if overall_pass {
                        "Result: Passed Interview"
                    } else {
                        "Result: Failed Interview"
                    }
                );
                if let Some(summary) = handle.snapshot()?.summary {
                    for result in summary.results() {
                        println!(
                            "  {}: Avg {:.1} / Threshold {} - {}",
                            result.title,
                            result.average,
                            result.threshold,
                            if result.pass { "Pass" } else { "Fail" }
                        );
                    }
                }
                let path = handle.export_report(&ReportExporter::new(&args.out_dir))?;
                println!("summary written to {}", path.display());
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
