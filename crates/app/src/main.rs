use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use classroom_core::grade_table::format_grade;
use classroom_core::model::{AssignmentId, CourseId, QuestionId, StudentId};
use services::grade_table_service::{export_file_name, missing_cell_text};
use services::submission::SubmissionTarget;
use services::{AnswerDraft, AppConfig, AppServices, Clock, MessageKey};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "app=info,services=info,storage=info,classroom=info";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidId { flag: &'static str, raw: String },
    InvalidPair { flag: &'static str, raw: String },
    InvalidPoints { raw: String },
    OrphanFlag { flag: &'static str },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidPair { flag, raw } => {
                write!(f, "invalid {flag} value: {raw} (expected <question_id>=<value>)")
            }
            ArgsError::InvalidPoints { raw } => write!(f, "invalid --points value: {raw}"),
            ArgsError::OrphanFlag { flag } => write!(f, "{flag} must follow --question"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid drafts database url: {raw}"),
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

fn parse_id<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidId { flag, raw })
}

fn parse_pair(flag: &'static str, raw: String) -> Result<(QuestionId, String), ArgsError> {
    let Some((id, value)) = raw.split_once('=') else {
        return Err(ArgsError::InvalidPair { flag, raw });
    };
    let id = id
        .parse::<QuestionId>()
        .map_err(|_| ArgsError::InvalidPair {
            flag,
            raw: raw.clone(),
        })?;
    Ok((id, value.to_string()))
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  classroom grades    --course <id> [--export <file.xlsx|file.csv|dir> --name <course name>]");
    eprintln!("  classroom grades    --course <id> --student <id>");
    eprintln!("  classroom grading   --student <id> --assignment <id>");
    eprintln!("  classroom validate  --course <id> --student <id> --assignment <id> [--set <question_id>=<grade>]...");
    eprintln!("  classroom countdown --course <id> --assignment <id> [--student <id>] [--watch <secs>]");
    eprintln!("  classroom compose   --assignment <id> [--question <text> [--answer <text>] [--points <n>]]... [--publish | --discard]");
    eprintln!("  classroom respond   --course <id> --assignment <id> --answer <question_id>=<text>...");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CLASSROOM_API_URL, CLASSROOM_API_TOKEN, CLASSROOM_ROLE, CLASSROOM_USER_ID,");
    eprintln!("  CLASSROOM_HTTP_TIMEOUT_SECS, CLASSROOM_DRAFTS_DB, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Grades,
    Grading,
    Validate,
    Countdown,
    Compose,
    Respond,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "grades" => Some(Self::Grades),
            "grading" => Some(Self::Grading),
            "validate" => Some(Self::Validate),
            "countdown" => Some(Self::Countdown),
            "compose" => Some(Self::Compose),
            "respond" => Some(Self::Respond),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct CardArgs {
    question: String,
    answer: String,
    points: u32,
}

#[derive(Debug, Default)]
struct Args {
    course: Option<CourseId>,
    student: Option<StudentId>,
    assignment: Option<AssignmentId>,
    export: Option<PathBuf>,
    name: Option<String>,
    grades: Vec<(QuestionId, String)>,
    answers: Vec<(QuestionId, String)>,
    cards: Vec<CardArgs>,
    watch: Option<u64>,
    publish: bool,
    discard: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--course" => {
                    parsed.course = Some(parse_id("--course", require_value(args, "--course")?)?);
                }
                "--student" => {
                    parsed.student =
                        Some(parse_id("--student", require_value(args, "--student")?)?);
                }
                "--assignment" => {
                    parsed.assignment = Some(parse_id(
                        "--assignment",
                        require_value(args, "--assignment")?,
                    )?);
                }
                "--export" => {
                    parsed.export = Some(PathBuf::from(require_value(args, "--export")?));
                }
                "--name" => parsed.name = Some(require_value(args, "--name")?),
                "--set" => {
                    let pair = parse_pair("--set", require_value(args, "--set")?)?;
                    parsed.grades.push(pair);
                }
                "--question" => parsed.cards.push(CardArgs {
                    question: require_value(args, "--question")?,
                    ..CardArgs::default()
                }),
                "--answer" if !parsed.cards.is_empty() => {
                    let value = require_value(args, "--answer")?;
                    if let Some(card) = parsed.cards.last_mut() {
                        card.answer = value;
                    }
                }
                "--answer" => {
                    let pair = parse_pair("--answer", require_value(args, "--answer")?)?;
                    parsed.answers.push(pair);
                }
                "--points" => {
                    let value = require_value(args, "--points")?;
                    let points = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidPoints { raw: value.clone() })?;
                    parsed
                        .cards
                        .last_mut()
                        .ok_or(ArgsError::OrphanFlag { flag: "--points" })?
                        .points = points;
                }
                "--watch" => {
                    parsed.watch = Some(parse_id("--watch", require_value(args, "--watch")?)?);
                }
                "--publish" => parsed.publish = true,
                "--discard" => parsed.discard = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn course(&self) -> Result<CourseId, ArgsError> {
        self.course.ok_or(ArgsError::MissingFlag { flag: "--course" })
    }

    fn student(&self) -> Result<StudentId, ArgsError> {
        self.student.ok_or(ArgsError::MissingFlag { flag: "--student" })
    }

    fn assignment(&self) -> Result<AssignmentId, ArgsError> {
        self.assignment
            .ok_or(ArgsError::MissingFlag { flag: "--assignment" })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ─── Commands ──────────────────────────────────────────────────────────────

async fn show_grades(services: &AppServices, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let course_id = args.course()?;
    if let Some(student_id) = args.student.or_else(|| services.session().student_id()) {
        return show_student_grades(services, student_id, course_id).await;
    }
    let table = services.grade_table().load(course_id).await?;

    if let Some(path) = &args.export {
        let name = args.name.clone().unwrap_or_else(|| format!("Course {course_id}"));
        let path = if path.is_dir() {
            path.join(export_file_name(&name))
        } else {
            path.clone()
        };
        services.grade_table().export_to_path(&table, &name, &path)?;
        println!("exported {} students to {}", table.rows().len(), path.display());
        return Ok(());
    }

    if table.is_empty() {
        println!("no assignments in course {course_id}");
        return Ok(());
    }

    let rendered = table.render(missing_cell_text());
    println!(
        "#\tName\t{}\t{}",
        rendered.headers.join("\t"),
        MessageKey::CourseTotal.text()
    );
    for (index, row) in rendered.rows.iter().enumerate() {
        println!(
            "{}\t{}\t{}\t{}",
            index + 1,
            row.full_name,
            row.cells.join("\t"),
            row.total
        );
    }
    println!(
        "\t{}\t{}",
        MessageKey::TestAverage.text(),
        rendered.averages.join("\t")
    );
    Ok(())
}

async fn show_student_grades(
    services: &AppServices,
    student_id: StudentId,
    course_id: CourseId,
) -> Result<(), Box<dyn std::error::Error>> {
    let graded = services.assignments().graded(student_id, course_id).await?;
    if graded.is_empty() {
        println!("no graded assignments yet");
        return Ok(());
    }
    for item in &graded {
        let state = if item.info.is_validated() { "validated" } else { "pending" };
        println!(
            "{}\t{}\t{}/{}\t{state}",
            item.assignment.id,
            item.assignment.title,
            format_grade(item.total()),
            item.assignment.points
        );
    }
    Ok(())
}

async fn show_grading(services: &AppServices, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let view = services
        .grading()
        .load(args.student()?, args.assignment()?)
        .await?;

    for row in view.rows() {
        let comment = row
            .feedback
            .and_then(|fb| fb.comment.as_deref())
            .unwrap_or("");
        println!(
            "[{}] {}  {}/{}  {}",
            row.question.id, row.question.text, row.grade, row.question.max_points, comment
        );
    }
    println!("total: {}/{}", view.form().total(), view.total_points());
    println!("state: {:?} ({})", view.state(), view.validate_label());
    if let Some(advice) = view.advice() {
        println!("advice: {advice}");
    }
    Ok(())
}

async fn validate(services: &AppServices, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let target = SubmissionTarget {
        course_id: args.course()?,
        student_id: args.student()?,
        assignment_id: args.assignment()?,
    };
    let mut view = services
        .grading()
        .load(target.student_id, target.assignment_id)
        .await?;

    for (question_id, raw) in &args.grades {
        let grade: f64 = raw.parse().map_err(|_| ArgsError::InvalidPair {
            flag: "--set",
            raw: format!("{question_id}={raw}"),
        })?;
        view.form_mut().set_grade(*question_id, grade)?;
    }

    let outcome = services.submission().submit(target, view.form_mut()).await?;
    println!(
        "validated after {} grade update(s); next: {}",
        outcome.updated,
        outcome.navigate_to.path()
    );
    Ok(())
}

async fn countdown(services: &AppServices, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let student_id = match args.student {
        Some(id) => id,
        None => services
            .session()
            .student_id()
            .ok_or(ArgsError::MissingFlag { flag: "--student" })?,
    };
    let assignments = services.assignments();
    let assignment = assignments
        .find(student_id, args.course()?, args.assignment()?)
        .await?;

    println!("{}  due {}", assignment.title, assignments.deadline_label(&assignment));

    let timer = assignments.countdown(&assignment);
    let mut updates = timer.subscribe();
    println!("{}", *updates.borrow_and_update());

    let until = tokio::time::Instant::now() + Duration::from_secs(args.watch.unwrap_or(0));
    while timer.is_running() {
        match tokio::time::timeout_at(until, updates.changed()).await {
            Ok(Ok(())) => println!("{}", *updates.borrow_and_update()),
            _ => break,
        }
    }
    Ok(())
}

async fn compose(services: &AppServices, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let assignment_id = args.assignment()?;
    let compose = services.compose();

    if args.discard {
        compose.discard(assignment_id).await?;
        println!("drafts of assignment {assignment_id} discarded");
        return Ok(());
    }

    let mut drafts = compose.open(assignment_id).await?;
    for card in &args.cards {
        let blank = drafts
            .cards()
            .iter()
            .find(|c| c.question_text.trim().is_empty())
            .map(|c| c.position);
        let position = blank.unwrap_or_else(|| drafts.add_blank());
        let slot = drafts.card_mut(position)?;
        slot.question_text.clone_from(&card.question);
        slot.teacher_answer.clone_from(&card.answer);
        slot.max_points = card.points;
    }

    if args.publish {
        let published = compose.publish(assignment_id, &drafts).await?;
        println!("published {published} question(s)");
        return Ok(());
    }

    compose.save(assignment_id, &drafts).await?;
    for card in drafts.cards() {
        println!(
            "{}. {} [{} pts] -> {}",
            card.position, card.question_text, card.max_points, card.teacher_answer
        );
    }
    Ok(())
}

async fn respond(services: &AppServices, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let student_id = services
        .session()
        .student_id()
        .ok_or("respond requires CLASSROOM_ROLE=student")?;
    let assignment = services
        .assignments()
        .find(student_id, args.course()?, args.assignment()?)
        .await?;
    let answers: Vec<AnswerDraft> = args
        .answers
        .iter()
        .map(|(id, text)| AnswerDraft::new(*id, text.clone()))
        .collect();

    let sent = services.responses().submit(&assignment, &answers).await?;
    println!("sent {sent} response(s) for {}", assignment.title);
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next().as_deref() {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut config = AppConfig::from_env()?;
    config.drafts_db = normalize_sqlite_url(config.drafts_db);
    // Open + migrate the draft store here so services stay free of filesystem setup.
    prepare_sqlite_file(&config.drafts_db)?;

    let services = AppServices::connect(config, Clock::default_clock()).await?;
    tracing::debug!(?cmd, "running command");

    let result = match cmd {
        Command::Grades => show_grades(&services, &parsed).await,
        Command::Grading => show_grading(&services, &parsed).await,
        Command::Validate => validate(&services, &parsed).await,
        Command::Countdown => countdown(&services, &parsed).await,
        Command::Compose => compose(&services, &parsed).await,
        Command::Respond => respond(&services, &parsed).await,
    };
    services.logout();
    result
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
