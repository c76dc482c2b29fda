//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use examarchive_client::FacultyFilter;
use examarchive_client::SubjectFilter;
use examarchive_core::analysis::{analyze_tests, validate_threshold};
use examarchive_core::filter::filter_items;
use examarchive_core::sync::{ProgressReporter, SyncResult};
use examarchive_core::upload::{UploadForm, download_file_name, prepare_upload};
use examarchive_shared::{
    Address, AppConfig, Faculty, Module, Subject, Test, TestQuery, init_config, load_config,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::context::{Context, is_unauthorized};
use crate::render::{self, TestDetail};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// examarchive: browse, search, and analyze archived exam papers.
#[derive(Parser)]
#[command(
    name = "examarchive",
    version,
    about = "Browse, search, and analyze archived exam papers.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Archive API base URL (overrides the config file).
    #[arg(long, global = true, env = "EXAMARCHIVE_API_URL")]
    pub api_url: Option<String>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Email and password, shared by `register` and `login`.
#[derive(clap::Args)]
pub(crate) struct Credentials {
    /// Account e-mail.
    #[arg(long, short)]
    pub email: String,

    /// Password (prefer the environment variable over the flag).
    #[arg(long, env = "EXAMARCHIVE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Create an account.
    Register(Credentials),

    /// Log in and remember the session.
    Login(Credentials),

    /// Forget the stored session.
    Logout,

    /// Show the logged-in account.
    Whoami,

    /// Faculties and their modules.
    Faculty {
        #[command(subcommand)]
        action: FacultyAction,
    },

    /// Subjects.
    Subject {
        #[command(subcommand)]
        action: SubjectAction,
    },

    /// Archived tests.
    Test {
        #[command(subcommand)]
        action: TestAction,
    },

    /// Group a subject's questions by similarity and rank them by frequency.
    Analyze {
        /// Subject code.
        subject: String,

        /// Similarity ratio (0-1) at which questions count as the same.
        #[arg(long)]
        threshold: Option<f64>,

        /// Analyze the locally cached tests instead of asking the server.
        #[arg(long)]
        offline: bool,

        /// Only print the N most frequent questions.
        #[arg(long)]
        top: Option<usize>,
    },

    /// Account administration (admin only).
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Split a test's text into questions (file path or `-` for stdin).
    Segment {
        input: String,
    },

    /// Offline cache of tests.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum FacultyAction {
    /// List faculties.
    List {
        /// Name contains (case-insensitive).
        #[arg(long)]
        name: Option<String>,
        /// Code contains (case-insensitive).
        #[arg(long)]
        code: Option<String>,
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },
    /// Search faculties by name, code, or description.
    Search { query: String },
    /// Show one faculty with its modules.
    Show { id: String },
    /// Create a faculty (admin).
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Street name; with --street-number, --city and --postal-code.
        #[arg(long, requires_all = ["street_number", "city", "postal_code"])]
        street: Option<String>,
        #[arg(long)]
        street_number: Option<u32>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        postal_code: Option<String>,
    },
    /// Delete a faculty (admin).
    Delete { id: String },
    /// Add a module to a faculty (admin).
    AddModule {
        faculty_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Remove a module from a faculty by code (admin).
    RemoveModule { faculty_id: String, code: String },
}

#[derive(Subcommand)]
pub(crate) enum SubjectAction {
    /// List subjects.
    List {
        #[arg(long)]
        faculty: Option<String>,
        #[arg(long)]
        module: Option<String>,
        #[arg(long)]
        year: Option<u8>,
        #[arg(long)]
        semester: Option<u8>,
        #[arg(long)]
        mandatory: Option<bool>,
        /// Client-side name/code filter.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show a subject by code (or by id with --id).
    Show {
        code: String,
        #[arg(long)]
        id: bool,
    },
    /// Create a subject (admin).
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        faculty: String,
        #[arg(long)]
        module: String,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
        year: u8,
        #[arg(long)]
        semester: u8,
        #[arg(long)]
        espb: u32,
        /// Mark the subject as elective.
        #[arg(long)]
        elective: bool,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a subject (admin).
    Delete { id: String },
}

#[derive(Subcommand)]
pub(crate) enum TestAction {
    /// Search tests.
    Find {
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        year: Option<String>,
        #[arg(long)]
        period: Option<String>,
        #[arg(long = "type")]
        test_type: Option<String>,
        /// Full-text search in the test content.
        #[arg(long)]
        text: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        skip: u32,
        /// Print segmented questions under each test.
        #[arg(long)]
        questions: bool,
    },
    /// List all tests, newest first.
    All {
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },
    /// Show a cached test with its questions.
    Show {
        id: String,
        /// Print the whole text instead of the questions.
        #[arg(long)]
        full: bool,
    },
    /// Upload a scanned paper (jpg, jpeg, png, pdf, tiff, bmp).
    Upload {
        file: PathBuf,
        #[arg(long)]
        subject: String,
        /// Exam period, e.g. "Januarski 2024".
        #[arg(long)]
        period: String,
        /// Academic year, e.g. 2023/2024.
        #[arg(long)]
        year: String,
        /// regular, makeup, midterm, final, or practical.
        #[arg(long = "type", default_value = "regular")]
        test_type: String,
    },
    /// Delete a test (admin).
    Delete { id: String },
    /// Download the original scan.
    Download {
        id: String,
        /// Output path (defaults to the server-provided file name).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub(crate) enum UserAction {
    /// List accounts.
    List {
        /// E-mail contains (case-insensitive).
        #[arg(long)]
        filter: Option<String>,
    },
    /// Grant or revoke admin rights.
    Admin {
        id: String,
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
    /// Enable or disable an account.
    Active {
        id: String,
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
    /// Delete an account.
    Delete { id: String },
}

#[derive(Subcommand)]
pub(crate) enum CacheAction {
    /// Download and cache all tests of the given subjects.
    Sync {
        #[arg(required = true)]
        subjects: Vec<String>,
    },
    /// Full-text search over cached tests.
    Search {
        query: String,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// List cached tests (or cached subjects with --subjects).
    List {
        #[arg(long)]
        subject: Option<String>,
        #[arg(long, conflicts_with = "subject")]
        subjects: bool,
    },
    /// Remove cached tests.
    Clear {
        #[arg(long)]
        subject: Option<String>,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so command
/// output stays pipeable.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "examarchive=info",
        1 => "examarchive=debug",
        _ => "examarchive=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let json = cli.json;
    let api_url = cli.api_url.clone();

    match cli.command {
        Command::Segment { input } => cmd_segment(&input, json),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(api_url.as_deref()),
        },
        command => {
            let mut ctx = Context::load(api_url.as_deref()).await?;
            let result = dispatch(&mut ctx, command, json).await;
            let rejected = result
                .as_ref()
                .is_err_and(|err| is_unauthorized(err) && ctx.client.is_authenticated());
            if rejected {
                ctx.forget_session().await;
                eprintln!("Session expired or rejected; run `examarchive login` again.");
            }
            result
        }
    }
}

async fn dispatch(ctx: &mut Context, command: Command, json: bool) -> Result<()> {
    match command {
        Command::Register(creds) => cmd_register(ctx, &creds, json).await,
        Command::Login(creds) => cmd_login(ctx, &creds).await,
        Command::Logout => cmd_logout(ctx).await,
        Command::Whoami => cmd_whoami(ctx, json).await,
        Command::Faculty { action } => cmd_faculty(ctx, action, json).await,
        Command::Subject { action } => cmd_subject(ctx, action, json).await,
        Command::Test { action } => cmd_test(ctx, action, json).await,
        Command::Analyze {
            subject,
            threshold,
            offline,
            top,
        } => cmd_analyze(ctx, &subject, threshold, offline, top, json).await,
        Command::User { action } => cmd_user(ctx, action, json).await,
        Command::Cache { action } => cmd_cache(ctx, action, json).await,
        Command::Segment { .. } | Command::Config { .. } => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

async fn cmd_register(ctx: &Context, creds: &Credentials, json: bool) -> Result<()> {
    let user = ctx.client.register(&creds.email, &creds.password).await?;
    if json {
        return render::json(&user);
    }
    println!("Registered {}. Log in with `examarchive login`.", user.email);
    Ok(())
}

async fn cmd_login(ctx: &mut Context, creds: &Credentials) -> Result<()> {
    ctx.client.login(&creds.email, &creds.password).await?;
    let user = ctx.client.me().await?;

    let token = ctx
        .client
        .token()
        .ok_or_else(|| eyre!("login succeeded but no token was kept"))?;
    let storage = ctx.storage().await?;
    storage
        .save_session(ctx.client.base_url().as_str(), token, Some(&user))
        .await?;

    info!(email = %user.email, admin = user.is_admin, "session saved");
    println!(
        "Logged in as {}{}.",
        user.email,
        if user.is_admin { " (admin)" } else { "" }
    );
    ctx.user = Some(user);
    Ok(())
}

async fn cmd_logout(ctx: &mut Context) -> Result<()> {
    ctx.client.logout();
    ctx.user = None;
    let storage = ctx.storage().await?;
    if storage.clear_session().await? {
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

async fn cmd_whoami(ctx: &Context, json: bool) -> Result<()> {
    ctx.require_login()?;
    let user = ctx.client.me().await?;
    if json {
        return render::json(&user);
    }
    render::user(&user);
    Ok(())
}

// ---------------------------------------------------------------------------
// Faculties
// ---------------------------------------------------------------------------

async fn cmd_faculty(ctx: &Context, action: FacultyAction, json: bool) -> Result<()> {
    let client = &ctx.client;
    match action {
        FacultyAction::List {
            name,
            code,
            skip,
            limit,
        } => {
            let filter = FacultyFilter {
                name,
                code,
                skip,
                limit,
            };
            let faculties = client.list_faculties(&filter).await?;
            if json {
                return render::json(&faculties);
            }
            render::faculties(&faculties);
        }
        FacultyAction::Search { query } => {
            let faculties = client.search_faculties(&query).await?;
            if json {
                return render::json(&faculties);
            }
            render::faculties(&faculties);
        }
        FacultyAction::Show { id } => {
            let faculty = client.get_faculty(&id).await?;
            if json {
                return render::json(&faculty);
            }
            render::faculty(&faculty);
        }
        FacultyAction::Create {
            name,
            code,
            description,
            street,
            street_number,
            city,
            postal_code,
        } => {
            ctx.require_admin()?;
            let address = match (street, street_number, city, postal_code) {
                (Some(street_name), Some(street_number), Some(city), Some(postal_code)) => {
                    Some(Address {
                        street_name,
                        street_number,
                        city,
                        postal_code,
                    })
                }
                _ => None,
            };
            let faculty = Faculty {
                id: None,
                name,
                code,
                description,
                address,
                modules: Vec::new(),
            };
            let created = client.create_faculty(&faculty).await?;
            if json {
                return render::json(&created);
            }
            println!(
                "Created faculty {} ({}).",
                created.code,
                created.id.as_deref().unwrap_or("-")
            );
        }
        FacultyAction::Delete { id } => {
            ctx.require_admin()?;
            client.delete_faculty(&id).await?;
            println!("Deleted faculty {id}.");
        }
        FacultyAction::AddModule {
            faculty_id,
            name,
            code,
            description,
        } => {
            ctx.require_admin()?;
            let module = Module {
                name,
                code,
                description,
            };
            let faculty = client.add_module(&faculty_id, &module).await?;
            if json {
                return render::json(&faculty);
            }
            render::faculty(&faculty);
        }
        FacultyAction::RemoveModule { faculty_id, code } => {
            ctx.require_admin()?;
            let faculty = client.remove_module(&faculty_id, &code).await?;
            if json {
                return render::json(&faculty);
            }
            render::faculty(&faculty);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Subjects
// ---------------------------------------------------------------------------

async fn cmd_subject(ctx: &Context, action: SubjectAction, json: bool) -> Result<()> {
    let client = &ctx.client;
    match action {
        SubjectAction::List {
            faculty,
            module,
            year,
            semester,
            mandatory,
            filter,
        } => {
            let query = SubjectFilter {
                faculty_code: faculty,
                module_code: module,
                year,
                semester,
                mandatory,
            };
            let subjects = client.list_subjects(&query).await?;
            let visible: Vec<Subject> = filter_items(&subjects, filter.as_deref().unwrap_or(""))
                .into_iter()
                .cloned()
                .collect();
            if json {
                return render::json(&visible);
            }
            render::subjects(&visible);
        }
        SubjectAction::Show { code, id } => {
            let subject = if id {
                client.get_subject(&code).await?
            } else {
                client.get_subject_by_code(&code).await?
            };
            if json {
                return render::json(&subject);
            }
            render::subject(&subject);
        }
        SubjectAction::Create {
            name,
            code,
            faculty,
            module,
            year,
            semester,
            espb,
            elective,
            description,
        } => {
            ctx.require_admin()?;
            let subject = Subject {
                id: None,
                name,
                code,
                module_code: module,
                faculty_code: faculty,
                year,
                semester,
                espb,
                mandatory: !elective,
                description,
            };
            let created = client.create_subject(&subject).await?;
            if json {
                return render::json(&created);
            }
            println!("Created subject {}.", created.code);
        }
        SubjectAction::Delete { id } => {
            ctx.require_admin()?;
            client.delete_subject(&id).await?;
            println!("Deleted subject {id}.");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

async fn cmd_test(ctx: &Context, action: TestAction, json: bool) -> Result<()> {
    let client = &ctx.client;
    let preview_chars = ctx.config.browse.preview_chars;
    match action {
        TestAction::Find {
            subject,
            year,
            period,
            test_type,
            text,
            limit,
            skip,
            questions,
        } => {
            let query = TestQuery {
                subject_code: subject,
                academic_year: year,
                exam_period: period,
                test_type,
                text_search: text,
                limit,
                skip,
            };
            let tests = client.find_tests(&query).await?;
            if json {
                return render::json(&tests);
            }
            let detail = if questions {
                TestDetail::Questions { preview_chars }
            } else {
                TestDetail::Summary
            };
            render::tests(&tests, detail);
        }
        TestAction::All { skip, limit } => {
            let tests = client.all_tests(skip, limit).await?;
            if json {
                return render::json(&tests);
            }
            render::tests(&tests, TestDetail::Summary);
        }
        TestAction::Show { id, full } => {
            let storage = ctx.storage().await?;
            let cached = storage.get_test(&id).await?.ok_or_else(|| {
                eyre!("test {id} is not cached; run `examarchive cache sync <subject>` first")
            })?;
            if json {
                let seg = examarchive_segmenter::segment(&cached.test.full_text);
                return render::json(&serde_json::json!({
                    "test": cached.test,
                    "segmentation": seg,
                }));
            }
            let detail = if full {
                TestDetail::FullText
            } else {
                TestDetail::Questions { preview_chars }
            };
            render::test(&cached.test, detail);
        }
        TestAction::Upload {
            file,
            subject,
            period,
            year,
            test_type,
        } => {
            ctx.require_login()?;
            let form = UploadForm {
                subject_code: subject,
                exam_period: period,
                academic_year: year,
                test_type,
            };
            let request = prepare_upload(form, &file).await?;

            let spinner = spinner(&format!("Uploading {}", file.display()));
            let result = client.upload_test(request).await;
            spinner.finish_and_clear();
            let test = result?;

            if json {
                return render::json(&test);
            }
            println!("Uploaded test {}.", test.id_str());
            render::test(&test, TestDetail::Questions { preview_chars });
        }
        TestAction::Delete { id } => {
            ctx.require_admin()?;
            client.delete_test(&id).await?;
            // A deleted test should not linger offline.
            if let Ok(storage) = ctx.storage().await {
                storage.delete_cached_test(&id).await.ok();
            }
            println!("Deleted test {id}.");
        }
        TestAction::Download { id, out } => {
            let file = client.download_test_file(&id).await?;
            let path = match out {
                Some(path) => path,
                None => PathBuf::from(
                    file.file_name
                        .clone()
                        .unwrap_or_else(|| download_file_name(&id, None)),
                ),
            };
            write_file(&path, &file.bytes)?;
            println!(
                "Saved {} ({} bytes, {}).",
                path.display(),
                file.bytes.len(),
                file.content_type
            );
        }
    }
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|e| eyre!("failed to write {}: {e}", path.display()))
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

async fn cmd_analyze(
    ctx: &Context,
    subject: &str,
    threshold: Option<f64>,
    offline: bool,
    top: Option<usize>,
    json: bool,
) -> Result<()> {
    let threshold = threshold.unwrap_or(ctx.config.analysis.similarity_threshold);
    validate_threshold(threshold)?;

    let analysis = if offline {
        let storage = ctx.storage().await?;
        let tests: Vec<Test> = storage
            .list_cached_tests(Some(subject))
            .await?
            .into_iter()
            .map(|c| c.test)
            .collect();
        analyze_tests(subject, &tests, threshold)?
    } else {
        ctx.client.analyze_subject(subject, threshold).await?
    };

    if json {
        return render::json(&analysis);
    }
    render::analysis(&analysis, top);
    Ok(())
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

async fn cmd_user(ctx: &Context, action: UserAction, json: bool) -> Result<()> {
    ctx.require_admin()?;
    let client = &ctx.client;
    match action {
        UserAction::List { filter } => {
            let users = client.list_users().await?;
            let visible: Vec<_> = filter_items(&users, filter.as_deref().unwrap_or(""))
                .into_iter()
                .cloned()
                .collect();
            if json {
                return render::json(&visible);
            }
            render::users(&visible);
        }
        UserAction::Admin { id, value } => {
            let user = client.set_admin(&id, value).await?;
            if json {
                return render::json(&user);
            }
            render::user(&user);
        }
        UserAction::Active { id, value } => {
            let user = client.set_active(&id, value).await?;
            if json {
                return render::json(&user);
            }
            render::user(&user);
        }
        UserAction::Delete { id } => {
            client.delete_user(&id).await?;
            println!("Deleted user {id}.");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Segment
// ---------------------------------------------------------------------------

fn cmd_segment(input: &str, json: bool) -> Result<()> {
    let raw = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input).map_err(|e| eyre!("failed to read {input}: {e}"))?
    };

    let seg = examarchive_segmenter::segment(&raw);
    if json {
        return render::json(&seg);
    }
    if seg.is_empty() {
        println!("No numbered questions found.");
    } else {
        render::questions(&seg, "");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

async fn cmd_cache(ctx: &Context, action: CacheAction, json: bool) -> Result<()> {
    let storage = ctx.storage().await?;
    match action {
        CacheAction::Sync { subjects } => {
            let mut results = Vec::with_capacity(subjects.len());
            for subject in &subjects {
                let reporter = CliProgress::new(subject);
                let result =
                    examarchive_core::sync::sync_subject(&ctx.client, &storage, subject, &reporter)
                        .await?;
                if !json {
                    println!(
                        "  {}: {} tests cached, {} questions ({} without numbering){}, {:.1}s",
                        result.subject_code,
                        result.cached,
                        result.questions,
                        result.unsegmented,
                        if result.skipped > 0 {
                            format!(", {} skipped", result.skipped)
                        } else {
                            String::new()
                        },
                        result.elapsed.as_secs_f64()
                    );
                }
                results.push(result);
            }
            if json {
                let summary: Vec<_> = results
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "subject_code": r.subject_code,
                            "cached": r.cached,
                            "questions": r.questions,
                            "unsegmented": r.unsegmented,
                            "skipped": r.skipped,
                        })
                    })
                    .collect();
                return render::json(&summary);
            }
        }
        CacheAction::Search {
            query,
            subject,
            limit,
        } => {
            let hits = storage
                .search_cached(&query, subject.as_deref(), limit)
                .await?;
            if json {
                let hits: Vec<_> = hits
                    .iter()
                    .map(|h| {
                        serde_json::json!({
                            "test_id": h.test_id,
                            "subject_code": h.subject_code,
                            "exam_period": h.exam_period,
                            "academic_year": h.academic_year,
                            "snippet": h.snippet,
                            "score": h.score,
                        })
                    })
                    .collect();
                return render::json(&hits);
            }
            render::search_hits(&hits);
        }
        CacheAction::List { subject, subjects } => {
            if subjects {
                let counts = storage.cached_subjects().await?;
                if json {
                    return render::json(&counts);
                }
                if counts.is_empty() {
                    println!("The cache is empty.");
                }
                for (code, count) in counts {
                    println!("{code:<10} {count} tests");
                }
            } else {
                let tests = storage.list_cached_tests(subject.as_deref()).await?;
                if json {
                    let plain: Vec<&Test> = tests.iter().map(|c| &c.test).collect();
                    return render::json(&plain);
                }
                render::cached_tests(&tests);
            }
        }
        CacheAction::Clear { subject } => {
            let removed = storage.clear_cache(subject.as_deref()).await?;
            println!("Removed {removed} cached tests.");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(api_url: Option<&str>) -> Result<()> {
    let mut config: AppConfig = load_config()?;
    if let Some(url) = api_url {
        config.api.base_url = url.to_string();
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(
            style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    subject: String,
    spinner: ProgressBar,
}

impl CliProgress {
    fn new(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            spinner: spinner(subject),
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(format!("{}: {name}", self.subject));
    }

    fn test_cached(&self, test: &Test, questions: usize, current: usize, total: usize) {
        self.spinner.set_message(format!(
            "{}: [{current}/{total}] {} {} ({questions} questions)",
            self.subject, test.exam_period, test.academic_year
        ));
    }

    fn done(&self, _result: &SyncResult) {
        self.spinner.finish_and_clear();
    }
}
