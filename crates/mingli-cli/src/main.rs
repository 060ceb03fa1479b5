mod tui;

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mingli_core::api::{ClientApi, HttpClient};
use mingli_core::config::{self, MingliConfig, API_URL_ENV};
use mingli_core::model::*;
use mingli_core::records::RecordStore;
use mingli_core::session::{SessionEvent, UserSession};
use mingli_core::storage::FileUserStorage;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mingli",
    about = "Mingli: birth records and BaZi, Zi Wei and astrology readings",
    version
)]
struct Cli {
    /// Without a subcommand the terminal UI starts
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive terminal UI
    Tui,
    /// Log in with a stand-in identity
    Login,
    /// Forget the logged-in user
    Logout,
    /// Show the logged-in user
    Whoami {
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage birth records
    Records {
        #[command(subcommand)]
        action: RecordsAction,
    },
    /// Run an analysis for a birth record
    Analyze {
        /// Birth record ID
        id: i64,
        /// Analysis kind (bazi, ziwei, astrology)
        #[arg(short, long, default_value = "bazi")]
        kind: String,
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored analyses of a birth record
    History {
        /// Birth record ID
        id: i64,
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config,
}

#[derive(Subcommand)]
enum RecordsAction {
    /// List the birth records of the logged-in user
    List {
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a birth record
    Add {
        /// Name of the person
        #[arg(long)]
        nickname: String,
        /// male or female
        #[arg(long)]
        gender: String,
        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Birth time (HH:MM)
        #[arg(long)]
        time: String,
        /// Birth place
        #[arg(long)]
        place: Option<String>,
        #[arg(long)]
        longitude: Option<f64>,
        #[arg(long)]
        latitude: Option<f64>,
    },
    /// Edit a birth record; omitted fields keep their value
    Edit {
        /// Birth record ID
        id: i64,
        #[arg(long)]
        nickname: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        place: Option<String>,
        #[arg(long)]
        longitude: Option<f64>,
        #[arg(long)]
        latitude: Option<f64>,
    },
    /// Delete a birth record
    Delete {
        /// Birth record ID
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let command = Cli::parse().command.unwrap_or(Commands::Tui);
    init_tracing(matches!(command, Commands::Tui));

    let config = MingliConfig::load(Some(&std::env::current_dir()?))
        .unwrap_or_else(|_| MingliConfig::default_config());

    run(command, &config).await
}

/// One-shot commands log to stderr. The TUI owns the terminal, so it logs
/// to `~/.config/mingli/mingli.log` or not at all.
fn init_tracing(interactive: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if !interactive {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
        return;
    }

    let Some(dir) = config::config_dir() else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("mingli.log"))
    else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .compact()
        .init();
}

async fn run(command: Commands, config: &MingliConfig) -> Result<()> {
    match command {
        Commands::Tui => tui::run_tui(config).await,
        Commands::Login => {
            let api = make_api(config)?;
            cmd_login(&api, config).await
        }
        Commands::Logout => cmd_logout(config),
        Commands::Whoami { json } => cmd_whoami(config, json),
        Commands::Records { action } => {
            let api = make_api(config)?;
            let user = require_user(config)?;
            match action {
                RecordsAction::List { json } => cmd_records_list(&api, &user, json).await,
                RecordsAction::Add {
                    nickname,
                    gender,
                    date,
                    time,
                    place,
                    longitude,
                    latitude,
                } => {
                    let draft = BirthDraft {
                        nickname,
                        gender: parse_gender(&gender)?,
                        birth_date: parse_birth_date(&date)?,
                        birth_time: parse_birth_time(&time)?,
                        birth_place: place,
                        longitude,
                        latitude,
                    };
                    cmd_records_add(&api, &user, draft).await
                }
                RecordsAction::Edit {
                    id,
                    nickname,
                    gender,
                    date,
                    time,
                    place,
                    longitude,
                    latitude,
                } => {
                    let changes = RecordChanges {
                        nickname,
                        gender: gender.as_deref().map(parse_gender).transpose()?,
                        birth_date: date.as_deref().map(parse_birth_date).transpose()?,
                        birth_time: time.as_deref().map(parse_birth_time).transpose()?,
                        birth_place: place,
                        longitude,
                        latitude,
                    };
                    cmd_records_edit(&api, &user, id, changes).await
                }
                RecordsAction::Delete { id, yes } => {
                    cmd_records_delete(&api, &user, id, yes).await
                }
            }
        }
        Commands::Analyze { id, kind, json } => {
            let kind: AnalysisKind = kind.parse().map_err(anyhow::Error::msg)?;
            let api = make_api(config)?;
            cmd_analyze(&api, id, kind, json).await
        }
        Commands::History { id, json } => {
            let api = make_api(config)?;
            cmd_history(&api, id, json).await
        }
        Commands::Config => cmd_config(config),
    }
}

fn make_api(config: &MingliConfig) -> Result<HttpClient> {
    HttpClient::new(&config.api).context("failed to create API client")
}

fn make_session(config: &MingliConfig) -> Result<UserSession> {
    let storage = FileUserStorage::from_config(config).context("failed to open session storage")?;
    Ok(UserSession::new(Box::new(storage), config.login.clone()))
}

fn require_user(config: &MingliConfig) -> Result<User> {
    let mut session = make_session(config)?;
    session.restore();
    match session.current_user() {
        Some(user) => Ok(user.clone()),
        None => bail!("not logged in, run `mingli login` first"),
    }
}

fn parse_gender(s: &str) -> Result<Gender> {
    s.parse().map_err(anyhow::Error::msg)
}

// -- Session --

async fn cmd_login(api: &HttpClient, config: &MingliConfig) -> Result<()> {
    let mut session = make_session(config)?;
    if let Some(SessionEvent::UserAvailable(user)) = session.restore() {
        println!(
            "Already logged in as {} {}",
            user.nickname.bold(),
            format!("(id {})", user.id).dimmed()
        );
        return Ok(());
    }

    let SessionEvent::UserAvailable(user) = session.login(api).await.context("login failed")?;
    println!(
        "{} Logged in as {} {}",
        "✓".green(),
        user.nickname.bold(),
        format!("(id {})", user.id).dimmed()
    );
    Ok(())
}

fn cmd_logout(config: &MingliConfig) -> Result<()> {
    let mut session = make_session(config)?;
    if session.restore().is_none() {
        println!("{}", "Not logged in.".dimmed());
        return Ok(());
    }
    session.logout().context("failed to clear the stored user")?;
    println!("{} Logged out", "✓".green());
    Ok(())
}

fn cmd_whoami(config: &MingliConfig, json: bool) -> Result<()> {
    let mut session = make_session(config)?;
    session.restore();
    let Some(user) = session.current_user() else {
        if json {
            println!("null");
        } else {
            println!("{}", "Not logged in.".dimmed());
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(user)?);
        return Ok(());
    }
    println!("{}", user.nickname.bold());
    println!("  {}      {}", "ID:".dimmed(), user.id.to_string().cyan());
    println!("  {}  {}", "OpenID:".dimmed(), user.wechat_openid);
    if let Some(ref avatar) = user.avatar_url {
        println!("  {}  {}", "Avatar:".dimmed(), avatar);
    }
    Ok(())
}

// -- Records --

async fn cmd_records_list(api: &HttpClient, user: &User, json: bool) -> Result<()> {
    let mut store = RecordStore::new();
    store
        .load(api, user.id)
        .await
        .context("failed to load birth records")?;

    if json {
        println!("{}", serde_json::to_string_pretty(store.records())?);
        return Ok(());
    }
    if store.records().is_empty() {
        println!("{}", "No birth records yet. Add one with `mingli records add`.".dimmed());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "{:<6} {:<16} {:<8} {:<12} {:<8} {}",
            "ID", "NAME", "GENDER", "DATE", "TIME", "PLACE"
        )
        .dimmed()
    );
    for record in store.records() {
        print_record_row(record);
    }
    println!();
    println!("{}", format!("{} record(s)", store.records().len()).dimmed());
    Ok(())
}

fn print_record_row(record: &BirthRecord) {
    println!(
        "{:<6} {:<16} {:<8} {:<12} {:<8} {}",
        record.id.to_string().cyan(),
        record.nickname,
        record.gender.label(),
        record.birth_date.format("%Y-%m-%d"),
        record.birth_time.format("%H:%M"),
        record.birth_place.as_deref().unwrap_or("-").dimmed(),
    );
}

async fn cmd_records_add(api: &HttpClient, user: &User, draft: BirthDraft) -> Result<()> {
    let mut store = RecordStore::new();
    store.reset_for(Some(user.id));
    store
        .create(api, user.id, draft)
        .await
        .context("failed to add birth record")?;

    println!("{} Birth record added", "✓".green());
    if let Some(record) = store.records().first() {
        print_record_row(record);
    }
    Ok(())
}

/// Fields given on the command line for `records edit`.
struct RecordChanges {
    nickname: Option<String>,
    gender: Option<Gender>,
    birth_date: Option<chrono::NaiveDate>,
    birth_time: Option<chrono::NaiveTime>,
    birth_place: Option<String>,
    longitude: Option<f64>,
    latitude: Option<f64>,
}

impl RecordChanges {
    fn is_empty(&self) -> bool {
        self.nickname.is_none()
            && self.gender.is_none()
            && self.birth_date.is_none()
            && self.birth_time.is_none()
            && self.birth_place.is_none()
            && self.longitude.is_none()
            && self.latitude.is_none()
    }

    fn apply(self, mut draft: BirthDraft) -> BirthDraft {
        if let Some(nickname) = self.nickname {
            draft.nickname = nickname;
        }
        if let Some(gender) = self.gender {
            draft.gender = gender;
        }
        if let Some(date) = self.birth_date {
            draft.birth_date = date;
        }
        if let Some(time) = self.birth_time {
            draft.birth_time = time;
        }
        if self.birth_place.is_some() {
            draft.birth_place = self.birth_place;
        }
        if self.longitude.is_some() {
            draft.longitude = self.longitude;
        }
        if self.latitude.is_some() {
            draft.latitude = self.latitude;
        }
        draft
    }
}

async fn cmd_records_edit(
    api: &HttpClient,
    user: &User,
    id: i64,
    changes: RecordChanges,
) -> Result<()> {
    if changes.is_empty() {
        bail!("nothing to change, pass at least one field");
    }

    let mut store = RecordStore::new();
    store
        .load(api, user.id)
        .await
        .context("failed to load birth records")?;
    let Some(record) = store.get(id) else {
        bail!("no birth record with id {id}");
    };
    let draft = changes.apply(BirthDraft::from_record(record));

    store
        .update(api, user.id, id, draft)
        .await
        .context("failed to update birth record")?;

    println!("{} Birth record saved", "✓".green());
    if let Some(record) = store.get(id) {
        print_record_row(record);
    }
    Ok(())
}

async fn cmd_records_delete(api: &HttpClient, user: &User, id: i64, yes: bool) -> Result<()> {
    let mut store = RecordStore::new();
    store
        .load(api, user.id)
        .await
        .context("failed to load birth records")?;
    let Some(record) = store.get(id) else {
        bail!("no birth record with id {id}");
    };

    if !yes {
        eprint!("Delete the record of {}? [y/N] ", record.nickname.bold());
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println!("{}", "Kept.".dimmed());
            return Ok(());
        }
    }

    store
        .delete(api, user.id, id)
        .await
        .context("failed to delete birth record")?;
    println!(
        "{} Birth record deleted ({} left)",
        "✓".green(),
        store.records().len()
    );
    Ok(())
}

// -- Analysis --

async fn cmd_analyze(api: &HttpClient, id: i64, kind: AnalysisKind, json: bool) -> Result<()> {
    let result = api
        .run_analysis(id, kind)
        .await
        .with_context(|| format!("{} analysis failed", kind.label()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    println!("{}", format!("{} · record {id}", kind.label()).bold());
    println!();
    print_result(&result);
    Ok(())
}

fn print_result(result: &AnalysisResult) {
    match result {
        AnalysisResult::Bazi(chart) => {
            println!("{}", "四柱 Pillars".cyan());
            println!(
                "  {} {}  {} {}  {} {}  {} {}",
                "年".dimmed(),
                chart.bazi.year,
                "月".dimmed(),
                chart.bazi.month,
                "日".dimmed(),
                chart.bazi.day,
                "时".dimmed(),
                chart.bazi.hour
            );
            if !chart.wuxing.is_empty() {
                println!("{}", "五行 Elements".cyan());
                let counts: Vec<String> = chart
                    .wuxing
                    .iter()
                    .map(|(element, count)| format!("{element} {count}"))
                    .collect();
                println!("  {}", counts.join("  "));
            }
        }
        AnalysisResult::Ziwei(chart) => {
            println!("{}", "命盘 Palaces".cyan());
            for (name, palace) in chart.mingpan.iter() {
                let minors = if palace.minor_stars.is_empty() {
                    String::new()
                } else {
                    format!(" + {}", palace.minor_stars.join(" "))
                };
                println!(
                    "  {:<6} {}{} {}",
                    name,
                    palace.main_star.magenta(),
                    minors,
                    format!("[{}]", palace.position).dimmed()
                );
            }
        }
        AnalysisResult::Astrology(chart) => {
            println!(
                "  {} {}  {} {}  {} {}",
                "Sun".dimmed(),
                chart.sun_sign.yellow(),
                "Moon".dimmed(),
                chart.moon_sign,
                "Rising".dimmed(),
                chart.rising_sign
            );
            if !chart.planets.is_empty() {
                println!("{}", "Planets".cyan());
                for (planet, place) in chart.planets.iter() {
                    println!(
                        "  {:<10} {} {} {}",
                        planet,
                        place.sign,
                        place.house.dimmed(),
                        place.degree.dimmed()
                    );
                }
            }
            if !chart.houses.is_empty() {
                println!("{}", "Houses".cyan());
                for (house, meaning) in chart.houses.iter() {
                    println!("  {:<10} {}", house, meaning);
                }
            }
        }
    }

    for (title, text) in result.sections().iter() {
        println!();
        println!("{}", title.bold());
        println!("  {text}");
    }
}

async fn cmd_history(api: &HttpClient, id: i64, json: bool) -> Result<()> {
    let entries = api
        .analysis_history(id)
        .await
        .context("failed to load analysis history")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("{}", format!("No stored analyses for record {id}.").dimmed());
        return Ok(());
    }
    for entry in &entries {
        let status = match entry.result() {
            Ok(_) => "ok".green().to_string(),
            Err(_) => "unreadable".red().to_string(),
        };
        println!(
            "{:<6} {:<16} {:<22} {}",
            entry.id.to_string().cyan(),
            entry.analysis_type.label(),
            entry.created_at.as_deref().unwrap_or("-").dimmed(),
            status
        );
    }
    Ok(())
}

// -- Config --

fn cmd_config(config: &MingliConfig) -> Result<()> {
    println!("{}", "Effective configuration".bold());
    if std::env::var(API_URL_ENV).is_ok() {
        println!(
            "{}",
            format!("api.base_url overridden by {API_URL_ENV}").dimmed()
        );
    }
    if let Ok(path) = config.session_path() {
        println!("{} {}", "Session file:".dimmed(), path.display());
    }
    println!();
    print!(
        "{}",
        toml::to_string_pretty(config).context("failed to render configuration")?
    );
    Ok(())
}
