use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use cinema_client::{
    filter::ScreeningFilter,
    validation::{ProgramForm, ReviewForm, ScreeningForm},
    view::{ProgramDetails, ScreeningRow},
    AdvanceOutcome, CinemaBackend, CinemaClient, ClientError, ProgramBoard, ScreeningDesk,
    SessionFile,
};
use cinema_shared::{
    domain::{ProgramId, ScreeningId},
    protocol::ScreeningSearchRequest,
};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::Settings;

#[derive(Parser, Debug)]
#[command(name = "cinema", about = "Client for the cinema program workflow backend")]
struct Cli {
    /// Backend base URL, e.g. http://localhost:8080/api
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in; the session is kept for later commands.
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    #[command(subcommand)]
    Programs(ProgramCommand),
    #[command(subcommand)]
    Screenings(ScreeningCommand),
}

#[derive(Subcommand, Debug)]
enum ProgramCommand {
    List,
    Show {
        id: i64,
    },
    Search {
        #[arg(long)]
        name: Option<String>,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        start_date: String,
        #[arg(long)]
        end_date: String,
    },
    /// Move the program to the next state.
    Advance {
        id: i64,
    },
    AddStaff {
        id: i64,
        username: String,
    },
    AddProgrammer {
        id: i64,
        username: String,
    },
}

#[derive(Args, Debug)]
struct ScreeningRef {
    program: i64,
    screening: i64,
}

impl ScreeningRef {
    fn ids(&self) -> (ProgramId, ScreeningId) {
        (ProgramId(self.program), ScreeningId(self.screening))
    }
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    cast: Option<String>,
    #[arg(long)]
    genre: Option<String>,
    /// First day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl FilterArgs {
    fn local(&self) -> ScreeningFilter {
        ScreeningFilter {
            title: self.title.clone(),
            cast: self.cast.clone(),
            genre: self.genre.clone(),
            from: self.from,
            to: self.to,
        }
    }

    fn remote(&self) -> ScreeningSearchRequest {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        ScreeningSearchRequest {
            film_title: text(&self.title),
            cast: text(&self.cast),
            genre: text(&self.genre),
            date_from: self.from,
            date_to: self.to,
        }
    }
}

#[derive(Args, Debug, Default)]
struct ScreeningFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    cast: Option<String>,
    #[arg(long)]
    genres: Option<String>,
    #[arg(long)]
    auditorium: Option<String>,
    /// Start time, e.g. 2025-05-01T18:00
    #[arg(long)]
    start: Option<String>,
    /// Duration in minutes
    #[arg(long, allow_hyphen_values = true)]
    duration: Option<String>,
    /// End time, e.g. 2025-05-01T20:00
    #[arg(long)]
    end: Option<String>,
}

impl ScreeningFields {
    /// Fields given on the command line replace those in `form`.
    fn merge_into(self, mut form: ScreeningForm) -> ScreeningForm {
        let pairs = [
            (self.title, &mut form.title),
            (self.cast, &mut form.cast),
            (self.genres, &mut form.genres),
            (self.auditorium, &mut form.auditorium),
            (self.start, &mut form.start),
            (self.duration, &mut form.duration),
            (self.end, &mut form.end),
        ];
        for (value, slot) in pairs {
            if let Some(value) = value {
                *slot = value;
            }
        }
        form
    }
}

#[derive(Subcommand, Debug)]
enum ScreeningCommand {
    List {
        program: i64,
        #[command(flatten)]
        filter: FilterArgs,
        /// Only screenings handled by the logged-in user
        #[arg(long)]
        mine: bool,
    },
    Show(ScreeningRef),
    /// Search on the server instead of filtering locally.
    Search {
        program: i64,
        #[command(flatten)]
        filter: FilterArgs,
    },
    Create {
        program: i64,
        #[command(flatten)]
        fields: ScreeningFields,
    },
    Update {
        #[command(flatten)]
        target: ScreeningRef,
        #[command(flatten)]
        fields: ScreeningFields,
    },
    Withdraw(ScreeningRef),
    Submit(ScreeningRef),
    AssignHandler {
        #[command(flatten)]
        target: ScreeningRef,
        username: String,
    },
    Review {
        #[command(flatten)]
        target: ScreeningRef,
        #[arg(long, allow_hyphen_values = true)]
        score: String,
        #[arg(long)]
        comments: String,
    },
    Approve {
        #[command(flatten)]
        target: ScreeningRef,
        #[arg(long, default_value = "")]
        notes: String,
    },
    Reject {
        #[command(flatten)]
        target: ScreeningRef,
        #[arg(long)]
        reason: String,
    },
    FinalSubmit(ScreeningRef),
    Accept(ScreeningRef),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config::LoadedSettings {
        mut settings,
        warnings,
    } = config::load_settings();
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }
    if let Some(session_file) = cli.session_file {
        settings.session_file = session_file;
    }
    init_tracing(&settings.log_filter);
    for warning in &warnings {
        warn!("config: {warning}");
    }
    debug!(base_url = %settings.base_url, session_file = %settings.session_file.display(), "cli: settings loaded");

    match run(cli.command, &settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", describe(&err));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Server rejections are printed exactly as the server worded them.
fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ClientError>() {
        Some(client_err) if client_err.requires_reauth() => {
            format!("{} (try `cinema login`)", client_err.user_message())
        }
        Some(client_err) => client_err.user_message(),
        None => format!("{err:#}"),
    }
}

/// Persists the new session. A rejected login also drops the saved one; input
/// that never left the client leaves it alone.
async fn login(
    client: &CinemaClient,
    session_file: &SessionFile,
    username: &str,
    password: &str,
) -> Result<String> {
    if let Err(err) = client.login(username, password).await {
        if !err.is_local() {
            session_file.clear()?;
        }
        return Err(err.into());
    }
    let session = client
        .session()
        .await
        .context("login succeeded without a session")?;
    session_file.save(&session)?;
    Ok(session.username)
}

async fn run(command: Command, settings: &Settings) -> Result<()> {
    let client = Arc::new(
        CinemaClient::with_timeout(&settings.base_url, settings.timeout())
            .context("failed to build http client")?,
    );
    let session_file = SessionFile::new(&settings.session_file);
    match session_file.load() {
        Ok(Some(session)) => client.restore_session(session).await,
        Ok(None) => {}
        Err(err) => warn!(error = %err, "session: ignoring saved session"),
    }
    let backend: Arc<dyn CinemaBackend> = client.clone();

    match command {
        Command::Login { username, password } => {
            let username = login(&client, &session_file, &username, &password).await?;
            println!("Logged in as {username}");
        }
        Command::Logout => {
            client.logout().await;
            session_file.clear()?;
            println!("Logged out");
        }
        Command::Whoami => match client.session_username().await {
            Some(username) => println!("Logged in as {username} ({})", client.base_url()),
            None => println!("Not logged in"),
        },
        Command::Programs(command) => run_program_command(command, backend).await?,
        Command::Screenings(command) => run_screening_command(command, backend).await?,
    }
    Ok(())
}

async fn run_program_command(command: ProgramCommand, backend: Arc<dyn CinemaBackend>) -> Result<()> {
    let mut board = ProgramBoard::new(backend);
    match command {
        ProgramCommand::List => {
            board.load_programs().await?;
            print!("{}", render::program_table(&board.rows()));
        }
        ProgramCommand::Show { id } => {
            board.select_program(ProgramId(id)).await?;
            print_selected_program(&board);
            print!("{}", render::screening_table(&board.screening_rows()));
        }
        ProgramCommand::Search { name } => {
            board.search_programs(name.as_deref().unwrap_or_default()).await?;
            print!("{}", render::program_table(&board.rows()));
        }
        ProgramCommand::Create {
            name,
            description,
            start_date,
            end_date,
        } => {
            let form = ProgramForm {
                name,
                description,
                start_date,
                end_date,
            };
            let program = board.create_program(&form).await?;
            println!("Created program #{}", program.id);
            print!("{}", render::program_table(&board.rows()));
        }
        ProgramCommand::Advance { id } => match board.advance(ProgramId(id)).await? {
            AdvanceOutcome::Advanced(program) => {
                println!("Program #{} is now {}", program.id, program.state);
            }
            AdvanceOutcome::AlreadyFinal => {
                println!("Program #{id} is already final (ANNOUNCED); nothing to do");
            }
        },
        ProgramCommand::AddStaff { id, username } => {
            board.select_program(ProgramId(id)).await?;
            board.add_staff(&username).await?;
            print_selected_program(&board);
        }
        ProgramCommand::AddProgrammer { id, username } => {
            board.select_program(ProgramId(id)).await?;
            board.add_programmer(&username).await?;
            print_selected_program(&board);
        }
    }
    Ok(())
}

fn print_selected_program(board: &ProgramBoard) {
    if let Some(details) = board.details() {
        print!("{}", render::program_details(&details));
    }
}

async fn run_screening_command(
    command: ScreeningCommand,
    backend: Arc<dyn CinemaBackend>,
) -> Result<()> {
    let mut board = ProgramBoard::new(backend.clone());
    let mut desk = ScreeningDesk::new(backend);

    match command {
        ScreeningCommand::List {
            program,
            filter,
            mine,
        } => {
            board.select_program(ProgramId(program)).await?;
            let rows: Vec<ScreeningRow> = if mine {
                board.my_assigned().await.iter().map(ScreeningRow::from).collect()
            } else {
                board
                    .apply_filter(filter.local())
                    .iter()
                    .map(ScreeningRow::from)
                    .collect()
            };
            print!("{}", render::screening_table(&rows));
        }
        ScreeningCommand::Search { program, filter } => {
            board.select_program(ProgramId(program)).await?;
            let found = board.search_screenings(&filter.remote()).await?;
            let rows: Vec<ScreeningRow> = found.iter().map(ScreeningRow::from).collect();
            print!("{}", render::screening_table(&rows));
        }
        ScreeningCommand::Create { program, fields } => {
            board.select_program(ProgramId(program)).await?;
            let form = fields.merge_into(ScreeningForm::default());
            let screening = board.create_screening(&form).await?;
            println!("Created screening #{}", screening.id);
            print!("{}", render::screening_table(&board.screening_rows()));
        }
        ScreeningCommand::Withdraw(target) => {
            let (program_id, screening_id) = target.ids();
            board.select_program(program_id).await?;
            board.withdraw(screening_id).await?;
            println!("Withdrew screening #{screening_id}");
            print!("{}", render::screening_table(&board.screening_rows()));
        }
        ScreeningCommand::Submit(target) => {
            let (program_id, screening_id) = target.ids();
            board.select_program(program_id).await?;
            board.submit(screening_id).await?;
            println!("Submitted screening #{screening_id}");
            print!("{}", render::screening_table(&board.screening_rows()));
        }
        ScreeningCommand::Show(target) => {
            load(&mut desk, &target).await?;
            print_screening(&desk).await?;
        }
        ScreeningCommand::Update { target, fields } => {
            load(&mut desk, &target).await?;
            let current = desk
                .screening()
                .map(ScreeningForm::from_screening)
                .unwrap_or_default();
            desk.update(&fields.merge_into(current)).await?;
            print_screening(&desk).await?;
        }
        ScreeningCommand::AssignHandler { target, username } => {
            load(&mut desk, &target).await?;
            desk.assign_handler(&username).await?;
            print_screening(&desk).await?;
        }
        ScreeningCommand::Review {
            target,
            score,
            comments,
        } => {
            load(&mut desk, &target).await?;
            desk.review(&ReviewForm::new(score, comments)).await?;
            print_screening(&desk).await?;
        }
        ScreeningCommand::Approve { target, notes } => {
            load(&mut desk, &target).await?;
            desk.approve(&notes).await?;
            print_screening(&desk).await?;
        }
        ScreeningCommand::Reject { target, reason } => {
            load(&mut desk, &target).await?;
            desk.reject(&reason).await?;
            print_screening(&desk).await?;
        }
        ScreeningCommand::FinalSubmit(target) => {
            load(&mut desk, &target).await?;
            desk.final_submit().await?;
            print_screening(&desk).await?;
        }
        ScreeningCommand::Accept(target) => {
            load(&mut desk, &target).await?;
            desk.accept().await?;
            print_screening(&desk).await?;
        }
    }
    Ok(())
}

async fn load(desk: &mut ScreeningDesk, target: &ScreeningRef) -> Result<()> {
    let (program_id, screening_id) = target.ids();
    desk.load(program_id, screening_id).await?;
    Ok(())
}

async fn print_screening(desk: &ScreeningDesk) -> Result<()> {
    let details = desk.details().await?;
    if let Some(program) = desk.program() {
        println!(
            "{} [{}]",
            program.name,
            ProgramDetails::from(program).advance_label
        );
    }
    print!("{}", render::screening_details(&details));
    Ok(())
}
