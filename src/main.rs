use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wedding_planner::{
    config::Config,
    controllers::{
        budget::BudgetField, dashboard::EventField, guests::rsvp_badge, money::format_amount,
        onboarding::{role_label, JOIN_ROLES},
        BUDGET_CATEGORIES,
    },
    db::{AssigneeKind, RsvpStatus, VendorStatus},
    error::AppError,
    notice::{Notice, NoticeLevel, Notifier},
    state::{Flow, MAIN_TABS},
    App,
};

#[derive(Parser)]
#[command(name = "planner")]
#[command(about = "Wedding planner client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the signed-in user, the active wedding and the current flow
    Status,

    /// Email a one-time sign-in code
    SignIn {
        #[arg(short, long)]
        email: String,
    },

    /// Exchange the emailed code for a session
    Verify {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        code: String,
    },

    /// Sign out and forget the active wedding
    SignOut,

    /// List the weddings you belong to
    Weddings,

    /// Create a wedding and make it active
    Create {
        #[arg(short, long, default_value = "Our Wedding")]
        title: String,
        /// DDMMYYYY
        #[arg(short, long, default_value = "")]
        date: String,
        #[arg(short, long, default_value = "")]
        venue: String,
    },

    /// Join a wedding with a shared code
    Join {
        #[arg(short, long)]
        wedding: String,
        /// One of the join roles, e.g. best_man
        #[arg(short, long, default_value = "bride_groom")]
        role: String,
        #[arg(short, long)]
        code: String,
    },

    /// Make one of your weddings active
    Open { wedding: String },

    /// List guests with their RSVP
    Guests,

    /// Add a guest
    GuestAdd {
        #[arg(short, long)]
        name: String,
        #[arg(short, long, default_value = "")]
        email: String,
        #[arg(short, long, default_value = "")]
        phone: String,
    },

    /// Record a guest's RSVP (yes, no, maybe)
    Rsvp { guest: String, status: RsvpStatus },

    /// List tasks
    Tasks,

    /// Add a task, optionally assigned to a guest, vendor, officiant or venue
    TaskAdd {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        kind: Option<AssigneeKind>,
        /// Id of the guest or vendor the task is assigned to
        #[arg(short, long)]
        assignee: Option<String>,
    },

    /// Flip a task between open and done
    TaskToggle { task: String },

    /// List vendors
    Vendors,

    /// Add a vendor
    VendorAdd {
        #[arg(short, long)]
        name: String,
        #[arg(short, long, default_value = "")]
        kind: String,
    },

    /// Set a vendor's status (researching, contacted, booked, paid)
    VendorStatus { vendor: String, status: VendorStatus },

    /// Show the budget
    Budget,

    /// Update one budget category
    BudgetSet {
        category: String,
        #[arg(long)]
        planned: Option<String>,
        #[arg(long)]
        actual: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
    },

    /// Show the upcoming event and budget totals
    Dashboard,

    /// Create or update the upcoming event
    EventSet {
        #[arg(short, long)]
        title: Option<String>,
        /// YYYY-MM-DD
        #[arg(short, long)]
        date: Option<String>,
        /// HH:MM
        #[arg(long)]
        time: Option<String>,
        #[arg(short, long)]
        location: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
}

/// Prints notices to stderr.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => eprintln!("{}: {}", notice.title, notice.message),
            _ => {
                tracing::warn!(title = %notice.title, "{}", notice.message);
                eprintln!("{}: {}", notice.title, notice.message);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wedding_planner=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::info!("🚀 Starting wedding planner v{}...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded");

    let app = App::connect(&config, Arc::new(ConsoleNotifier)).await?;
    if let Some(flow) = app.gate().ready().await {
        tracing::info!("🧭 Starting flow: {}", flow);
    }

    let result = run(&app, cli.command).await;
    app.shutdown();
    result
}

fn require_flow(app: &App, flow: Flow) -> Result<(), AppError> {
    match app.flow() {
        Some(current) if current == flow => Ok(()),
        Some(Flow::Auth) => Err(AppError::precondition("Signed out", "Run `planner sign-in` first.")),
        Some(Flow::Onboarding) if flow == Flow::Main => Err(AppError::precondition(
            "No wedding selected",
            "Create, join or open a wedding first.",
        )),
        _ => Ok(()),
    }
}

async fn run(app: &App, command: Commands) -> Result<(), AppError> {
    match command {
        Commands::Status => {
            let session = app.sessions().snapshot();
            match session.session {
                Some(session) => println!(
                    "user:    {} ({})",
                    session.user.email.as_deref().unwrap_or("-"),
                    session.user.id
                ),
                None => println!("user:    signed out"),
            }
            println!(
                "wedding: {}",
                app.wedding().current().as_deref().unwrap_or("none")
            );
            match app.flow() {
                Some(Flow::Main) => println!("flow:    main ({})", MAIN_TABS.join(", ")),
                Some(flow) => println!("flow:    {flow}"),
                None => println!("flow:    starting"),
            }
        }
        Commands::SignIn { email } => {
            app.sign_in().send_code(&email).await?;
        }
        Commands::Verify { email, code } => {
            let session = app.sign_in().verify(&email, &code).await?;
            println!("Signed in as {}", session.user.id);
        }
        Commands::SignOut => {
            app.sign_in().sign_out().await?;
            println!("Signed out");
        }
        Commands::Weddings => {
            require_flow(app, Flow::Onboarding)?;
            let mut onboarding = app.onboarding();
            onboarding.load().await?;
            let active = app.wedding().current();
            for summary in onboarding.weddings() {
                let marker = if active.as_deref() == Some(summary.wedding_id.as_str()) { "*" } else { " " };
                let (title, date) = match &summary.wedding {
                    Some(w) => (
                        w.title.as_str(),
                        w.date.map(|d| d.to_string()).unwrap_or_default(),
                    ),
                    None => ("(unavailable)", String::new()),
                };
                println!(
                    "{marker} {}  {title}  {date}  [{}]",
                    summary.wedding_id,
                    role_label(&summary.role)
                );
            }
        }
        Commands::Create { title, date, venue } => {
            require_flow(app, Flow::Onboarding)?;
            let mut onboarding = app.onboarding();
            onboarding.create_form.title = title;
            onboarding.create_form.date = date;
            onboarding.create_form.venue = venue;
            let wedding_id = onboarding.create().await?;
            println!("{wedding_id}");
        }
        Commands::Join { wedding, role, code } => {
            require_flow(app, Flow::Onboarding)?;
            if !JOIN_ROLES.iter().any(|(key, _)| *key == role) {
                let roles: Vec<_> = JOIN_ROLES.iter().map(|(key, _)| *key).collect();
                return Err(AppError::Validation(format!(
                    "Role must be one of: {}",
                    roles.join(", ")
                )));
            }
            let mut onboarding = app.onboarding();
            onboarding.join_form.wedding_id = wedding;
            onboarding.join_form.role = role;
            onboarding.join_form.code = code;
            onboarding.join().await?;
        }
        Commands::Open { wedding } => {
            require_flow(app, Flow::Onboarding)?;
            let mut onboarding = app.onboarding();
            onboarding.load().await?;
            onboarding.open(&wedding).await?;
        }
        Commands::Guests => {
            require_flow(app, Flow::Main)?;
            let mut guests = app.guests();
            guests.load().await?;
            for guest in guests.guests() {
                println!(
                    "{}  {:<24} {:<28} {}",
                    guest.id,
                    guest.name,
                    guest.email.as_deref().unwrap_or("-"),
                    rsvp_badge(guest.rsvp_status)
                );
            }
        }
        Commands::GuestAdd { name, email, phone } => {
            require_flow(app, Flow::Main)?;
            let mut guests = app.guests();
            let form = guests.form_mut();
            form.name = name;
            form.email = email;
            form.phone = phone;
            guests.submit().await?;
        }
        Commands::Rsvp { guest, status } => {
            require_flow(app, Flow::Main)?;
            app.guests().set_rsvp(&guest, status).await?;
        }
        Commands::Tasks => {
            require_flow(app, Flow::Main)?;
            let mut tasks = app.tasks();
            tasks.load().await?;
            for task in tasks.tasks() {
                let done = if task.completed { "x" } else { " " };
                let assignee = tasks
                    .assignee_label(task)
                    .map(|label| format!("  -> {label}"))
                    .unwrap_or_default();
                println!("[{done}] {}  {}{assignee}", task.id, task.title);
            }
        }
        Commands::TaskAdd {
            title,
            kind,
            assignee,
        } => {
            require_flow(app, Flow::Main)?;
            let mut tasks = app.tasks();
            tasks.load().await?;
            tasks.set_title(title);
            tasks.select_kind(kind);
            if let Some(assignee) = assignee {
                if !tasks.choose_assignee(&assignee) {
                    return Err(AppError::Validation(format!(
                        "{assignee} is not a valid assignee for that kind"
                    )));
                }
            }
            tasks.add().await?;
        }
        Commands::TaskToggle { task } => {
            require_flow(app, Flow::Main)?;
            let mut tasks = app.tasks();
            tasks.load().await?;
            tasks.toggle_complete(&task).await?;
        }
        Commands::Vendors => {
            require_flow(app, Flow::Main)?;
            let mut vendors = app.vendors();
            vendors.load().await?;
            for vendor in vendors.vendors() {
                println!(
                    "{}  {:<24} {:<16} {}",
                    vendor.id,
                    vendor.name,
                    vendor.kind.as_deref().unwrap_or("-"),
                    vendor.status.label()
                );
            }
        }
        Commands::VendorAdd { name, kind } => {
            require_flow(app, Flow::Main)?;
            let mut vendors = app.vendors();
            vendors.form_mut().name = name;
            vendors.form_mut().kind = kind;
            vendors.add().await?;
        }
        Commands::VendorStatus { vendor, status } => {
            require_flow(app, Flow::Main)?;
            app.vendors().set_status(&vendor, status).await?;
        }
        Commands::Budget => {
            require_flow(app, Flow::Main)?;
            let mut budget = app.budget();
            budget.load().await?;
            for category in BUDGET_CATEGORIES {
                println!(
                    "{:<24} planned {:<16} actual {}",
                    category,
                    budget.planned_label(category),
                    budget.actual_label(category)
                );
            }
            println!(
                "{:<24} planned {:<16} actual {}",
                "Total",
                format_amount(Some(budget.total_planned())),
                format_amount(Some(budget.total_actual()))
            );
        }
        Commands::BudgetSet {
            category,
            planned,
            actual,
            notes,
            due,
        } => {
            require_flow(app, Flow::Main)?;
            let mut budget = app.budget();
            budget.load().await?;
            budget.start_edit();
            let fields = [
                (BudgetField::Planned, planned),
                (BudgetField::Actual, actual),
                (BudgetField::Notes, notes),
                (BudgetField::DueDate, due),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    if !budget.set_field(&category, field, &value) {
                        return Err(AppError::Validation(format!(
                            "Category must be one of: {}",
                            BUDGET_CATEGORIES.join(", ")
                        )));
                    }
                }
            }
            budget.save().await?;
        }
        Commands::Dashboard => {
            require_flow(app, Flow::Main)?;
            let mut dashboard = app.dashboard();
            dashboard.load().await?;
            match dashboard.event.upcoming() {
                Some(event) => println!(
                    "Next: {} at {}{}",
                    event.title,
                    event.starts_at.format("%Y-%m-%d %H:%M UTC"),
                    event
                        .location
                        .as_deref()
                        .map(|l| format!(", {l}"))
                        .unwrap_or_default()
                ),
                None => println!("No upcoming event"),
            }
            let (planned, actual) = dashboard.budget_totals();
            println!(
                "Budget: {} planned, {} spent",
                format_amount(Some(planned)),
                format_amount(Some(actual))
            );
        }
        Commands::EventSet {
            title,
            date,
            time,
            location,
            notes,
        } => {
            require_flow(app, Flow::Main)?;
            let mut dashboard = app.dashboard();
            dashboard.load().await?;
            dashboard.event.start_edit();
            let fields = [
                (EventField::Title, title),
                (EventField::Date, date),
                (EventField::Time, time),
                (EventField::Location, location),
                (EventField::Notes, notes),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    dashboard.event.set_field(field, &value);
                }
            }
            dashboard.event.save().await?;
        }
    }
    Ok(())
}
