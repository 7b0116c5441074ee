//! `booking` CLI: check availability, take bookings and run admin tasks.
//!
//! State lives in two files: a TOML configuration (`--config`, built-in
//! defaults when omitted) and a JSON store of reservations, blocked slots and
//! subjects (`--store`, created on first write). Commands that change the
//! store hold an exclusive lock on `<store>.lock` for their whole run.
//!
//! ## Usage
//!
//! ```sh
//! # Free times per offered date, as JSON
//! booking availability
//!
//! # Is one slot still free?
//! booking check --date 2025-11-18 --time 09:00
//!
//! # Book it, writing both notifications as .eml files
//! booking book --date 2025-11-18 --time 09:00 --first-name Jane --last-name Doe \
//!     --organization Acme --email jane@example.com --subject Demo --outbox mail/
//!
//! # Admin tasks
//! booking blocked add --date 2025-11-19 --time 14:00
//! booking reservations export -o reservations.csv
//! booking --config booking.toml settings display hide
//!
//! # Escape text for an iCalendar TEXT value (stdin → stdout)
//! printf 'Room 4, east wing; floor 2' | booking escape
//! ```

mod outbox;
mod store_file;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use booking_engine::availability::SlotStatus;
use booking_engine::{
    escape_ics_text, AdminPanel, BookingConfig, BookingRequest, BookingService, Confirmation,
    DisplayMode, MailSettingsUpdate, Mailer, MemoryOutbox, MemoryStore, Slot,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::outbox::DirOutbox;

#[derive(Parser)]
#[command(
    name = "booking",
    version,
    about = "Appointment booking over a fixed offer of dates and times"
)]
struct Cli {
    /// Booking configuration (TOML); built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Reservation store (JSON), created on first write
    #[arg(short, long, global = true, default_value = "booking-store.json")]
    store: PathBuf,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print free times per offered date as JSON
    Availability,
    /// Tell whether one slot can still be booked
    Check {
        #[arg(long)]
        date: String,
        #[arg(long)]
        time: String,
    },
    /// Print the booking form data as JSON
    Form,
    /// Book a slot and send the notifications
    Book(BookArgs),
    /// List, delete or export reservations
    Reservations {
        #[command(subcommand)]
        action: ReservationAction,
    },
    /// Manage slots closed by the administrator
    Blocked {
        #[command(subcommand)]
        action: BlockedAction,
    },
    /// Manage the visit subjects offered on the form
    Subjects {
        #[command(subcommand)]
        action: SubjectAction,
    },
    /// Show or edit settings in the --config file
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Escape text for an iCalendar TEXT value
    Escape {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

#[derive(Args)]
struct BookArgs {
    #[arg(long)]
    date: String,
    #[arg(long)]
    time: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    organization: String,
    #[arg(long)]
    email: String,
    /// Visit subject; repeat for several
    #[arg(long = "subject")]
    subjects: Vec<String>,
    /// Subject text used when no --subject is given
    #[arg(long)]
    free_subject: Option<String>,
    /// Write notifications as .eml files into this directory
    #[arg(long)]
    outbox: Option<PathBuf>,
}

impl BookArgs {
    fn to_request(&self) -> BookingRequest {
        BookingRequest {
            date: self.date.clone(),
            time: self.time.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            organization: self.organization.clone(),
            email: self.email.clone(),
            subjects: self.subjects.clone(),
            free_subject: self.free_subject.clone(),
        }
    }
}

#[derive(Subcommand)]
enum ReservationAction {
    /// List reservations, latest slot first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Delete a reservation, freeing its slot
    Delete { id: u64 },
    /// Export every reservation as CSV
    Export {
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
enum BlockedAction {
    List,
    Add {
        #[arg(long)]
        date: String,
        #[arg(long)]
        time: String,
    },
    Delete { id: u64 },
}

#[derive(Subcommand)]
enum SubjectAction {
    List,
    Add { name: String },
    Delete { id: u64 },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the effective configuration as TOML
    Show,
    /// Show dates without a free time greyed out ("grey") or not at all ("hide")
    Display { mode: DisplayMode },
    /// Edit notification settings; an empty address clears the override
    Mail(MailArgs),
}

#[derive(Args)]
struct MailArgs {
    #[arg(long)]
    from_name: Option<String>,
    #[arg(long)]
    from_email: Option<String>,
    #[arg(long)]
    admin_email: Option<String>,
    #[arg(long)]
    client_subject: Option<String>,
    #[arg(long)]
    client_message: Option<String>,
    #[arg(long)]
    admin_subject: Option<String>,
    #[arg(long)]
    admin_message: Option<String>,
}

impl From<MailArgs> for MailSettingsUpdate {
    fn from(args: MailArgs) -> Self {
        MailSettingsUpdate {
            from_name: args.from_name,
            from_email: args.from_email,
            admin_email: args.admin_email,
            client_subject: args.client_subject,
            client_message: args.client_message,
            admin_subject: args.admin_subject,
            admin_message: args.admin_message,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Availability => {
            let service = open_service(cli.config.as_deref(), &cli.store)?;
            let map = service.availability_map()?;
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        Commands::Check { date, time } => {
            let service = open_service(cli.config.as_deref(), &cli.store)?;
            let slot = Slot::parse(&date, &time)?;
            let verdict = if !service.config().offers(&slot) {
                "not offered"
            } else {
                match service.occupancy()?.status(&slot) {
                    SlotStatus::Free => "available",
                    SlotStatus::Reserved => "reserved",
                    SlotStatus::Blocked => "blocked",
                }
            };
            println!("{slot}: {verdict}");
        }
        Commands::Form => {
            let service = open_service(cli.config.as_deref(), &cli.store)?;
            println!("{}", serde_json::to_string_pretty(&service.form_view()?)?);
        }
        Commands::Book(args) => {
            let config = load_config(cli.config.as_deref())?;
            let request = args.to_request();

            let confirmation = match &args.outbox {
                Some(dir) => {
                    let outbox = DirOutbox::create(dir)?;
                    let confirmation = book(config, &outbox, &request, &cli.store)?;
                    for path in outbox.written()? {
                        eprintln!("Wrote {}", path.display());
                    }
                    confirmation
                }
                None => book(config, MemoryOutbox::new(), &request, &cli.store)?,
            };

            let r = &confirmation.reservation;
            println!("{}", confirmation.message());
            println!("Reservation #{}: {}", r.id, r.slot);
            for kind in &confirmation.undelivered {
                eprintln!("Warning: {kind:?} notification was not sent");
            }
        }
        Commands::Reservations { action } => {
            let config = load_config(cli.config.as_deref())?;
            match action {
                ReservationAction::List { json } => {
                    let store = store_file::open(&cli.store)?;
                    let reservations = AdminPanel::new(&config, &store).reservations()?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&reservations)?);
                    } else {
                        for r in &reservations {
                            println!(
                                "{}\t{}\t{}\t{}\t{}\t{}",
                                r.id,
                                r.slot,
                                r.requester.full_name(),
                                r.requester.organization,
                                r.requester.email,
                                r.subjects_joined()
                            );
                        }
                        println!("Total: {}", reservations.len());
                    }
                }
                ReservationAction::Delete { id } => {
                    store_file::update(&cli.store, |store| {
                        Ok(AdminPanel::new(&config, store).delete_reservation(id)?)
                    })?;
                    println!("Deleted reservation {id}");
                }
                ReservationAction::Export { output } => {
                    let store = store_file::open(&cli.store)?;
                    let csv = AdminPanel::new(&config, &store).export_csv()?;
                    write_output(output.as_deref(), &csv)?;
                }
            }
        }
        Commands::Blocked { action } => {
            let config = load_config(cli.config.as_deref())?;
            match action {
                BlockedAction::List => {
                    let store = store_file::open(&cli.store)?;
                    for b in AdminPanel::new(&config, &store).blocked_slots()? {
                        println!("{}\t{}", b.id, b.slot);
                    }
                }
                BlockedAction::Add { date, time } => {
                    let slot = Slot::parse(&date, &time)?;
                    let blocked = store_file::update(&cli.store, |store| {
                        Ok(AdminPanel::new(&config, store).block_slot(slot)?)
                    })?;
                    println!("Blocked {} (id {})", blocked.slot, blocked.id);
                }
                BlockedAction::Delete { id } => {
                    store_file::update(&cli.store, |store| {
                        Ok(AdminPanel::new(&config, store).unblock_slot(id)?)
                    })?;
                    println!("Unblocked slot {id}");
                }
            }
        }
        Commands::Subjects { action } => {
            let config = load_config(cli.config.as_deref())?;
            match action {
                SubjectAction::List => {
                    let store = store_file::open(&cli.store)?;
                    for s in AdminPanel::new(&config, &store).subjects()? {
                        println!("{}\t{}", s.id, s.name);
                    }
                }
                SubjectAction::Add { name } => {
                    let subject = store_file::update(&cli.store, |store| {
                        Ok(AdminPanel::new(&config, store).add_subject(&name)?)
                    })?;
                    println!("Added subject {:?} (id {})", subject.name, subject.id);
                }
                SubjectAction::Delete { id } => {
                    store_file::update(&cli.store, |store| {
                        Ok(AdminPanel::new(&config, store).delete_subject(id)?)
                    })?;
                    println!("Deleted subject {id}");
                }
            }
        }
        Commands::Settings { action } => match action {
            SettingsAction::Show => {
                let config = load_config(cli.config.as_deref())?;
                print!("{}", config.to_toml_string()?);
            }
            SettingsAction::Display { mode } => {
                let path = settings_path(cli.config.as_deref())?;
                let mut config = load_config_for_update(path)?;
                config.set_display_mode(mode);
                save_config(&config, path)?;
                println!("Display mode set to {mode:?}");
            }
            SettingsAction::Mail(args) => {
                let path = settings_path(cli.config.as_deref())?;
                let mut config = load_config_for_update(path)?;
                config.mail.apply(args.into())?;
                save_config(&config, path)?;
                println!("Mail settings saved to {}", path.display());
            }
        },
        Commands::Escape { input } => {
            let text = read_input(input.as_deref())?;
            print!("{}", escape_ics_text(&text));
        }
    }

    Ok(())
}

/// `--verbose` wins over `RUST_LOG`; without either only warnings are shown.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn open_service(
    config: Option<&Path>,
    store: &Path,
) -> Result<BookingService<MemoryStore, MemoryOutbox>> {
    Ok(BookingService::new(
        load_config(config)?,
        store_file::open(store)?,
        MemoryOutbox::new(),
    ))
}

/// Submit through a service under the store lock; the store is saved only
/// when the booking is taken.
fn book<M: Mailer>(
    config: BookingConfig,
    mailer: M,
    request: &BookingRequest,
    store_path: &Path,
) -> Result<Confirmation> {
    store_file::update(store_path, |store| {
        let service = BookingService::new(config, store, mailer);
        service.submit(request).context("Booking rejected")
    })
}

fn load_config(path: Option<&Path>) -> Result<BookingConfig> {
    match path {
        Some(path) => BookingConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(BookingConfig::default()),
    }
}

/// Like [`load_config`], but a missing file starts from the defaults.
fn load_config_for_update(path: &Path) -> Result<BookingConfig> {
    if path.exists() {
        load_config(Some(path))
    } else {
        Ok(BookingConfig::default())
    }
}

fn settings_path(path: Option<&Path>) -> Result<&Path> {
    path.context("Settings edits are written to the --config file; pass --config FILE")
}

fn save_config(config: &BookingConfig, path: &Path) -> Result<()> {
    config.validate()?;
    store_file::write_atomic(path, &config.to_toml_string()?)
        .with_context(|| format!("Failed to write config: {}", path.display()))
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
