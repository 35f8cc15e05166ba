//! CGM Treatment Guide
//!
//! Looks up what to do for a CGM trend arrow and glucose reading, using a
//! protocol table the caregiver customizes to match the physician's plan.
//!
//! Usage:
//!   carbguide                          - Show status
//!   carbguide recommend <trend> <bg>   - Get a recommendation
//!   carbguide help                     - Show help
//!   CARBGUIDE_DBG=1 carbguide ...      - Enable debug output

use std::env;

use log::{info, warn};

use carbguide::config::{config_file_path, default_database_path, ensure_data_dir, get_data_dir, Config};
use carbguide::gate::DEFAULTS_WARNING;
use carbguide::storage::{KvStore, MemoryStore, SqliteStore, ALL_KEYS};
use carbguide::{CalcError, ContactField, Session, TrendDirection};

fn main() -> Result<(), CalcError> {
    let mut args: Vec<String> = env::args().skip(1).collect();

    // Check for debug mode
    if env::var("CARBGUIDE_DBG").is_ok() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp(None)
            .init();
    }

    let ephemeral = take_flag(&mut args, "--ephemeral");

    match args.first().map(|s| s.as_str()) {
        Some("--help") | Some("-h") | Some("help") => {
            print_help();
            return Ok(());
        }
        Some("--version") | Some("-V") => {
            println!("carbguide {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some("path") | Some("paths") => {
            cmd_show_paths();
            return Ok(());
        }
        _ => {}
    }

    let store = open_store(ephemeral);
    let mut session = Session::load(store);
    let rest: Vec<&str> = args.iter().skip(1).map(|s| s.as_str()).collect();

    match args.first().map(|s| s.as_str()) {
        None | Some("status") => cmd_status(&session),
        Some("recommend") | Some("rec") => cmd_recommend(&session, &rest)?,
        Some("table") => cmd_table(&session),
        Some("edit") => cmd_edit(&mut session, &rest)?,
        Some("toggle") => cmd_toggle(&mut session, &rest)?,
        Some("reset") => {
            session.reset_to_defaults();
            eprintln!("Protocol reset to defaults.");
            if session.is_customized() {
                eprintln!("Note: the protocol is still marked as customized.");
            }
        }
        Some("save") | Some("confirm") => {
            session.confirm_protocol();
            eprintln!("Protocol saved.");
        }
        Some("contacts") => match rest.first().copied() {
            None => cmd_contacts(&session),
            Some("save") => {
                session.confirm_contacts(session.contacts().clone());
                eprintln!("Contacts saved.");
            }
            Some(other) => {
                return Err(CalcError::Usage(format!("unknown contacts action: {}", other)));
            }
        },
        Some("contact") => cmd_contact(&mut session, &rest)?,
        Some("name") => {
            let name = rest.join(" ");
            session.set_name(&name);
            eprintln!("Name set to {:?}", session.name());
        }
        Some(other) => {
            return Err(CalcError::Usage(format!("unknown command: {} (try `carbguide help`)", other)));
        }
    }

    Ok(())
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != flag);
    args.len() != before
}

/// Open the on-disk store, falling back to memory when it is unavailable
fn open_store(ephemeral: bool) -> Box<dyn KvStore> {
    if ephemeral {
        info!("Using in-memory store");
        return Box::new(MemoryStore::new());
    }

    if let Err(e) = ensure_data_dir() {
        warn!("Could not create data directory: {}", e);
    }

    // Create default config if it doesn't exist
    let cfg_path = config_file_path();
    if !cfg_path.exists() {
        if let Err(e) = Config::create_default(&cfg_path) {
            warn!("Could not create default config: {}", e);
        }
    }

    let config = Config::load(&cfg_path).unwrap_or_else(|e| {
        warn!("Could not load config: {}. Using defaults.", e);
        Config::default()
    });

    let db_path = env::var("CARBGUIDE_DB")
        .ok()
        .or(config.database_path)
        .unwrap_or_else(|| default_database_path().to_string_lossy().to_string());

    match SqliteStore::new(&db_path) {
        Ok(store) => {
            info!("Using store at {}", db_path);
            Box::new(store)
        }
        Err(e) => {
            let err = CalcError::PersistenceUnavailable(format!("{}: {}", db_path, e));
            warn!("{}. Changes will not be kept.", err);
            Box::new(MemoryStore::new())
        }
    }
}

fn cmd_show_paths() {
    println!("Treatment Guide Data Paths:");
    println!("  Data directory:  {}", get_data_dir().display());
    println!("  Database:        {}", default_database_path().display());
    println!("  Config file:     {}", config_file_path().display());
}

fn cmd_status(session: &Session) {
    if session.should_warn() {
        eprintln!("⚠  Using Default Settings");
        eprintln!("{}", DEFAULTS_WARNING);
        eprintln!();
    }

    let name = if session.name().is_empty() { "(unnamed)" } else { session.name() };
    println!("Treatment guide for {}", name);
    println!(
        "  Protocol:  {}",
        if session.is_customized() { "customized" } else { "defaults, not yet reviewed" }
    );
    if !session.contacts().has_any_contact() {
        println!("  Contacts:  none yet (add physician & school nurse contacts)");
    }
    for key in ALL_KEYS {
        if let Ok(Some(when)) = session.store().updated_at(key) {
            println!("  {:<10} saved {}", format!("{}:", key), when);
        }
    }
}

fn parse_trend(arg: Option<&&str>) -> Result<TrendDirection, CalcError> {
    arg.ok_or_else(|| CalcError::Usage("missing trend (e.g. flat, double-down)".to_string()))?
        .parse()
}

fn parse_band(arg: Option<&&str>, session: &Session) -> Result<usize, CalcError> {
    let raw = arg.ok_or_else(|| CalcError::Usage("missing band index or id".to_string()))?;
    if let Ok(index) = raw.parse::<usize>() {
        return Ok(index);
    }
    session
        .table()
        .bands()
        .iter()
        .position(|b| b.id == *raw || b.label == *raw)
        .ok_or_else(|| CalcError::Usage(format!("unknown band: {}", raw)))
}

fn cmd_recommend(session: &Session, args: &[&str]) -> Result<(), CalcError> {
    let trend = parse_trend(args.first())?;
    let reading = args.get(1).copied().unwrap_or("");

    match session.get_recommendation(Some(trend), reading) {
        Some(rec) => {
            let action = rec.action();
            println!("{} · {} mg/dL ({})", trend, rec.reading.0, rec.band.format_range());
            println!("  {}", action.main);
            println!("  {}", action.sub);
            println!("  Urgency: {}", rec.urgency);
            if session.should_warn() {
                eprintln!("⚠  Default protocol. Customize it with your care team before relying on it.");
            }
        }
        None => {
            eprintln!("Enter a positive whole-number reading to get a recommendation.");
        }
    }
    Ok(())
}

fn cmd_table(session: &Session) {
    let table = session.table();
    print!("{:<16}", "");
    for (i, band) in table.bands().iter().enumerate() {
        print!("{:>9}", format!("[{}]{}", i, band.label));
    }
    println!();

    for trend in TrendDirection::ALL {
        print!("{:<16}", trend.to_string());
        for cell in table.row(trend) {
            let marks = format!(
                "{}{}",
                if cell.finger_poke { "*" } else { "" },
                if cell.retest { "+" } else { "" }
            );
            print!("{:>9}", format!("{}{}", cell.carbs, marks));
        }
        println!();
    }
    println!();
    println!("* finger poke   + retest   Obs = observe & recheck   Pump = check insulin pump");
}

fn cmd_edit(session: &mut Session, args: &[&str]) -> Result<(), CalcError> {
    let trend = parse_trend(args.first())?;
    let band = parse_band(args.get(1), session)?;
    let input = args.get(2..).map(|v| v.join(" ")).unwrap_or_default();

    let previous = session.table().cell(trend, band).map(|c| c.carbs.edit_text());
    let value = session.edit_cell(trend, band, &input)?;
    match previous {
        Some(prev) if !prev.is_empty() => eprintln!("{} / band {} set to {} (was {})", trend, band, value, prev),
        _ => eprintln!("{} / band {} set to {}", trend, band, value),
    }
    if !session.is_customized() {
        eprintln!("Run `carbguide save` when the protocol matches the care plan.");
    }
    Ok(())
}

fn cmd_toggle(session: &mut Session, args: &[&str]) -> Result<(), CalcError> {
    let which = args
        .first()
        .copied()
        .ok_or_else(|| CalcError::Usage("toggle what? poke or retest".to_string()))?;
    let trend = parse_trend(args.get(1))?;
    let band = parse_band(args.get(2), session)?;
    let on = match args.get(3).copied() {
        Some("on") | Some("yes") | Some("true") => true,
        Some("off") | Some("no") | Some("false") => false,
        _ => return Err(CalcError::Usage("expected on or off".to_string())),
    };

    match which {
        "poke" | "finger-poke" => session.set_finger_poke(trend, band, on)?,
        "retest" => session.set_retest(trend, band, on)?,
        other => return Err(CalcError::Usage(format!("unknown flag: {}", other))),
    }
    eprintln!("{} {} / band {}: {}", which, trend, band, if on { "on" } else { "off" });
    Ok(())
}

fn cmd_contacts(session: &Session) {
    let book = session.contacts();
    for field in ContactField::ALL {
        let value = book.get(field);
        if !value.is_empty() {
            println!("{:<20} {}", field.key(), value);
        }
    }
    if !book.has_any_contact() {
        println!("No physician or school nurse contacts yet.");
    }
}

/// Edit one contact field; `contacts save` confirms the sheet
fn cmd_contact(session: &mut Session, args: &[&str]) -> Result<(), CalcError> {
    let field: ContactField = args
        .first()
        .ok_or_else(|| CalcError::Usage("missing contact field (e.g. physician.phone)".to_string()))?
        .parse()?;
    let value = args.get(1..).map(|v| v.join(" ")).unwrap_or_default();

    session.set_contact_field(field, &value);
    eprintln!("{} set.", field.key());
    if !session.is_customized() {
        eprintln!("Run `carbguide contacts save` when the contact sheet is complete.");
    }
    Ok(())
}

fn print_help() {
    eprintln!("CGM Treatment Guide v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  carbguide [--ephemeral] <command>");
    eprintln!();
    eprintln!("COMMANDS:");
    eprintln!("  status                              Show customization status (default)");
    eprintln!("  recommend <trend> <mg/dL>           What to do for this arrow and reading");
    eprintln!("  table                               Show the protocol table");
    eprintln!("  edit <trend> <band> <value>         Set a cell: grams, obs, pump or blank");
    eprintln!("  toggle <poke|retest> <trend> <band> <on|off>");
    eprintln!("  reset                               Restore the default protocol");
    eprintln!("  save                                Mark the protocol as reviewed");
    eprintln!("  contacts                            Show care-team contacts");
    eprintln!("  contacts save                       Mark the contact sheet as reviewed");
    eprintln!("  contact <field> <value>             Set a contact field");
    eprintln!("  name <name>                         Set the display name");
    eprintln!("  path                                Show data file locations");
    eprintln!("  help                                Show this help");
    eprintln!();
    eprintln!("TRENDS:");
    for trend in TrendDirection::ALL {
        eprintln!("  {:<14} {:<3} {}", trend.cli_name(), trend.symbol(), trend.description());
    }
    eprintln!();
    eprintln!("ENVIRONMENT:");
    eprintln!("  CARBGUIDE_DBG=1                     Enable debug output");
    eprintln!("  CARBGUIDE_DB=<path>                 Use this database file");
    eprintln!();
    eprintln!("DATA LOCATIONS:");
    eprintln!("  Database:  {}", default_database_path().display());
    eprintln!("  Config:    {}", config_file_path().display());
}
