use achot::config::AppConfig;
use achot::draft::ConfirmChoice;
use achot::format::{format_nonzero, format_number};
use achot::gateway::{JsonFileGateway, ReportGroup};
use achot::row::{Field, calculate_itog};
use achot::session::{ExportKind, NoticeKind, Outcome, ReportSession};
use achot::storage::FileStore;
use chrono::NaiveDate;
use std::env;
use std::io::{self, Write};
use std::time::Instant;

fn display(session: &ReportSession<FileStore>) {
    let title = if session.report_name().is_empty() {
        "(nomsiz)"
    } else {
        session.report_name()
    };
    let marker = if session.has_unsaved_changes() { " *" } else { "" };
    println!("{} | {}{}", title, session.report_date(), marker);

    print!("{:>4} {:<24}", "N", Field::Sabablar.caption());
    for field in Field::NUMERIC {
        print!(" {:>12}", field.caption());
    }
    println!(" {:>12}", "ITOG");

    let selection = session.grid().selection();
    for (i, row) in session.rows().iter().enumerate() {
        let mark = if selection.contains(&i) { '>' } else { ' ' };
        print!("{}{:>3} {:<24}", mark, i + 1, row.sabablar);
        for field in Field::NUMERIC {
            print!(" {:>12}", format_number(row.amount(field).map(|a| a.as_str())));
        }
        println!(" {:>12}", format_number(calculate_itog(row)));
    }

    let totals = session.totals();
    print!("{:>4} {:<24}", totals.row_count, "JAMI");
    for field in Field::NUMERIC {
        print!(" {:>12}", format_nonzero(totals.column(field)));
    }
    println!(" {:>12}", format_number(totals.itog));
}

fn print_help() {
    println!("Commands:");
    println!("  q: Quit (an unsaved draft is kept for next time)");
    println!("  <row> <field>=<value>: Edit a cell, e.g. 1 tovar=1000 or 2 sabablar=Un");
    println!("  name <text> / date <YYYY-MM-DD>: Report name and date");
    println!("  add [n]: Append n empty rows (default 1)");
    println!("  del <row>: Delete a row");
    println!("  sel <row> / selall / delsel: Select rows and delete the selection");
    println!("  save: Save the report");
    println!("  list [query]: List saved reports");
    println!("  load <n> / rm <n>: Load or delete the n-th report of the last list");
    println!("  new: Start a new report");
    println!("  save_first / discard / cancel: Answer an unsaved-changes prompt");
    println!("  export <pdf|xlsx|csv>: Write the report to the current directory");
    println!("  theme: Toggle light/dark");
    println!("  disable_output / enable_output: Toggle table display");
}

fn parse_row(arg: &str, len: usize) -> Option<usize> {
    let n: usize = arg.trim().parse().ok()?;
    (n >= 1 && n <= len).then(|| n - 1)
}

fn outcome_status(outcome: Outcome) -> String {
    match outcome {
        Outcome::Done => "ok".to_string(),
        Outcome::NeedsConfirmation => "unsaved changes: save_first, discard or cancel".to_string(),
        Outcome::Cancelled => "cancelled".to_string(),
        Outcome::Failed => "failed".to_string(),
        Outcome::SignedOut => "signed out".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = AppConfig::from_env().with_args(&args);
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        eprintln!("Usage: achot [database_dir] [user]");
        return Ok(());
    }
    let Some(database_dir) = &config.database_dir else {
        return Ok(());
    };

    let gateway = JsonFileGateway::open(database_dir)?;
    let store = FileStore::open(&config.draft_file)?;
    let mut session = ReportSession::open(store, &config.user)?;
    if session.has_unsaved_changes() {
        println!("Restored unsaved draft.");
    }

    let mut listed: Vec<ReportGroup> = Vec::new();
    let mut start_time = Instant::now();
    let mut status = String::from("ok");
    let mut show = true;
    loop {
        if show {
            display(&session);
        }
        for notice in session.take_notices() {
            let tag = match notice.kind {
                NoticeKind::Success => "+",
                NoticeKind::Error => "!",
            };
            println!("[{}] {}", tag, notice.message);
        }

        print!("[{:.1}] ({}) > ", start_time.elapsed().as_secs_f64(), status);
        io::stdout().flush()?;

        let mut command = String::new();
        if io::stdin().read_line(&mut command)? == 0 {
            break;
        }
        let command = command.trim();
        start_time = Instant::now();

        let (verb, rest) = match command.split_once(' ') {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (command, ""),
        };

        status = String::from("ok");
        match verb {
            "" => status = String::from("invalid command"),
            "help" => print_help(),
            "q" => break,
            "disable_output" => show = false,
            "enable_output" => show = true,
            "name" => session.set_report_name(rest),
            "date" => match NaiveDate::parse_from_str(rest, "%Y-%m-%d") {
                Ok(date) => session.set_report_date(date),
                Err(_) => status = String::from("invalid date"),
            },
            "add" => {
                let count = if rest.is_empty() { 1 } else { rest.parse().unwrap_or(0) };
                if session.append_rows(count) == 0 {
                    status = String::from("invalid count");
                }
            }
            "del" => match parse_row(rest, session.rows().len()) {
                Some(i) => {
                    session.delete_row(i);
                }
                None => status = String::from("invalid row"),
            },
            "sel" => match parse_row(rest, session.rows().len()) {
                Some(i) => session.toggle_row(i),
                None => status = String::from("invalid row"),
            },
            "selall" => session.toggle_all(),
            "delsel" => status = format!("{} deleted", session.delete_selected()),
            "save" => {
                if !session.save(&gateway).await {
                    status = String::from("not saved");
                }
            }
            "list" => {
                listed = session.list_reports(&gateway, rest).await;
                for (i, group) in listed.iter().enumerate() {
                    println!("{:>3}. {} ({})", i + 1, group.name, group.report_date);
                }
                status = format!("{} reports", listed.len());
            }
            "load" => match parse_row(rest, listed.len()) {
                Some(i) => {
                    let group = listed[i].clone();
                    status = outcome_status(session.load_report(&gateway, group).await);
                }
                None => status = String::from("run list first"),
            },
            "rm" => match parse_row(rest, listed.len()) {
                Some(i) => {
                    let group = listed.remove(i);
                    if !session.delete_report(&gateway, &group.id).await {
                        status = String::from("not deleted");
                    }
                }
                None => status = String::from("run list first"),
            },
            "new" => status = outcome_status(session.new_report(&gateway).await),
            "save_first" => {
                status = outcome_status(session.confirm(&gateway, ConfirmChoice::SaveThenProceed).await)
            }
            "discard" => {
                status = outcome_status(session.confirm(&gateway, ConfirmChoice::DiscardAndProceed).await)
            }
            "cancel" => status = outcome_status(session.confirm(&gateway, ConfirmChoice::Cancel).await),
            "export" => {
                let kind = match rest {
                    "pdf" => Some(ExportKind::Pdf),
                    "xlsx" => Some(ExportKind::Xlsx),
                    "csv" => Some(ExportKind::Csv),
                    _ => None,
                };
                match kind.and_then(|k| session.export(k)) {
                    Some((file_name, bytes)) => {
                        std::fs::write(&file_name, bytes)?;
                        status = format!("wrote {}", file_name);
                    }
                    None => status = String::from("export failed"),
                }
            }
            "theme" => {
                let theme = session.ui().theme.toggled();
                session.set_theme(theme);
                status = format!("theme {}", theme);
            }
            _ => {
                // <row> <field>=<value>
                let edit = rest.split_once('=').and_then(|(field, value)| {
                    let row = parse_row(verb, session.rows().len())?;
                    let field = Field::from_key(field.trim())?;
                    Some((row, field, value.trim().to_string()))
                });
                match edit {
                    Some((row, field, value)) => {
                        if !session.edit_cell(row, field, &value) {
                            status = String::from("invalid value");
                        }
                    }
                    None => status = String::from("invalid command"),
                }
            }
        }
    }

    if session.confirm_before_unload() {
        println!("Unsaved changes kept as a draft.");
    }

    Ok(())
}
