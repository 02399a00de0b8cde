use std::fmt::Write as _;
use std::io;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::calendar::month_view;
use crate::engine::{Engine, EngineError, now_local};
use crate::model::*;

/// Parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// `None` opens on the default booking date.
    Slots { date: Option<NaiveDate> },
    Book { date: NaiveDate, time: NaiveTime, email: String, name: String },
    Calendar { year: i32, month: u32 },
    Gallery { filter: Option<ImageCategory> },
    Login { email: String, password: String },
    Logout,
    Dashboard,
    Bookings { order: SortOrder },
    Edit { id: String, date: NaiveDate, time: NaiveTime, email: String, name: String },
    Suggest { id: String, date: NaiveDate, time: Option<NaiveTime> },
    Delete { id: String },
    AddImage { category: ImageCategory, src: String, alt: String },
    DeleteImage { id: String },
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid date: {0} (expected YYYY-MM-DD)")]
    BadDate(String),
    #[error("invalid time: {0} (expected HH:MM)")]
    BadTime(String),
    #[error("invalid month: {0} (expected YYYY-MM)")]
    BadMonth(String),
    #[error("{0}")]
    BadValue(String),
}

const HELP: &str = "\
commands:
  slots [YYYY-MM-DD]                          show slots (default: next open day)
  book <YYYY-MM-DD> <HH:MM> <email> <name..>  book a slot
  calendar [YYYY-MM]                          show a month
  gallery [hair|beard|other]                  list gallery images
  login <email> <password>                    admin login
  logout                                      admin logout
  dashboard                                   admin totals
  bookings [asc|desc]                         admin booking list
  edit <id> <YYYY-MM-DD> <HH:MM> <email> <name..>
  suggest <id> <YYYY-MM-DD> [HH:MM]           time to preselect when editing
  delete <id>                                 delete a booking
  add-image <category> <url> <description..>  add a gallery image
  delete-image <id>                           delete a gallery image
  quit";

fn date_arg(raw: &str) -> Result<NaiveDate, ParseError> {
    parse_date(raw).ok_or_else(|| ParseError::BadDate(raw.to_string()))
}

fn time_arg(raw: &str) -> Result<NaiveTime, ParseError> {
    parse_time(raw).ok_or_else(|| ParseError::BadTime(raw.to_string()))
}

fn month_arg(raw: &str) -> Result<(i32, u32), ParseError> {
    let bad = || ParseError::BadMonth(raw.to_string());
    let (y, m) = raw.split_once('-').ok_or_else(bad)?;
    let year: i32 = y.parse().map_err(|_| bad())?;
    let month: u32 = m.parse().map_err(|_| bad())?;
    if !(1..=12).contains(&month) {
        return Err(bad());
    }
    Ok((year, month))
}

/// Parse one input line. `Ok(None)` for a blank line.
///
/// `calendar` without a month is resolved against `today`.
pub fn parse(line: &str, today: NaiveDate) -> Result<Option<Command>, ParseError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = words.split_first() else {
        return Ok(None);
    };
    let rest = |from: usize| args.get(from..).map(|w| w.join(" ")).unwrap_or_default();

    let cmd = match head.to_ascii_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "logout" => Command::Logout,
        "dashboard" => Command::Dashboard,
        "slots" => match args {
            [] => Command::Slots { date: None },
            [d] => Command::Slots { date: Some(date_arg(d)?) },
            _ => return Err(ParseError::Usage("slots [YYYY-MM-DD]")),
        },
        "book" => {
            if args.len() < 4 {
                return Err(ParseError::Usage("book <YYYY-MM-DD> <HH:MM> <email> <name..>"));
            }
            Command::Book {
                date: date_arg(args[0])?,
                time: time_arg(args[1])?,
                email: args[2].to_string(),
                name: rest(3),
            }
        }
        "calendar" => match args {
            [] => Command::Calendar { year: today.year(), month: today.month() },
            [m] => {
                let (year, month) = month_arg(m)?;
                Command::Calendar { year, month }
            }
            _ => return Err(ParseError::Usage("calendar [YYYY-MM]")),
        },
        "gallery" => match args {
            [] => Command::Gallery { filter: None },
            [c] if c.eq_ignore_ascii_case("all") => Command::Gallery { filter: None },
            [c] => Command::Gallery { filter: Some(c.parse().map_err(ParseError::BadValue)?) },
            _ => return Err(ParseError::Usage("gallery [hair|beard|other]")),
        },
        "login" => match args {
            [email, password] => Command::Login {
                email: email.to_string(),
                password: password.to_string(),
            },
            _ => return Err(ParseError::Usage("login <email> <password>")),
        },
        "bookings" => match args {
            [] => Command::Bookings { order: SortOrder::Asc },
            [o] => Command::Bookings { order: o.parse().map_err(ParseError::BadValue)? },
            _ => return Err(ParseError::Usage("bookings [asc|desc]")),
        },
        "edit" => {
            if args.len() < 5 {
                return Err(ParseError::Usage("edit <id> <YYYY-MM-DD> <HH:MM> <email> <name..>"));
            }
            Command::Edit {
                id: args[0].to_string(),
                date: date_arg(args[1])?,
                time: time_arg(args[2])?,
                email: args[3].to_string(),
                name: rest(4),
            }
        }
        "suggest" => match args {
            [id, d] => Command::Suggest { id: id.to_string(), date: date_arg(d)?, time: None },
            [id, d, t] => Command::Suggest {
                id: id.to_string(),
                date: date_arg(d)?,
                time: Some(time_arg(t)?),
            },
            _ => return Err(ParseError::Usage("suggest <id> <YYYY-MM-DD> [HH:MM]")),
        },
        "delete" => match args {
            [id] => Command::Delete { id: id.to_string() },
            _ => return Err(ParseError::Usage("delete <id>")),
        },
        "add-image" => {
            if args.len() < 3 {
                return Err(ParseError::Usage("add-image <category> <url> <description..>"));
            }
            Command::AddImage {
                category: args[0].parse().map_err(ParseError::BadValue)?,
                src: args[1].to_string(),
                alt: rest(2),
            }
        }
        "delete-image" => match args {
            [id] => Command::DeleteImage { id: id.to_string() },
            _ => return Err(ParseError::Usage("delete-image <id>")),
        },
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(cmd))
}

/// What the loop should do after a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(String),
    Quit,
}

/// Text front end over the engine: the booking page and the admin panel.
pub struct Console {
    engine: Arc<Engine>,
    clock: fn() -> NaiveDateTime,
}

impl Console {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self::with_clock(engine, now_local)
    }

    pub fn with_clock(engine: Arc<Engine>, clock: fn() -> NaiveDateTime) -> Self {
        Self { engine, clock }
    }

    /// Read commands until EOF or `quit`, writing one reply per command.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            match self.handle_line(&line).await {
                Outcome::Reply(text) if text.is_empty() => {}
                Outcome::Reply(text) => {
                    writer.write_all(text.as_bytes()).await?;
                    writer.write_all(b"\n").await?;
                    writer.flush().await?;
                }
                Outcome::Quit => break,
            }
        }
        Ok(())
    }

    pub async fn handle_line(&self, line: &str) -> Outcome {
        let now = (self.clock)();
        match parse(line, now.date()) {
            Ok(None) => Outcome::Reply(String::new()),
            Ok(Some(Command::Quit)) => Outcome::Quit,
            Ok(Some(cmd)) => match self.execute(cmd, now).await {
                Ok(text) => Outcome::Reply(text),
                Err(e) => Outcome::Reply(format!("error: {e}")),
            },
            Err(e) => Outcome::Reply(format!("error: {e}")),
        }
    }

    pub async fn execute(&self, cmd: Command, now: NaiveDateTime) -> Result<String, EngineError> {
        let engine = &self.engine;
        let text = match cmd {
            Command::Help => HELP.to_string(),
            Command::Quit => String::new(),
            Command::Slots { date } => {
                let date = date.unwrap_or_else(|| engine.default_booking_date(now.date()));
                render_day(date, &engine.day_view(date, now).await)
            }
            Command::Book { date, time, email, name } => {
                let b = engine
                    .create_booking(BookingRequest { date, time, name, email, service: None }, now)
                    .await?;
                format!(
                    "Booking confirmed for {} on {} at {}! A confirmation email would be sent to {} (simulated).\nbooking id: {}",
                    b.name,
                    b.date,
                    format_time(b.time),
                    b.email,
                    b.id
                )
            }
            Command::Calendar { year, month } => {
                match month_view(engine.hours(), year, month, now.date()) {
                    Some(view) => render_month(&view),
                    None => format!("no such month: {year}-{month:02}"),
                }
            }
            Command::Gallery { filter } => {
                let images = engine.gallery(filter).await;
                if images.is_empty() {
                    "No images in the gallery.".to_string()
                } else {
                    images
                        .iter()
                        .map(|img| format!("{}  [{}] {}  {}", img.id, img.category, img.alt, img.src))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            Command::Login { email, password } => {
                engine.login(&email, &password).await?;
                "Logged in as admin.".to_string()
            }
            Command::Logout => {
                engine.logout().await?;
                "Logged out.".to_string()
            }
            Command::Dashboard => {
                let d = engine.dashboard().await?;
                format!(
                    "Total bookings: {}\nGallery images: {}",
                    d.total_bookings, d.total_gallery_images
                )
            }
            Command::Bookings { order } => {
                let list = engine.bookings_sorted(order).await?;
                if list.is_empty() {
                    "No bookings yet.".to_string()
                } else {
                    list.iter().map(render_booking).collect::<Vec<_>>().join("\n")
                }
            }
            Command::Edit { id, date, time, email, name } => {
                engine
                    .edit_booking(&id, BookingRequest { date, time, name, email, service: None }, now)
                    .await?;
                "Booking updated successfully.".to_string()
            }
            Command::Suggest { id, date, time } => {
                match engine.suggest_edit_time(&id, date, time, now).await? {
                    Some(t) => format!("Suggested time: {}", format_time(t)),
                    None => format!("No free slots on {date}."),
                }
            }
            Command::Delete { id } => {
                engine.delete_booking(&id).await?;
                "Booking deleted successfully.".to_string()
            }
            Command::AddImage { category, src, alt } => {
                let img = engine.add_gallery_image(&src, &alt, category).await?;
                format!("Image added: {}", img.id)
            }
            Command::DeleteImage { id } => {
                engine.delete_gallery_image(&id).await?;
                "Image deleted.".to_string()
            }
        };
        Ok(text)
    }
}

fn render_booking(b: &Booking) -> String {
    let mut line = format!("{}  {} {}  {} <{}>", b.id, b.date, format_time(b.time), b.name, b.email);
    if let Some(service) = &b.service {
        let _ = write!(line, "  ({service})");
    }
    line
}

fn render_day(date: NaiveDate, day: &DayAvailability) -> String {
    if let Some(msg) = day.message() {
        return msg.to_string();
    }
    let DayAvailability::Open(slots) = day else {
        return String::new();
    };
    let mut out = format!("Available Slots for {}", date.format("%A, %B %-d, %Y"));
    for slot in slots {
        let _ = write!(out, "\n  {}", format_time(slot.time));
        if slot.booked {
            out.push_str(" (Booked)");
        }
    }
    out
}

fn render_month(view: &crate::calendar::CalendarMonth) -> String {
    let mut out = format!("{}\n Sun Mon Tue Wed Thu Fri Sat\n", view.first.format("%B %Y"));
    let mut column = view.leading_blanks;
    out.push_str(&"    ".repeat(column as usize));
    for day in &view.days {
        let marker = if day.disabled {
            'x'
        } else if day.is_today {
            '*'
        } else {
            ' '
        };
        let _ = write!(out, "{:>3}{marker}", day.date.day());
        column += 1;
        if column == 7 {
            out.push('\n');
            column = 0;
        }
    }
    if column != 0 {
        out.push('\n');
    }
    out.push_str("x = unavailable, * = today");

    let prev = view.previous().filter(|_| view.can_go_back);
    match prev {
        Some(p) => {
            let _ = write!(out, "\nprev: calendar {}", p.format("%Y-%m"));
        }
        None => out.push_str("\nprev: none (earliest month)"),
    }
    if let Some(n) = view.next() {
        let _ = write!(out, "  next: calendar {}", n.format("%Y-%m"));
    }
    out
}
