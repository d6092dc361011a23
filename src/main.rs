//! Bookstore CLI
//!
//! Adds books, records purchases and sales, and shows the stock master,
//! ledger, dashboard totals and low-stock alerts.

use anyhow::Context;
use bookstore_ledger::{
    config::{self, Config},
    identifier::{LANGUAGES, OTHER_LANGUAGE},
    ledger::TransactionType,
    report::LowStockReport,
    service::{ActionOutcome, StockService},
    store::SledStore,
    transaction::{AddBookForm, TransactionForm},
};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "bookstore")]
#[command(about = "Bookstore stock master and transaction ledger")]
struct Cli {
    /// Database directory, overrides BOOKSTORE_DB_PATH
    #[arg(long)]
    db: Option<PathBuf>,

    /// Civil timezone as a UTC offset, e.g. +05:30; overrides BOOKSTORE_UTC_OFFSET
    #[arg(long, allow_hyphen_values = true)]
    utc_offset: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a book with zero stock
    AddBook {
        #[arg(long)]
        name: String,
        /// One of the listed languages, or "other" together with --other-language
        #[arg(long)]
        language: String,
        #[arg(long)]
        other_language: Option<String>,
    },
    /// Remove a book from the stock master (its ledger history stays)
    DeleteBook { id: String },
    /// Record a purchase
    Purchase(TransactionArgs),
    /// Record a sale
    Sale(TransactionArgs),
    /// Total profit, units sold and units in stock
    Dashboard,
    /// Stock master table
    Stock,
    /// Every transaction, newest first
    Ledger,
    /// Purchases or Sales log
    Log {
        #[arg(value_enum)]
        kind: LogKind,
    },
    /// Books with fewer than 5 units left
    Alerts,
    /// Languages accepted by add-book
    Languages,
    /// Write a table as CSV in the sheet layout
    Export {
        #[arg(value_enum)]
        table: Table,
        /// Output file, stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Load a sheet CSV export into the store
    Import {
        #[arg(value_enum)]
        table: ImportTable,
        file: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct TransactionArgs {
    /// Book id, e.g. ENG-THE_ALCHEMIST
    #[arg(long)]
    book: String,
    #[arg(long)]
    qty: String,
    #[arg(long)]
    amount: String,
    /// YYYY-MM-DD
    #[arg(long)]
    date: String,
    /// HH:MM, 24 hour clock
    #[arg(long)]
    time: String,
    /// Online or Offline
    #[arg(long)]
    payment_mode: String,
    #[arg(long)]
    bill_no: Option<String>,
    #[arg(long)]
    remarks: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogKind {
    Purchases,
    Sales,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Table {
    Stock,
    Ledger,
    Purchases,
    Sales,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ImportTable {
    Stock,
    Ledger,
}

impl From<LogKind> for TransactionType {
    fn from(kind: LogKind) -> Self {
        match kind {
            LogKind::Purchases => TransactionType::Purchase,
            LogKind::Sales => TransactionType::Sale,
        }
    }
}

impl TransactionArgs {
    fn to_form(&self) -> TransactionForm {
        let mut form = TransactionForm::new()
            .set_book_id(&self.book)
            .set_qty(&self.qty)
            .set_amount(&self.amount)
            .set_date(&self.date)
            .set_time(&self.time)
            .set_payment_mode(&self.payment_mode);
        if let Some(bill_no) = &self.bill_no {
            form = form.set_bill_no(bill_no);
        }
        if let Some(remarks) = &self.remarks {
            form = form.set_remarks(remarks);
        }
        form
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    // logs go to stderr so exports on stdout stay clean
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn money(amount: f64) -> String {
    format!("₹{amount:.2}")
}

fn report(outcome: ActionOutcome) -> anyhow::Result<()> {
    if outcome.success {
        println!("{}", outcome.message);
        Ok(())
    } else {
        anyhow::bail!(outcome.message)
    }
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(offset) = &cli.utc_offset {
        config.utc_offset = config::parse_utc_offset(offset)?;
    }
    config.validate()?;

    init_tracing(config.log_json);
    info!(db = %config.db_path.display(), offset = %config.utc_offset, "starting");

    let store = SledStore::open(&config.db_path).context("Failed to open the stock store")?;
    let service = StockService::new(store, config.utc_offset);
    let zone = config.utc_offset;

    match cli.command {
        Command::AddBook {
            name,
            language,
            other_language,
        } => {
            let mut form = AddBookForm::new().set_book_name(&name).set_language(&language);
            if let Some(other) = &other_language {
                form = form.set_other_language(other);
            }
            report(service.submit_add_book(&form))?;
        }
        Command::DeleteBook { id } => report(service.submit_delete_book(&id))?,
        Command::Purchase(args) => report(service.submit_purchase(&args.to_form()))?,
        Command::Sale(args) => report(service.submit_sale(&args.to_form()))?,
        Command::Dashboard => {
            let totals = service.dashboard()?;
            println!("Total profit:         {}", money(totals.total_profit));
            println!("Total items sold:     {}", totals.total_sales_qty);
            println!("Total items in stock: {}", totals.total_closing_qty);
        }
        Command::Stock => {
            println!(
                "{:<28} {:<28} {:<12} {:>6} {:>12} {:>6} {:>12} {:>7} {:>10} {:>12}",
                "ID",
                "Book",
                "Language",
                "P.Qty",
                "P.Amt",
                "S.Qty",
                "S.Amt",
                "Closing",
                "Avg cost",
                "Profit"
            );
            for book in service.stock_master()? {
                println!(
                    "{:<28} {:<28} {:<12} {:>6} {:>12} {:>6} {:>12} {:>7} {:>10} {:>12}",
                    book.id,
                    book.book_name,
                    book.language,
                    book.purchase_qty,
                    money(book.purchase_amt),
                    book.sales_qty,
                    money(book.sales_amt),
                    book.closing_qty,
                    money(book.closing_price),
                    money(book.profit),
                );
            }
        }
        Command::Ledger => {
            for entry in service.ledger()? {
                println!(
                    "{}  {:<8} {:<28} {:>5} {:>12}  {:<7} bal {:>5}  {}  {}",
                    entry.date.format_civil(&zone),
                    entry.transaction_type,
                    entry.book_name,
                    entry.qty,
                    money(entry.amount),
                    entry.payment_mode,
                    entry.balance,
                    entry.bill_no.as_deref().unwrap_or("-"),
                    entry.remarks.as_deref().unwrap_or(""),
                );
            }
        }
        Command::Log { kind } => {
            for entry in service.type_log(kind.into())? {
                println!(
                    "{}  {:<28} {:>5} {:>12}  {:<7} {}",
                    entry.date.format_civil(&zone),
                    entry.book_name,
                    entry.qty,
                    money(entry.amount),
                    entry.payment_mode,
                    entry.bill_no.as_deref().unwrap_or("-"),
                );
            }
        }
        Command::Alerts => match service.low_stock()? {
            LowStockReport::AllGood => println!("All Good! No items are currently low on stock."),
            LowStockReport::Alerts(alerts) => {
                for alert in alerts {
                    println!("{:<28} {}", alert.book_name, alert.message);
                }
            }
        },
        Command::Languages => {
            for language in LANGUAGES {
                println!("{language}");
            }
            println!("{OTHER_LANGUAGE}  (then pass --other-language)");
        }
        Command::Export { table, out } => {
            let writer: Box<dyn io::Write> = match &out {
                Some(path) => Box::new(
                    File::create(path)
                        .with_context(|| format!("Failed to create {}", path.display()))?,
                ),
                None => Box::new(io::stdout().lock()),
            };
            match table {
                Table::Stock => service.export_stock_master(writer)?,
                Table::Ledger => service.export_ledger(writer)?,
                Table::Purchases => service.export_type_log(writer, TransactionType::Purchase)?,
                Table::Sales => service.export_type_log(writer, TransactionType::Sale)?,
            }
        }
        Command::Import { table, file } => {
            let reader = File::open(&file)
                .with_context(|| format!("Failed to open {}", file.display()))?;
            let summary = match table {
                ImportTable::Stock => service.import_stock_master(reader)?,
                ImportTable::Ledger => service.import_ledger(reader)?,
            };
            println!(
                "Imported {} rows, skipped {} already present, rejected {} unreadable.",
                summary.imported, summary.skipped, summary.rejected
            );
        }
    }

    Ok(())
}
