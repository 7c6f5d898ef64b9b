use anyhow::Context;
use clap::{App, Arg};
use tokio::io::{self, AsyncBufReadExt, BufReader};

use library_desk::app_config::AppConfig;
use library_desk::desk::{Command, DeskEvent, LibraryDesk};
use library_desk::render::{render_event, render_login_failure, OutputFormat, HELP};
use library_desk::telemetry::init_telemetry;
use library_recommendations::recommendations::RecommendationsEngine;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let matches = App::new("Library Desk")
        .about("Search, issue, return and get recommendations from a library catalog")
        .arg(
            Arg::new("catalog")
                .short('c')
                .long("catalog")
                .takes_value(true)
                .help("Catalog workbook (.xlsx) or CSV file, overrides the configured path"),
        )
        .arg(
            Arg::new("sheet")
                .long("sheet")
                .takes_value(true)
                .help("Workbook sheet holding the catalog table"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print books as JSON lines instead of a table"),
        )
        .get_matches();

    let mut app_config = AppConfig::load()?;
    if let Some(catalog_path) = matches.value_of("catalog") {
        app_config.catalog_path = catalog_path.into();
    }
    if let Some(sheet_name) = matches.value_of("sheet") {
        app_config.sheet_name = sheet_name.to_string();
    }
    let format = if matches.is_present("json") {
        OutputFormat::JsonLines
    } else {
        OutputFormat::Table
    };

    init_telemetry("library_desk", &app_config.log_level)?;

    let storage = app_config.catalog_storage();
    let desk = LibraryDesk::open(
        storage,
        RecommendationsEngine::default()
            .with_large_catalog_warning(app_config.large_catalog_warning),
    )
    .await
    .with_context(|| {
        format!(
            "Failed to open catalog {}",
            app_config.catalog_path.display()
        )
    })?;
    tracing::info!(
        "Library desk ready, catalog {}",
        app_config.catalog_path.display()
    );

    let mut lines = BufReader::new(io::stdin()).lines();

    println!("Library Management System - Login");
    println!("User ID:");
    let mut session = loop {
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        match desk.login(line.trim()) {
            Ok(session) => {
                println!("Welcome to the Library Management System!");
                break session;
            }
            Err(err) => {
                println!("{}", render_login_failure(&err));
                println!("User ID:");
            }
        }
    };

    println!("{}", HELP);
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command: Command = match line.parse() {
            Ok(command) => command,
            Err(err) => {
                println!("{}", err);
                continue;
            }
        };
        for event in session.execute(&desk, command).await {
            if let DeskEvent::Quit = event {
                return Ok(());
            }
            if let Some(text) = render_event(&event, format) {
                print!("{}", text);
            }
        }
    }
    Ok(())
}
