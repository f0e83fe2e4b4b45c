use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::process::ExitCode;
use taskboard::{
    api::HttpBoardApi,
    app::{run_app, App},
    board::BoardView,
    config::{Cli, Commands, Config},
    error::AppError,
    logging, report,
};
use tracing::{info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::resolve(&cli)?;
    let api = HttpBoardApi::new(&config.api_url, config.timeout)?;

    match cli.command.unwrap_or(Commands::Board) {
        Commands::Board => run_board(api, &config).await,
        command => {
            logging::init_stderr();
            match report::run(&api, &config.project, command).await {
                Ok(out) => {
                    print!("{out}");
                    Ok(())
                }
                Err(err) => {
                    warn!(project = %config.project, error = %err, "report failed");
                    Err(err)
                }
            }
        }
    }
}

async fn run_board(api: HttpBoardApi, config: &Config) -> Result<(), AppError> {
    logging::init_file(&config.log_file)?;
    info!(api = %config.api_url, project = %config.project, "starting board");

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(BoardView::new(api, config.project.clone()));
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result?;
    info!("board closed");
    Ok(())
}
