/*!
 * Terminal front end.
 *
 * Renders the three mutually exclusive views of a session and runs the
 * interactive command loop that drives a `CaptureController`.
 */

use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::app_controller::CaptureController;
use crate::session::{Session, View};

const TITLE: &str = "Tradutor RD Engenharia";

/// One interactive command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Camera,
    Capture,
    File(PathBuf),
    Translate,
    Retry,
    Reset,
    Status,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line; blank lines are `Ok(None)`
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "camera" | "c" => Self::Camera,
            "capture" | "snap" => Self::Capture,
            "file" | "f" | "open" => {
                if rest.is_empty() {
                    return Err(anyhow!("usage: file <path>"));
                }
                Self::File(PathBuf::from(unquote(rest)))
            }
            "translate" | "t" => Self::Translate,
            "retry" => Self::Retry,
            "reset" | "new" => Self::Reset,
            "status" | "s" => Self::Status,
            "help" | "h" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(anyhow!("unknown command '{}', type 'help'", other)),
        };

        Ok(Some(command))
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}

/// Text of the current view
pub fn render(session: &Session) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", TITLE);

    match session.view() {
        View::Picker => {
            let _ = writeln!(out, "Selecione uma imagem para traduzir");
            let _ = writeln!(out, "  camera         Usar Câmera");
            let _ = writeln!(out, "  file <arquivo> Enviar Arquivo");
            if let Some(message) = session.error_message() {
                let _ = writeln!(out, "! {}", message);
            }
        }
        View::Camera => {
            let _ = writeln!(out, "Câmera ativa");
            let _ = writeln!(out, "  capture        Capturar Foto");
            let _ = writeln!(out, "  reset          Cancelar");
            if let Some(message) = session.error_message() {
                let _ = writeln!(out, "! {}", message);
            }
        }
        View::Preview => {
            let _ = writeln!(out, "Imagem Selecionada");
            if let Some(preview) = &session.preview {
                let _ = writeln!(out, "  {}", preview);
            }
            if session.can_submit() {
                let _ = writeln!(out, "  translate      Traduzir Agora");
            }
            let _ = writeln!(out, "-- Resultado da Tradução --");
            if session.is_translating() {
                let _ = writeln!(out, "Carregando... Por favor, aguarde.");
            }
            if let Some(message) = session.error_message() {
                let _ = writeln!(out, "! {}", message);
            }
            if let Some(text) = &session.translated_text {
                let _ = writeln!(out, "{}", text);
            }
            let _ = writeln!(out, "  reset          Traduzir Outra Imagem");
        }
    }

    out
}

/// Command summary shown by `help`
pub fn help_text() -> &'static str {
    "Commands:
  camera            open the rear camera
  capture           take a photo from the open camera
  file <path>       use an image file
  translate         send the image for translation
  retry             go back to the image after a result
  reset             start over
  status            show the current screen
  quit              leave
"
}

/// Run the interactive loop until `quit` or end of input
pub async fn run_shell<R, W>(controller: &mut CaptureController, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    write!(out, "{}", render(controller.session()))?;
    write!(out, "> ")?;
    out.flush()?;

    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => {
                write!(out, "> ")?;
                out.flush()?;
                continue;
            }
            Err(e) => {
                writeln!(out, "{}", e)?;
                write!(out, "> ")?;
                out.flush()?;
                continue;
            }
        };
        debug!("Console command: {:?}", command);

        match command {
            Command::Quit => break,
            Command::Help => write!(out, "{}", help_text())?,
            Command::Status => {}
            Command::Camera => controller.open_camera().await,
            Command::Capture => controller.capture(),
            Command::File(ref path) => controller.select_file(path).await,
            Command::Translate => {
                let spinner = translating_spinner();
                controller.submit().await;
                spinner.finish_and_clear();
            }
            Command::Retry => controller.retry(),
            Command::Reset => controller.reset(),
        }

        if command != Command::Help {
            write!(out, "{}", render(controller.session()))?;
        }
        write!(out, "> ")?;
        out.flush()?;
    }

    controller.reset();
    Ok(())
}

fn translating_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg} [{elapsed}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message("Carregando... Por favor, aguarde.");
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
