//! Line-oriented terminal front end for the form.
//!
//! Each input line is one form action (`select 1 cat.png`, `prompt ...`,
//! `submit`, ...). Responses are plain text, so the whole session can be
//! driven from tests through [`Session::handle_line`].

use crate::error::{GenFormError, Result};
use crate::form::{FormController, FormState, MAX_IMAGES};
use crate::image::{GeneratedImage, ImageService, OutputQuality, OutputSize, ACCEPT_HINT};
use std::fmt::Write as _;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const HELP: &str = "\
Commands:
  select <slot> <path>   attach an image to slot 1-4 (replaces what is there)
  remove <slot>          remove the image in a slot; later images move up
  prompt <text>          set the prompt
  size <value>           1024x1024 | 1536x1024 | 1024x1536 | auto
  quality <value>        low | medium | high | auto
  submit                 generate (or edit, when images are attached)
  save [path]            write the generated image (default: generated-image.png)
  show                   redraw the form
  help                   this text
  quit                   leave";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Attach the file at `path` to slot `index` (0-based).
    Select {
        /// Target slot.
        index: usize,
        /// File to read.
        path: PathBuf,
    },
    /// Remove the image in slot `index`.
    Remove {
        /// Slot to clear.
        index: usize,
    },
    /// Replace the prompt.
    Prompt(String),
    /// Select an output size.
    Size(OutputSize),
    /// Select an output quality.
    Quality(OutputQuality),
    /// Submit the form.
    Submit,
    /// Write the result, to the given path or the download directory.
    Save(Option<PathBuf>),
    /// Redraw the form.
    Show,
    /// Print the command list.
    Help,
    /// Leave the session.
    Quit,
}

impl Command {
    /// Parses one line. Blank lines yield `Ok(None)`.
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
            "select" | "add" => {
                let (slot, path) = rest.split_once(char::is_whitespace).ok_or_else(|| {
                    GenFormError::Validation("usage: select <slot> <path>".into())
                })?;
                let path = path.trim();
                if path.is_empty() {
                    return Err(GenFormError::Validation("usage: select <slot> <path>".into()));
                }
                Self::Select {
                    index: parse_slot(slot)?,
                    path: PathBuf::from(path),
                }
            }
            "remove" | "rm" => Self::Remove {
                index: parse_slot(rest)?,
            },
            // The prompt is taken verbatim, blank included; submit validates it.
            "prompt" => Self::Prompt(rest.to_string()),
            "size" => Self::Size(rest.parse()?),
            "quality" => Self::Quality(rest.parse()?),
            "submit" | "generate" => Self::Submit,
            "save" | "download" => Self::Save((!rest.is_empty()).then(|| PathBuf::from(rest))),
            "show" => Self::Show,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => {
                return Err(GenFormError::Validation(format!(
                    "unknown command: {other} (try `help`)"
                )))
            }
        };

        Ok(Some(command))
    }
}

/// Converts a 1-based slot number into an index.
fn parse_slot(raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if (1..=MAX_IMAGES).contains(&n) => Ok(n - 1),
        _ => Err(GenFormError::InvalidValue {
            field: "slot",
            value: raw.trim().to_string(),
        }),
    }
}

/// Text produced by one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// What to print.
    pub text: String,
    /// True once the user asked to leave.
    pub done: bool,
}

impl Response {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            done: false,
        }
    }
}

/// Interactive session wrapping a form controller.
pub struct Session<S> {
    form: FormController<S>,
    download_dir: PathBuf,
}

impl<S: ImageService> Session<S> {
    /// Creates a session. `save` without a path writes into `download_dir`.
    pub fn new(form: FormController<S>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            form,
            download_dir: download_dir.into(),
        }
    }

    /// The wrapped controller.
    pub fn form(&self) -> &FormController<S> {
        &self.form
    }

    /// Runs the session on stdin/stdout until `quit` or end of input.
    pub async fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        writeln!(stdout, "{}", render(self.form.state()))?;
        write!(stdout, "> ")?;
        stdout.flush()?;

        for line in stdin.lock().lines() {
            let line = line?;
            let response = self.handle_line(&line).await;
            if !response.text.is_empty() {
                writeln!(stdout, "{}", response.text)?;
            }
            if response.done {
                break;
            }
            write!(stdout, "> ")?;
            stdout.flush()?;
        }

        Ok(())
    }

    /// Applies one input line and returns what to print.
    pub async fn handle_line(&mut self, line: &str) -> Response {
        match Command::parse(line) {
            Ok(Some(command)) => self.execute(command).await,
            Ok(None) => Response::text(""),
            Err(e) => Response::text(format!("error: {e}")),
        }
    }

    async fn execute(&mut self, command: Command) -> Response {
        match command {
            Command::Select { index, path } => {
                match self.form.select_image_path(index, &path).await {
                    Ok(_) => Response::text(render(self.form.state())),
                    Err(e) => Response::text(format!("error: {e}")),
                }
            }
            Command::Remove { index } => {
                if self.form.remove_image(index) {
                    Response::text(render(self.form.state()))
                } else {
                    Response::text(format!("slot {} is empty", index + 1))
                }
            }
            Command::Prompt(text) => {
                self.form.set_prompt(text);
                Response::text("")
            }
            Command::Size(size) => {
                self.form.set_size(size);
                Response::text("")
            }
            Command::Quality(quality) => {
                self.form.set_quality(quality);
                Response::text("")
            }
            Command::Submit => {
                let route = self.form.state().route();
                let outcome = self
                    .form
                    .submit()
                    .await
                    .map(|image| image.map(|i| (i.id, i.size())));
                match outcome {
                    Ok(Some((id, size))) => Response::text(format!(
                        "Generated image {id} ({size} bytes) via {route} endpoint. Use `save` to download."
                    )),
                    Ok(None) => Response::text("a submission is already in progress"),
                    Err(_) => Response::text(format!(
                        "error: {}",
                        self.form.state().error().unwrap_or_default()
                    )),
                }
            }
            Command::Save(target) => {
                let target = target.unwrap_or_else(|| self.download_dir.clone());
                match self.form.save_result(&target).await {
                    Ok(path) => Response::text(format!("Saved {}", path.display())),
                    Err(e) => Response::text(format!("error: {e}")),
                }
            }
            Command::Show => Response::text(render(self.form.state())),
            Command::Help => Response::text(HELP),
            Command::Quit => Response {
                text: String::new(),
                done: true,
            },
        }
    }
}

/// Draws the form as text.
pub fn render(state: &FormState) -> String {
    let mut out = String::new();

    out.push_str("Upload Images\n");
    for index in 0..state.visible_slot_count() {
        match state.slot(index) {
            Some(slot) => {
                let _ = writeln!(
                    out,
                    "  [{}] {} ({} {}x{}, {} bytes)",
                    index + 1,
                    slot.file.name,
                    slot.preview.format.extension(),
                    slot.preview.width,
                    slot.preview.height,
                    slot.file.size()
                );
            }
            None => {
                let label = if index == 0 {
                    "Upload your first image"
                } else {
                    "Add another image"
                };
                let _ = writeln!(
                    out,
                    "  [{}] {} ({})",
                    index + 1,
                    label,
                    ACCEPT_HINT.join(", ")
                );
            }
        }
    }
    let _ = writeln!(out, "  {}", state.slot_summary());

    let _ = writeln!(out, "Prompt: {:?}", state.prompt());
    let _ = writeln!(
        out,
        "Image Size:    {}",
        radio_group(OutputSize::ALL.iter().map(|s| (s.as_str(), *s == state.size())))
    );
    let _ = writeln!(
        out,
        "Image Quality: {}",
        radio_group(
            OutputQuality::ALL
                .iter()
                .map(|q| (q.as_str(), *q == state.quality()))
        )
    );

    let _ = write!(out, "[ {} ]", state.submit_label());
    if !state.can_submit() {
        out.push_str(" (disabled)");
    }

    if let Some(error) = state.error() {
        let _ = write!(out, "\nError: {error}");
    }

    if let Some(result) = state.result() {
        let _ = write!(
            out,
            "\nGenerated Image: {} ({}, {} bytes) [download as {}]",
            result.id,
            result.format.extension(),
            result.size(),
            GeneratedImage::DOWNLOAD_FILE_NAME
        );
    }

    out
}

fn radio_group<'a>(options: impl Iterator<Item = (&'a str, bool)>) -> String {
    options
        .map(|(label, selected)| {
            if selected {
                format!("(*) {label}")
            } else {
                format!("( ) {label}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}
