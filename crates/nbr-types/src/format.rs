//! Output formats understood by the nbconvert engine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{config_error, RunnerError};

/// A rendered-output format, passed to the engine's `--to` option.
///
/// The variant set mirrors what nbconvert accepts without a custom
/// template; each carries the file extension appended to output names
/// (some formats append their own, so no extension is added here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Asciidoc,
    Html,
    Latex,
    Markdown,
    Notebook,
    Pdf,
    Python,
    Rst,
    Script,
    Slides,
}

impl OutputFormat {
    /// Extension appended to the computed output filename, without the dot.
    /// `None` means the engine appends its own (e.g. `script` adds `.py`).
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::Html => Some("html"),
            Self::Latex => Some("tex"),
            Self::Markdown => Some("md"),
            Self::Notebook => Some("ipynb"),
            Self::Pdf => Some("pdf"),
            Self::Python => Some("py"),
            Self::Rst => Some("rst"),
            Self::Asciidoc | Self::Script | Self::Slides => None,
        }
    }

    /// Whether conversion to this format actually executes the notebook.
    /// `python` and `script` exports are plain source dumps, so the engine
    /// gets no execution timeout for them.
    pub fn executes(&self) -> bool {
        !matches!(self, Self::Python | Self::Script)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asciidoc => "asciidoc",
            Self::Html => "html",
            Self::Latex => "latex",
            Self::Markdown => "markdown",
            Self::Notebook => "notebook",
            Self::Pdf => "pdf",
            Self::Python => "python",
            Self::Rst => "rst",
            Self::Script => "script",
            Self::Slides => "slides",
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Html
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asciidoc" => Ok(Self::Asciidoc),
            "html" => Ok(Self::Html),
            "latex" => Ok(Self::Latex),
            "markdown" => Ok(Self::Markdown),
            "notebook" => Ok(Self::Notebook),
            "pdf" => Ok(Self::Pdf),
            "python" => Ok(Self::Python),
            "rst" => Ok(Self::Rst),
            "script" => Ok(Self::Script),
            "slides" => Ok(Self::Slides),
            other => Err(config_error!("unsupported output format: {other}")),
        }
    }
}
