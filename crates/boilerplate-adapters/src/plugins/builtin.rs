//! Transform steps that ship with Boilerplate.
//!
//! Text steps leave files that are not valid UTF-8 untouched.

use std::sync::Arc;

use boilerplate_core::domain::{
    DomainError, OptionMap, Plugin, SourceFile,
    options::{kind_of, string_option},
};

/// Every built-in plugin, in registration order.
pub fn all_plugins() -> Vec<Arc<dyn Plugin>> {
    vec![
        Arc::new(Noop),
        Arc::new(Eol),
        Arc::new(Trim),
        Arc::new(Banner),
    ]
}

/// Passes files through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct Noop;

impl Plugin for Noop {
    fn name(&self) -> &str {
        "noop"
    }

    fn apply(&self, file: SourceFile, _: &OptionMap) -> Result<Option<SourceFile>, DomainError> {
        Ok(Some(file))
    }
}

/// Normalises CRLF line endings to LF.
#[derive(Debug, Clone, Copy)]
pub struct Eol;

impl Plugin for Eol {
    fn name(&self) -> &str {
        "eol"
    }

    fn apply(&self, mut file: SourceFile, _: &OptionMap) -> Result<Option<SourceFile>, DomainError> {
        if let Some(text) = file.text().filter(|t| t.contains('\r')) {
            let normalised = text.replace("\r\n", "\n");
            file.set_text(normalised);
        }
        Ok(Some(file))
    }
}

/// Strips trailing whitespace from every line and ends the file with a
/// single newline.
#[derive(Debug, Clone, Copy)]
pub struct Trim;

impl Plugin for Trim {
    fn name(&self) -> &str {
        "trim"
    }

    fn apply(&self, mut file: SourceFile, _: &OptionMap) -> Result<Option<SourceFile>, DomainError> {
        if let Some(text) = file.text() {
            let mut trimmed: String = text
                .lines()
                .map(str::trim_end)
                .collect::<Vec<_>>()
                .join("\n")
                .trim_end()
                .to_string();
            trimmed.push('\n');
            file.set_text(trimmed);
        }
        Ok(Some(file))
    }
}

/// Prepends the `banner` option followed by a newline.
#[derive(Debug, Clone, Copy)]
pub struct Banner;

impl Plugin for Banner {
    fn name(&self) -> &str {
        "banner"
    }

    fn apply(
        &self,
        mut file: SourceFile,
        options: &OptionMap,
    ) -> Result<Option<SourceFile>, DomainError> {
        let Some(banner) = options.get("banner") else {
            return Ok(Some(file));
        };
        let Some(banner) = string_option(options, "banner") else {
            return Err(DomainError::transform(
                self.name(),
                file.path().display().to_string(),
                format!("`banner` must be a string, found {}", kind_of(banner)),
            ));
        };
        if let Some(text) = file.text() {
            let text = format!("{banner}\n{text}");
            file.set_text(text);
        }
        Ok(Some(file))
    }
}
