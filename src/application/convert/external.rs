//! Argument templates for the external converters.

use std::ffi::OsString;
use std::path::Path;

use crate::domain::error::{AlfredError, Result};
use crate::domain::traits::ToolLocator;
use crate::domain::types::Tool;

/// A program and its arguments, ready for the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: &'static str,
    pub args: Vec<OsString>,
}

fn os(parts: &[&str]) -> Vec<OsString> {
    parts.iter().map(OsString::from).collect()
}

fn sips_format(target: &str) -> &str {
    match target {
        "jpg" => "jpeg",
        other => other,
    }
}

fn afconvert_flags(target: &str) -> Result<[&'static str; 4]> {
    match target {
        "aac" | "m4a" => Ok(["-f", "m4af", "-d", "aac"]),
        "wav" => Ok(["-f", "WAVE", "-d", "LEI16"]),
        other => Err(AlfredError::conversion(
            "afconvert",
            format!("no afconvert preset for .{other}"),
        )),
    }
}

/// Build the command line converting `input` to `output` (format `target`).
pub fn invocation(
    tool: Tool,
    target: &str,
    input: &Path,
    output: &Path,
    locator: &dyn ToolLocator,
) -> Result<Invocation> {
    let (input, output) = (input.as_os_str().to_owned(), output.as_os_str().to_owned());

    let invocation = match tool {
        Tool::Ffmpeg => {
            let mut args = os(&["-y", "-i"]);
            args.extend([input, output]);
            Invocation { program: "ffmpeg", args }
        }
        Tool::Pandoc => {
            let mut args = vec![input];
            args.extend([OsString::from("-o"), output]);
            Invocation { program: "pandoc", args }
        }
        Tool::Magick => {
            let program = if locator.is_available("magick") { "magick" } else { "convert" };
            Invocation { program, args: vec![input, output] }
        }
        Tool::Sips => {
            let mut args = os(&["-s", "format", sips_format(target)]);
            args.extend([input, OsString::from("--out"), output]);
            Invocation { program: "sips", args }
        }
        Tool::Afconvert => {
            let mut args = os(&afconvert_flags(target)?);
            args.extend([input, output]);
            Invocation { program: "afconvert", args }
        }
        Tool::Textutil => {
            let mut args = os(&["-convert", target, "-output"]);
            args.extend([output, input]);
            Invocation { program: "textutil", args }
        }
        Tool::DataCodec | Tool::ImageCodec | Tool::Markdown => {
            return Err(AlfredError::conversion(
                tool.name(),
                "bundled converter has no command line",
            ));
        }
    };
    Ok(invocation)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Only(&'static str);

    impl ToolLocator for Only {
        fn is_available(&self, executable: &str) -> bool {
            executable == self.0
        }
    }

    fn args_of(inv: &Invocation) -> Vec<String> {
        inv.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_templates() {
        let (i, o) = (Path::new("in.x"), Path::new("out.y"));
        let none = Only("");

        let ffmpeg = invocation(Tool::Ffmpeg, "mp3", i, o, &none).unwrap();
        assert_eq!(ffmpeg.program, "ffmpeg");
        assert_eq!(args_of(&ffmpeg), ["-y", "-i", "in.x", "out.y"]);

        let pandoc = invocation(Tool::Pandoc, "pdf", i, o, &none).unwrap();
        assert_eq!(args_of(&pandoc), ["in.x", "-o", "out.y"]);

        let sips = invocation(Tool::Sips, "jpg", i, o, &none).unwrap();
        assert_eq!(args_of(&sips), ["-s", "format", "jpeg", "in.x", "--out", "out.y"]);

        let afconvert = invocation(Tool::Afconvert, "m4a", i, o, &none).unwrap();
        assert_eq!(args_of(&afconvert), ["-f", "m4af", "-d", "aac", "in.x", "out.y"]);

        let textutil = invocation(Tool::Textutil, "rtf", i, o, &none).unwrap();
        assert_eq!(args_of(&textutil), ["-convert", "rtf", "-output", "out.y", "in.x"]);
    }

    #[test]
    fn test_magick_falls_back_to_convert() {
        let (i, o) = (Path::new("a.svg"), Path::new("a.png"));
        assert_eq!(invocation(Tool::Magick, "png", i, o, &Only("magick")).unwrap().program, "magick");
        assert_eq!(invocation(Tool::Magick, "png", i, o, &Only("convert")).unwrap().program, "convert");
    }

    #[test]
    fn test_bundled_tools_have_no_command() {
        let err = invocation(Tool::Markdown, "html", Path::new("a"), Path::new("b"), &Only("")).unwrap_err();
        assert!(matches!(err, AlfredError::Conversion { .. }));
    }
}
