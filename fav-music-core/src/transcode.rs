//! [`Transcoder`] implementation shelling out to ImageMagick and ffmpeg.
//!
//! A non-zero exit status is reported as [`ToolError::Failed`] so a broken
//! derivative never ends up in the cache or on the server.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use tracing::{error, info};

use crate::config::ToolsConfig;
use crate::contract::{ToolError, Transcoder};

pub struct CommandTranscoder {
    tools: ToolsConfig,
}

impl CommandTranscoder {
    pub fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }
}

/// Arguments for the reduced-palette, ordered-dither derivative.
pub fn dither_args(src: &Path, dst: &Path) -> Vec<OsString> {
    vec![
        "convert".into(),
        src.into(),
        "-colors".into(),
        "2".into(),
        "-resize".into(),
        "200x200".into(),
        "-ordered-dither".into(),
        "o8x8,2".into(),
        dst.into(),
    ]
}

/// Arguments for the quarter-volume preview.
pub fn attenuate_args(src: &Path, dst: &Path) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        src.into(),
        "-af".into(),
        "volume=0.25".into(),
        dst.into(),
    ]
}

fn run_tool(tool: &str, args: Vec<OsString>, dst: &Path) -> Result<(), ToolError> {
    let status = Command::new(tool).args(&args).status();
    match status {
        Ok(s) if s.success() => {
            info!(tool, path = %dst.display(), "Tool finished");
            Ok(())
        }
        Ok(s) => {
            error!(tool, path = %dst.display(), "Tool exited with non-zero code: {}", s);
            Err(ToolError::Failed {
                tool: tool.to_string(),
                status: s.to_string(),
            })
        }
        Err(e) => {
            error!(error = ?e, tool, "Failed to launch tool process");
            Err(ToolError::Launch {
                tool: tool.to_string(),
                source: e,
            })
        }
    }
}

impl Transcoder for CommandTranscoder {
    fn dither_image(&self, src: &Path, dst: &Path) -> Result<(), ToolError> {
        info!(path = %src.display(), "[ENRICH] Processing image with imagemagick");
        run_tool(&self.tools.magick, dither_args(src, dst), dst)
    }

    fn attenuate_audio(&self, src: &Path, dst: &Path) -> Result<(), ToolError> {
        info!(path = %src.display(), "[ENRICH] Processing preview with ffmpeg");
        run_tool(&self.tools.ffmpeg, attenuate_args(src, dst), dst)
    }
}
