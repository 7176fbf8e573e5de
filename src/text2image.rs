//! Process boundary to Tesseract's `text2image` renderer.
//!
//! text2image -fonts_dir=... --font=ARIAL --text=line.gt.txt --outputbase=out/line ...
//! produces `out/line.tif` and `out/line.box`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{self, Command};

use anyhow::Context;
use tracing::debug;

/// Turns a ground-truth text file into a `<output_base>.tif` / `<output_base>.box` pair.
pub trait Renderer {
    fn render(&self, text_file: &Path, output_base: &Path) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub max_pages: u32,
    pub leading: u32,
    pub xsize: u32,
    pub ysize: u32,
    pub char_spacing: f32,
    pub exposure: i32,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            max_pages: 1,
            leading: 32,
            xsize: 3600,
            ysize: 480,
            char_spacing: 1.0,
            exposure: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Text2Image {
    binary: PathBuf,
    fonts_dir: Option<PathBuf>,
    font: String,
    unicharset: Option<PathBuf>,
    params: RenderParams,
}

impl Default for Text2Image {
    fn default() -> Self {
        Self::new()
    }
}

impl Text2Image {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("text2image"),
            fonts_dir: None,
            font: "ARIAL".to_string(),
            unicharset: None,
            params: RenderParams::default(),
        }
    }

    pub fn with_binary(mut self, binary: PathBuf) -> Self {
        self.binary = binary;
        self
    }

    pub fn with_fonts_dir(mut self, fonts_dir: Option<PathBuf>) -> Self {
        self.fonts_dir = fonts_dir;
        self
    }

    pub fn with_font(mut self, font: String) -> Self {
        self.font = font;
        self
    }

    pub fn with_unicharset(mut self, unicharset: Option<PathBuf>) -> Self {
        self.unicharset = unicharset;
        self
    }

    pub fn with_params(mut self, params: RenderParams) -> Self {
        self.params = params;
        self
    }

    /// Command line arguments for one render, without the binary.
    pub fn args(&self, text_file: &Path, output_base: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        args.reserve_exact(12);

        //Cada flag va en un solo argumento "--flag=valor", si se separan text2image no los reconoce
        if let Some(fonts_dir) = &self.fonts_dir {
            args.push(path_flag("--fonts_dir=", fonts_dir));
        }
        args.push(format!("--font={}", self.font).into());
        args.push(path_flag("--text=", text_file));
        args.push(path_flag("--outputbase=", output_base));
        args.push(format!("--max_pages={}", self.params.max_pages).into());
        args.push("--strip_unrenderable_words".into());
        args.push(format!("--leading={}", self.params.leading).into());
        args.push(format!("--xsize={}", self.params.xsize).into());
        args.push(format!("--ysize={}", self.params.ysize).into());
        args.push(format!("--char_spacing={}", self.params.char_spacing).into());
        args.push(format!("--exposure={}", self.params.exposure).into());
        if let Some(unicharset) = &self.unicharset {
            args.push(path_flag("--unicharset_file=", unicharset));
        }

        args
    }
}

impl Renderer for Text2Image {
    fn render(&self, text_file: &Path, output_base: &Path) -> anyhow::Result<()> {
        let out_message: process::Output = Command::new(&self.binary)
            .args(self.args(text_file, output_base))
            .output()
            .with_context(|| format!("failed to run {}", self.binary.display()))?;

        //text2image escribe su progreso en stderr aunque todo salga bien
        let stderr: String = String::from_utf8_lossy(&out_message.stderr).into_owned();
        if !out_message.status.success() {
            anyhow::bail!("{} exited with {}: {}", self.binary.display(), out_message.status, stderr.trim());
        }
        debug!(output_base = %output_base.display(), stderr = %stderr.trim(), "rendered");

        Ok(())
    }
}

fn path_flag(flag: &str, path: &Path) -> OsString {
    let mut arg: OsString = OsString::from(flag);
    arg.push(path);
    arg
}
