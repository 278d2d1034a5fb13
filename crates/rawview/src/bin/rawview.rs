//! CLI for rawview
//!
//! ```bash
//! rawview formats
//! rawview info -i dump.yuv -f NV12 -W 1280 -H 720
//! rawview decode -i dump.yuv -f NV12 -W 1280 -H 720 -n 3 -o frame3.png
//! rawview extract -i dump.yuv --settings viewer.json --first 10 --count 5 --out-dir frames/
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use log::{error, info};

use rawview::prelude::*;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    name = "rawview",
    version,
    about = "Decode frames from headerless YUV/RGB dumps"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Input file and decode parameters shared by every frame command.
#[derive(Args)]
struct FrameArgs {
    /// Raw dump to read
    #[arg(short, long = "in", value_name = "FILE")]
    input: PathBuf,
    /// JSON settings file; flags below override its values
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,
    /// Pixel format: name, viewer label or FourCC (e.g. I420, NV21, "YUV422P (I422)", RG24)
    #[arg(short, long)]
    format: Option<PixelFormat>,
    /// Frame width in pixels
    #[arg(short = 'W', long)]
    width: Option<u32>,
    /// Frame height in pixels
    #[arg(short = 'H', long)]
    height: Option<u32>,
    /// Row stride (bytes of a luma row, or pixels for RGB formats); defaults to the width
    #[arg(short = 'L', long)]
    linesize: Option<u32>,
    /// Playback rate in frames per second
    #[arg(long, env = "RAWVIEW_FPS")]
    fps: Option<u32>,
}

impl FrameArgs {
    fn resolve(&self) -> Result<ViewerSettings, SettingsError> {
        let mut settings = match &self.settings {
            Some(path) => ViewerSettings::load(path)?,
            None => ViewerSettings::default(),
        };
        if let Some(format) = self.format {
            settings.format = format;
        }
        if let Some(width) = self.width {
            settings.width = width;
            if self.linesize.is_none() && self.settings.is_none() {
                settings.linesize = width;
            }
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(linesize) = self.linesize {
            settings.linesize = linesize;
        }
        if let Some(fps) = self.fps {
            settings.fps = fps;
        }
        settings.validate()?;
        Ok(settings)
    }

    fn open(&self) -> Result<(ViewerSettings, Session<Vec<u8>>), Box<dyn std::error::Error>> {
        let settings = self.resolve()?;
        let data = fs::read(&self.input)
            .map_err(|e| format!("read {}: {e}", self.input.display()))?;
        info!("loaded {} ({} bytes)", self.input.display(), data.len());
        let session = Session::new(data, &settings)?;
        Ok((settings, session))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Decode one frame to PNG (.png) or raw RGB/RGBA bytes (any other extension)
    Decode {
        #[command(flatten)]
        frame_args: FrameArgs,
        /// Frame number, starting at 1
        #[arg(short = 'n', long, default_value_t = 1)]
        frame: usize,
        /// Output file
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Show frame size, frame count and plane layout
    Info {
        #[command(flatten)]
        frame_args: FrameArgs,
    },
    /// List supported pixel formats
    Formats,
    /// Write consecutive frames as frame_00001.png, frame_00002.png, ...
    Extract {
        #[command(flatten)]
        frame_args: FrameArgs,
        /// First frame to write, starting at 1
        #[arg(long, default_value_t = 1)]
        first: usize,
        /// Number of frames to write (default: through the last frame)
        #[arg(long)]
        count: Option<usize>,
        /// Directory for the PNG files
        #[arg(long, value_name = "DIR")]
        out_dir: PathBuf,
    },
}

fn main() {
    pretty_env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decode {
            frame_args,
            frame,
            out,
        } => cmd_decode(&frame_args, frame, &out),
        Commands::Info { frame_args } => cmd_info(&frame_args),
        Commands::Formats => cmd_formats(),
        Commands::Extract {
            frame_args,
            first,
            count,
            out_dir,
        } => cmd_extract(&frame_args, first, count, &out_dir),
    };

    if let Err(err) = result {
        error!("{err}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn no_frames(session: &Session<Vec<u8>>) -> Box<dyn std::error::Error> {
    format!(
        "no valid frames found in {} bytes as {} {}; check parameters",
        session.buffer().len(),
        session.format(),
        session.geometry()
    )
    .into()
}

/// Move the session to the 1-based `frame`.
fn seek(session: &mut Session<Vec<u8>>, frame: usize) -> CliResult {
    let total = session.frame_index()?.frame_count();
    if total == 0 {
        return Err(no_frames(session));
    }
    let target = frame
        .checked_sub(1)
        .ok_or("frames are numbered from 1")?;
    if !session.jump_to(target) {
        return Err(format!("frame {frame} out of range (1..={total})").into());
    }
    Ok(())
}

fn write_frame(frame: &DecodedFrame, out: &Path) -> CliResult {
    let is_png = out
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
    if is_png {
        decoded_ref_to_dynamic_image(frame)?.save(out)?;
    } else {
        fs::write(out, frame.data())?;
    }
    info!(
        "wrote {}x{} {:?} to {}",
        frame.width(),
        frame.height(),
        frame.output_format(),
        out.display()
    );
    Ok(())
}

fn cmd_decode(args: &FrameArgs, frame: usize, out: &Path) -> CliResult {
    let (_, mut session) = args.open()?;
    seek(&mut session, frame)?;
    if !matches!(session.refresh()?, Refresh::Frame(_)) {
        return Err(no_frames(&session));
    }
    let decoded = session.last_frame().ok_or("no frame decoded")?;
    write_frame(decoded, out)
}

fn cmd_info(args: &FrameArgs) -> CliResult {
    let (settings, session) = args.open()?;
    let format = session.format();
    let geometry = session.geometry();
    let info = format.info();
    let index = session.frame_index()?;
    let required = required_len(format, geometry)?;
    let trailing = SourceBuffer::new(session.buffer())
        .tail(&index, index.frame_count())
        .map_or(0, <[u8]>::len);

    println!("file:        {}", args.input.display());
    println!("format:      {} [{}] fourcc {}", info.name, info.label, info.fourcc);
    println!("geometry:    {geometry}");
    println!("output:      {:?}", format.output_format());
    println!("frame size:  {} bytes", index.frame_size());
    if required > index.frame_size() {
        println!(
            "reads:       {required} bytes per frame; chroma runs past the frame, so no frame decodes"
        );
    }
    println!("frames:      {}", index.frame_count());
    if trailing > 0 {
        let partial = if format.is_yuv() {
            "not decodable"
        } else {
            "partial frame"
        };
        println!("trailing:    {trailing} bytes ({partial})");
    }
    for (i, plane) in format.plane_layouts(geometry)?.iter().enumerate() {
        println!(
            "plane {i}:     offset {} len {} stride {}",
            plane.offset, plane.len, plane.stride
        );
    }
    println!(
        "playback:    {} fps ({} ms/frame)",
        settings.fps,
        1000 / settings.fps
    );
    Ok(())
}

fn cmd_formats() -> CliResult {
    for format in PixelFormat::ALL {
        let info = format.info();
        println!(
            "{:<9} {:<5} {:<21} -> {:?}",
            info.name,
            info.fourcc.to_string(),
            info.label,
            info.output
        );
    }
    Ok(())
}

fn cmd_extract(args: &FrameArgs, first: usize, count: Option<usize>, out_dir: &Path) -> CliResult {
    if count == Some(0) {
        return Ok(());
    }
    let (_, mut session) = args.open()?;
    seek(&mut session, first)?;
    fs::create_dir_all(out_dir)?;

    let mut written = 0usize;
    loop {
        let number = session.current_frame() + 1;
        if !matches!(session.refresh()?, Refresh::Frame(_)) {
            return Err(no_frames(&session));
        }
        let decoded = session.last_frame().ok_or("no frame decoded")?;
        write_frame(decoded, &out_dir.join(format!("frame_{number:05}.png")))?;
        written += 1;
        if count.is_some_and(|count| written >= count) || !session.next_frame() {
            break;
        }
    }
    println!("wrote {written} frame(s) to {}", out_dir.display());
    Ok(())
}
