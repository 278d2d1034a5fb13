use std::env;
use std::path::PathBuf;
use std::thread;

use rawview::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let mut args = env::args().skip(1);
    let (Some(path), Some(settings_path)) = (args.next(), args.next()) else {
        eprintln!("usage: cargo run -p rawview --example frame_replay <dump> <settings.json>");
        return Ok(());
    };
    let path = PathBuf::from(path);
    let mut settings = ViewerSettings::load(&settings_path)?;
    if let Some(fps) = env::var("RAWVIEW_FPS").ok().and_then(|v| v.parse().ok()) {
        settings.fps = fps;
    }
    settings.validate()?;

    let data = std::fs::read(&path)?;
    let mut session = Session::new(data, &settings)?;

    let index = session.frame_index()?;
    println!(
        "{}: {} frames of {} bytes ({} {})",
        path.display(),
        index.frame_count(),
        index.frame_size(),
        settings.format,
        session.geometry()
    );

    if !session.toggle_playback(settings.fps) {
        println!("fewer than two frames; nothing to replay");
    }
    let interval = session.playback_interval().unwrap_or_default();

    loop {
        match session.refresh()? {
            Refresh::Frame(frame) => {
                let centre = frame
                    .pixel(frame.width() / 2, frame.height() / 2)
                    .map(<[u8]>::to_vec)
                    .unwrap_or_default();
                println!("{:<16} centre={centre:?}", session.navigation().label);
            }
            Refresh::NoFramesAvailable => {
                println!("no valid frames found; check parameters");
                break;
            }
        }
        match session.tick() {
            PlaybackTick::Advanced(_) => thread::sleep(interval),
            PlaybackTick::Finished | PlaybackTick::Idle => break,
        }
    }
    Ok(())
}
