//! leap_gesture — interactive entry point.

use std::io::{self, Write};

use hand_pose::{CapturePolicy, Handedness};
use leap_gesture::app::run;
use leap_gesture::settings::AppSettings;
use tracing::error;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Leap Gesture — static hand pose recogniser          ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Mode: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Mode: Keyboard simulation  (use --features leap for hardware)");
    println!();

    let mut settings = AppSettings::load();
    if std::env::args().any(|a| a == "--quick") {
        println!(
            "  Quick-start: threshold {:.3} m, default hand {}, library {}\n",
            settings.detector.recognition_threshold,
            settings.detector.default_handedness,
            settings.library_path.display(),
        );
    } else {
        configure_interactively(&mut settings);
    }

    println!();
    println!("  Opening visualizer window…");
    println!();

    if let Err(e) = run(settings) {
        error!(error = %e, "leap_gesture stopped");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn configure_interactively(settings: &mut AppSettings) {
    let det = &mut settings.detector;

    let prompt = format!("  Recognition threshold, metres (default {}): ", det.recognition_threshold);
    if let Ok(t) = read_line(&prompt).trim().parse::<f32>() {
        if t.is_finite() && t > 0.0 {
            det.recognition_threshold = t;
        } else {
            println!("    ⚠  must be a positive number; keeping {}", det.recognition_threshold);
        }
    }

    println!("  Default capture hand: 1=any  2=right  3=left");
    det.default_handedness = match read_line("  Choice (default 1): ").trim() {
        "2" => Handedness::Right,
        "3" => Handedness::Left,
        _   => Handedness::Any,
    };

    println!("  Capture without a tracked palm: 1=store empty template  2=refuse");
    det.capture_policy = match read_line("  Choice (default 1): ").trim() {
        "2" => CapturePolicy::RequirePalm,
        _   => CapturePolicy::LegacyEmpty,
    };

    settings.name_prompt = matches!(
        read_line("  Name gestures on capture? y/N: ").trim(),
        "y" | "Y" | "yes"
    );
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
