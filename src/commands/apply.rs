//! Apply command implementation

use super::{open_target, report_failure};
use crate::cli::ApplyArgs;
use msirgb_core::{Channels, ColorProgram, Controller, EffectMode, RgbConfig};

/// Translate command line options into a lighting configuration
///
/// `--fade-in` names the channels that fade in; all others go into the
/// fade-in-disable set, so with no `--fade-in` the frames play literally.
pub fn build_config(args: &ApplyArgs) -> RgbConfig {
    let effect = if args.disable {
        EffectMode::Disabled
    } else if args.pulse {
        EffectMode::Pulse
    } else if let Some(level) = args.blink {
        EffectMode::from_blink_level(level)
    } else {
        EffectMode::Normal
    };

    RgbConfig::new()
        .with_colors(args.red, args.green, args.blue)
        .with_step_duration(args.step_duration)
        .with_invert(args.invert)
        .with_fade_in_disable(Channels::all().difference(args.fade_in))
        .with_effect(effect)
}

/// Program the RGB header
pub fn run_apply(args: &ApplyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (backend, config) = open_target(&args.target, build_config(args))?;
    let target = backend.describe();

    let program = ColorProgram::encode(&config);
    log::info!(
        "Program: mode={:#04x} step={} timing={:#04x} red={} green={} blue={}",
        program.mode,
        program.step_duration(),
        program.timing,
        config.red,
        config.green,
        config.blue
    );

    let mut controller = Controller::new(backend);
    if let Err(e) = controller.apply(&config) {
        log::debug!("Apply stopped at {:?}", controller.state());
        report_failure(&e, &args.target);
        return Err(Box::new(e));
    }

    println!("RGB header programmed ({}).", target);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn args(extra: &[&str]) -> ApplyArgs {
        let argv = ["msirgb", "apply"].into_iter().chain(extra.iter().copied());
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Apply(args) => args,
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn test_default_plays_frames_literally() {
        let config = build_config(&args(&[]));
        assert_eq!(config.fade_in_disable, Channels::all());
        assert_eq!(config.effect, EffectMode::Normal);
        assert!(ColorProgram::encode(&config).is_literal_sequence());
    }

    #[test]
    fn test_fade_in_is_complement() {
        let config = build_config(&args(&["-f", "rg"]));
        assert_eq!(config.fade_in_disable, Channels::BLUE);
    }

    #[test]
    fn test_effect_selection() {
        assert_eq!(build_config(&args(&["--pulse"])).effect, EffectMode::Pulse);
        assert_eq!(build_config(&args(&["--disable"])).effect, EffectMode::Disabled);
        assert_eq!(build_config(&args(&["--blink", "4"])).effect, EffectMode::Blink(4));
        assert_eq!(build_config(&args(&["--blink", "0"])).effect, EffectMode::Normal);
    }

    #[test]
    fn test_apply_to_port_file() {
        let path =
            std::env::temp_dir().join(format!("msirgb-apply-{}.portfile", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let port = format!("portfile:path={}", path.display());
        run_apply(&args(&["-p", port.as_str(), "-r", "ffffffff", "-b", "000000ab"])).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes[0x4E], 0xAA);
        assert_eq!(bytes[0x4F], 0xAB);
        std::fs::remove_file(&path).unwrap();
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_apply_to_emulator() {
        run_apply(&args(&["-p", "dummy", "--pulse"])).unwrap();
        run_apply(&args(&["-p", "dummy:id=d451", "--base-port", "2e"])).unwrap();
        assert!(run_apply(&args(&["-p", "dummy:id=1234"])).is_err());
        assert!(run_apply(&args(&["-p", "dummy:id=1234", "--ignore-check"])).is_ok());
    }

    #[test]
    fn test_hardware_needs_flag() {
        assert!(run_apply(&args(&["-p", "devport"])).is_err());
    }
}
