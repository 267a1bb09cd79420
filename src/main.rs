//! Replay host: runs a JSON command script through an overlay session and
//! writes the resulting raster layer to a PNG file.
//!
//! Usage: `scribble-overlay [--container WxH] <SCRIPT.json> <OUT.png>`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;
use clap::Parser;
use serde::Deserialize;

use scribble_overlay::config::InkColor;
use scribble_overlay::domain::{Anchor, Point, Size};
use scribble_overlay::gesture::{PointerEvent, PointerId, PointerPhase};
use scribble_overlay::render::text::AbGlyphRasterizer;
use scribble_overlay::session::OverlayContent;
use scribble_overlay::{
    CommandOutcome, ContainerGeometry, MemoryLayer, OverlayConfig, OverlayMsg, OverlaySession,
    handle_overlay_msg,
};

#[derive(Debug, Deserialize)]
struct Script {
    /// Overlay container size; defaults to the layer size
    #[serde(default)]
    container: Option<(f32, f32)>,
    #[serde(default)]
    container_origin: (f32, f32),
    #[serde(default)]
    layer_origin: (f32, f32),
    #[serde(default)]
    layer_size: Option<(u32, u32)>,
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct ScriptAnchor {
    top: f32,
    left: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ScriptPhase {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    AddImage {
        base64: String,
        #[serde(default)]
        anchor: Option<ScriptAnchor>,
        #[serde(default)]
        density: Option<f32>,
    },
    /// Image file read from disk, relative to the script
    AddImageFile {
        path: PathBuf,
        #[serde(default)]
        anchor: Option<ScriptAnchor>,
        #[serde(default)]
        density: Option<f32>,
    },
    AddText {
        text: String,
        #[serde(default)]
        color: Option<InkColor>,
        #[serde(default)]
        anchor: Option<ScriptAnchor>,
        #[serde(default)]
        density: Option<f32>,
    },
    Move {
        dx: f32,
        dy: f32,
    },
    IncreaseSize,
    DecreaseSize,
    RotateRight,
    RotateLeft,
    SetFontSize {
        size: f32,
    },
    SetTextColor {
        color: InkColor,
    },
    Pointer {
        id: PointerId,
        phase: ScriptPhase,
        x: f32,
        y: f32,
    },
    Commit,
    Cancel,
    /// Host relayout; affects where later overlays are centered
    ResizeContainer {
        width: f32,
        height: f32,
    },
}

impl Step {
    /// Turn a step into a session command; host-only steps are applied directly
    fn prepare(
        self,
        script_dir: &Path,
        session: &mut OverlaySession,
    ) -> Result<Option<OverlayMsg>> {
        let add = |content, anchor: Option<ScriptAnchor>, density| OverlayMsg::Add {
            content,
            anchor: anchor.map(|a| Anchor::new(a.top, a.left)),
            density,
        };
        Ok(Some(match self {
            Step::AddImage {
                base64,
                anchor,
                density,
            } => add(OverlayContent::Image { base64 }, anchor, density),
            Step::AddImageFile {
                path,
                anchor,
                density,
            } => {
                let path = script_dir.join(path);
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("Failed to read image {}", path.display()))?;
                let base64 = base64::engine::general_purpose::STANDARD.encode(bytes);
                add(OverlayContent::Image { base64 }, anchor, density)
            }
            Step::AddText {
                text,
                color,
                anchor,
                density,
            } => add(
                OverlayContent::Text {
                    content: text,
                    color,
                },
                anchor,
                density,
            ),
            Step::Move { dx, dy } => OverlayMsg::Move { dx, dy },
            Step::IncreaseSize => OverlayMsg::IncreaseSize,
            Step::DecreaseSize => OverlayMsg::DecreaseSize,
            Step::RotateRight => OverlayMsg::RotateRight,
            Step::RotateLeft => OverlayMsg::RotateLeft,
            Step::SetFontSize { size } => OverlayMsg::SetFontSize(size),
            Step::SetTextColor { color } => OverlayMsg::SetTextColor(color),
            Step::Pointer { id, phase, x, y } => OverlayMsg::Pointer(PointerEvent {
                id,
                phase: match phase {
                    ScriptPhase::Down => PointerPhase::Down,
                    ScriptPhase::Move => PointerPhase::Move,
                    ScriptPhase::Up => PointerPhase::Up,
                    ScriptPhase::Cancel => PointerPhase::Cancel,
                },
                position: Point::new(x, y),
            }),
            Step::Commit => OverlayMsg::Commit,
            Step::Cancel => OverlayMsg::Cancel,
            Step::ResizeContainer { width, height } => {
                session.set_container_size(Size::new(width, height));
                return Ok(None);
            }
        }))
    }
}

fn load_glyphs(config: &OverlayConfig) -> Option<AbGlyphRasterizer> {
    let path = config.font_path.as_ref()?;
    match AbGlyphRasterizer::from_file(path) {
        Ok(glyphs) => Some(glyphs),
        Err(e) => {
            log::warn!("Text overlays disabled: {e:#}");
            None
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let script_path = args.script.as_path();
    let out_path = args.output.as_path();
    let raw = std::fs::read_to_string(script_path)
        .with_context(|| format!("Failed to read script {}", script_path.display()))?;
    let script: Script = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse script {}", script_path.display()))?;
    let script_dir = script_path.parent().unwrap_or(Path::new("."));

    let config = OverlayConfig::load();
    let (layer_w, layer_h) = script.layer_size.unwrap_or(config.layer_size);
    let (container_w, container_h) = args
        .container
        .or(script.container)
        .unwrap_or((layer_w as f32, layer_h as f32));
    let geometry = ContainerGeometry {
        container_origin: Point::new(script.container_origin.0, script.container_origin.1),
        layer_origin: Point::new(script.layer_origin.0, script.layer_origin.1),
    };

    let mut layer = MemoryLayer::blank(layer_w, layer_h);
    let glyphs = load_glyphs(&config);
    let mut session = OverlaySession::new(config, Size::new(container_w, container_h));
    if let Some(glyphs) = glyphs {
        session = session.with_glyphs(Box::new(glyphs));
    }

    let mut failures = 0usize;
    for (index, step) in script.steps.into_iter().enumerate() {
        let Some(msg) = step.prepare(script_dir, &mut session)? else {
            continue;
        };
        let positions = geometry.positions(session.position().unwrap_or(Point::ZERO));
        match handle_overlay_msg(&mut session, msg, &positions, &mut layer) {
            CommandOutcome::Failed(err) => {
                failures += 1;
                log::warn!("Step {index} failed: {err}");
            }
            CommandOutcome::Committed(report) => {
                log::info!("Step {index} committed into region {:?}", report.region);
            }
            outcome => log::debug!("Step {index}: {outcome:?}"),
        }
        if session.gestures().is_pinching() {
            log::debug!("Step {index}: pinch in progress");
        }
    }
    if session.is_active() {
        log::info!("Script ended with an uncommitted overlay, discarding it");
    }

    let png = layer.encode_png().context("Failed to encode layer")?;
    std::fs::write(out_path, png)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;
    println!(
        "Wrote {} ({} writes, {} failed steps)",
        out_path.display(),
        layer.version(),
        failures
    );
    Ok(())
}

/// Replay an overlay command script onto a blank layer
#[derive(Parser, Debug)]
#[command(name = "scribble-overlay", about = "Replay overlay commands and write the baked layer")]
struct Args {
    /// JSON command script
    #[arg(value_name = "SCRIPT.json")]
    script: PathBuf,

    /// PNG file receiving the raster layer
    #[arg(value_name = "OUT.png")]
    output: PathBuf,

    /// Overlay container size as WIDTHxHEIGHT, overriding the script
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    container: Option<(f32, f32)>,
}

fn parse_size(raw: &str) -> Result<(f32, f32), String> {
    let (w, h) = raw
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {raw:?}"))?;
    let parse = |v: &str| v.trim().parse::<f32>().map_err(|e| format!("{v:?}: {e}"));
    Ok((parse(w)?, parse(h)?))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_take_script_and_output() {
        let args = Args::try_parse_from(["scribble-overlay", "steps.json", "out.png"]).unwrap();
        assert_eq!(args.script, PathBuf::from("steps.json"));
        assert_eq!(args.output, PathBuf::from("out.png"));
        assert_eq!(args.container, None);
    }

    #[test]
    fn test_args_require_output() {
        assert!(Args::try_parse_from(["scribble-overlay", "steps.json"]).is_err());
    }

    #[test]
    fn test_container_override_parses() {
        let args =
            Args::try_parse_from(["scribble-overlay", "--container", "300x200", "a.json", "b.png"])
                .unwrap();
        assert_eq!(args.container, Some((300.0, 200.0)));
        assert!(parse_size("300").is_err());
        assert!(parse_size("wide x 2").is_err());
    }

    #[test]
    fn test_script_steps_deserialize() {
        let script: Script = serde_json::from_str(
            r#"{"steps": [
                {"op": "add_text", "text": "hi", "anchor": {"top": 1, "left": 2}, "density": 2},
                {"op": "pointer", "id": 1, "phase": "down", "x": 3, "y": 4},
                {"op": "increase_size"},
                {"op": "commit"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(script.steps.len(), 4);
        assert!(matches!(script.steps[2], Step::IncreaseSize));
    }
}
